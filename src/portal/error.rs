// ==========================================
// 教务数据同步系统 - 教务系统客户端错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::portal::records::PortalQuery;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    // ===== 认证错误（不重试） =====
    #[error("登录失败 (学号 {code}): {reason}")]
    Authentication { code: String, reason: String },

    #[error("会话已过期: {0}")]
    SessionExpired(String),

    // ===== 查询错误（仅中止当前分支） =====
    #[error("查询失败 [{query}]: {message}")]
    RemoteQuery { query: PortalQuery, message: String },

    #[error("返回数据格式错误 ({record}): {message}")]
    MalformedRecord { record: String, message: String },

    #[error("网络传输失败: {0}")]
    Transport(String),

    // ===== 离线快照 =====
    #[error("快照读取失败: {0}")]
    Snapshot(String),
}

impl PortalError {
    /// 是否为认证类错误（需立即中止整次同步）
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            PortalError::Authentication { .. } | PortalError::SessionExpired(_)
        )
    }

    pub fn malformed(record: &str, message: impl Into<String>) -> Self {
        PortalError::MalformedRecord {
            record: record.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::Snapshot(err.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Snapshot(err.to_string())
    }
}

/// Result 类型别名
pub type PortalResult<T> = Result<T, PortalError>;
