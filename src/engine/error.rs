// ==========================================
// 教务数据同步系统 - 同步引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束:
// - 认证错误中止整次同步，不重试
// - 远端查询错误只中止所在分支，并携带分支定位
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::portal::PortalError;
use crate::repository::RepositoryError;

/// 遍历分支定位
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum Branch {
    /// 代码表（学期 + 专业）
    Codebook,
    /// 单个专业（名称无法解析入学年份）
    Major { major_code: String },
    /// (学期, 专业)；专业为空表示选修分支
    TermMajor {
        term_code: String,
        major_code: Option<String>,
    },
    /// (学期, 课程)
    TermCourse {
        term_code: String,
        course_code: String,
    },
    /// 个人档案刷新
    Profile { code: String },
}

impl Branch {
    pub fn term_major(term_code: &str, major_code: Option<&str>) -> Self {
        Branch::TermMajor {
            term_code: term_code.to_string(),
            major_code: major_code.map(str::to_string),
        }
    }

    pub fn term_course(term_code: &str, course_code: &str) -> Self {
        Branch::TermCourse {
            term_code: term_code.to_string(),
            course_code: course_code.to_string(),
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Codebook => write!(f, "codebook"),
            Branch::Major { major_code } => write!(f, "major={}", major_code),
            Branch::TermMajor {
                term_code,
                major_code: Some(major),
            } => write!(f, "term={} major={}", term_code, major),
            Branch::TermMajor {
                term_code,
                major_code: None,
            } => write!(f, "term={} elective", term_code),
            Branch::TermCourse {
                term_code,
                course_code,
            } => write!(f, "term={} course={}", term_code, course_code),
            Branch::Profile { code } => write!(f, "profile={}", code),
        }
    }
}

/// 同步引擎错误类型
#[derive(Error, Debug)]
pub enum SyncError {
    // ===== 中止整次同步 =====
    #[error("认证失败: {0}")]
    Authentication(#[source] PortalError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("配置错误: {0}")]
    Config(String),

    // ===== 中止当前分支 =====
    #[error("分支 [{branch}] 同步失败: {source}")]
    RemoteQuery {
        branch: Branch,
        #[source]
        source: PortalError,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// 按错误种类归入认证错误或分支错误
    pub fn from_portal(branch: Branch, err: PortalError) -> Self {
        if err.is_authentication() {
            SyncError::Authentication(err)
        } else {
            SyncError::RemoteQuery {
                branch,
                source: err,
            }
        }
    }

    /// 失败分支（仅分支级错误有）
    pub fn branch(&self) -> Option<&Branch> {
        match self {
            SyncError::RemoteQuery { branch, .. } => Some(branch),
            _ => None,
        }
    }

    /// 是否只影响所在分支
    pub fn is_branch_local(&self) -> bool {
        matches!(self, SyncError::RemoteQuery { .. })
    }
}

/// Result 类型别名
pub type SyncResult<T> = Result<T, SyncError>;
