// ==========================================
// 教务数据同步系统 - 同步配置读取 Trait
// ==========================================
// 职责: 定义同步编排器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::Campus;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 一次同步所需的全部配置
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub account_code: Option<String>,
    pub account_password: Option<String>,
    pub campus: Campus,
    pub fail_fast: bool,
    pub reuse_entity_cache: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            account_code: None,
            account_password: None,
            campus: Campus::Hefei,
            fail_fast: true,
            reuse_entity_cache: false,
        }
    }
}

// ==========================================
// SyncConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SyncConfigReader: Send + Sync {
    /// 同步账号学号（未配置时 None）
    async fn get_account_code(&self) -> ConfigResult<Option<String>>;

    /// 同步账号密码（未配置时 None）
    async fn get_account_password(&self) -> ConfigResult<Option<String>>;

    /// 登录校区
    ///
    /// # 默认值
    /// - HF
    async fn get_campus(&self) -> ConfigResult<Campus>;

    /// # 默认值
    /// - true
    async fn get_fail_fast(&self) -> ConfigResult<bool>;

    /// # 默认值
    /// - false
    async fn get_reuse_entity_cache(&self) -> ConfigResult<bool>;

    /// 一次性读取全部同步配置
    async fn get_sync_settings(&self) -> ConfigResult<SyncSettings> {
        Ok(SyncSettings {
            account_code: self.get_account_code().await?,
            account_password: self.get_account_password().await?,
            campus: self.get_campus().await?,
            fail_fast: self.get_fail_fast().await?,
            reuse_entity_cache: self.get_reuse_entity_cache().await?,
        })
    }
}
