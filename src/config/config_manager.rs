// ==========================================
// 教务数据同步系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)，与业务数据同库
// ==========================================

use crate::config::sync_config_trait::{ConfigResult, SyncConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::Campus;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            conn_guard.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS config_kv (
                    scope_id TEXT NOT NULL DEFAULT 'global',
                    key TEXT NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (scope_id, key)
                );
                "#,
            )?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式，密码项脱敏）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            if key == config_keys::ACCOUNT_PASSWORD {
                config_map.insert(key, "***".to_string());
            } else {
                config_map.insert(key, value);
            }
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

/// 解析布尔配置（无法识别时返回 None）
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ==========================================
// SyncConfigReader Trait 实现
// ==========================================
#[async_trait]
impl SyncConfigReader for ConfigManager {
    async fn get_account_code(&self) -> ConfigResult<Option<String>> {
        Ok(non_empty(self.get_config_value(config_keys::ACCOUNT_CODE)?))
    }

    async fn get_account_password(&self) -> ConfigResult<Option<String>> {
        Ok(non_empty(self.get_config_value(config_keys::ACCOUNT_PASSWORD)?))
    }

    async fn get_campus(&self) -> ConfigResult<Campus> {
        let value = self.get_config_or_default(config_keys::CAMPUS, "HF")?;
        Ok(Campus::parse(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::CAMPUS,
                raw_value = %value,
                "校区配置无法识别，使用 HF"
            );
            Campus::Hefei
        }))
    }

    async fn get_fail_fast(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::FAIL_FAST, "true")?;
        Ok(parse_bool(&value).unwrap_or(true))
    }

    async fn get_reuse_entity_cache(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::REUSE_ENTITY_CACHE, "false")?;
        Ok(parse_bool(&value).unwrap_or(false))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 同步账号
    pub const ACCOUNT_CODE: &str = "sync.account_code";
    pub const ACCOUNT_PASSWORD: &str = "sync.account_password";
    pub const CAMPUS: &str = "sync.campus";

    // 遍历行为
    pub const FAIL_FAST: &str = "sync.fail_fast";
    pub const REUSE_ENTITY_CACHE: &str = "sync.reuse_entity_cache";
}
