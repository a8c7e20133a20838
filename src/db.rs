// ==========================================
// 教务数据同步系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 记录 schema_version，旧库上运行时给出告警
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 数据库文件名
pub const DB_FILE_NAME: &str = "hfut_sync.db";

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开共享连接（各仓储通过 Arc<Mutex<Connection>> 共用）
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema_version_table(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 打开内存库共享连接（测试用）
pub fn open_in_memory_shared() -> rusqlite::Result<Arc<Mutex<Connection>>> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    ensure_schema_version_table(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 默认数据库路径（用户数据目录下，取不到时回退到当前目录）
pub fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("hfut-sync");
            // 目录创建失败时由后续打开连接报错
            std::fs::create_dir_all(&dir).ok();
            dir.join(DB_FILE_NAME)
        }
        None => PathBuf::from(".").join(DB_FILE_NAME),
    }
}

/// 创建 schema_version 表并登记当前版本（幂等）
pub fn ensure_schema_version_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    if let Some(found) = read_schema_version(conn)? {
        if found < CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                found,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 落后于当前代码"
            );
        }
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_registered_once() {
        let conn = open_in_memory_shared().unwrap();
        let conn = conn.lock().unwrap();
        ensure_schema_version_table(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory_shared().unwrap();
        let conn = conn.lock().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
