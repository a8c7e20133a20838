// ==========================================
// 教务数据同步系统 - 专业数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::academic::{Major, MajorDefaults};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 专业仓储
/// 职责: 管理 major 表
pub struct MajorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MajorRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS major (
              code TEXT PRIMARY KEY,
              name TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// 创建或更新专业（Upsert 操作）
    pub fn upsert(&self, code: &str, defaults: &MajorDefaults) -> RepositoryResult<(Major, bool)> {
        let conn = self.get_conn()?;
        let existed = conn
            .query_row("SELECT 1 FROM major WHERE code = ?1", params![code], |_| Ok(()))
            .optional()?
            .is_some();

        conn.execute(
            r#"
            INSERT INTO major (code, name) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name
            "#,
            params![code, defaults.name],
        )?;

        Ok((
            Major {
                code: code.to_string(),
                name: defaults.name.clone(),
            },
            !existed,
        ))
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Major>> {
        let conn = self.get_conn()?;
        let major = conn
            .query_row(
                "SELECT code, name FROM major WHERE code = ?1",
                params![code],
                |row| {
                    Ok(Major {
                        code: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(major)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Major>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT code, name FROM major ORDER BY code ASC")?;
        let majors = stmt
            .query_map([], |row| {
                Ok(Major {
                    code: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(majors)
    }
}
