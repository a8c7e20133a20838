// ==========================================
// 教务数据同步系统 - 学期数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::academic::{Term, TermDefaults};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// TermRepository - 学期仓储
// ==========================================
/// 职责: 管理 term 表的 upsert / 查询
pub struct TermRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TermRepository {
    /// 从已有连接创建仓储实例（确保表存在）
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
            CREATE TABLE IF NOT EXISTS term (
              code TEXT PRIMARY KEY,
              name TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// 按学期代码创建或更新
    ///
    /// # 返回
    /// - Ok((Term, true)): 新建
    /// - Ok((Term, false)): 已存在，名称已覆盖为最新值
    pub fn upsert(&self, code: &str, defaults: &TermDefaults) -> RepositoryResult<(Term, bool)> {
        let conn = self.get_conn()?;
        let existed = conn
            .query_row("SELECT 1 FROM term WHERE code = ?1", params![code], |_| Ok(()))
            .optional()?
            .is_some();

        conn.execute(
            r#"
            INSERT INTO term (code, name) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name
            "#,
            params![code, defaults.name],
        )?;

        Ok((
            Term {
                code: code.to_string(),
                name: defaults.name.clone(),
            },
            !existed,
        ))
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Term>> {
        let conn = self.get_conn()?;
        let term = conn
            .query_row(
                "SELECT code, name FROM term WHERE code = ?1",
                params![code],
                |row| {
                    Ok(Term {
                        code: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(term)
    }

    /// 按学期代码升序列出所有学期
    pub fn list_all(&self) -> RepositoryResult<Vec<Term>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT code, name FROM term ORDER BY code ASC")?;
        let terms = stmt
            .query_map([], |row| {
                Ok(Term {
                    code: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_shared;

    #[test]
    fn test_upsert_reports_created_then_updated() {
        let repo = TermRepository::from_connection(open_in_memory_shared().unwrap()).unwrap();

        let (term, created) = repo
            .upsert("001", &TermDefaults { name: "2016上".to_string() })
            .unwrap();
        assert!(created);
        assert_eq!(term.name, "2016上");

        let (_, created) = repo
            .upsert("001", &TermDefaults { name: "2016-2017学年第一学期".to_string() })
            .unwrap();
        assert!(!created);

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "2016-2017学年第一学期");
    }
}
