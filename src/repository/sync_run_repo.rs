// ==========================================
// 教务数据同步系统 - 同步运行日志仓储
// ==========================================
// 职责: sync_run 表的开始/结束登记与查询
// ==========================================

use crate::domain::sync_run::SyncRun;
use crate::domain::types::SyncRunStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct SyncRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SyncRunRepository {
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
            CREATE TABLE IF NOT EXISTS sync_run (
              run_id TEXT PRIMARY KEY,
              account_code TEXT NOT NULL,
              started_at TEXT NOT NULL,
              finished_at TEXT,
              status TEXT NOT NULL DEFAULT 'RUNNING',
              counters_json TEXT,
              failed_branches_json TEXT,
              error_message TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_sync_run_started
              ON sync_run(started_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 登记运行开始
    pub fn insert(&self, run: &SyncRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sync_run (
                run_id, account_code, started_at, finished_at, status,
                counters_json, failed_branches_json, error_message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run.run_id,
                run.account_code,
                run.started_at,
                run.finished_at,
                run.status.to_db_str(),
                run.counters_json,
                run.failed_branches_json,
                run.error_message,
            ],
        )?;
        Ok(())
    }

    /// 登记运行结束
    pub fn finish(
        &self,
        run_id: &str,
        finished_at: NaiveDateTime,
        status: SyncRunStatus,
        counters_json: Option<&str>,
        failed_branches_json: Option<&str>,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE sync_run SET
                finished_at = ?2,
                status = ?3,
                counters_json = ?4,
                failed_branches_json = ?5,
                error_message = ?6
            WHERE run_id = ?1
            "#,
            params![
                run_id,
                finished_at,
                status.to_db_str(),
                counters_json,
                failed_branches_json,
                error_message
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SyncRun".to_string(),
                id: run_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<SyncRun>> {
        let conn = self.get_conn()?;
        let run = conn
            .query_row(
                r#"
                SELECT run_id, account_code, started_at, finished_at, status,
                       counters_json, failed_branches_json, error_message
                FROM sync_run WHERE run_id = ?1
                "#,
                params![run_id],
                map_sync_run_row,
            )
            .optional()?;
        Ok(run)
    }

    /// 最近的运行记录（按开始时间倒序）
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<SyncRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT run_id, account_code, started_at, finished_at, status,
                   counters_json, failed_branches_json, error_message
            FROM sync_run
            ORDER BY started_at DESC
            LIMIT ?1
            "#,
        )?;
        let runs = stmt
            .query_map(params![limit], map_sync_run_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(runs)
    }
}

fn map_sync_run_row(row: &Row<'_>) -> SqliteResult<SyncRun> {
    Ok(SyncRun {
        run_id: row.get(0)?,
        account_code: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        status: SyncRunStatus::from_str(&row.get::<_, String>(4)?),
        counters_json: row.get(5)?,
        failed_branches_json: row.get(6)?,
        error_message: row.get(7)?,
    })
}
