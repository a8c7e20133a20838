// ==========================================
// 教务数据同步系统 - 教学计划数据仓储
// ==========================================
// 说明: 教学计划无可更新字段，upsert 即“存在则保留，不存在则插入”
// ==========================================

use crate::domain::academic::TeachingPlan;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 教学计划仓储
/// 职责: 管理 teaching_plan 表，复合主键 (term_code, course_code, major_code)
pub struct TeachingPlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeachingPlanRepository {
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
            CREATE TABLE IF NOT EXISTS teaching_plan (
              term_code TEXT NOT NULL,
              course_code TEXT NOT NULL,
              major_code TEXT NOT NULL,
              PRIMARY KEY (term_code, course_code, major_code),
              FOREIGN KEY (term_code) REFERENCES term(code),
              FOREIGN KEY (course_code) REFERENCES course(code),
              FOREIGN KEY (major_code) REFERENCES major(code)
            );

            CREATE INDEX IF NOT EXISTS idx_teaching_plan_major
              ON teaching_plan(major_code, term_code);
            "#,
        )?;
        Ok(())
    }

    /// 创建教学计划（已存在时不做修改）
    ///
    /// # 返回
    /// - Ok(true): 新建
    /// - Ok(false): 已存在
    pub fn upsert(&self, plan: &TeachingPlan) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO teaching_plan (term_code, course_code, major_code)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(term_code, course_code, major_code) DO NOTHING
            "#,
            params![plan.term_code, plan.course_code, plan.major_code],
        )?;
        Ok(inserted > 0)
    }

    /// 查询某专业某学期的教学计划
    pub fn find_by_major_and_term(
        &self,
        major_code: &str,
        term_code: &str,
    ) -> RepositoryResult<Vec<TeachingPlan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT term_code, course_code, major_code
            FROM teaching_plan
            WHERE major_code = ?1 AND term_code = ?2
            ORDER BY course_code ASC
            "#,
        )?;
        let plans = stmt
            .query_map(params![major_code, term_code], |row| {
                Ok(TeachingPlan {
                    term_code: row.get(0)?,
                    course_code: row.get(1)?,
                    major_code: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(plans)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM teaching_plan", [], |row| row.get(0))?;
        Ok(n)
    }
}
