// ==========================================
// 教务数据同步系统 - 课程数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::academic::{Course, CourseDefaults};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 课程仓储
/// 职责: 管理 course 表
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
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
            CREATE TABLE IF NOT EXISTS course (
              code TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              credit REAL NOT NULL,
              hours INTEGER NOT NULL,
              department TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// 创建或更新课程，已存在时覆盖为教务系统最新值
    pub fn upsert(&self, code: &str, defaults: &CourseDefaults) -> RepositoryResult<(Course, bool)> {
        let conn = self.get_conn()?;
        let existed = conn
            .query_row("SELECT 1 FROM course WHERE code = ?1", params![code], |_| Ok(()))
            .optional()?
            .is_some();

        conn.execute(
            r#"
            INSERT INTO course (code, name, credit, hours, department)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                credit = excluded.credit,
                hours = excluded.hours,
                department = excluded.department
            "#,
            params![
                code,
                defaults.name,
                defaults.credit,
                defaults.hours,
                defaults.department
            ],
        )?;

        Ok((
            Course {
                code: code.to_string(),
                name: defaults.name.clone(),
                credit: defaults.credit,
                hours: defaults.hours,
                department: defaults.department.clone(),
            },
            !existed,
        ))
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        let course = conn
            .query_row(
                "SELECT code, name, credit, hours, department FROM course WHERE code = ?1",
                params![code],
                map_course_row,
            )
            .optional()?;
        Ok(course)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT code, name, credit, hours, department FROM course ORDER BY code ASC",
        )?;
        let courses = stmt
            .query_map([], map_course_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(courses)
    }
}

fn map_course_row(row: &Row<'_>) -> SqliteResult<Course> {
    Ok(Course {
        code: row.get(0)?,
        name: row.get(1)?,
        credit: row.get(2)?,
        hours: row.get(3)?,
        department: row.get(4)?,
    })
}
