// ==========================================
// 教务数据同步系统 - 成绩数据仓储
// ==========================================
// 说明: 遍历引擎不写入成绩；供下游成绩导入使用
// ==========================================

use crate::domain::grade::Grade;
use crate::domain::teaching_class::TeachingClassKey;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct GradeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GradeRepository {
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
            CREATE TABLE IF NOT EXISTS grade (
              term_code TEXT NOT NULL,
              course_code TEXT NOT NULL,
              number TEXT NOT NULL,
              student_code TEXT NOT NULL,
              grade TEXT NOT NULL,
              makeup_grade TEXT,
              PRIMARY KEY (term_code, course_code, number, student_code),
              FOREIGN KEY (term_code, course_code, number)
                REFERENCES teaching_class(term_code, course_code, number),
              FOREIGN KEY (student_code) REFERENCES student(code)
            );

            CREATE INDEX IF NOT EXISTS idx_grade_student ON grade(student_code);
            "#,
        )?;
        Ok(())
    }

    /// 按 (教学班, 学生) 创建或更新成绩
    pub fn upsert(&self, grade: &Grade) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let key = &grade.teaching_class;
        let existed = conn
            .query_row(
                r#"
                SELECT 1 FROM grade
                WHERE term_code = ?1 AND course_code = ?2 AND number = ?3 AND student_code = ?4
                "#,
                params![key.term_code, key.course_code, key.number, grade.student_code],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        conn.execute(
            r#"
            INSERT INTO grade (term_code, course_code, number, student_code, grade, makeup_grade)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(term_code, course_code, number, student_code) DO UPDATE SET
                grade = excluded.grade,
                makeup_grade = excluded.makeup_grade
            "#,
            params![
                key.term_code,
                key.course_code,
                key.number,
                grade.student_code,
                grade.grade,
                grade.makeup_grade
            ],
        )?;
        Ok(!existed)
    }

    /// 查询学生全部成绩（按学期、课程排序）
    pub fn find_by_student(&self, student_code: &str) -> RepositoryResult<Vec<Grade>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT term_code, course_code, number, student_code, grade, makeup_grade
            FROM grade
            WHERE student_code = ?1
            ORDER BY term_code ASC, course_code ASC
            "#,
        )?;
        let grades = stmt
            .query_map(params![student_code], map_grade_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(grades)
    }
}

fn map_grade_row(row: &Row<'_>) -> SqliteResult<Grade> {
    Ok(Grade {
        teaching_class: TeachingClassKey {
            term_code: row.get(0)?,
            course_code: row.get(1)?,
            number: row.get(2)?,
        },
        student_code: row.get(3)?,
        grade: row.get(4)?,
        makeup_grade: row.get(5)?,
    })
}
