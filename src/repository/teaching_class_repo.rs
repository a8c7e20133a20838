// ==========================================
// 教务数据同步系统 - 教学班数据仓储
// ==========================================
// 对齐: teaching_class 表 + teaching_class_student 关系表
// 红线: 名册整体替换（删除 + 重新插入，单事务）
// ==========================================

use crate::domain::teaching_class::{TeachingClass, TeachingClassDefaults, TeachingClassKey};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// TeachingClassRepository - 教学班仓储
// ==========================================
pub struct TeachingClassRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeachingClassRepository {
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
            CREATE TABLE IF NOT EXISTS teaching_class (
              term_code TEXT NOT NULL,
              course_code TEXT NOT NULL,
              number TEXT NOT NULL,
              course_type TEXT NOT NULL,
              exam_type TEXT NOT NULL,
              campus TEXT NOT NULL,
              weeks TEXT,
              time_and_place TEXT,
              capacity INTEGER,
              sex_limit TEXT,
              preferred_scope TEXT,
              forbidden_scope TEXT,
              remark TEXT,
              PRIMARY KEY (term_code, course_code, number),
              FOREIGN KEY (term_code) REFERENCES term(code),
              FOREIGN KEY (course_code) REFERENCES course(code)
            );

            CREATE TABLE IF NOT EXISTS teaching_class_student (
              term_code TEXT NOT NULL,
              course_code TEXT NOT NULL,
              number TEXT NOT NULL,
              student_code TEXT NOT NULL,
              PRIMARY KEY (term_code, course_code, number, student_code),
              FOREIGN KEY (term_code, course_code, number)
                REFERENCES teaching_class(term_code, course_code, number) ON DELETE CASCADE,
              FOREIGN KEY (student_code) REFERENCES student(code)
            );

            CREATE INDEX IF NOT EXISTS idx_teaching_class_student_student
              ON teaching_class_student(student_code);
            "#,
        )?;
        Ok(())
    }

    /// 按 (学期, 课程, 教学班号) 创建或更新教学班
    pub fn upsert(
        &self,
        key: &TeachingClassKey,
        defaults: &TeachingClassDefaults,
    ) -> RepositoryResult<(TeachingClass, bool)> {
        let conn = self.get_conn()?;
        let existed = conn
            .query_row(
                "SELECT 1 FROM teaching_class WHERE term_code = ?1 AND course_code = ?2 AND number = ?3",
                params![key.term_code, key.course_code, key.number],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        conn.execute(
            r#"
            INSERT INTO teaching_class (
                term_code, course_code, number,
                course_type, exam_type, campus,
                weeks, time_and_place, capacity,
                sex_limit, preferred_scope, forbidden_scope, remark
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(term_code, course_code, number) DO UPDATE SET
                course_type = excluded.course_type,
                exam_type = excluded.exam_type,
                campus = excluded.campus,
                weeks = excluded.weeks,
                time_and_place = excluded.time_and_place,
                capacity = excluded.capacity,
                sex_limit = excluded.sex_limit,
                preferred_scope = excluded.preferred_scope,
                forbidden_scope = excluded.forbidden_scope,
                remark = excluded.remark
            "#,
            params![
                key.term_code,
                key.course_code,
                key.number,
                defaults.course_type,
                defaults.exam_type,
                defaults.campus,
                defaults.weeks,
                defaults.time_and_place,
                defaults.capacity,
                defaults.sex_limit,
                defaults.preferred_scope,
                defaults.forbidden_scope,
                defaults.remark,
            ],
        )?;

        Ok((
            TeachingClass {
                key: key.clone(),
                attrs: defaults.clone(),
            },
            !existed,
        ))
    }

    /// 整体替换教学班名册
    ///
    /// # 说明
    /// - 远端已退课的学生从关系中移除，学生实体本身保留
    /// - 重复学号只保留一条
    pub fn replace_roster(
        &self,
        key: &TeachingClassKey,
        student_codes: &[String],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM teaching_class_student WHERE term_code = ?1 AND course_code = ?2 AND number = ?3",
            params![key.term_code, key.course_code, key.number],
        )?;

        let mut linked = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO teaching_class_student (term_code, course_code, number, student_code)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for code in student_codes {
                linked += stmt.execute(params![key.term_code, key.course_code, key.number, code])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(linked)
    }

    /// 查询教学班名册（学号升序）
    pub fn list_roster(&self, key: &TeachingClassKey) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT student_code FROM teaching_class_student
            WHERE term_code = ?1 AND course_code = ?2 AND number = ?3
            ORDER BY student_code ASC
            "#,
        )?;
        let codes = stmt
            .query_map(params![key.term_code, key.course_code, key.number], |row| {
                row.get(0)
            })?
            .collect::<SqliteResult<Vec<String>>>()?;
        Ok(codes)
    }

    pub fn find_by_key(&self, key: &TeachingClassKey) -> RepositoryResult<Option<TeachingClass>> {
        let conn = self.get_conn()?;
        let class = conn
            .query_row(
                r#"
                SELECT term_code, course_code, number,
                       course_type, exam_type, campus,
                       weeks, time_and_place, capacity,
                       sex_limit, preferred_scope, forbidden_scope, remark
                FROM teaching_class
                WHERE term_code = ?1 AND course_code = ?2 AND number = ?3
                "#,
                params![key.term_code, key.course_code, key.number],
                map_teaching_class_row,
            )
            .optional()?;
        Ok(class)
    }

    /// 查询某学期某课程的所有教学班
    pub fn find_by_term_and_course(
        &self,
        term_code: &str,
        course_code: &str,
    ) -> RepositoryResult<Vec<TeachingClass>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT term_code, course_code, number,
                   course_type, exam_type, campus,
                   weeks, time_and_place, capacity,
                   sex_limit, preferred_scope, forbidden_scope, remark
            FROM teaching_class
            WHERE term_code = ?1 AND course_code = ?2
            ORDER BY number ASC
            "#,
        )?;
        let classes = stmt
            .query_map(params![term_code, course_code], map_teaching_class_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(classes)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM teaching_class", [], |row| row.get(0))?;
        Ok(n)
    }
}

fn map_teaching_class_row(row: &Row<'_>) -> SqliteResult<TeachingClass> {
    Ok(TeachingClass {
        key: TeachingClassKey {
            term_code: row.get(0)?,
            course_code: row.get(1)?,
            number: row.get(2)?,
        },
        attrs: TeachingClassDefaults {
            course_type: row.get(3)?,
            exam_type: row.get(4)?,
            campus: row.get(5)?,
            weeks: row.get(6)?,
            time_and_place: row.get(7)?,
            capacity: row.get(8)?,
            sex_limit: row.get(9)?,
            preferred_scope: row.get(10)?,
            forbidden_scope: row.get(11)?,
            remark: row.get(12)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_shared;

    fn setup() -> (Arc<Mutex<Connection>>, TeachingClassRepository) {
        let conn = open_in_memory_shared().unwrap();
        {
            let c = conn.lock().unwrap();
            c.execute_batch(
                r#"
                CREATE TABLE term (code TEXT PRIMARY KEY, name TEXT NOT NULL);
                CREATE TABLE course (code TEXT PRIMARY KEY, name TEXT NOT NULL,
                    credit REAL NOT NULL, hours INTEGER NOT NULL, department TEXT NOT NULL);
                CREATE TABLE student (code TEXT PRIMARY KEY, name TEXT NOT NULL);
                INSERT INTO term VALUES ('029', '2016-2017学年第一学期');
                INSERT INTO course VALUES ('0400021B', '高等数学', 6.0, 96, '数学学院');
                INSERT INTO student VALUES ('2016000001', '张三');
                INSERT INTO student VALUES ('2016000002', '李四');
                "#,
            )
            .unwrap();
        }
        let repo = TeachingClassRepository::from_connection(conn.clone()).unwrap();
        (conn, repo)
    }

    fn key() -> TeachingClassKey {
        TeachingClassKey::new("029", "0400021B", "0001")
    }

    #[test]
    fn test_upsert_overwrites_detail_fields() {
        let (_conn, repo) = setup();
        let mut defaults = TeachingClassDefaults {
            course_type: "必修".to_string(),
            exam_type: "考试".to_string(),
            campus: "合肥校区".to_string(),
            capacity: Some(120),
            ..Default::default()
        };
        let (_, created) = repo.upsert(&key(), &defaults).unwrap();
        assert!(created);

        defaults.capacity = Some(90);
        let (class, created) = repo.upsert(&key(), &defaults).unwrap();
        assert!(!created);
        assert_eq!(class.attrs.capacity, Some(90));

        let stored = repo.find_by_key(&key()).unwrap().unwrap();
        assert_eq!(stored.attrs.capacity, Some(90));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_replace_roster_drops_removed_students() {
        let (_conn, repo) = setup();
        repo.upsert(&key(), &TeachingClassDefaults::default()).unwrap();

        repo.replace_roster(&key(), &["2016000001".to_string(), "2016000002".to_string()])
            .unwrap();
        assert_eq!(repo.list_roster(&key()).unwrap().len(), 2);

        let linked = repo
            .replace_roster(&key(), &["2016000002".to_string(), "2016000002".to_string()])
            .unwrap();
        assert_eq!(linked, 1);
        assert_eq!(repo.list_roster(&key()).unwrap(), vec!["2016000002".to_string()]);
    }
}
