// ==========================================
// 教务数据同步系统 - 学生数据仓储
// ==========================================
// 红线:
// - 名册同步只覆盖 name / sex，不触碰档案字段
// - 档案写入前校验身份证号格式
// ==========================================

use crate::domain::student::{Student, StudentDefaults, StudentProfile};
use crate::domain::types::{Campus, Sex};
use crate::repository::error::{RepositoryError, RepositoryResult};
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

lazy_static! {
    /// 身份证号: 17 位数字 + 1 位数字或 x/X
    static ref ID_CARD_PATTERN: Regex = Regex::new(r"^\d{17}[\dxX]$").unwrap();
}

const STUDENT_COLUMNS: &str = r#"
    code, name, sex,
    id_card_number, photo, birthday, phone, home_phone,
    campus, college, major, klass,
    nation, native_place, home_address,
    admission_type, admission_date, examinee_code, high_school, student_origin, foreign_language,
    can_select_courses, politics_status, marital_status, school_roll_status, registration_status
"#;

/// 校验身份证号格式
pub fn validate_id_card_number(value: &str) -> RepositoryResult<()> {
    if ID_CARD_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(RepositoryError::FieldValueError {
            field: "id_card_number".to_string(),
            message: format!("身份证号格式不正确: {}", value),
        })
    }
}

// ==========================================
// StudentRepository - 学生仓储
// ==========================================
pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
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
            CREATE TABLE IF NOT EXISTS student (
              code TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              sex TEXT,
              id_card_number TEXT UNIQUE,
              photo TEXT,
              birthday TEXT,
              phone TEXT,
              home_phone TEXT,
              campus TEXT,
              college TEXT,
              major TEXT,
              klass TEXT,
              nation TEXT,
              native_place TEXT,
              home_address TEXT,
              admission_type TEXT,
              admission_date TEXT,
              examinee_code TEXT,
              high_school TEXT,
              student_origin TEXT,
              foreign_language TEXT,
              can_select_courses INTEGER NOT NULL DEFAULT 1,
              politics_status TEXT,
              marital_status TEXT,
              school_roll_status TEXT,
              registration_status TEXT
            );
            "#,
        )?;
        Ok(())
    }

    fn select_by_code(conn: &Connection, code: &str) -> RepositoryResult<Option<Student>> {
        let sql = format!("SELECT {} FROM student WHERE code = ?1", STUDENT_COLUMNS);
        let student = conn
            .query_row(&sql, params![code], map_student_row)
            .optional()?;
        Ok(student)
    }

    /// 名册同步: 按学号创建或更新姓名/性别
    ///
    /// # 返回
    /// 完整学生实体（含已有档案字段）与是否新建
    pub fn upsert_basic(
        &self,
        code: &str,
        defaults: &StudentDefaults,
    ) -> RepositoryResult<(Student, bool)> {
        let conn = self.get_conn()?;
        let existed = conn
            .query_row("SELECT 1 FROM student WHERE code = ?1", params![code], |_| Ok(()))
            .optional()?
            .is_some();

        conn.execute(
            r#"
            INSERT INTO student (code, name, sex) VALUES (?1, ?2, ?3)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                sex = excluded.sex
            "#,
            params![code, defaults.name, defaults.sex.to_db_str()],
        )?;

        let student = Self::select_by_code(&conn, code)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Student".to_string(),
            id: code.to_string(),
        })?;
        Ok((student, !existed))
    }

    /// 档案刷新: 写入完整学生档案（覆盖全部字段）
    pub fn upsert_profile(&self, student: &Student) -> RepositoryResult<bool> {
        if let Some(id) = student.profile.id_card_number.as_deref() {
            validate_id_card_number(id)?;
        }

        let conn = self.get_conn()?;
        let existed = conn
            .query_row(
                "SELECT 1 FROM student WHERE code = ?1",
                params![student.code],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let p = &student.profile;
        conn.execute(
            r#"
            INSERT INTO student (
                code, name, sex,
                id_card_number, photo, birthday, phone, home_phone,
                campus, college, major, klass,
                nation, native_place, home_address,
                admission_type, admission_date, examinee_code, high_school, student_origin, foreign_language,
                can_select_courses, politics_status, marital_status, school_roll_status, registration_status
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
            )
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                sex = excluded.sex,
                id_card_number = excluded.id_card_number,
                photo = excluded.photo,
                birthday = excluded.birthday,
                phone = excluded.phone,
                home_phone = excluded.home_phone,
                campus = excluded.campus,
                college = excluded.college,
                major = excluded.major,
                klass = excluded.klass,
                nation = excluded.nation,
                native_place = excluded.native_place,
                home_address = excluded.home_address,
                admission_type = excluded.admission_type,
                admission_date = excluded.admission_date,
                examinee_code = excluded.examinee_code,
                high_school = excluded.high_school,
                student_origin = excluded.student_origin,
                foreign_language = excluded.foreign_language,
                can_select_courses = excluded.can_select_courses,
                politics_status = excluded.politics_status,
                marital_status = excluded.marital_status,
                school_roll_status = excluded.school_roll_status,
                registration_status = excluded.registration_status
            "#,
            params![
                student.code,
                student.name,
                student.sex.map(|s| s.to_db_str()),
                p.id_card_number,
                p.photo,
                p.birthday,
                p.phone,
                p.home_phone,
                p.campus.map(|c| c.to_db_str()),
                p.college,
                p.major,
                p.klass,
                p.nation,
                p.native_place,
                p.home_address,
                p.admission_type,
                p.admission_date,
                p.examinee_code,
                p.high_school,
                p.student_origin,
                p.foreign_language,
                p.can_select_courses,
                p.politics_status,
                p.marital_status,
                p.school_roll_status,
                p.registration_status,
            ],
        )?;
        Ok(!existed)
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        Self::select_by_code(&conn, code)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM student", [], |row| row.get(0))?;
        Ok(n)
    }
}

fn map_student_row(row: &Row<'_>) -> SqliteResult<Student> {
    Ok(Student {
        code: row.get(0)?,
        name: row.get(1)?,
        sex: row
            .get::<_, Option<String>>(2)?
            .and_then(|s| Sex::from_db_str(&s)),
        profile: StudentProfile {
            id_card_number: row.get(3)?,
            photo: row.get(4)?,
            birthday: row.get(5)?,
            phone: row.get(6)?,
            home_phone: row.get(7)?,
            campus: row
                .get::<_, Option<String>>(8)?
                .and_then(|s| Campus::parse(&s)),
            college: row.get(9)?,
            major: row.get(10)?,
            klass: row.get(11)?,
            nation: row.get(12)?,
            native_place: row.get(13)?,
            home_address: row.get(14)?,
            admission_type: row.get(15)?,
            admission_date: row.get(16)?,
            examinee_code: row.get(17)?,
            high_school: row.get(18)?,
            student_origin: row.get(19)?,
            foreign_language: row.get(20)?,
            can_select_courses: row.get(21)?,
            politics_status: row.get(22)?,
            marital_status: row.get(23)?,
            school_roll_status: row.get(24)?,
            registration_status: row.get(25)?,
        },
    })
}
