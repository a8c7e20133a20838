// ==========================================
// 教务数据同步系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 来源: rusqlite 错误按约束类型归类；身份证号等字段校验
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} (code={id})")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束错误 =====
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    /// 名册引用了不存在的学生或教学班
    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("FOREIGN KEY") => {
                RepositoryError::ForeignKeyViolation(msg)
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn sqlite_error(sql: &str) -> RepositoryError {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE student (code TEXT PRIMARY KEY);
            CREATE TABLE roster (student_code TEXT NOT NULL REFERENCES student(code));
            INSERT INTO student (code) VALUES ('2016000001');
            "#,
        )
        .unwrap();
        conn.execute_batch(sql).unwrap_err().into()
    }

    #[test]
    fn test_constraint_errors_are_classified() {
        assert!(matches!(
            sqlite_error("INSERT INTO student (code) VALUES ('2016000001');"),
            RepositoryError::UniqueConstraintViolation(_)
        ));
        assert!(matches!(
            sqlite_error("INSERT INTO roster (student_code) VALUES ('9999');"),
            RepositoryError::ForeignKeyViolation(_)
        ));
        assert!(matches!(
            sqlite_error("SELECT * FROM missing_table;"),
            RepositoryError::DatabaseQueryError(_)
        ));
    }

    #[test]
    fn test_no_rows_is_not_found() {
        let err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
