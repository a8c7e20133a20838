// ==========================================
// 教务数据同步系统 - 教学班
// ==========================================
// 对齐: schema teaching_class / teaching_class_student 表
// 红线: 名册每次同步整体替换，不做增量合并
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 教学班复合主键 (学期, 课程, 教学班号)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeachingClassKey {
    pub term_code: String,
    pub course_code: String,
    pub number: String, // 教学班号
}

impl TeachingClassKey {
    pub fn new(term_code: &str, course_code: &str, number: &str) -> Self {
        Self {
            term_code: term_code.to_string(),
            course_code: course_code.to_string(),
            number: number.to_string(),
        }
    }
}

impl fmt::Display for TeachingClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.term_code, self.course_code, self.number)
    }
}

/// 教学班可更新字段（容量来自教学班列表，其余来自教学班详情）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeachingClassDefaults {
    pub course_type: String,             // 课程类型
    pub exam_type: String,               // 考核类型
    pub campus: String,                  // 校区
    pub weeks: Option<String>,           // 起止周
    pub time_and_place: Option<String>,  // 时间地点
    pub capacity: Option<i64>,           // 班级容量
    pub sex_limit: Option<String>,       // 性别限制
    pub preferred_scope: Option<String>, // 优选范围
    pub forbidden_scope: Option<String>, // 禁选范围
    pub remark: Option<String>,          // 备注
}

// ==========================================
// TeachingClass - 教学班
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachingClass {
    pub key: TeachingClassKey,
    #[serde(flatten)]
    pub attrs: TeachingClassDefaults,
}

impl TeachingClass {
    pub fn term_code(&self) -> &str {
        &self.key.term_code
    }

    pub fn course_code(&self) -> &str {
        &self.key.course_code
    }

    pub fn number(&self) -> &str {
        &self.key.number
    }
}

impl fmt::Display for TeachingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<TeachingClass {}-{}{}班>",
            self.key.term_code, self.key.course_code, self.key.number
        )
    }
}
