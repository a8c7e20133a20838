// ==========================================
// 教务数据同步系统 - 成绩
// ==========================================
// 对齐: schema grade 表，复合主键 (教学班, 学生)
// 说明: 遍历引擎不写入成绩，由下游按需写入
// ==========================================

use crate::domain::teaching_class::TeachingClassKey;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub teaching_class: TeachingClassKey,
    pub student_code: String,
    pub grade: String,                // 成绩
    pub makeup_grade: Option<String>, // 补考成绩
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Grade {}-{}-{}-{}>",
            self.student_code,
            self.teaching_class,
            self.grade,
            self.makeup_grade.as_deref().unwrap_or("")
        )
    }
}
