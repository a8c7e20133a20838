// ==========================================
// 教务数据同步系统 - 学生
// ==========================================
// 对齐: schema student 表
// 说明:
// - 名册同步只写 name / sex
// - 个人档案字段只由档案刷新写入
// ==========================================

use crate::domain::types::{Campus, Sex};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 名册中女生姓名末尾的标记字符
pub const FEMALE_NAME_MARKER: char = '*';

/// 从名册原始姓名派生 (存储姓名, 性别)
///
/// 末尾带 `*` 表示女生，存储时去掉所有末尾标记。
pub fn derive_name_and_sex(raw_name: &str) -> (String, Sex) {
    let sex = if raw_name.ends_with(FEMALE_NAME_MARKER) {
        Sex::Female
    } else {
        Sex::Male
    };
    let name = raw_name.trim_end_matches(FEMALE_NAME_MARKER).to_string();
    (name, sex)
}

/// 名册同步写入的默认字段
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDefaults {
    pub name: String,
    pub sex: Sex,
}

impl StudentDefaults {
    pub fn from_raw_name(raw_name: &str) -> Self {
        let (name, sex) = derive_name_and_sex(raw_name);
        Self { name, sex }
    }
}

// ==========================================
// StudentProfile - 学生档案（个人信息页）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id_card_number: Option<String>, // 身份证号
    pub photo: Option<String>,          // 照片 URL
    pub birthday: Option<NaiveDate>,
    pub phone: Option<String>,
    pub home_phone: Option<String>,

    pub campus: Option<Campus>,
    pub college: Option<String>, // 学院简称
    pub major: Option<String>,   // 专业简称
    pub klass: Option<String>,   // 班级简称

    pub nation: Option<String>,
    pub native_place: Option<String>,
    pub home_address: Option<String>,

    // ===== 生源信息 =====
    pub admission_type: Option<String>,
    pub admission_date: Option<String>,
    pub examinee_code: Option<String>,
    pub high_school: Option<String>,
    pub student_origin: Option<String>,
    pub foreign_language: Option<String>,

    // ===== 状态信息 =====
    pub can_select_courses: bool,
    pub politics_status: Option<String>,
    pub marital_status: Option<String>,
    pub school_roll_status: Option<String>,
    pub registration_status: Option<String>,
}

// ==========================================
// Student - 学生
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub code: String, // 学号 (主键)
    pub name: String,
    pub sex: Option<Sex>,
    pub profile: StudentProfile,
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Student [{} {}]>", self.code, self.name)
    }
}
