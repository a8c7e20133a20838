// ==========================================
// 教务数据同步系统 - 学期/专业/课程/教学计划
// ==========================================
// 对齐: schema term / major / course / teaching_plan 表
// 主键: 教务系统的自然代码
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 学期代码固定为 3 位数字，左侧补零（如 "029"）
pub const TERM_CODE_WIDTH: usize = 3;

/// 将学期序号格式化为学期代码
pub fn format_term_code(number: u32) -> String {
    format!("{:0width$}", number, width = TERM_CODE_WIDTH)
}

/// 解析学期代码为学期序号，非数字时返回 None
pub fn parse_term_number(code: &str) -> Option<u32> {
    code.trim().parse::<u32>().ok()
}

// ==========================================
// Term - 学期
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub code: String, // 学期代码 (主键)
    pub name: String, // 学期名称, 如 "2016-2017学年第一学期"
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermDefaults {
    pub name: String,
}

impl Term {
    pub fn number(&self) -> Option<u32> {
        parse_term_number(&self.code)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Term [{}]{}>", self.code, self.name)
    }
}

// ==========================================
// Major - 专业
// ==========================================
// 专业名称前 4 个字符为入学年份（如 "2016计算机科学与技术"）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Major {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MajorDefaults {
    pub name: String,
}

/// 从专业名称前 4 个字符解析入学年份
pub fn parse_admission_year(major_name: &str) -> Option<i32> {
    let prefix: String = major_name.chars().take(4).collect();
    if prefix.chars().count() != 4 || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

impl Major {
    pub fn admission_year(&self) -> Option<i32> {
        parse_admission_year(&self.name)
    }
}

impl fmt::Display for Major {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Major [{}]{}>", self.code, self.name)
    }
}

// ==========================================
// Course - 课程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub credit: f64,        // 学分
    pub hours: i64,         // 学时
    pub department: String, // 开课单位
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDefaults {
    pub name: String,
    pub credit: f64,
    pub hours: i64,
    pub department: String,
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Course [{}]{}>", self.code, self.name)
    }
}

// ==========================================
// TeachingPlan - 教学计划
// ==========================================
// 复合主键 (term, course, major)；仅在按专业同步计划时创建
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeachingPlan {
    pub term_code: String,
    pub course_code: String,
    pub major_code: String,
}

impl fmt::Display for TeachingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<TeachingPlan {}-{}-{}>",
            self.term_code, self.major_code, self.course_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn major(name: &str) -> Major {
        Major {
            code: "080901".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_admission_year_from_name_prefix() {
        assert_eq!(major("2016计算机科学与技术").admission_year(), Some(2016));
        assert_eq!(major("2016XX").admission_year(), Some(2016));
    }

    #[test]
    fn test_admission_year_rejects_malformed_prefix() {
        assert_eq!(major("计算机2016").admission_year(), None);
        assert_eq!(major("201").admission_year(), None);
        assert_eq!(major("20a6软件工程").admission_year(), None);
    }

    #[test]
    fn test_term_code_formatting() {
        assert_eq!(format_term_code(2), "002");
        assert_eq!(format_term_code(29), "029");
        assert_eq!(parse_term_number("029"), Some(29));
        assert_eq!(parse_term_number("秋季"), None);
    }
}
