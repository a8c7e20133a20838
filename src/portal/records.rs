// ==========================================
// 教务数据同步系统 - 教务系统返回记录
// ==========================================
// 职责: 每种查询响应一个强类型结构，在客户端边界校验
// 红线: 引擎只接触这里的类型，不接触原始键值映射
// ==========================================

use crate::domain::academic::{parse_term_number, CourseDefaults, MajorDefaults, TermDefaults};
use crate::domain::student::derive_name_and_sex;
use crate::domain::teaching_class::{TeachingClassDefaults, TeachingClassKey};
use crate::domain::types::Campus;
use crate::portal::error::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 边界校验
pub trait Validate {
    fn validate(&self) -> PortalResult<()>;
}

fn require_non_empty(record: &str, field: &str, value: &str) -> PortalResult<()> {
    if value.trim().is_empty() {
        return Err(PortalError::malformed(record, format!("{} 为空", field)));
    }
    Ok(())
}

// ==========================================
// 登录凭据
// ==========================================
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub code: String,
    pub password: String,
    pub campus: Campus,
}

impl Credentials {
    pub fn new(code: impl Into<String>, password: impl Into<String>, campus: Campus) -> Self {
        Self {
            code: code.into(),
            password: password.into(),
            campus,
        }
    }
}

// 密码不进日志
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("code", &self.code)
            .field("password", &"***")
            .field("campus", &self.campus)
            .finish()
    }
}

// ==========================================
// 查询标识（日志、错误上下文、调用记录）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum PortalQuery {
    Authenticate { code: String },
    Codebook,
    TeachingPlan { term_code: String, major_code: Option<String> },
    SearchSections { term_code: String, course_code: String },
    SectionDetail { key: TeachingClassKey },
    SectionRoster { key: TeachingClassKey },
    MyProfile,
}

impl fmt::Display for PortalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalQuery::Authenticate { code } => write!(f, "authenticate({})", code),
            PortalQuery::Codebook => write!(f, "list_codebook"),
            PortalQuery::TeachingPlan { term_code, major_code: Some(major) } => {
                write!(f, "list_teaching_plan({}, {})", term_code, major)
            }
            PortalQuery::TeachingPlan { term_code, major_code: None } => {
                write!(f, "list_teaching_plan({}, elective)", term_code)
            }
            PortalQuery::SearchSections { term_code, course_code } => {
                write!(f, "search_sections({}, {})", term_code, course_code)
            }
            PortalQuery::SectionDetail { key } => write!(f, "get_section_detail({})", key),
            PortalQuery::SectionRoster { key } => write!(f, "get_section_roster({})", key),
            PortalQuery::MyProfile => write!(f, "get_my_profile"),
        }
    }
}

// ==========================================
// 代码表: 学期 + 专业
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRecord {
    pub code: String,
    pub name: String,
}

impl TermRecord {
    pub fn defaults(&self) -> TermDefaults {
        TermDefaults {
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorRecord {
    pub code: String,
    pub name: String,
}

impl MajorRecord {
    pub fn defaults(&self) -> MajorDefaults {
        MajorDefaults {
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Codebook {
    pub terms: Vec<TermRecord>,
    pub majors: Vec<MajorRecord>,
}

impl Codebook {
    /// 已知最大学期序号（代码表为空时 None）
    pub fn max_term_number(&self) -> Option<u32> {
        self.terms
            .iter()
            .filter_map(|t| parse_term_number(&t.code))
            .max()
    }
}

impl Validate for Codebook {
    fn validate(&self) -> PortalResult<()> {
        for term in &self.terms {
            require_non_empty("term", "code", &term.code)?;
            if parse_term_number(&term.code).is_none() {
                return Err(PortalError::malformed(
                    "term",
                    format!("学期代码非数字: {}", term.code),
                ));
            }
        }
        for major in &self.majors {
            require_non_empty("major", "code", &major.code)?;
        }
        Ok(())
    }
}

// ==========================================
// 教学计划
// ==========================================
/// 教学计划查询: 按专业 / 选修
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanQuery<'a> {
    Major { term_code: &'a str, major_code: &'a str },
    Elective { term_code: &'a str },
}

impl<'a> PlanQuery<'a> {
    pub fn term_code(&self) -> &'a str {
        match self {
            PlanQuery::Major { term_code, .. } | PlanQuery::Elective { term_code } => term_code,
        }
    }

    pub fn major_code(&self) -> Option<&'a str> {
        match self {
            PlanQuery::Major { major_code, .. } => Some(major_code),
            PlanQuery::Elective { .. } => None,
        }
    }

    pub fn to_query(&self) -> PortalQuery {
        PortalQuery::TeachingPlan {
            term_code: self.term_code().to_string(),
            major_code: self.major_code().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCourseRecord {
    pub course_code: String,
    pub course_name: String,
    pub credit: f64,
    pub hours: i64,
    pub department: String,
}

impl PlanCourseRecord {
    pub fn defaults(&self) -> CourseDefaults {
        CourseDefaults {
            name: self.course_name.clone(),
            credit: self.credit,
            hours: self.hours,
            department: self.department.clone(),
        }
    }
}

impl Validate for PlanCourseRecord {
    fn validate(&self) -> PortalResult<()> {
        require_non_empty("plan_course", "course_code", &self.course_code)?;
        if !self.credit.is_finite() || self.credit < 0.0 {
            return Err(PortalError::malformed(
                "plan_course",
                format!("学分非法: {} ({})", self.credit, self.course_code),
            ));
        }
        Ok(())
    }
}

// ==========================================
// 教学班
// ==========================================
/// 教学班列表项（来自课程搜索）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub number: String,        // 教学班号
    pub capacity: Option<i64>, // 班级容量
}

impl Validate for SectionSummary {
    fn validate(&self) -> PortalResult<()> {
        require_non_empty("section", "number", &self.number)
    }
}

/// 教学班详情
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionDetail {
    pub course_type: String,
    pub exam_type: String,
    pub campus: String,
    #[serde(default)]
    pub weeks: Option<String>,
    #[serde(default)]
    pub time_and_place: Option<String>,
    #[serde(default)]
    pub sex_limit: Option<String>,
    #[serde(default)]
    pub preferred_scope: Option<String>,
    #[serde(default)]
    pub forbidden_scope: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
}

impl SectionDetail {
    /// 合并列表容量与详情字段
    pub fn merge_with(&self, summary: &SectionSummary) -> TeachingClassDefaults {
        TeachingClassDefaults {
            course_type: self.course_type.clone(),
            exam_type: self.exam_type.clone(),
            campus: self.campus.clone(),
            weeks: self.weeks.clone(),
            time_and_place: self.time_and_place.clone(),
            capacity: summary.capacity,
            sex_limit: self.sex_limit.clone(),
            preferred_scope: self.preferred_scope.clone(),
            forbidden_scope: self.forbidden_scope.clone(),
            remark: self.remark.clone(),
        }
    }
}

impl Validate for SectionDetail {
    fn validate(&self) -> PortalResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub code: String,     // 学号
    pub raw_name: String, // 原始姓名（女生末尾带 *）
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionRoster {
    #[serde(default)]
    pub term_name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    pub students: Vec<RosterEntry>,
}

impl Validate for SectionRoster {
    fn validate(&self) -> PortalResult<()> {
        for entry in &self.students {
            require_non_empty("roster", "code", &entry.code)?;
            require_non_empty("roster", "raw_name", &entry.raw_name)?;
            // 仅有性别标记、去掉后无姓名
            let (name, _) = derive_name_and_sex(&entry.raw_name);
            if name.trim().is_empty() {
                return Err(PortalError::malformed(
                    "roster",
                    format!("学号 {} 的姓名为空: {:?}", entry.code, entry.raw_name),
                ));
            }
        }
        Ok(())
    }
}

// ==========================================
// 个人信息（档案刷新）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfileRecord {
    pub code: String,
    pub name: String,
    pub sex_label: String,        // 男 / 女
    pub birthday: Option<String>, // YYYY-MM-DD
    pub id_card_number: Option<String>,
    pub photo: Option<String>,
    pub phone: Option<String>,
    pub home_phone: Option<String>,
    pub college: Option<String>,
    pub major: Option<String>,
    pub klass: Option<String>,
    pub nation: Option<String>,
    pub native_place: Option<String>,
    pub home_address: Option<String>,
    pub admission_type: Option<String>,
    pub admission_date: Option<String>,
    pub examinee_code: Option<String>,
    pub high_school: Option<String>,
    pub student_origin: Option<String>,
    pub foreign_language: Option<String>,
    pub can_select_label: String, // 能 / 否
    pub politics_status: Option<String>,
    pub marital_status: Option<String>,
    pub school_roll_status: Option<String>,
    pub registration_status: Option<String>,
}

impl Validate for StudentProfileRecord {
    fn validate(&self) -> PortalResult<()> {
        require_non_empty("profile", "code", &self.code)?;
        require_non_empty("profile", "name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_rejects_marker_only_name() {
        let roster = |raw: &str| SectionRoster {
            students: vec![RosterEntry {
                code: "2016000001".to_string(),
                raw_name: raw.to_string(),
            }],
            ..Default::default()
        };
        assert!(roster("张三*").validate().is_ok());
        assert!(matches!(
            roster("*").validate(),
            Err(PortalError::MalformedRecord { .. })
        ));
        assert!(roster("**").validate().is_err());
    }

    #[test]
    fn test_codebook_rejects_non_numeric_term_code() {
        let codebook = Codebook {
            terms: vec![TermRecord {
                code: "秋季".to_string(),
                name: "2016秋".to_string(),
            }],
            majors: vec![],
        };
        assert!(matches!(
            codebook.validate(),
            Err(PortalError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_max_term_number_uses_largest_code() {
        let codebook = Codebook {
            terms: vec![
                TermRecord { code: "002".to_string(), name: "b".to_string() },
                TermRecord { code: "010".to_string(), name: "c".to_string() },
                TermRecord { code: "001".to_string(), name: "a".to_string() },
            ],
            majors: vec![],
        };
        assert_eq!(codebook.max_term_number(), Some(10));
        assert_eq!(Codebook::default().max_term_number(), None);
    }

    #[test]
    fn test_detail_merge_takes_capacity_from_listing() {
        let detail = SectionDetail {
            course_type: "必修".to_string(),
            exam_type: "考试".to_string(),
            campus: "屯溪路校区".to_string(),
            weeks: Some("1-16".to_string()),
            ..Default::default()
        };
        let merged = detail.merge_with(&SectionSummary {
            number: "0001".to_string(),
            capacity: Some(60),
        });
        assert_eq!(merged.capacity, Some(60));
        assert_eq!(merged.weeks.as_deref(), Some("1-16"));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("2016000001", "secret", Campus::Hefei);
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("secret"));
    }
}
