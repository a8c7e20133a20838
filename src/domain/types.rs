// ==========================================
// 教务数据同步系统 - 领域类型定义
// ==========================================
// 职责: 校区、性别、实体种类、同步运行状态等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 校区 (Campus)
// ==========================================
// 数据库存储: HF / XC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Campus {
    #[serde(rename = "HF")]
    Hefei, // 合肥校区
    #[serde(rename = "XC")]
    Xuancheng, // 宣城校区
}

impl fmt::Display for Campus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Campus {
    /// 从字符串解析校区（大小写不敏感），无法识别时返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "HF" | "合肥校区" => Some(Campus::Hefei),
            "XC" | "宣城校区" => Some(Campus::Xuancheng),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Campus::Hefei => "HF",
            Campus::Xuancheng => "XC",
        }
    }
}

// ==========================================
// 性别 (Sex)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Sex {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "m" => Some(Sex::Male),
            "f" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Sex::Male => "m",
            Sex::Female => "f",
        }
    }

    /// 从教务系统个人信息页的中文性别解析
    pub fn from_label(label: &str) -> Self {
        if label.trim() == "男" {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

// ==========================================
// 实体种类 (Entity Kind)
// ==========================================
// 用于缓存键与日志字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Term,
    Major,
    Course,
    TeachingPlan,
    TeachingClass,
    Student,
    Grade,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Term => write!(f, "TERM"),
            EntityKind::Major => write!(f, "MAJOR"),
            EntityKind::Course => write!(f, "COURSE"),
            EntityKind::TeachingPlan => write!(f, "TEACHING_PLAN"),
            EntityKind::TeachingClass => write!(f, "TEACHING_CLASS"),
            EntityKind::Student => write!(f, "STUDENT"),
            EntityKind::Grade => write!(f, "GRADE"),
        }
    }
}

// ==========================================
// 同步运行状态 (Sync Run Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncRunStatus {
    Running,   // 运行中
    Succeeded, // 全部成功
    Partial,   // 部分分支失败（fail_fast = false）
    Failed,    // 中止
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl SyncRunStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "RUNNING" => SyncRunStatus::Running,
            "SUCCEEDED" => SyncRunStatus::Succeeded,
            "PARTIAL" => SyncRunStatus::Partial,
            _ => SyncRunStatus::Failed,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Running => "RUNNING",
            SyncRunStatus::Succeeded => "SUCCEEDED",
            SyncRunStatus::Partial => "PARTIAL",
            SyncRunStatus::Failed => "FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campus_parse() {
        assert_eq!(Campus::parse("hf"), Some(Campus::Hefei));
        assert_eq!(Campus::parse(" XC "), Some(Campus::Xuancheng));
        assert_eq!(Campus::parse("宣城校区"), Some(Campus::Xuancheng));
        assert_eq!(Campus::parse("ALL"), None);
    }

    #[test]
    fn test_sex_round_trip_db_str() {
        assert_eq!(Sex::from_db_str(Sex::Female.to_db_str()), Some(Sex::Female));
        assert_eq!(Sex::from_db_str("x"), None);
        assert_eq!(Sex::from_label("男"), Sex::Male);
        assert_eq!(Sex::from_label("女"), Sex::Female);
    }

    #[test]
    fn test_sync_run_status_from_str() {
        assert_eq!(SyncRunStatus::from_str("partial"), SyncRunStatus::Partial);
        assert_eq!(SyncRunStatus::from_str("???"), SyncRunStatus::Failed);
    }
}
