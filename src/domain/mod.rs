// ==========================================
// 教务数据同步系统 - 领域模型层
// ==========================================
// 职责: 定义同步实体、主键与默认字段
// 红线: 不含数据访问逻辑，不含遍历逻辑
// ==========================================

pub mod academic;
pub mod grade;
pub mod student;
pub mod sync_run;
pub mod teaching_class;
pub mod types;

// 重导出核心类型
pub use academic::{
    format_term_code, parse_admission_year, parse_term_number, Course, CourseDefaults, Major, MajorDefaults,
    TeachingPlan, Term, TermDefaults,
};
pub use grade::Grade;
pub use student::{derive_name_and_sex, Student, StudentDefaults, StudentProfile};
pub use sync_run::SyncRun;
pub use teaching_class::{TeachingClass, TeachingClassDefaults, TeachingClassKey};
pub use types::{Campus, EntityKind, Sex, SyncRunStatus};
