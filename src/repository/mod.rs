// ==========================================
// 教务数据同步系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口，屏蔽数据库细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod course_repo;
pub mod error;
pub mod grade_repo;
pub mod major_repo;
pub mod student_repo;
pub mod sync_repository;
pub mod sync_run_repo;
pub mod teaching_class_repo;
pub mod teaching_plan_repo;
pub mod term_repo;

// 重导出核心仓储
pub use course_repo::CourseRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use grade_repo::GradeRepository;
pub use major_repo::MajorRepository;
pub use student_repo::{validate_id_card_number, StudentRepository};
pub use sync_repository::SyncRepository;
pub use sync_run_repo::SyncRunRepository;
pub use teaching_class_repo::TeachingClassRepository;
pub use teaching_plan_repo::TeachingPlanRepository;
pub use term_repo::TermRepository;
