// ==========================================
// 教务数据同步系统 - 同步仓储 Trait
// ==========================================
// 职责: 定义遍历引擎依赖的写入接口（不包含实现）
// 实现者: engine::SyncRepositories（SQLite）
// 约束: 每个 upsert 按自然键幂等，各自独立提交
// ==========================================

use crate::domain::academic::{
    Course, CourseDefaults, Major, MajorDefaults, TeachingPlan, Term, TermDefaults,
};
use crate::domain::student::{Student, StudentDefaults};
use crate::domain::teaching_class::{TeachingClass, TeachingClassDefaults, TeachingClassKey};
use crate::repository::error::RepositoryResult;

/// 同步写入接口
///
/// upsert 返回 `(实体, 是否新建)`
pub trait SyncRepository: Send + Sync {
    fn upsert_term(&self, code: &str, defaults: &TermDefaults) -> RepositoryResult<(Term, bool)>;

    fn upsert_major(&self, code: &str, defaults: &MajorDefaults)
        -> RepositoryResult<(Major, bool)>;

    fn upsert_course(
        &self,
        code: &str,
        defaults: &CourseDefaults,
    ) -> RepositoryResult<(Course, bool)>;

    /// 名册同步写入学生，仅覆盖姓名与性别
    fn upsert_student(
        &self,
        code: &str,
        defaults: &StudentDefaults,
    ) -> RepositoryResult<(Student, bool)>;

    fn upsert_teaching_plan(&self, plan: &TeachingPlan) -> RepositoryResult<bool>;

    fn upsert_teaching_class(
        &self,
        key: &TeachingClassKey,
        defaults: &TeachingClassDefaults,
    ) -> RepositoryResult<(TeachingClass, bool)>;

    /// 整体替换教学班名册，返回关联条数
    fn replace_roster(
        &self,
        key: &TeachingClassKey,
        student_codes: &[String],
    ) -> RepositoryResult<usize>;

    /// 档案刷新写入完整学生档案
    fn upsert_student_profile(&self, student: &Student) -> RepositoryResult<bool>;
}
