// ==========================================
// 教务数据同步系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合同步引擎所需的所有 Repository，并实现 SyncRepository
// 目标: 引擎只依赖 trait，测试时可整体替换仓储层
// ==========================================

use std::fmt::Display;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::debug;

use crate::db::open_shared_connection;
use crate::domain::academic::{
    Course, CourseDefaults, Major, MajorDefaults, TeachingPlan, Term, TermDefaults,
};
use crate::domain::student::{Student, StudentDefaults};
use crate::domain::teaching_class::{TeachingClass, TeachingClassDefaults, TeachingClassKey};
use crate::repository::{
    CourseRepository, GradeRepository, MajorRepository, RepositoryResult, StudentRepository,
    SyncRepository, SyncRunRepository, TeachingClassRepository, TeachingPlanRepository,
    TermRepository,
};

/// 同步引擎仓储集合
///
/// 所有仓储共享同一个连接，表按外键依赖顺序创建。
#[derive(Clone)]
pub struct SyncRepositories {
    pub term_repo: Arc<TermRepository>,
    pub major_repo: Arc<MajorRepository>,
    pub course_repo: Arc<CourseRepository>,
    pub student_repo: Arc<StudentRepository>,
    pub teaching_plan_repo: Arc<TeachingPlanRepository>,
    pub teaching_class_repo: Arc<TeachingClassRepository>,
    pub grade_repo: Arc<GradeRepository>,
    pub sync_run_repo: Arc<SyncRunRepository>,
}

impl SyncRepositories {
    /// 打开数据库文件并初始化全部仓储
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_shared_connection(db_path)?;
        Self::from_connection(conn)
    }

    /// 从已有共享连接初始化全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        Ok(Self {
            term_repo: Arc::new(TermRepository::from_connection(conn.clone())?),
            major_repo: Arc::new(MajorRepository::from_connection(conn.clone())?),
            course_repo: Arc::new(CourseRepository::from_connection(conn.clone())?),
            student_repo: Arc::new(StudentRepository::from_connection(conn.clone())?),
            teaching_plan_repo: Arc::new(TeachingPlanRepository::from_connection(conn.clone())?),
            teaching_class_repo: Arc::new(TeachingClassRepository::from_connection(conn.clone())?),
            grade_repo: Arc::new(GradeRepository::from_connection(conn.clone())?),
            sync_run_repo: Arc::new(SyncRunRepository::from_connection(conn)?),
        })
    }
}

/// 记录 upsert 结果（新建/更新）
fn log_upsert<E: Display>(entity: &E, created: bool) {
    if created {
        debug!("{} 新建成功", entity);
    } else {
        debug!("{} 更新成功", entity);
    }
}

fn logged<E: Display>(result: RepositoryResult<(E, bool)>) -> RepositoryResult<(E, bool)> {
    let (entity, created) = result?;
    log_upsert(&entity, created);
    Ok((entity, created))
}

impl SyncRepository for SyncRepositories {
    fn upsert_term(&self, code: &str, defaults: &TermDefaults) -> RepositoryResult<(Term, bool)> {
        logged(self.term_repo.upsert(code, defaults))
    }

    fn upsert_major(
        &self,
        code: &str,
        defaults: &MajorDefaults,
    ) -> RepositoryResult<(Major, bool)> {
        logged(self.major_repo.upsert(code, defaults))
    }

    fn upsert_course(
        &self,
        code: &str,
        defaults: &CourseDefaults,
    ) -> RepositoryResult<(Course, bool)> {
        logged(self.course_repo.upsert(code, defaults))
    }

    fn upsert_student(
        &self,
        code: &str,
        defaults: &StudentDefaults,
    ) -> RepositoryResult<(Student, bool)> {
        logged(self.student_repo.upsert_basic(code, defaults))
    }

    fn upsert_teaching_plan(&self, plan: &TeachingPlan) -> RepositoryResult<bool> {
        let created = self.teaching_plan_repo.upsert(plan)?;
        log_upsert(plan, created);
        Ok(created)
    }

    fn upsert_teaching_class(
        &self,
        key: &TeachingClassKey,
        defaults: &TeachingClassDefaults,
    ) -> RepositoryResult<(TeachingClass, bool)> {
        logged(self.teaching_class_repo.upsert(key, defaults))
    }

    fn replace_roster(
        &self,
        key: &TeachingClassKey,
        student_codes: &[String],
    ) -> RepositoryResult<usize> {
        self.teaching_class_repo.replace_roster(key, student_codes)
    }

    fn upsert_student_profile(&self, student: &Student) -> RepositoryResult<bool> {
        let created = self.student_repo.upsert_profile(student)?;
        log_upsert(student, created);
        Ok(created)
    }
}
