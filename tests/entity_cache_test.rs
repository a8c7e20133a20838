// ==========================================
// 实体缓存集成测试
// ==========================================
// 测试目标:
// - 一次运行内每个实体至多写库一次
// - 跨运行复用缓存时不再写库
// - 默认每次运行使用新缓存
// ==========================================

mod test_helpers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hfut_sync::domain::academic::{
    Course, CourseDefaults, Major, MajorDefaults, TeachingPlan, Term, TermDefaults,
};
use hfut_sync::domain::student::{Student, StudentDefaults};
use hfut_sync::domain::teaching_class::{TeachingClass, TeachingClassDefaults, TeachingClassKey};
use hfut_sync::domain::types::EntityKind;
use hfut_sync::engine::{SyncOptions, SyncRepositories, TraversalEngine};
use hfut_sync::portal::PortalClient;
use hfut_sync::repository::{RepositoryResult, SyncRepository};
use test_helpers::{
    create_test_db, credentials, open_repos, orchestrator, standard_snapshot, ExpectedCounts,
};

/// 统计每个 (种类, 代码) 写库次数的仓储包装
struct CountingRepository {
    inner: SyncRepositories,
    upserts: Mutex<HashMap<String, usize>>,
}

impl CountingRepository {
    fn new(inner: SyncRepositories) -> Self {
        Self {
            inner,
            upserts: Mutex::new(HashMap::new()),
        }
    }

    fn bump(&self, kind: EntityKind, code: &str) {
        *self
            .upserts
            .lock()
            .unwrap()
            .entry(format!("{}:{}", kind, code))
            .or_insert(0) += 1;
    }

    fn upserts(&self) -> HashMap<String, usize> {
        self.upserts.lock().unwrap().clone()
    }
}

impl SyncRepository for CountingRepository {
    fn upsert_term(&self, code: &str, defaults: &TermDefaults) -> RepositoryResult<(Term, bool)> {
        self.bump(EntityKind::Term, code);
        self.inner.upsert_term(code, defaults)
    }

    fn upsert_major(
        &self,
        code: &str,
        defaults: &MajorDefaults,
    ) -> RepositoryResult<(Major, bool)> {
        self.bump(EntityKind::Major, code);
        self.inner.upsert_major(code, defaults)
    }

    fn upsert_course(
        &self,
        code: &str,
        defaults: &CourseDefaults,
    ) -> RepositoryResult<(Course, bool)> {
        self.bump(EntityKind::Course, code);
        self.inner.upsert_course(code, defaults)
    }

    fn upsert_student(
        &self,
        code: &str,
        defaults: &StudentDefaults,
    ) -> RepositoryResult<(Student, bool)> {
        self.bump(EntityKind::Student, code);
        self.inner.upsert_student(code, defaults)
    }

    fn upsert_teaching_plan(&self, plan: &TeachingPlan) -> RepositoryResult<bool> {
        self.inner.upsert_teaching_plan(plan)
    }

    fn upsert_teaching_class(
        &self,
        key: &TeachingClassKey,
        defaults: &TeachingClassDefaults,
    ) -> RepositoryResult<(TeachingClass, bool)> {
        self.inner.upsert_teaching_class(key, defaults)
    }

    fn replace_roster(
        &self,
        key: &TeachingClassKey,
        student_codes: &[String],
    ) -> RepositoryResult<usize> {
        self.inner.replace_roster(key, student_codes)
    }

    fn upsert_student_profile(&self, student: &Student) -> RepositoryResult<bool> {
        self.inner.upsert_student_profile(student)
    }
}

#[tokio::test]
async fn test_each_entity_written_once_per_run() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let counting = Arc::new(CountingRepository::new(open_repos(&db_path)));
    let client = standard_snapshot().client();
    let session = client.authenticate(&credentials()).await.unwrap();

    let mut engine = TraversalEngine::new(&session, counting.clone(), SyncOptions::default());
    engine.run().await.unwrap();
    let outcome = engine.into_outcome();

    let upserts = counting.upserts();
    assert!(upserts.values().all(|&n| n == 1), "重复写库: {:?}", upserts);
    // 2016000001 出现在三个名册中
    assert_eq!(upserts.get("STUDENT:2016000001"), Some(&1));
    assert_eq!(upserts.len(), 13);

    assert_eq!(outcome.cache.stats().misses, 13);
    assert!(outcome.cache.stats().hits > 0);
    assert_eq!(outcome.cache.len(), 13);
    assert!(outcome.failed_branches.is_empty());
}

#[tokio::test]
async fn test_reused_cache_skips_repository_on_second_run() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot().client();
    let mut sync = orchestrator(
        &client,
        &repos,
        SyncOptions {
            reuse_entity_cache: true,
            ..Default::default()
        },
    );

    let first = sync.run_full_sync().await.unwrap();
    assert_eq!(first.cache.misses, 13);
    assert_eq!(sync.retained_cache_len(), 13);

    let second = sync.run_full_sync().await.unwrap();
    assert_eq!(second.cache.misses, 0);
    assert!(second.cache.hits > 0);
    assert_eq!(second.counters.teaching_classes, first.counters.teaching_classes);
    assert_eq!(
        repos.teaching_class_repo.count().unwrap(),
        ExpectedCounts::TEACHING_CLASSES
    );
}

#[tokio::test]
async fn test_fresh_cache_per_run_by_default() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot().client();
    let mut sync = orchestrator(&client, &repos, SyncOptions::default());

    sync.run_full_sync().await.unwrap();
    assert_eq!(sync.retained_cache_len(), 0);

    let second = sync.run_full_sync().await.unwrap();
    assert_eq!(second.cache.misses, 13);
    assert_eq!(second.cache.updated_of(EntityKind::Term), 3);
    assert_eq!(second.cache.created_of(EntityKind::Term), 0);
}

#[tokio::test]
async fn test_disabling_reuse_drops_retained_cache() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot().client();
    let mut sync = orchestrator(
        &client,
        &repos,
        SyncOptions {
            reuse_entity_cache: true,
            ..Default::default()
        },
    );

    sync.run_full_sync().await.unwrap();
    assert!(sync.retained_cache_len() > 0);

    sync.set_options(SyncOptions::default());
    assert_eq!(sync.retained_cache_len(), 0);
}
