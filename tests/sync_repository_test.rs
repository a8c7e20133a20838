// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 文件数据库上的 upsert、名册替换、成绩与运行记录
// ==========================================

mod test_helpers;

use chrono::Utc;
use hfut_sync::domain::academic::{CourseDefaults, TermDefaults};
use hfut_sync::domain::student::StudentDefaults;
use hfut_sync::domain::teaching_class::{TeachingClassDefaults, TeachingClassKey};
use hfut_sync::domain::types::SyncRunStatus;
use hfut_sync::domain::{Grade, SyncRun};
use hfut_sync::repository::{RepositoryError, SyncRepository};
use test_helpers::{create_test_db, open_repos};

fn seed_class(repos: &hfut_sync::engine::SyncRepositories) -> TeachingClassKey {
    repos
        .upsert_term(
            "029",
            &TermDefaults {
                name: "2016-2017学年第一学期".to_string(),
            },
        )
        .unwrap();
    repos
        .upsert_course(
            "C1",
            &CourseDefaults {
                name: "高等数学".to_string(),
                credit: 5.0,
                hours: 80,
                department: "数学学院".to_string(),
            },
        )
        .unwrap();
    let key = TeachingClassKey::new("029", "C1", "0001");
    repos
        .upsert_teaching_class(&key, &TeachingClassDefaults::default())
        .unwrap();
    for (code, raw) in [("2016000001", "张三*"), ("2016000002", "李四")] {
        repos
            .upsert_student(code, &StudentDefaults::from_raw_name(raw))
            .unwrap();
    }
    key
}

#[test]
fn test_term_upsert_overwrites_name() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);

    let (_, created) = repos
        .upsert_term("029", &TermDefaults { name: "旧名称".to_string() })
        .unwrap();
    assert!(created);
    let (term, created) = repos
        .upsert_term("029", &TermDefaults { name: "新名称".to_string() })
        .unwrap();
    assert!(!created);
    assert_eq!(term.name, "新名称");
    assert_eq!(repos.term_repo.list_all().unwrap().len(), 1);
}

#[test]
fn test_replace_roster_is_full_replacement() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let key = seed_class(&repos);

    let linked = repos
        .replace_roster(&key, &["2016000001".to_string(), "2016000002".to_string()])
        .unwrap();
    assert_eq!(linked, 2);

    repos
        .replace_roster(&key, &["2016000002".to_string()])
        .unwrap();
    assert_eq!(
        repos.teaching_class_repo.list_roster(&key).unwrap(),
        vec!["2016000002".to_string()]
    );

    repos.replace_roster(&key, &[]).unwrap();
    assert!(repos.teaching_class_repo.list_roster(&key).unwrap().is_empty());
    assert_eq!(repos.student_repo.count().unwrap(), 2);
}

#[test]
fn test_roster_with_unknown_student_rolls_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let key = seed_class(&repos);
    repos
        .replace_roster(&key, &["2016000001".to_string()])
        .unwrap();

    let result = repos.replace_roster(&key, &["2016000002".to_string(), "9999".to_string()]);
    assert!(matches!(
        result,
        Err(RepositoryError::ForeignKeyViolation(_))
    ));
    // 事务回滚，原名册保留
    assert_eq!(
        repos.teaching_class_repo.list_roster(&key).unwrap(),
        vec!["2016000001".to_string()]
    );
}

#[test]
fn test_grade_upsert_and_lookup() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let key = seed_class(&repos);

    let mut grade = Grade {
        teaching_class: key.clone(),
        student_code: "2016000001".to_string(),
        grade: "58".to_string(),
        makeup_grade: None,
    };
    assert!(repos.grade_repo.upsert(&grade).unwrap());

    grade.makeup_grade = Some("75".to_string());
    assert!(!repos.grade_repo.upsert(&grade).unwrap());

    let grades = repos.grade_repo.find_by_student("2016000001").unwrap();
    assert_eq!(grades, vec![grade]);
    assert!(repos.grade_repo.find_by_student("2016000002").unwrap().is_empty());
}

#[test]
fn test_sync_run_lifecycle() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);

    let started_at = Utc::now().naive_utc();
    repos
        .sync_run_repo
        .insert(&SyncRun::start(
            "run-1".to_string(),
            "2016000001".to_string(),
            started_at,
        ))
        .unwrap();
    let running = repos.sync_run_repo.find_by_id("run-1").unwrap().unwrap();
    assert_eq!(running.status, SyncRunStatus::Running);
    assert!(running.finished_at.is_none());

    repos
        .sync_run_repo
        .finish(
            "run-1",
            Utc::now().naive_utc(),
            SyncRunStatus::Partial,
            Some("{}"),
            Some("[]"),
            None,
        )
        .unwrap();
    let finished = repos.sync_run_repo.find_by_id("run-1").unwrap().unwrap();
    assert_eq!(finished.status, SyncRunStatus::Partial);
    assert_eq!(finished.counters_json.as_deref(), Some("{}"));
    assert!(finished.finished_at.is_some());
}
