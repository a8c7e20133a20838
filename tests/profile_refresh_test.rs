// ==========================================
// 学生档案刷新集成测试
// ==========================================
// 测试目标:
// - 档案刷新写入完整字段
// - 之后的名册同步只更新姓名/性别，不清除档案
// - 身份证号校验失败不落库
// ==========================================

mod test_helpers;

use std::sync::Arc;

use hfut_sync::domain::types::{Campus, Sex};
use hfut_sync::engine::{
    Branch, ProfileRefresher, RecordingEventPublisher, SyncError, SyncEvent, SyncEventPublisher,
    SyncOptions,
};
use hfut_sync::portal::Credentials;
use hfut_sync::repository::RepositoryError;
use test_helpers::{
    create_test_db, credentials, open_repos, orchestrator, profile_record, standard_snapshot,
    ACCOUNT, PASSWORD,
};

const ID_CARD: &str = "34010419980504002X";

#[tokio::test]
async fn test_profile_survives_roster_sync() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot()
        .profile(profile_record(ACCOUNT, ID_CARD))
        .client();

    let refresher = ProfileRefresher::new(client.clone(), Arc::new(repos.clone()));
    let student = refresher.refresh(&credentials()).await.unwrap();
    assert_eq!(student.profile.campus, Some(Campus::Hefei));

    orchestrator(&client, &repos, SyncOptions::default())
        .run_full_sync()
        .await
        .unwrap();

    let stored = repos.student_repo.find_by_code(ACCOUNT).unwrap().unwrap();
    assert_eq!(stored.name, "张三");
    assert_eq!(stored.sex, Some(Sex::Female));
    assert_eq!(stored.profile.id_card_number.as_deref(), Some(ID_CARD));
    assert_eq!(stored.profile.college.as_deref(), Some("计算机与信息学院"));
    assert!(stored.profile.can_select_courses);
}

#[tokio::test]
async fn test_refresh_after_sync_fills_existing_student() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot()
        .profile(profile_record(ACCOUNT, ID_CARD))
        .client();

    orchestrator(&client, &repos, SyncOptions::default())
        .run_full_sync()
        .await
        .unwrap();
    assert!(repos
        .student_repo
        .find_by_code(ACCOUNT)
        .unwrap()
        .unwrap()
        .profile
        .id_card_number
        .is_none());

    ProfileRefresher::new(client, Arc::new(repos.clone()))
        .refresh(&credentials())
        .await
        .unwrap();

    let stored = repos.student_repo.find_by_code(ACCOUNT).unwrap().unwrap();
    assert_eq!(stored.profile.id_card_number.as_deref(), Some(ID_CARD));
    assert_eq!(repos.student_repo.count().unwrap(), 3);
}

#[tokio::test]
async fn test_malformed_id_card_is_rejected() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot()
        .profile(profile_record(ACCOUNT, "3401041998"))
        .client();

    let err = ProfileRefresher::new(client, Arc::new(repos.clone()))
        .refresh(&credentials())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Repository(RepositoryError::FieldValueError { .. })
    ));
    assert!(repos.student_repo.find_by_code(ACCOUNT).unwrap().is_none());
}

#[tokio::test]
async fn test_missing_profile_fails_profile_branch() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot().client();

    let err = ProfileRefresher::new(client, Arc::new(repos))
        .refresh(&credentials())
        .await
        .unwrap_err();

    assert_eq!(
        err.branch(),
        Some(&Branch::Profile {
            code: ACCOUNT.to_string()
        })
    );
}

#[tokio::test]
async fn test_refresh_with_wrong_password_publishes_auth_failure() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path);
    let client = standard_snapshot()
        .profile(profile_record(ACCOUNT, ID_CARD))
        .client();
    let recorder = Arc::new(RecordingEventPublisher::new());

    let refresher = ProfileRefresher::new(client, Arc::new(repos))
        .with_publisher(recorder.clone() as Arc<dyn SyncEventPublisher>);
    let err = refresher
        .refresh(&Credentials::new(ACCOUNT, format!("{}-x", PASSWORD), Campus::Hefei))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Authentication(_)));
    assert!(matches!(
        recorder.events().as_slice(),
        [SyncEvent::AuthFailed { .. }]
    ));
}
