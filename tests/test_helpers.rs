// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供临时数据库、教务快照构造等测试支撑
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use hfut_sync::domain::types::Campus;
use hfut_sync::engine::{SyncOptions, SyncOrchestrator, SyncRepositories};
use hfut_sync::portal::{
    Credentials, MajorRecord, PlanCourseRecord, PortalSnapshot, RosterEntry,
    SectionDetail, SectionRoster, SnapshotAccount, SnapshotPlan, SnapshotPortalClient,
    SnapshotSection, StudentProfileRecord, TermRecord,
};
use tempfile::NamedTempFile;

pub const ACCOUNT: &str = "2016000001";
pub const PASSWORD: &str = "pw-2016000001";

/// 创建临时测试数据库
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// 打开测试数据库上的全部仓储
pub fn open_repos(db_path: &str) -> SyncRepositories {
    SyncRepositories::open(db_path).expect("Failed to open repositories")
}

pub fn credentials() -> Credentials {
    Credentials::new(ACCOUNT, PASSWORD, Campus::Hefei)
}

pub fn orchestrator(
    client: &Arc<SnapshotPortalClient>,
    repos: &SyncRepositories,
    options: SyncOptions,
) -> SyncOrchestrator<SnapshotPortalClient> {
    SyncOrchestrator::new(client.clone(), repos.clone(), credentials(), options)
}

// ==========================================
// 快照构造器
// ==========================================
#[derive(Default)]
pub struct SnapshotBuilder {
    snapshot: PortalSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        let mut builder = Self::default();
        builder.snapshot.accounts.push(SnapshotAccount {
            code: ACCOUNT.to_string(),
            password: PASSWORD.to_string(),
        });
        builder
    }

    pub fn term(mut self, code: &str, name: &str) -> Self {
        self.snapshot.codebook.terms.push(TermRecord {
            code: code.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn major(mut self, code: &str, name: &str) -> Self {
        self.snapshot.codebook.majors.push(MajorRecord {
            code: code.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// 专业教学计划
    pub fn plan(mut self, term_code: &str, major_code: &str, courses: &[&str]) -> Self {
        self.snapshot.teaching_plans.push(SnapshotPlan {
            term_code: term_code.to_string(),
            major_code: Some(major_code.to_string()),
            courses: courses.iter().map(|c| course(c)).collect(),
        });
        self
    }

    /// 选修计划
    pub fn elective(mut self, term_code: &str, courses: &[&str]) -> Self {
        self.snapshot.teaching_plans.push(SnapshotPlan {
            term_code: term_code.to_string(),
            major_code: None,
            courses: courses.iter().map(|c| course(c)).collect(),
        });
        self
    }

    /// 教学班，名册为 (学号, 原始姓名)
    pub fn section(
        mut self,
        term_code: &str,
        course_code: &str,
        number: &str,
        roster: &[(&str, &str)],
    ) -> Self {
        self.snapshot.sections.push(SnapshotSection {
            term_code: term_code.to_string(),
            course_code: course_code.to_string(),
            number: number.to_string(),
            capacity: Some(60),
            detail: Some(detail()),
            roster: Some(SectionRoster {
                term_name: None,
                class_name: None,
                students: roster
                    .iter()
                    .map(|(code, raw_name)| RosterEntry {
                        code: code.to_string(),
                        raw_name: raw_name.to_string(),
                    })
                    .collect(),
            }),
        });
        self
    }

    pub fn profile(mut self, record: StudentProfileRecord) -> Self {
        self.snapshot.profiles.push(record);
        self
    }

    pub fn build(self) -> PortalSnapshot {
        self.snapshot
    }

    pub fn client(self) -> Arc<SnapshotPortalClient> {
        Arc::new(SnapshotPortalClient::new(self.build()))
    }
}

pub fn course(code: &str) -> PlanCourseRecord {
    PlanCourseRecord {
        course_code: code.to_string(),
        course_name: format!("课程{}", code),
        credit: 3.0,
        hours: 48,
        department: "计算机与信息学院".to_string(),
    }
}

pub fn detail() -> SectionDetail {
    SectionDetail {
        course_type: "必修".to_string(),
        exam_type: "考试".to_string(),
        campus: "屯溪路校区".to_string(),
        weeks: Some("1-16".to_string()),
        time_and_place: Some("周一 1-2节 三教301".to_string()),
        ..Default::default()
    }
}

pub fn profile_record(code: &str, id_card_number: &str) -> StudentProfileRecord {
    StudentProfileRecord {
        code: code.to_string(),
        name: "张三".to_string(),
        sex_label: "女".to_string(),
        birthday: Some("1998-05-04".to_string()),
        id_card_number: Some(id_card_number.to_string()),
        college: Some("计算机与信息学院".to_string()),
        can_select_label: "能".to_string(),
        ..Default::default()
    }
}

/// 标准场景
///
/// - 学期 029/030/031；专业 080901、080902（均为 2016 级，范围 29..=31）
/// - 029 学期两个专业共用课程 C1
/// - 029 学期选修课 C5
pub fn standard_snapshot() -> SnapshotBuilder {
    SnapshotBuilder::new()
        .term("029", "2016-2017学年第一学期")
        .term("030", "2016-2017学年第二学期")
        .term("031", "2017-2018学年第一学期")
        .major("080901", "2016计算机科学与技术")
        .major("080902", "2016软件工程")
        .plan("029", "080901", &["C1", "C2"])
        .plan("029", "080902", &["C1", "C3"])
        .plan("030", "080901", &["C4"])
        .elective("029", &["C5"])
        .section("029", "C1", "0001", &[("2016000001", "张三*"), ("2016000002", "李四")])
        .section("029", "C1", "0002", &[("2016000003", "王五")])
        .section(
            "029",
            "C2",
            "0001",
            &[("2016000001", "张三*"), ("2016000003", "王五")],
        )
        .section("029", "C3", "0001", &[("2016000002", "李四")])
        .section("030", "C4", "0001", &[("2016000001", "张三*")])
        .section("029", "C5", "0001", &[("2016000002", "李四")])
}

/// 标准场景下的期望行数
pub struct ExpectedCounts;

impl ExpectedCounts {
    pub const TERMS: usize = 3;
    pub const MAJORS: usize = 2;
    pub const COURSES: usize = 5;
    pub const TEACHING_PLANS: i64 = 5;
    pub const TEACHING_CLASSES: i64 = 6;
    pub const STUDENTS: i64 = 3;
}

/// 当前库中各表行数
pub fn table_counts(repos: &SyncRepositories) -> (usize, usize, usize, i64, i64, i64) {
    (
        repos.term_repo.list_all().unwrap().len(),
        repos.major_repo.list_all().unwrap().len(),
        repos.course_repo.list_all().unwrap().len(),
        repos.teaching_plan_repo.count().unwrap(),
        repos.teaching_class_repo.count().unwrap(),
        repos.student_repo.count().unwrap(),
    )
}
