// ==========================================
// 教务数据同步系统 - 离线快照客户端
// ==========================================
// 职责: 从 JSON 快照应答教务系统查询（CLI 与测试使用）
// 说明:
// - 记录每次查询，便于核对去重效果
// - 可注入指定查询失败，模拟远端故障
// - 快照中缺少的教学班详情/名册视为远端查询失败
// - 缺少的教学计划视为空计划
// ==========================================

use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::teaching_class::TeachingClassKey;
use crate::domain::types::Campus;
use crate::portal::client::{PortalClient, PortalSession};
use crate::portal::error::{PortalError, PortalResult};
use crate::portal::records::{
    Codebook, Credentials, PlanCourseRecord, PlanQuery, PortalQuery, SectionDetail,
    SectionRoster, SectionSummary, StudentProfileRecord, Validate,
};

// ==========================================
// 快照文件结构
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAccount {
    pub code: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPlan {
    pub term_code: String,
    #[serde(default)]
    pub major_code: Option<String>, // None 表示选修计划
    pub courses: Vec<PlanCourseRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSection {
    pub term_code: String,
    pub course_code: String,
    pub number: String,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub detail: Option<SectionDetail>,
    #[serde(default)]
    pub roster: Option<SectionRoster>,
}

impl SnapshotSection {
    pub fn key(&self) -> TeachingClassKey {
        TeachingClassKey::new(&self.term_code, &self.course_code, &self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortalSnapshot {
    #[serde(default)]
    pub accounts: Vec<SnapshotAccount>,
    #[serde(default)]
    pub codebook: Codebook,
    #[serde(default)]
    pub teaching_plans: Vec<SnapshotPlan>,
    #[serde(default)]
    pub sections: Vec<SnapshotSection>,
    #[serde(default)]
    pub profiles: Vec<StudentProfileRecord>,
}

impl PortalSnapshot {
    pub fn from_json(json: &str) -> PortalResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn find_plan(&self, query: &PlanQuery<'_>) -> Option<&SnapshotPlan> {
        self.teaching_plans.iter().find(|p| {
            p.term_code == query.term_code() && p.major_code.as_deref() == query.major_code()
        })
    }

    fn find_section(&self, key: &TeachingClassKey) -> Option<&SnapshotSection> {
        self.sections.iter().find(|s| {
            s.term_code == key.term_code && s.course_code == key.course_code && s.number == key.number
        })
    }
}

// ==========================================
// 共享状态（客户端与其签发的会话共用）
// ==========================================
#[derive(Default)]
struct SnapshotState {
    snapshot: RwLock<PortalSnapshot>,
    calls: Mutex<Vec<PortalQuery>>,
    failing: Mutex<Vec<PortalQuery>>,
}

impl SnapshotState {
    fn record(&self, query: &PortalQuery) -> PortalResult<()> {
        debug!(query = %query, "快照查询");
        self.calls
            .lock()
            .map_err(|e| PortalError::Snapshot(format!("调用记录锁获取失败: {}", e)))?
            .push(query.clone());

        let failing = self
            .failing
            .lock()
            .map_err(|e| PortalError::Snapshot(format!("故障注入锁获取失败: {}", e)))?;
        if failing.contains(query) {
            return Err(PortalError::RemoteQuery {
                query: query.clone(),
                message: "注入的远端故障".to_string(),
            });
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&PortalSnapshot) -> T) -> PortalResult<T> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|e| PortalError::Snapshot(format!("快照锁获取失败: {}", e)))?;
        Ok(f(&snapshot))
    }
}

fn missing(query: PortalQuery, what: &str) -> PortalError {
    PortalError::RemoteQuery {
        query,
        message: format!("快照中不存在{}", what),
    }
}

// ==========================================
// SnapshotPortalClient
// ==========================================
#[derive(Clone)]
pub struct SnapshotPortalClient {
    state: Arc<SnapshotState>,
}

impl SnapshotPortalClient {
    pub fn new(snapshot: PortalSnapshot) -> Self {
        Self {
            state: Arc::new(SnapshotState {
                snapshot: RwLock::new(snapshot),
                ..Default::default()
            }),
        }
    }

    /// 从 JSON 文件加载快照
    pub fn from_file(path: impl AsRef<Path>) -> PortalResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let snapshot = PortalSnapshot::from_json(&json)?;
        info!(
            path = %path.display(),
            terms = snapshot.codebook.terms.len(),
            majors = snapshot.codebook.majors.len(),
            sections = snapshot.sections.len(),
            "快照加载完成"
        );
        Ok(Self::new(snapshot))
    }

    /// 至今发出的全部查询（按顺序）
    pub fn calls(&self) -> Vec<PortalQuery> {
        self.state
            .calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// 统计满足条件的查询次数
    pub fn count_calls(&self, pred: impl Fn(&PortalQuery) -> bool) -> usize {
        self.calls().iter().filter(|q| pred(q)).count()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.state.calls.lock() {
            calls.clear();
        }
    }

    /// 替换快照内容（模拟远端数据变化）
    pub fn update_snapshot(&self, f: impl FnOnce(&mut PortalSnapshot)) -> PortalResult<()> {
        let mut snapshot = self
            .state
            .snapshot
            .write()
            .map_err(|e| PortalError::Snapshot(format!("快照锁获取失败: {}", e)))?;
        f(&mut snapshot);
        Ok(())
    }

    /// 令指定查询返回远端故障
    pub fn fail_on(&self, query: PortalQuery) -> PortalResult<()> {
        self.state
            .failing
            .lock()
            .map_err(|e| PortalError::Snapshot(format!("故障注入锁获取失败: {}", e)))?
            .push(query);
        Ok(())
    }
}

#[async_trait]
impl PortalClient for SnapshotPortalClient {
    type Session = SnapshotSession;

    async fn authenticate(&self, credentials: &Credentials) -> PortalResult<SnapshotSession> {
        self.state.record(&PortalQuery::Authenticate {
            code: credentials.code.clone(),
        })?;

        let accepted = self.state.read(|s| {
            s.accounts
                .iter()
                .any(|a| a.code == credentials.code && a.password == credentials.password)
        })?;
        if !accepted {
            return Err(PortalError::Authentication {
                code: credentials.code.clone(),
                reason: "学号或密码错误".to_string(),
            });
        }

        Ok(SnapshotSession {
            account_code: credentials.code.clone(),
            campus: credentials.campus,
            state: Arc::clone(&self.state),
        })
    }
}

// ==========================================
// SnapshotSession
// ==========================================
pub struct SnapshotSession {
    account_code: String,
    campus: Campus,
    state: Arc<SnapshotState>,
}

#[async_trait]
impl PortalSession for SnapshotSession {
    fn account_code(&self) -> &str {
        &self.account_code
    }

    fn campus(&self) -> Campus {
        self.campus
    }

    async fn list_codebook(&self) -> PortalResult<Codebook> {
        self.state.record(&PortalQuery::Codebook)?;
        let codebook = self.state.read(|s| s.codebook.clone())?;
        codebook.validate()?;
        Ok(codebook)
    }

    async fn list_teaching_plan(
        &self,
        query: PlanQuery<'_>,
    ) -> PortalResult<Vec<PlanCourseRecord>> {
        self.state.record(&query.to_query())?;
        let courses = self
            .state
            .read(|s| s.find_plan(&query).map(|p| p.courses.clone()))?
            .unwrap_or_default();
        for course in &courses {
            course.validate()?;
        }
        Ok(courses)
    }

    async fn search_sections(
        &self,
        term_code: &str,
        course_code: &str,
    ) -> PortalResult<Vec<SectionSummary>> {
        self.state.record(&PortalQuery::SearchSections {
            term_code: term_code.to_string(),
            course_code: course_code.to_string(),
        })?;
        let sections = self.state.read(|s| {
            s.sections
                .iter()
                .filter(|sec| sec.term_code == term_code && sec.course_code == course_code)
                .map(|sec| SectionSummary {
                    number: sec.number.clone(),
                    capacity: sec.capacity,
                })
                .collect::<Vec<_>>()
        })?;
        for section in &sections {
            section.validate()?;
        }
        Ok(sections)
    }

    async fn get_section_detail(&self, key: &TeachingClassKey) -> PortalResult<SectionDetail> {
        let query = PortalQuery::SectionDetail { key: key.clone() };
        self.state.record(&query)?;
        let detail = self
            .state
            .read(|s| s.find_section(key).and_then(|sec| sec.detail.clone()))?
            .ok_or_else(|| missing(query, "教学班详情"))?;
        detail.validate()?;
        Ok(detail)
    }

    async fn get_section_roster(&self, key: &TeachingClassKey) -> PortalResult<SectionRoster> {
        let query = PortalQuery::SectionRoster { key: key.clone() };
        self.state.record(&query)?;
        let roster = self
            .state
            .read(|s| s.find_section(key).and_then(|sec| sec.roster.clone()))?
            .ok_or_else(|| missing(query, "教学班名册"))?;
        roster.validate()?;
        Ok(roster)
    }

    async fn get_my_profile(&self) -> PortalResult<StudentProfileRecord> {
        self.state.record(&PortalQuery::MyProfile)?;
        let profile = self
            .state
            .read(|s| {
                s.profiles
                    .iter()
                    .find(|p| p.code == self.account_code)
                    .cloned()
            })?
            .ok_or_else(|| missing(PortalQuery::MyProfile, "个人信息"))?;
        profile.validate()?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::records::TermRecord;

    fn snapshot() -> PortalSnapshot {
        PortalSnapshot {
            accounts: vec![SnapshotAccount {
                code: "2016000001".to_string(),
                password: "pw".to_string(),
            }],
            codebook: Codebook {
                terms: vec![TermRecord {
                    code: "029".to_string(),
                    name: "2016-2017学年第一学期".to_string(),
                }],
                majors: vec![],
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_wrong_password_is_authentication_error() {
        let client = SnapshotPortalClient::new(snapshot());
        let err = client
            .authenticate(&Credentials::new("2016000001", "bad", Campus::Hefei))
            .await
            .err()
            .unwrap();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_missing_plan_is_empty_and_missing_detail_is_remote_error() {
        let client = SnapshotPortalClient::new(snapshot());
        let session = client
            .authenticate(&Credentials::new("2016000001", "pw", Campus::Hefei))
            .await
            .unwrap();

        let plan = session
            .list_teaching_plan(PlanQuery::Elective { term_code: "029" })
            .await
            .unwrap();
        assert!(plan.is_empty());

        let err = session
            .get_section_detail(&TeachingClassKey::new("029", "X", "0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::RemoteQuery { .. }));
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let client = SnapshotPortalClient::new(snapshot());
        client.fail_on(PortalQuery::Codebook).unwrap();
        let session = client
            .authenticate(&Credentials::new("2016000001", "pw", Campus::Hefei))
            .await
            .unwrap();
        assert!(session.list_codebook().await.is_err());
    }
}
