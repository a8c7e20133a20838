// ==========================================
// 教务数据同步系统 - 教务系统客户端接口
// ==========================================
// 职责: 定义登录与查询接口（不包含实现）
// 约束:
// - 只有登录成功才能拿到会话，查询接口只挂在会话上
// - 返回值在客户端边界完成校验
// 实现者: portal::SnapshotPortalClient（离线 JSON 快照）
// ==========================================

use async_trait::async_trait;

use crate::domain::teaching_class::TeachingClassKey;
use crate::domain::types::Campus;
use crate::portal::error::PortalResult;
use crate::portal::records::{
    Codebook, Credentials, PlanCourseRecord, PlanQuery, SectionDetail, SectionRoster,
    SectionSummary, StudentProfileRecord,
};

/// 教务系统客户端
#[async_trait]
pub trait PortalClient: Send + Sync {
    type Session: PortalSession;

    /// 登录，凭据错误返回 `PortalError::Authentication`
    async fn authenticate(&self, credentials: &Credentials) -> PortalResult<Self::Session>;
}

/// 已登录会话
#[async_trait]
pub trait PortalSession: Send + Sync {
    fn account_code(&self) -> &str;

    fn campus(&self) -> Campus;

    async fn list_codebook(&self) -> PortalResult<Codebook>;

    async fn list_teaching_plan(&self, query: PlanQuery<'_>)
        -> PortalResult<Vec<PlanCourseRecord>>;

    async fn search_sections(
        &self,
        term_code: &str,
        course_code: &str,
    ) -> PortalResult<Vec<SectionSummary>>;

    async fn get_section_detail(&self, key: &TeachingClassKey) -> PortalResult<SectionDetail>;

    async fn get_section_roster(&self, key: &TeachingClassKey) -> PortalResult<SectionRoster>;

    /// 当前登录学生的个人信息
    async fn get_my_profile(&self) -> PortalResult<StudentProfileRecord>;
}
