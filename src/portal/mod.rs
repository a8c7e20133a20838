// ==========================================
// 教务数据同步系统 - 教务系统客户端层
// ==========================================
// 职责: 登录、查询接口与强类型返回记录
// 红线: 引擎通过 trait 访问教务系统，不依赖具体传输方式
// ==========================================

pub mod client;
pub mod error;
pub mod records;
pub mod snapshot;

pub use client::{PortalClient, PortalSession};
pub use error::{PortalError, PortalResult};
pub use records::{
    Codebook, Credentials, MajorRecord, PlanCourseRecord, PlanQuery, PortalQuery, RosterEntry,
    SectionDetail, SectionRoster, SectionSummary, StudentProfileRecord, TermRecord, Validate,
};
pub use snapshot::{
    PortalSnapshot, SnapshotAccount, SnapshotPlan, SnapshotPortalClient, SnapshotSection,
    SnapshotSession,
};
