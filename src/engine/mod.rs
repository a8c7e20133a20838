// ==========================================
// 教务数据同步系统 - 引擎层
// ==========================================
// 职责: 实体缓存、遍历引擎、同步编排、档案刷新
// 红线: Engine 不拼 SQL，只通过 SyncRepository 写库
// ==========================================

pub mod cache;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod profile;
pub mod report;
pub mod repositories;
pub mod term_range;
pub mod traversal;

// 重导出核心引擎
pub use cache::{CacheStats, CachedEntity, EntityCache};
pub use error::{Branch, SyncError, SyncResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, RecordingEventPublisher, SyncEvent,
    SyncEventPublisher,
};
pub use orchestrator::SyncOrchestrator;
pub use profile::{student_from_profile, ProfileRefresher};
pub use report::{BranchFailure, SyncCounters, SyncReport};
pub use repositories::SyncRepositories;
pub use term_range::{term_range, TermMajorPairs, TraversalStep};
pub use traversal::{SyncOptions, TraversalEngine, TraversalOutcome};
