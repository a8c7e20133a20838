// ==========================================
// 教务数据同步系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 将教务系统的学期/专业/课程/教学班/名册同步到本地库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 教务系统客户端层 - 登录与查询
pub mod portal;

// 引擎层 - 缓存、遍历、编排
pub mod engine;

// 配置层 - 同步配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Campus, EntityKind, Sex, SyncRunStatus};

// 领域实体
pub use domain::{
    Course, Grade, Major, Student, StudentProfile, SyncRun, TeachingClass, TeachingClassKey,
    TeachingPlan, Term,
};

// 引擎
pub use engine::{
    EntityCache, ProfileRefresher, SyncError, SyncOptions, SyncOrchestrator, SyncReport,
    SyncRepositories, TraversalEngine,
};

// 教务系统客户端
pub use portal::{Credentials, PortalClient, PortalError, PortalSession, SnapshotPortalClient};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "教务数据同步系统";
