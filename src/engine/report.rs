// ==========================================
// 教务数据同步系统 - 同步报告
// ==========================================
// 用途: 汇总一次全量同步的计数、缓存命中与失败分支
// 持久化: counters / failed_branches 序列化为 JSON 写入 sync_run
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{EntityKind, SyncRunStatus};
use crate::engine::cache::CacheStats;
use crate::engine::error::{Branch, SyncError};

/// 遍历计数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncCounters {
    pub term_major_pairs: u64,        // 已处理 (学期, 专业/选修) 分支
    pub term_course_pairs: u64,       // 已处理 (学期, 课程) 分支
    pub skipped_duplicate_pairs: u64, // 本次运行中重复的 (学期, 课程)
    pub teaching_plans_created: u64,
    pub teaching_classes: u64,
    pub rosters: u64,
    pub roster_links: u64, // 名册关联总条数
}

/// 失败分支
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchFailure {
    pub branch: Branch,
    pub message: String,
}

impl BranchFailure {
    pub fn from_error(err: &SyncError) -> Option<Self> {
        err.branch().map(|branch| Self {
            branch: branch.clone(),
            message: err.to_string(),
        })
    }
}

/// 全量同步报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: String,
    pub account_code: String,
    pub status: SyncRunStatus,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub counters: SyncCounters,
    pub cache: CacheStats,
    pub failed_branches: Vec<BranchFailure>,
}

impl SyncReport {
    /// 本次运行新建的某类实体数
    pub fn created(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::TeachingPlan => self.counters.teaching_plans_created,
            _ => self.cache.created_of(kind),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_branches.is_empty()
    }
}

/// 根据失败分支判定运行状态
pub fn status_for(failed_branches: &[BranchFailure]) -> SyncRunStatus {
    if failed_branches.is_empty() {
        SyncRunStatus::Succeeded
    } else {
        SyncRunStatus::Partial
    }
}
