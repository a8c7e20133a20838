// ==========================================
// 教务数据同步系统 - 同步运行记录
// ==========================================
// 对齐: schema sync_run 表
// 用途: 记录每次全量同步的状态、计数与失败分支，便于重跑定位
// ==========================================

use crate::domain::types::SyncRunStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub run_id: String,       // UUID v4
    pub account_code: String, // 同步所用学号
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub status: SyncRunStatus,
    pub counters_json: Option<String>,        // SyncCounters 序列化
    pub failed_branches_json: Option<String>, // Vec<BranchFailure> 序列化
    pub error_message: Option<String>,
}

impl SyncRun {
    /// 创建运行中的记录
    pub fn start(run_id: String, account_code: String, started_at: NaiveDateTime) -> Self {
        Self {
            run_id,
            account_code,
            started_at,
            finished_at: None,
            status: SyncRunStatus::Running,
            counters_json: None,
            failed_branches_json: None,
            error_message: None,
        }
    }
}
