// ==========================================
// 教务数据同步系统 - 引擎层事件发布
// ==========================================
// 职责: 定义同步事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，调用方（CLI、上层服务）实现订阅者
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

use crate::domain::types::{Campus, SyncRunStatus};

// ==========================================
// 同步事件类型
// ==========================================

/// 同步事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// 登录成功
    AuthSucceeded { account_code: String, campus: Campus },
    /// 登录失败
    AuthFailed { account_code: String, reason: String },
    /// 全量同步结束（成功、部分成功或中止）
    RunCompleted {
        run_id: String,
        status: SyncRunStatus,
        failed_branches: usize,
    },
}

impl SyncEvent {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            SyncEvent::AuthSucceeded { .. } => "AuthSucceeded",
            SyncEvent::AuthFailed { .. } => "AuthFailed",
            SyncEvent::RunCompleted { .. } => "RunCompleted",
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 同步事件发布者 Trait
///
/// # 返回
/// - `Ok(id)`: 订阅方分配的标识（如果支持）或空字符串
/// - `Err`: 发布失败（调用方只记录日志，不影响同步结果）
pub trait SyncEventPublisher: Send + Sync {
    fn publish(&self, event: SyncEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl SyncEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: SyncEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!("NoOpEventPublisher: 跳过事件发布 - event={}", event.as_str());
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn SyncEventPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn SyncEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn SyncEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）；失败只记录告警
    pub fn publish(&self, event: SyncEvent) {
        match &self.inner {
            Some(publisher) => {
                let name = event.as_str().to_string();
                if let Err(e) = publisher.publish(event) {
                    tracing::warn!(event = %name, error = %e, "事件发布失败");
                }
            }
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - event={}",
                    event.as_str()
                );
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

/// 记录全部事件的发布者（测试与 CLI 汇总使用）
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: std::sync::Mutex<Vec<SyncEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl SyncEventPublisher for RecordingEventPublisher {
    fn publish(&self, event: SyncEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| format!("事件记录锁获取失败: {}", e))?;
        events.push(event);
        Ok(events.len().to_string())
    }
}
