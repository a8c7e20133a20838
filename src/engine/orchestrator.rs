// ==========================================
// 教务数据同步系统 - 同步编排器
// ==========================================
// 用途: 协调一次全量同步
// 流程:
// 1. 登记 sync_run（RUNNING）
// 2. 登录；失败发布 AuthFailed 并中止
// 3. 新建遍历引擎（新标记集合；实体缓存按选项新建或复用）
// 4. 深度优先遍历，无并行
// 5. 登记结束状态、计数与失败分支，发布 RunCompleted
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SyncConfigReader;
use crate::domain::sync_run::SyncRun;
use crate::domain::types::SyncRunStatus;
use crate::engine::cache::EntityCache;
use crate::engine::error::{SyncError, SyncResult};
use crate::engine::events::{OptionalEventPublisher, SyncEvent, SyncEventPublisher};
use crate::engine::report::{status_for, BranchFailure, SyncReport};
use crate::engine::repositories::SyncRepositories;
use crate::engine::traversal::{SyncOptions, TraversalEngine};
use crate::portal::{Credentials, PortalClient, PortalSession};
use crate::repository::SyncRepository;

// ==========================================
// SyncOrchestrator - 同步编排器
// ==========================================
pub struct SyncOrchestrator<P>
where
    P: PortalClient,
{
    client: Arc<P>,
    repos: SyncRepositories,
    credentials: Credentials,
    options: SyncOptions,
    publisher: OptionalEventPublisher,
    retained_cache: Option<EntityCache>,
}

impl<P> SyncOrchestrator<P>
where
    P: PortalClient,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - client: 教务系统客户端
    /// - repos: 仓储集合
    /// - credentials: 同步账号
    /// - options: 遍历选项
    pub fn new(
        client: Arc<P>,
        repos: SyncRepositories,
        credentials: Credentials,
        options: SyncOptions,
    ) -> Self {
        Self {
            client,
            repos,
            credentials,
            options,
            publisher: OptionalEventPublisher::none(),
            retained_cache: None,
        }
    }

    /// 从配置读取账号与选项创建编排器
    pub async fn from_config<C>(client: Arc<P>, repos: SyncRepositories, config: &C) -> SyncResult<Self>
    where
        C: SyncConfigReader + ?Sized,
    {
        let settings = config
            .get_sync_settings()
            .await
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let code = settings
            .account_code
            .ok_or_else(|| SyncError::Config("未配置同步账号 sync.account_code".to_string()))?;
        let password = settings.account_password.ok_or_else(|| {
            SyncError::Config("未配置同步密码 sync.account_password".to_string())
        })?;

        Ok(Self::new(
            client,
            repos,
            Credentials::new(code, password, settings.campus),
            SyncOptions {
                fail_fast: settings.fail_fast,
                reuse_entity_cache: settings.reuse_entity_cache,
            },
        ))
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn SyncEventPublisher>) -> Self {
        self.publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    pub fn set_options(&mut self, options: SyncOptions) {
        self.options = options;
        if !options.reuse_entity_cache {
            self.retained_cache = None;
        }
    }

    /// 保留的实体缓存条目数（未复用缓存时为 0）
    pub fn retained_cache_len(&self) -> usize {
        self.retained_cache.as_ref().map_or(0, EntityCache::len)
    }

    /// 执行一次全量同步
    pub async fn run_full_sync(&mut self) -> SyncResult<SyncReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now().naive_utc();
        let account_code = self.credentials.code.clone();

        info!(run_id = %run_id, account = %account_code, "开始全量同步");
        self.repos.sync_run_repo.insert(&SyncRun::start(
            run_id.clone(),
            account_code.clone(),
            started_at,
        ))?;

        // ==========================================
        // 登录
        // ==========================================
        let session = match self.client.authenticate(&self.credentials).await {
            Ok(session) => session,
            Err(e) => {
                error!(account = %account_code, error = %e, "登录失败，中止同步");
                self.publisher.publish(SyncEvent::AuthFailed {
                    account_code: account_code.clone(),
                    reason: e.to_string(),
                });
                let err = SyncError::Authentication(e);
                self.finish_failed(&run_id, &err, Vec::new());
                return Err(err);
            }
        };
        self.publisher.publish(SyncEvent::AuthSucceeded {
            account_code: session.account_code().to_string(),
            campus: session.campus(),
        });

        // ==========================================
        // 遍历
        // ==========================================
        let cache = self.take_cache();
        let repo: Arc<dyn SyncRepository> = Arc::new(self.repos.clone());
        let mut engine = TraversalEngine::with_cache(&session, repo, self.options, cache);
        let result = engine.run().await;
        let outcome = engine.into_outcome();

        let cache_stats = outcome.cache.stats().clone();
        if self.options.reuse_entity_cache {
            self.retained_cache = Some(outcome.cache);
        }
        let mut failed_branches = outcome.failed_branches;

        if let Err(err) = result {
            if let Some(failure) = BranchFailure::from_error(&err) {
                failed_branches.push(failure);
            }
            error!(run_id = %run_id, error = %err, "全量同步中止");
            self.finish_failed(&run_id, &err, failed_branches);
            return Err(err);
        }

        // ==========================================
        // 登记结果
        // ==========================================
        let status = status_for(&failed_branches);
        let finished_at = Utc::now().naive_utc();
        let counters_json = serde_json::to_string(&outcome.counters)
            .map_err(|e| SyncError::Other(e.into()))?;
        let failed_json = serde_json::to_string(&failed_branches)
            .map_err(|e| SyncError::Other(e.into()))?;
        self.repos.sync_run_repo.finish(
            &run_id,
            finished_at,
            status,
            Some(&counters_json),
            Some(&failed_json),
            None,
        )?;

        self.publisher.publish(SyncEvent::RunCompleted {
            run_id: run_id.clone(),
            status,
            failed_branches: failed_branches.len(),
        });
        info!(
            run_id = %run_id,
            status = %status,
            classes = outcome.counters.teaching_classes,
            cache_hits = cache_stats.hits,
            cache_misses = cache_stats.misses,
            failed = failed_branches.len(),
            "全量同步完成"
        );

        Ok(SyncReport {
            run_id,
            account_code,
            status,
            started_at,
            finished_at,
            counters: outcome.counters,
            cache: cache_stats,
            failed_branches,
        })
    }

    /// 取出本次运行使用的实体缓存
    fn take_cache(&mut self) -> EntityCache {
        match (self.options.reuse_entity_cache, self.retained_cache.take()) {
            (true, Some(mut cache)) => {
                info!(entries = cache.len(), "复用上次运行的实体缓存");
                cache.reset_stats();
                cache
            }
            _ => EntityCache::new(),
        }
    }

    /// 登记中止状态；登记失败只记录告警，保留原始错误
    fn finish_failed(&self, run_id: &str, err: &SyncError, failed_branches: Vec<BranchFailure>) {
        let failed_json = serde_json::to_string(&failed_branches).ok();
        if let Err(e) = self.repos.sync_run_repo.finish(
            run_id,
            Utc::now().naive_utc(),
            SyncRunStatus::Failed,
            None,
            failed_json.as_deref(),
            Some(&err.to_string()),
        ) {
            warn!(run_id, error = %e, "登记同步中止状态失败");
        }
        self.publisher.publish(SyncEvent::RunCompleted {
            run_id: run_id.to_string(),
            status: SyncRunStatus::Failed,
            failed_branches: failed_branches.len(),
        });
    }
}
