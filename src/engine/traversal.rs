// ==========================================
// 教务数据同步系统 - 遍历引擎
// ==========================================
// 流程（深度优先，逐个等待远端查询）:
// 1. 学期与专业: 物化代码表，枚举 (学期, 专业/选修)
// 2. 课程: 按专业/选修查询教学计划，写课程与教学计划
// 3. 教学班: 每个 (学期, 课程) 每次运行只处理一次
// 4. 名册: 写学生，整体替换教学班名册
// 约束:
// - 不重试；查询失败中止所在分支
// - fail_fast = false 时记录分支失败并继续兄弟分支
// - 认证与仓储错误始终中止整次运行
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::academic::{Course, Major, TeachingPlan, Term};
use crate::domain::student::{Student, StudentDefaults};
use crate::domain::teaching_class::{TeachingClass, TeachingClassKey};
use crate::engine::cache::EntityCache;
use crate::engine::error::{Branch, SyncError, SyncResult};
use crate::engine::report::{BranchFailure, SyncCounters};
use crate::engine::term_range::{TermMajorPairs, TraversalStep};
use crate::portal::{PlanQuery, PortalSession};
use crate::repository::SyncRepository;

/// 同步选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// 首个分支失败即中止整次运行
    pub fail_fast: bool,
    /// 同一编排器的多次运行之间保留实体缓存
    pub reuse_entity_cache: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fail_fast: true,
            reuse_entity_cache: false,
        }
    }
}

/// 一次遍历的产出
#[derive(Debug)]
pub struct TraversalOutcome {
    pub cache: EntityCache,
    pub counters: SyncCounters,
    pub failed_branches: Vec<BranchFailure>,
}

// ==========================================
// TraversalEngine
// ==========================================
pub struct TraversalEngine<'s, S: PortalSession + ?Sized> {
    session: &'s S,
    repo: Arc<dyn SyncRepository>,
    options: SyncOptions,
    cache: EntityCache,
    synced_pairs: HashSet<(String, String)>,
    counters: SyncCounters,
    failed_branches: Vec<BranchFailure>,
}

impl<'s, S: PortalSession + ?Sized> TraversalEngine<'s, S> {
    pub fn new(session: &'s S, repo: Arc<dyn SyncRepository>, options: SyncOptions) -> Self {
        Self::with_cache(session, repo, options, EntityCache::new())
    }

    /// 使用既有实体缓存（标记集合总是新建）
    pub fn with_cache(
        session: &'s S,
        repo: Arc<dyn SyncRepository>,
        options: SyncOptions,
        cache: EntityCache,
    ) -> Self {
        Self {
            session,
            repo,
            options,
            cache,
            synced_pairs: HashSet::new(),
            counters: SyncCounters::default(),
            failed_branches: Vec::new(),
        }
    }

    pub fn counters(&self) -> &SyncCounters {
        &self.counters
    }

    pub fn failed_branches(&self) -> &[BranchFailure] {
        &self.failed_branches
    }

    pub fn into_outcome(self) -> TraversalOutcome {
        TraversalOutcome {
            cache: self.cache,
            counters: self.counters,
            failed_branches: self.failed_branches,
        }
    }

    /// 全量遍历
    pub async fn run(&mut self) -> SyncResult<()> {
        info!(account = %self.session.account_code(), "开始遍历代码表");
        let codebook = self
            .session
            .list_codebook()
            .await
            .map_err(|e| SyncError::from_portal(Branch::Codebook, e))?;
        info!(
            terms = codebook.terms.len(),
            majors = codebook.majors.len(),
            "代码表获取完成"
        );

        for step in TermMajorPairs::new(&codebook) {
            let step = match step {
                Ok(step) => step,
                Err(e) => {
                    self.absorb(e)?;
                    continue;
                }
            };

            match step {
                TraversalStep::Term(record) => {
                    let term: Term = self.cache.get_or_create(
                        self.repo.as_ref(),
                        &record.code,
                        &record.defaults(),
                    )?;
                    let result = self.sync_courses(&term, None).await;
                    self.absorb_result(result)?;
                }
                TraversalStep::Major(record) => {
                    let _: Major = self.cache.get_or_create(
                        self.repo.as_ref(),
                        &record.code,
                        &record.defaults(),
                    )?;
                }
                TraversalStep::Pair { term, major } => {
                    let term: Term =
                        self.cache
                            .get_or_create(self.repo.as_ref(), &term.code, &term.defaults())?;
                    let major: Major = self.cache.get_or_create(
                        self.repo.as_ref(),
                        &major.code,
                        &major.defaults(),
                    )?;
                    let result = self.sync_courses(&term, Some(&major)).await;
                    self.absorb_result(result)?;
                }
            }
        }

        info!(
            pairs = self.counters.term_major_pairs,
            classes = self.counters.teaching_classes,
            failed = self.failed_branches.len(),
            "遍历完成"
        );
        Ok(())
    }

    // ==========================================
    // 阶段 2: 课程
    // ==========================================

    /// 同步 (学期, 专业) 的课程；专业为空时走选修计划，不写教学计划
    pub async fn sync_courses(&mut self, term: &Term, major: Option<&Major>) -> SyncResult<()> {
        let branch = Branch::term_major(&term.code, major.map(|m| m.code.as_str()));
        let query = match major {
            Some(major) => PlanQuery::Major {
                term_code: &term.code,
                major_code: &major.code,
            },
            None => PlanQuery::Elective {
                term_code: &term.code,
            },
        };
        debug!(branch = %branch, "查询教学计划");

        self.counters.term_major_pairs += 1;
        let plan = self
            .session
            .list_teaching_plan(query)
            .await
            .map_err(|e| SyncError::from_portal(branch, e))?;

        for record in &plan {
            let course: Course = self.cache.get_or_create(
                self.repo.as_ref(),
                &record.course_code,
                &record.defaults(),
            )?;

            if let Some(major) = major {
                let created = self.repo.upsert_teaching_plan(&TeachingPlan {
                    term_code: term.code.clone(),
                    course_code: course.code.clone(),
                    major_code: major.code.clone(),
                })?;
                if created {
                    self.counters.teaching_plans_created += 1;
                }
            }

            let result = self.sync_classes(&term.code, &course).await;
            self.absorb_result(result)?;
        }
        Ok(())
    }

    // ==========================================
    // 阶段 3: 教学班
    // ==========================================

    /// 同步 (学期, 课程) 的全部教学班；本次运行已处理过则跳过
    pub async fn sync_classes(&mut self, term_code: &str, course: &Course) -> SyncResult<()> {
        if !self
            .synced_pairs
            .insert((term_code.to_string(), course.code.clone()))
        {
            self.counters.skipped_duplicate_pairs += 1;
            debug!(term = term_code, course = %course.code, "教学班已同步，跳过");
            return Ok(());
        }

        let branch = Branch::term_course(term_code, &course.code);
        self.counters.term_course_pairs += 1;
        let sections = self
            .session
            .search_sections(term_code, &course.code)
            .await
            .map_err(|e| SyncError::from_portal(branch.clone(), e))?;
        debug!(
            term = term_code,
            course = %course.code,
            sections = sections.len(),
            "教学班查询完成"
        );

        for summary in &sections {
            let key = TeachingClassKey::new(term_code, &course.code, &summary.number);
            let detail = self
                .session
                .get_section_detail(&key)
                .await
                .map_err(|e| SyncError::from_portal(branch.clone(), e))?;

            let (class, _) = self
                .repo
                .upsert_teaching_class(&key, &detail.merge_with(summary))?;
            self.counters.teaching_classes += 1;

            self.sync_roster(&class).await?;
        }
        Ok(())
    }

    // ==========================================
    // 阶段 4: 名册
    // ==========================================

    /// 同步教学班名册，返回名册人数
    pub async fn sync_roster(&mut self, class: &TeachingClass) -> SyncResult<usize> {
        let branch = Branch::term_course(class.term_code(), class.course_code());
        let roster = self
            .session
            .get_section_roster(&class.key)
            .await
            .map_err(|e| SyncError::from_portal(branch, e))?;

        let mut codes = Vec::with_capacity(roster.students.len());
        for entry in &roster.students {
            let defaults = StudentDefaults::from_raw_name(&entry.raw_name);
            let student: Student =
                self.cache
                    .get_or_create(self.repo.as_ref(), &entry.code, &defaults)?;
            codes.push(student.code);
        }

        let linked = self.repo.replace_roster(&class.key, &codes)?;
        self.counters.rosters += 1;
        self.counters.roster_links += linked as u64;
        debug!(class = %class.key, students = linked, "名册同步完成");
        Ok(linked)
    }

    // ==========================================
    // 分支失败处理
    // ==========================================

    fn absorb_result(&mut self, result: SyncResult<()>) -> SyncResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => self.absorb(e),
        }
    }

    /// fail_fast = false 时吸收分支级错误，其余错误原样返回
    fn absorb(&mut self, err: SyncError) -> SyncResult<()> {
        if self.options.fail_fast || !err.is_branch_local() {
            return Err(err);
        }
        match BranchFailure::from_error(&err) {
            Some(failure) => {
                warn!(branch = %failure.branch, error = %err, "分支同步失败，继续后续分支");
                self.failed_branches.push(failure);
                Ok(())
            }
            None => Err(err),
        }
    }
}
