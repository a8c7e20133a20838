// ==========================================
// 教务数据同步系统 - 实体缓存
// ==========================================
// 职责: 按 (实体种类, 代码) 缓存已写入的学期/专业/课程/学生
// 约束:
// - 缓存生命周期内，每个 (种类, 代码) 至多写库一次
// - 命中时直接返回，不访问仓储
// - 单一所有者（&mut self），无并发控制
// ==========================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::academic::{Course, CourseDefaults, Major, MajorDefaults, Term, TermDefaults};
use crate::domain::student::{Student, StudentDefaults};
use crate::domain::types::EntityKind;
use crate::repository::{RepositoryResult, SyncRepository};

/// 可缓存实体
pub trait CachedEntity: Clone + Sized {
    type Defaults;

    const KIND: EntityKind;

    /// 缓存未命中时的写库操作
    fn upsert(
        repo: &dyn SyncRepository,
        code: &str,
        defaults: &Self::Defaults,
    ) -> RepositoryResult<(Self, bool)>;

    fn slot(maps: &EntityMaps) -> &HashMap<String, Self>;

    fn slot_mut(maps: &mut EntityMaps) -> &mut HashMap<String, Self>;
}

/// 各实体种类的缓存表
#[derive(Debug, Default)]
pub struct EntityMaps {
    terms: HashMap<String, Term>,
    majors: HashMap<String, Major>,
    courses: HashMap<String, Course>,
    students: HashMap<String, Student>,
}

impl EntityMaps {
    fn len(&self) -> usize {
        self.terms.len() + self.majors.len() + self.courses.len() + self.students.len()
    }
}

/// 缓存统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub created: HashMap<EntityKind, u64>,
    pub updated: HashMap<EntityKind, u64>,
}

impl CacheStats {
    pub fn created_of(&self, kind: EntityKind) -> u64 {
        self.created.get(&kind).copied().unwrap_or(0)
    }

    pub fn updated_of(&self, kind: EntityKind) -> u64 {
        self.updated.get(&kind).copied().unwrap_or(0)
    }
}

// ==========================================
// EntityCache
// ==========================================
#[derive(Debug, Default)]
pub struct EntityCache {
    maps: EntityMaps,
    stats: CacheStats,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 命中返回缓存实体；未命中则写库并缓存结果
    pub fn get_or_create<E: CachedEntity>(
        &mut self,
        repo: &dyn SyncRepository,
        code: &str,
        defaults: &E::Defaults,
    ) -> RepositoryResult<E> {
        if let Some(entity) = E::slot(&self.maps).get(code) {
            self.stats.hits += 1;
            trace!(kind = %E::KIND, code, "缓存命中");
            return Ok(entity.clone());
        }

        self.stats.misses += 1;
        let (entity, created) = E::upsert(repo, code, defaults)?;
        let counter = if created {
            &mut self.stats.created
        } else {
            &mut self.stats.updated
        };
        *counter.entry(E::KIND).or_insert(0) += 1;

        E::slot_mut(&mut self.maps).insert(code.to_string(), entity.clone());
        Ok(entity)
    }

    pub fn get<E: CachedEntity>(&self, code: &str) -> Option<&E> {
        E::slot(&self.maps).get(code)
    }

    pub fn contains<E: CachedEntity>(&self, code: &str) -> bool {
        E::slot(&self.maps).contains_key(code)
    }

    /// 已缓存实体总数
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// 清零统计，保留缓存内容（跨运行复用缓存时使用）
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }
}

// ==========================================
// CachedEntity 实现
// ==========================================
impl CachedEntity for Term {
    type Defaults = TermDefaults;
    const KIND: EntityKind = EntityKind::Term;

    fn upsert(
        repo: &dyn SyncRepository,
        code: &str,
        defaults: &TermDefaults,
    ) -> RepositoryResult<(Self, bool)> {
        repo.upsert_term(code, defaults)
    }

    fn slot(maps: &EntityMaps) -> &HashMap<String, Self> {
        &maps.terms
    }

    fn slot_mut(maps: &mut EntityMaps) -> &mut HashMap<String, Self> {
        &mut maps.terms
    }
}

impl CachedEntity for Major {
    type Defaults = MajorDefaults;
    const KIND: EntityKind = EntityKind::Major;

    fn upsert(
        repo: &dyn SyncRepository,
        code: &str,
        defaults: &MajorDefaults,
    ) -> RepositoryResult<(Self, bool)> {
        repo.upsert_major(code, defaults)
    }

    fn slot(maps: &EntityMaps) -> &HashMap<String, Self> {
        &maps.majors
    }

    fn slot_mut(maps: &mut EntityMaps) -> &mut HashMap<String, Self> {
        &mut maps.majors
    }
}

impl CachedEntity for Course {
    type Defaults = CourseDefaults;
    const KIND: EntityKind = EntityKind::Course;

    fn upsert(
        repo: &dyn SyncRepository,
        code: &str,
        defaults: &CourseDefaults,
    ) -> RepositoryResult<(Self, bool)> {
        repo.upsert_course(code, defaults)
    }

    fn slot(maps: &EntityMaps) -> &HashMap<String, Self> {
        &maps.courses
    }

    fn slot_mut(maps: &mut EntityMaps) -> &mut HashMap<String, Self> {
        &mut maps.courses
    }
}

impl CachedEntity for Student {
    type Defaults = StudentDefaults;
    const KIND: EntityKind = EntityKind::Student;

    fn upsert(
        repo: &dyn SyncRepository,
        code: &str,
        defaults: &StudentDefaults,
    ) -> RepositoryResult<(Self, bool)> {
        repo.upsert_student(code, defaults)
    }

    fn slot(maps: &EntityMaps) -> &HashMap<String, Self> {
        &maps.students
    }

    fn slot_mut(maps: &mut EntityMaps) -> &mut HashMap<String, Self> {
        &mut maps.students
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_shared;
    use crate::engine::repositories::SyncRepositories;

    #[test]
    fn test_second_lookup_hits_without_write() {
        let repos = SyncRepositories::from_connection(open_in_memory_shared().unwrap()).unwrap();
        let mut cache = EntityCache::new();
        let defaults = TermDefaults {
            name: "2016-2017学年第一学期".to_string(),
        };

        let first: Term = cache.get_or_create(&repos, "029", &defaults).unwrap();
        // 命中时即使默认值不同也不覆盖
        let second: Term = cache
            .get_or_create(
                &repos,
                "029",
                &TermDefaults {
                    name: "改名".to_string(),
                },
            )
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().created_of(EntityKind::Term), 1);
        assert!(cache.contains::<Term>("029"));
        assert!(!cache.contains::<Major>("029"));
    }

    #[test]
    fn test_reset_stats_keeps_entries() {
        let repos = SyncRepositories::from_connection(open_in_memory_shared().unwrap()).unwrap();
        let mut cache = EntityCache::new();
        let _: Major = cache
            .get_or_create(
                &repos,
                "080901",
                &MajorDefaults {
                    name: "2016计算机科学与技术".to_string(),
                },
            )
            .unwrap();

        cache.reset_stats();
        assert_eq!(cache.stats(), &CacheStats::default());
        assert_eq!(cache.len(), 1);
    }
}
