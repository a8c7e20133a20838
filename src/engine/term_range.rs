// ==========================================
// 教务数据同步系统 - 学期范围与 (学期, 专业) 枚举
// ==========================================
// 规则:
// - 入学年份 Y 的专业，起始学期序号 = (Y-2001)*2-1，不小于 1
// - 结束学期序号 = min(起始 + 7, 已知最大学期序号)
// - 范围为空不是错误
// 输出顺序:
// 1. 每个学期的 (学期, 无专业)，按代码表顺序
// 2. 每个专业按列表顺序，其范围内学期按序号升序
// ==========================================

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::warn;

use crate::domain::academic::{parse_admission_year, parse_term_number};
use crate::engine::error::{Branch, SyncError, SyncResult};
use crate::portal::{Codebook, MajorRecord, PortalError, TermRecord};

/// 学期序号基准年
pub const BASE_ADMISSION_YEAR: i64 = 2001;

/// 一届学生覆盖的学期数（起始学期之后再 7 个）
pub const TERMS_PER_COHORT_SPAN: i64 = 7;

/// 计算入学年份对应的学期序号范围
pub fn term_range(admission_year: i32, max_term_number: u32) -> RangeInclusive<u32> {
    let first = (i64::from(admission_year) - BASE_ADMISSION_YEAR) * 2 - 1;
    // 上界取自未截断的起始学期；早于基准年的专业可能得到空范围
    let end = (first + TERMS_PER_COHORT_SPAN).min(i64::from(max_term_number));
    let start = u32::try_from(first.max(1)).unwrap_or(u32::MAX);
    let end = u32::try_from(end.max(0)).unwrap_or(u32::MAX);
    start..=end
}

/// 枚举步骤
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraversalStep<'a> {
    /// (学期, 无专业)：物化学期并走选修分支
    Term(&'a TermRecord),
    /// 物化专业（范围为空时也会产出）
    Major(&'a MajorRecord),
    /// (学期, 专业)
    Pair {
        term: &'a TermRecord,
        major: &'a MajorRecord,
    },
}

/// 代码表上的惰性 (学期, 专业) 枚举器
pub struct TermMajorPairs<'a> {
    codebook: &'a Codebook,
    by_number: HashMap<u32, &'a TermRecord>,
    max_term_number: u32,
    term_idx: usize,
    major_idx: usize,
    pending: Option<(&'a MajorRecord, RangeInclusive<u32>)>,
}

impl<'a> TermMajorPairs<'a> {
    pub fn new(codebook: &'a Codebook) -> Self {
        let mut by_number = HashMap::new();
        for term in &codebook.terms {
            if let Some(number) = parse_term_number(&term.code) {
                by_number.entry(number).or_insert(term);
            }
        }
        Self {
            codebook,
            by_number,
            max_term_number: codebook.max_term_number().unwrap_or(0),
            term_idx: 0,
            major_idx: 0,
            pending: None,
        }
    }

    fn next_pending_pair(&mut self) -> Option<TraversalStep<'a>> {
        let (major, range) = self.pending.as_mut()?;
        let major = *major;
        for number in range.by_ref() {
            match self.by_number.get(&number) {
                Some(&term) => return Some(TraversalStep::Pair { term, major }),
                None => warn!(
                    major = %major.code,
                    term_number = number,
                    "范围内学期不在代码表中，跳过"
                ),
            }
        }
        self.pending = None;
        None
    }
}

impl<'a> Iterator for TermMajorPairs<'a> {
    type Item = SyncResult<TraversalStep<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(term) = self.codebook.terms.get(self.term_idx) {
            self.term_idx += 1;
            return Some(Ok(TraversalStep::Term(term)));
        }

        if let Some(step) = self.next_pending_pair() {
            return Some(Ok(step));
        }

        let major = self.codebook.majors.get(self.major_idx)?;
        self.major_idx += 1;

        match parse_admission_year(&major.name) {
            Some(year) => {
                self.pending = Some((major, term_range(year, self.max_term_number)));
                Some(Ok(TraversalStep::Major(major)))
            }
            None => Some(Err(SyncError::RemoteQuery {
                branch: Branch::Major {
                    major_code: major.code.clone(),
                },
                source: PortalError::malformed(
                    "major",
                    format!("专业名称缺少入学年份前缀: {}", major.name),
                ),
            })),
        }
    }
}
