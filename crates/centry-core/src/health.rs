//! # Health Module
//!
//! Pure status assessment over the ledger and the mounted pages.
//!
//! Assessment is deterministic: the same inputs always produce the
//! same snapshot. Collecting the inputs (page fault states, ledger
//! counters, the month under review) is the caller's job.
//!
//! Two axes are assessed. System health says whether every page still
//! renders. The finance stage grades the ledger itself: an integer
//! score built from budget adherence, savings rate, and recorded
//! activity, bucketed into named stages.

use crate::ledger::{CategoryId, Ledger, MonthKey, TxKind};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SYSTEM HEALTH
// =============================================================================

/// Overall system condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every page renders.
    Healthy,
    /// At least one page is showing fallback content.
    Degraded,
}

impl HealthStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
        }
    }
}

/// One assessment of the running system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub accounts: usize,
    pub transactions: usize,
    pub ledger_version: u64,
    pub faulted_pages: Vec<String>,
    pub finance: StageAssessment,
}

/// Assess system health from the ledger and the faulted page names.
///
/// `month` is the month graded for budgets and savings; pass the
/// current month for live status.
#[must_use]
pub fn assess(ledger: &Ledger, month: MonthKey, mut faulted_pages: Vec<String>) -> HealthSnapshot {
    faulted_pages.sort();
    let status = if faulted_pages.is_empty() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };
    HealthSnapshot {
        status,
        accounts: ledger.account_count(),
        transactions: ledger.transaction_count(),
        ledger_version: ledger.version(),
        faulted_pages,
        finance: assess_stage(ledger, month),
    }
}

// =============================================================================
// FINANCE STAGE
// =============================================================================

/// Weight of budget adherence in the composite score.
const ADHERENCE_WEIGHT: u32 = 40;
/// Weight of the savings rate in the composite score.
const SAVINGS_WEIGHT: u32 = 40;
/// Weight of recorded activity in the composite score.
const ACTIVITY_WEIGHT: u32 = 20;
/// Months of activity that earn the full activity slice.
const FULL_ACTIVITY_MONTHS: u32 = 4;
/// Savings rate (basis points of income kept) that earns the full
/// savings slice.
const FULL_SAVINGS_BPS: i64 = 2_000;

/// Maturity of the finances as a whole, graded from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinanceStage {
    /// Little or no recorded history.
    Starting,
    /// Active ledger, weak score.
    Building,
    /// Budgets mostly held, some savings.
    Stable,
    /// Budgets held and a solid savings rate.
    Thriving,
}

impl FinanceStage {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            FinanceStage::Starting => "starting",
            FinanceStage::Building => "building",
            FinanceStage::Stable => "stable",
            FinanceStage::Thriving => "thriving",
        }
    }

    /// Bucket a composite score (0..=100) into a stage.
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        match score {
            0..=24 => FinanceStage::Starting,
            25..=49 => FinanceStage::Building,
            50..=74 => FinanceStage::Stable,
            _ => FinanceStage::Thriving,
        }
    }
}

/// The integer score sheet behind a stage.
///
/// Component values are `None` where the ledger has nothing to grade:
/// no budgets set for the month, or no income recorded in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageAssessment {
    pub stage: FinanceStage,
    /// Composite score, 0..=100.
    pub score: u32,
    /// Percent of budgeted categories kept within their limit.
    pub budget_adherence: Option<u32>,
    /// Basis points of the month's income kept (negative when spending
    /// exceeded income).
    pub savings_rate_bps: Option<i64>,
    /// Distinct months carrying at least one transaction.
    pub active_months: u32,
}

/// Grade the ledger for `month`.
///
/// All arithmetic is integer; equal ledgers always grade equally.
/// Scoring: adherence fills up to [`ADHERENCE_WEIGHT`] points (half
/// credit when no budgets exist to grade), the savings rate fills up to
/// [`SAVINGS_WEIGHT`] points at [`FULL_SAVINGS_BPS`] and above, and
/// activity fills up to [`ACTIVITY_WEIGHT`] points at
/// [`FULL_ACTIVITY_MONTHS`] months.
#[must_use]
pub fn assess_stage(ledger: &Ledger, month: MonthKey) -> StageAssessment {
    let budget_adherence = budget_adherence(ledger, month);
    let savings_rate_bps = savings_rate_bps(ledger, month);
    let active_months = active_months(ledger);

    let adherence_slice = match budget_adherence {
        Some(percent) => percent * ADHERENCE_WEIGHT / 100,
        None => ADHERENCE_WEIGHT / 2,
    };
    let savings_slice = match savings_rate_bps {
        Some(bps) => {
            (bps.clamp(0, FULL_SAVINGS_BPS) * i64::from(SAVINGS_WEIGHT) / FULL_SAVINGS_BPS) as u32
        }
        None => 0,
    };
    let activity_slice =
        active_months.min(FULL_ACTIVITY_MONTHS) * (ACTIVITY_WEIGHT / FULL_ACTIVITY_MONTHS);

    let score = adherence_slice + savings_slice + activity_slice;
    StageAssessment {
        stage: FinanceStage::from_score(score),
        score,
        budget_adherence,
        savings_rate_bps,
        active_months,
    }
}

/// Percent of `month`'s budgets whose category spending stayed within
/// the limit. `None` when the month has no budgets.
fn budget_adherence(ledger: &Ledger, month: MonthKey) -> Option<u32> {
    let mut spent_by_category: BTreeMap<CategoryId, i128> = BTreeMap::new();
    for tx in ledger.transactions_in_month(month) {
        if tx.kind == TxKind::Expense {
            if let Some(category) = tx.category {
                *spent_by_category.entry(category).or_default() +=
                    i128::from(tx.amount.cents());
            }
        }
    }

    let mut total: u32 = 0;
    let mut met: u32 = 0;
    for budget in ledger.budgets_in_month(month) {
        total += 1;
        let spent = spent_by_category
            .get(&budget.category)
            .copied()
            .unwrap_or(0);
        if spent <= i128::from(budget.limit.cents()) {
            met += 1;
        }
    }

    if total == 0 {
        None
    } else {
        Some(met * 100 / total)
    }
}

/// Basis points of `month`'s income kept after expenses. `None` when
/// the month has no income to measure against.
fn savings_rate_bps(ledger: &Ledger, month: MonthKey) -> Option<i64> {
    let mut income: i128 = 0;
    let mut spent: i128 = 0;
    for tx in ledger.transactions_in_month(month) {
        match tx.kind {
            TxKind::Income => income += i128::from(tx.amount.cents()),
            TxKind::Expense => spent += i128::from(tx.amount.cents()),
        }
    }
    if income <= 0 {
        return None;
    }
    let bps = ((income - spent) * 10_000 / income)
        .clamp(i128::from(i64::MIN), i128::from(i64::MAX));
    Some(bps as i64)
}

/// Distinct months with at least one recorded transaction.
fn active_months(ledger: &Ledger) -> u32 {
    let months: BTreeSet<MonthKey> = ledger
        .transactions()
        .map(|tx| MonthKey::from_date(tx.date))
        .collect();
    months.len() as u32
}

// =============================================================================
// TESTS
// =============================================================================
