//! # Reports Module
//!
//! Pure report assembly over a ledger snapshot.
//!
//! Builders take `&Ledger` and return plain data; nothing here mutates
//! state or performs IO. Output ordering follows the ledger's BTreeMap
//! iteration, so the same ledger always produces the same report.
//! `to_text` is the single text serialization point, shared by the CLI
//! and the log output.

use crate::ledger::{AccountId, AccountKind, CategoryId, Ledger, MonthKey, TxKind};
use crate::money::Money;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Label used for spending that has no category.
pub const UNCATEGORIZED: &str = "(uncategorized)";

// =============================================================================
// REPORT KINDS
// =============================================================================

/// The reports the system can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    NetWorth,
    Spending,
    Budgets,
}

impl ReportKind {
    /// Every kind, in display order.
    pub const ALL: [ReportKind; 3] = [ReportKind::NetWorth, ReportKind::Spending, ReportKind::Budgets];

    /// Stable kebab-case label, also the parse form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ReportKind::NetWorth => "net-worth",
            ReportKind::Spending => "spending",
            ReportKind::Budgets => "budgets",
        }
    }
}

/// Parse failure for report kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown report kind: {0}")]
pub struct UnknownReportKind(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReportKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "net-worth" => Ok(ReportKind::NetWorth),
            "spending" => Ok(ReportKind::Spending),
            "budgets" => Ok(ReportKind::Budgets),
            other => Err(UnknownReportKind(other.to_owned())),
        }
    }
}

// =============================================================================
// REPORT SHAPES
// =============================================================================

/// One account's balance line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Money,
}

/// Balance per account plus the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetWorthReport {
    pub accounts: Vec<AccountBalance>,
    pub total: Money,
}

/// Expense total for one category in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpend {
    pub category: Option<CategoryId>,
    pub name: String,
    pub spent: Money,
}

/// Monthly expenses grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpendingReport {
    pub month: String,
    pub categories: Vec<CategorySpend>,
    pub total: Money,
}

/// One budget line: limit against actual spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetRow {
    pub category: CategoryId,
    pub name: String,
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    pub over: bool,
}

/// Budget performance for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetReport {
    pub month: String,
    pub rows: Vec<BudgetRow>,
}

/// Any report, for uniform dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    NetWorth(NetWorthReport),
    Spending(SpendingReport),
    Budgets(BudgetReport),
}

impl Report {
    /// Render the report as plain text.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Report::NetWorth(report) => {
                let mut out = String::from("NET WORTH\n");
                for line in &report.accounts {
                    out.push_str(&format!(
                        "  {} ({}): {}\n",
                        line.name, line.kind, line.balance
                    ));
                }
                out.push_str(&format!("TOTAL: {}\n", report.total));
                out
            }
            Report::Spending(report) => {
                let mut out = format!("SPENDING {}\n", report.month);
                for line in &report.categories {
                    out.push_str(&format!("  {}: {}\n", line.name, line.spent));
                }
                out.push_str(&format!("TOTAL: {}\n", report.total));
                out
            }
            Report::Budgets(report) => {
                let mut out = format!("BUDGETS {}\n", report.month);
                if report.rows.is_empty() {
                    out.push_str("  (no budgets set)\n");
                }
                for row in &report.rows {
                    if row.over {
                        let over_by = row.spent.saturating_sub(row.limit);
                        out.push_str(&format!(
                            "  {}: spent {} of {} (OVER by {})\n",
                            row.name, row.spent, row.limit, over_by
                        ));
                    } else {
                        out.push_str(&format!(
                            "  {}: spent {} of {} ({} left)\n",
                            row.name, row.spent, row.limit, row.remaining
                        ));
                    }
                }
                out
            }
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Build one report by kind.
///
/// `month` scopes the spending and budget reports; net worth covers the
/// whole ledger and ignores it.
#[must_use]
pub fn build_report(ledger: &Ledger, kind: ReportKind, month: MonthKey) -> Report {
    match kind {
        ReportKind::NetWorth => Report::NetWorth(net_worth_report(ledger)),
        ReportKind::Spending => Report::Spending(spending_report(ledger, month)),
        ReportKind::Budgets => Report::Budgets(budget_report(ledger, month)),
    }
}

/// Per-account balances and their sum.
#[must_use]
pub fn net_worth_report(ledger: &Ledger) -> NetWorthReport {
    let mut accounts = Vec::with_capacity(ledger.account_count());
    for account in ledger.accounts() {
        let balance = ledger
            .account_balance(account.id)
            .unwrap_or(account.opening_balance);
        accounts.push(AccountBalance {
            id: account.id,
            name: account.name.clone(),
            kind: account.kind,
            balance,
        });
    }
    NetWorthReport {
        accounts,
        total: ledger.net_worth(),
    }
}

/// Monthly expenses grouped by category, uncategorized last.
#[must_use]
pub fn spending_report(ledger: &Ledger, month: MonthKey) -> SpendingReport {
    let mut by_category: BTreeMap<Option<CategoryId>, Money> = BTreeMap::new();
    let mut total = Money::ZERO;
    for tx in ledger.transactions_in_month(month) {
        if tx.kind != TxKind::Expense {
            continue;
        }
        let slot = by_category.entry(tx.category).or_insert(Money::ZERO);
        *slot = slot.saturating_add(tx.amount);
        total = total.saturating_add(tx.amount);
    }

    // BTreeMap puts the None (uncategorized) bucket first; report it last.
    let mut categories = Vec::with_capacity(by_category.len());
    let uncategorized = by_category.remove(&None);
    for (category, spent) in by_category {
        let name = category
            .and_then(|id| ledger.category(id))
            .map_or_else(|| UNCATEGORIZED.to_owned(), |c| c.name.clone());
        categories.push(CategorySpend {
            category,
            name,
            spent,
        });
    }
    if let Some(spent) = uncategorized {
        categories.push(CategorySpend {
            category: None,
            name: UNCATEGORIZED.to_owned(),
            spent,
        });
    }

    SpendingReport {
        month: month.to_string(),
        categories,
        total,
    }
}

/// Budget limits against actual monthly spending.
#[must_use]
pub fn budget_report(ledger: &Ledger, month: MonthKey) -> BudgetReport {
    let mut rows = Vec::new();
    for budget in ledger.budgets_in_month(month) {
        let spent = ledger
            .transactions_in_month(month)
            .filter(|tx| tx.kind == TxKind::Expense && tx.category == Some(budget.category))
            .fold(Money::ZERO, |acc, tx| acc.saturating_add(tx.amount));
        let name = ledger
            .category(budget.category)
            .map_or_else(|| format!("category {}", budget.category), |c| c.name.clone());
        rows.push(BudgetRow {
            category: budget.category,
            name,
            limit: budget.limit,
            spent,
            remaining: budget.limit.saturating_sub(spent),
            over: spent > budget.limit,
        });
    }
    BudgetReport {
        month: month.to_string(),
        rows,
    }
}

// =============================================================================
// TESTS
// =============================================================================
