//! # Widgets Module
//!
//! Finance components rendered inside page boundaries.
//!
//! Widgets hold snapshot data taken from the ledger up front, so
//! rendering itself never touches shared state. Amounts come
//! preformatted through [`Money`]'s display form.

use crate::component::{Component, RenderCtx, RenderResult};
use crate::health::StageAssessment;
use crate::ledger::{Ledger, TxKind};
use crate::money::Money;
use crate::reports::{BudgetReport, NetWorthReport, SpendingReport, UNCATEGORIZED};
use crate::view::{el, Element, View};

// =============================================================================
// TABLE HELPERS
// =============================================================================

fn table(headers: &[&str], body_rows: Vec<Element>) -> Element {
    let mut head_row = el("tr");
    for header in headers {
        head_row = head_row.child(el("th").text(*header));
    }
    let mut body = el("tbody");
    for row in body_rows {
        body = body.child(row);
    }
    el("table")
        .child(el("thead").child(head_row))
        .child(body)
}

fn cells(values: &[&str]) -> Element {
    let mut row = el("tr");
    for value in values {
        row = row.child(el("td").text(*value));
    }
    row
}

// =============================================================================
// NET WORTH CARD
// =============================================================================

/// Total balance plus a per-account breakdown.
#[derive(Debug, Clone)]
pub struct NetWorthCard {
    pub report: NetWorthReport,
}

impl Component for NetWorthCard {
    fn name(&self) -> &str {
        "NetWorthCard"
    }

    fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
        let mut list = el("ul").class("accounts");
        for line in &self.report.accounts {
            list = list.child(el("li").text(format!(
                "{} ({}): {}",
                line.name, line.kind, line.balance
            )));
        }
        Ok(el("section")
            .class("card net-worth")
            .child(el("h3").text("Net Worth"))
            .child(el("p").class("total").text(self.report.total.to_string()))
            .child(list)
            .into())
    }
}

// =============================================================================
// STAGE CARD
// =============================================================================

/// Finance stage badge with the score sheet behind it.
#[derive(Debug, Clone)]
pub struct StageCard {
    pub assessment: StageAssessment,
}

impl StageCard {
    fn savings_line(&self) -> String {
        match self.assessment.savings_rate_bps {
            Some(bps) => {
                // Sign printed separately so -0.50% keeps its minus.
                let sign = if bps < 0 { "-" } else { "" };
                let abs = bps.abs();
                format!("savings rate: {sign}{}.{:02}%", abs / 100, abs % 100)
            }
            None => "savings rate: no income this month".to_owned(),
        }
    }

    fn budgets_line(&self) -> String {
        match self.assessment.budget_adherence {
            Some(percent) => format!("budgets held: {percent}%"),
            None => "budgets held: none set".to_owned(),
        }
    }
}

impl Component for StageCard {
    fn name(&self) -> &str {
        "StageCard"
    }

    fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
        let stage = self.assessment.stage.label();
        let sheet = el("ul")
            .class("score-sheet")
            .child(el("li").text(self.budgets_line()))
            .child(el("li").text(self.savings_line()))
            .child(el("li").text(format!(
                "active months: {}",
                self.assessment.active_months
            )));
        Ok(el("section")
            .class(format!("card stage stage-{stage}"))
            .child(el("h3").text("Financial Health"))
            .child(el("p").class("stage-label").text(stage))
            .child(
                el("p")
                    .class("score")
                    .text(format!("{}/100", self.assessment.score)),
            )
            .child(sheet)
            .into())
    }
}

// =============================================================================
// ACCOUNTS TABLE
// =============================================================================

/// Full account listing with kinds and balances.
#[derive(Debug, Clone)]
pub struct AccountsTable {
    pub report: NetWorthReport,
}

impl Component for AccountsTable {
    fn name(&self) -> &str {
        "AccountsTable"
    }

    fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
        if self.report.accounts.is_empty() {
            return Ok(el("p").class("empty").text("(no accounts)").into());
        }
        let rows = self
            .report
            .accounts
            .iter()
            .map(|line| cells(&[&line.name, &line.kind.to_string(), &line.balance.to_string()]))
            .collect();
        Ok(el("section")
            .class("card accounts")
            .child(el("h3").text("Accounts"))
            .child(table(&["Account", "Kind", "Balance"], rows))
            .child(
                el("p")
                    .class("total")
                    .text(format!("Net worth: {}", self.report.total)),
            )
            .into())
    }
}

// =============================================================================
// SPENDING TABLE
// =============================================================================

/// Monthly spending per category.
#[derive(Debug, Clone)]
pub struct SpendingTable {
    pub report: SpendingReport,
}

impl Component for SpendingTable {
    fn name(&self) -> &str {
        "SpendingTable"
    }

    fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
        if self.report.categories.is_empty() {
            return Ok(el("p")
                .class("empty")
                .text(format!("(no spending in {})", self.report.month))
                .into());
        }
        let rows = self
            .report
            .categories
            .iter()
            .map(|line| cells(&[&line.name, &line.spent.to_string()]))
            .collect();
        Ok(el("section")
            .class("card spending")
            .child(el("h3").text(format!("Spending {}", self.report.month)))
            .child(table(&["Category", "Spent"], rows))
            .child(
                el("p")
                    .class("total")
                    .text(format!("Total: {}", self.report.total)),
            )
            .into())
    }
}

// =============================================================================
// BUDGETS TABLE
// =============================================================================

/// Budget limits against actual spending.
#[derive(Debug, Clone)]
pub struct BudgetsTable {
    pub report: BudgetReport,
}

impl Component for BudgetsTable {
    fn name(&self) -> &str {
        "BudgetsTable"
    }

    fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
        if self.report.rows.is_empty() {
            return Ok(el("p").class("empty").text("(no budgets set)").into());
        }
        let rows = self
            .report
            .rows
            .iter()
            .map(|row| {
                let status = if row.over { "over budget" } else { "on track" };
                cells(&[
                    &row.name,
                    &row.spent.to_string(),
                    &row.limit.to_string(),
                    &row.remaining.to_string(),
                    status,
                ])
            })
            .collect();
        Ok(el("section")
            .class("card budgets")
            .child(el("h3").text(format!("Budgets {}", self.report.month)))
            .child(table(
                &["Category", "Spent", "Limit", "Remaining", "Status"],
                rows,
            ))
            .into())
    }
}

// =============================================================================
// TRANSACTIONS TABLE
// =============================================================================

/// One display row of the transaction listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub date: String,
    pub account: String,
    pub category: String,
    pub memo: String,
    pub amount: Money,
}

/// Snapshot the ledger's transactions into display rows, newest id
/// first.
#[must_use]
pub fn transaction_rows(ledger: &Ledger) -> Vec<TransactionRow> {
    let mut rows: Vec<TransactionRow> = ledger
        .transactions()
        .map(|tx| {
            let account = ledger
                .account(tx.account)
                .map_or_else(|| tx.account.to_string(), |a| a.name.clone());
            let category = tx
                .category
                .and_then(|id| ledger.category(id))
                .map_or_else(|| UNCATEGORIZED.to_owned(), |c| c.name.clone());
            TransactionRow {
                date: tx.date.to_string(),
                account,
                category,
                memo: tx.memo.clone(),
                amount: tx.signed_amount(),
            }
        })
        .collect();
    rows.reverse();
    rows
}

/// Recorded transactions, most recent first.
#[derive(Debug, Clone)]
pub struct TransactionsTable {
    pub rows: Vec<TransactionRow>,
}

impl Component for TransactionsTable {
    fn name(&self) -> &str {
        "TransactionsTable"
    }

    fn render(&mut self, _ctx: &mut RenderCtx) -> RenderResult {
        if self.rows.is_empty() {
            return Ok(el("p").class("empty").text("(no transactions)").into());
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                cells(&[
                    &row.date,
                    &row.account,
                    &row.category,
                    &row.memo,
                    &row.amount.to_string(),
                ])
            })
            .collect();
        Ok(el("section")
            .class("card transactions")
            .child(el("h3").text("Transactions"))
            .child(table(
                &["Date", "Account", "Category", "Memo", "Amount"],
                rows,
            ))
            .into())
    }
}

// =============================================================================
// TESTS
// =============================================================================
