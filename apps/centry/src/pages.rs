//! # Pages
//!
//! Long-lived page trees served over HTTP.
//!
//! Each page owns an [`ErrorBoundary`] at its root. A widget fault
//! renders that page's fallback and leaves every other page untouched,
//! and the fault sticks across requests until a reset arrives at the
//! page's reset endpoint. Re-rendering with fresh children is not
//! enough to clear it.
//!
//! Loader components hold a handle to the shared ledger and take their
//! data snapshot during render, so a fault while loading lands inside
//! the boundary like any other render fault.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use centry_core::health::assess_stage;
use centry_core::reports::{budget_report, net_worth_report, spending_report};
use centry_core::view::el;
use centry_core::widgets::{
    transaction_rows, AccountsTable, BudgetsTable, NetWorthCard, SpendingTable, StageCard,
    TransactionsTable,
};
use centry_core::{
    Child, Component, ErrorBoundary, Fallback, Ledger, MonthKey, RenderCtx, RenderResult,
    RouteFallback, View,
};

// =============================================================================
// SHARED STATE HELPERS
// =============================================================================

/// The ledger as shared by the server, the pages, and the CLI `serve`
/// path.
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Lock a mutex, recovering the value from a poisoned lock.
///
/// A widget can panic while holding the ledger lock. Render never
/// mutates the ledger, so the value behind a poisoned lock is still the
/// last consistent snapshot.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The month the server is currently in, by local time.
#[must_use]
pub fn current_month() -> MonthKey {
    MonthKey::from_date(chrono::Local::now().date_naive())
}

// =============================================================================
// PAGE LOADERS
// =============================================================================

struct DashboardLoader {
    ledger: SharedLedger,
}

impl Component for DashboardLoader {
    fn name(&self) -> &str {
        "DashboardPage"
    }

    fn render(&mut self, ctx: &mut RenderCtx) -> RenderResult {
        let month = current_month();
        let (net_worth, spending, assessment) = {
            let ledger = lock_unpoisoned(&self.ledger);
            (
                net_worth_report(&ledger),
                spending_report(&ledger, month),
                assess_stage(&ledger, month),
            )
        };
        let card = ctx.render(&mut NetWorthCard { report: net_worth })?;
        let stage = ctx.render(&mut StageCard { assessment })?;
        let table = ctx.render(&mut SpendingTable { report: spending })?;
        Ok(View::fragment(vec![card, stage, table]))
    }
}

struct AccountsLoader {
    ledger: SharedLedger,
}

impl Component for AccountsLoader {
    fn name(&self) -> &str {
        "AccountsPage"
    }

    fn render(&mut self, ctx: &mut RenderCtx) -> RenderResult {
        let report = {
            let ledger = lock_unpoisoned(&self.ledger);
            net_worth_report(&ledger)
        };
        ctx.render(&mut AccountsTable { report })
    }
}

struct TransactionsLoader {
    ledger: SharedLedger,
}

impl Component for TransactionsLoader {
    fn name(&self) -> &str {
        "TransactionsPage"
    }

    fn render(&mut self, ctx: &mut RenderCtx) -> RenderResult {
        let rows = {
            let ledger = lock_unpoisoned(&self.ledger);
            transaction_rows(&ledger)
        };
        ctx.render(&mut TransactionsTable { rows })
    }
}

struct BudgetsLoader {
    ledger: SharedLedger,
}

impl Component for BudgetsLoader {
    fn name(&self) -> &str {
        "BudgetsPage"
    }

    fn render(&mut self, ctx: &mut RenderCtx) -> RenderResult {
        let report = {
            let ledger = lock_unpoisoned(&self.ledger);
            budget_report(&ledger, current_month())
        };
        ctx.render(&mut BudgetsTable { report })
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// One mounted page: a stable route plus its boundary-rooted tree.
pub struct Page {
    slug: String,
    path: String,
    title: String,
    boundary: ErrorBoundary,
}

impl Page {
    /// A page mounted at `/{slug}` with the given fallback behavior.
    ///
    /// The boundary's reset action points at the page's own reset
    /// endpoint, so the default fallback offers "Try again" and posts
    /// back to exactly this page.
    #[must_use]
    pub fn new(slug: impl Into<String>, title: impl Into<String>, fallback: Fallback) -> Self {
        let slug = slug.into();
        let boundary = ErrorBoundary::new()
            .with_fallback(fallback)
            .with_reset_action(format!("/pages/{slug}/reset"));
        Self {
            path: format!("/{slug}"),
            slug,
            title: title.into(),
            boundary,
        }
    }

    /// Append a child to the page's boundary.
    #[must_use]
    pub fn with_child(mut self, child: Child) -> Self {
        self.boundary.push_child(child);
        self
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// True while the boundary is showing its fallback.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.boundary.is_faulted()
    }

    /// Clear the fault and return to rendering children.
    pub fn reset(&mut self) {
        self.boundary.reset();
    }

    /// Direct access to the boundary, for diagnostics and tests.
    pub fn boundary_mut(&mut self) -> &mut ErrorBoundary {
        &mut self.boundary
    }

    /// Render the page body and wrap it in the site chrome.
    pub fn render_html(&mut self) -> String {
        let mut ctx = RenderCtx::new();
        let body = self.boundary.render(&mut ctx);
        let document = layout(&self.title, body);
        format!("<!doctype html>\n{}", document.to_html())
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("slug", &self.slug)
            .field("faulted", &self.is_faulted())
            .finish_non_exhaustive()
    }
}

const NAV_LINKS: [(&str, &str); 4] = [
    ("/dashboard", "Dashboard"),
    ("/accounts", "Accounts"),
    ("/transactions", "Transactions"),
    ("/budgets", "Budgets"),
];

/// Site chrome around a rendered page body.
fn layout(title: &str, body: View) -> View {
    let mut nav = el("nav");
    for (href, label) in NAV_LINKS {
        nav = nav.child(el("a").attr("href", href).text(label));
    }
    el("html")
        .attr("lang", "en")
        .child(
            el("head")
                .child(el("meta").attr("charset", "utf-8"))
                .child(el("title").text(format!("{title} - Centry"))),
        )
        .child(
            el("body")
                .child(el("header").child(el("h1").text("Centry")).child(nav))
                .child(el("main").child(body)),
        )
        .into()
}

// =============================================================================
// PAGE REGISTRY
// =============================================================================

/// All mounted pages, keyed by slug.
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: BTreeMap<String, Page>,
}

impl PageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount the stock pages against a shared ledger.
    #[must_use]
    pub fn mount_default(ledger: &SharedLedger) -> Self {
        let mut registry = Self::new();
        registry.insert(
            Page::new("dashboard", "Dashboard", Fallback::Default).with_child(Child::component(
                DashboardLoader {
                    ledger: Arc::clone(ledger),
                },
            )),
        );
        registry.insert(
            Page::new("accounts", "Accounts", RouteFallback::new().into_fallback()).with_child(
                Child::component(AccountsLoader {
                    ledger: Arc::clone(ledger),
                }),
            ),
        );
        registry.insert(
            Page::new(
                "transactions",
                "Transactions",
                RouteFallback::new().with_back_button().into_fallback(),
            )
            .with_child(Child::component(TransactionsLoader {
                ledger: Arc::clone(ledger),
            })),
        );
        registry.insert(
            Page::new("budgets", "Budgets", RouteFallback::new().into_fallback()).with_child(
                Child::component(BudgetsLoader {
                    ledger: Arc::clone(ledger),
                }),
            ),
        );
        registry
    }

    /// Add or replace a page under its slug.
    pub fn insert(&mut self, page: Page) {
        self.pages.insert(page.slug().to_owned(), page);
    }

    #[must_use]
    pub fn get_mut(&mut self, slug: &str) -> Option<&mut Page> {
        self.pages.get_mut(slug)
    }

    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        self.pages.contains_key(slug)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Slugs of pages currently showing their fallback.
    #[must_use]
    pub fn faulted_slugs(&self) -> Vec<String> {
        self.pages
            .values()
            .filter(|page| page.is_faulted())
            .map(|page| page.slug.clone())
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
