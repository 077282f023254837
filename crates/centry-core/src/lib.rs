//! # Centry Core
//!
//! Deterministic core of the Centry personal finance tracker.
//!
//! Everything here computes without IO: the rendering model with its
//! error boundaries, the ledger domain, report assembly, and the
//! persistence formats. The binary crate (`apps/centry`) wires these
//! into a CLI and an HTTP server.
//!
//! Rules carried throughout:
//! - No floating point; money is integer cents.
//! - BTreeMap collections only, so iteration and output are
//!   deterministic.
//! - Render faults travel as `Result`s (with panics trapped at the
//!   same point) and stop at the nearest error boundary.

pub mod adapter;
pub mod boundary;
pub mod cache;
pub mod component;
pub mod fallback;
pub mod formats;
pub mod health;
pub mod ledger;
pub mod money;
pub mod reports;
pub mod storage;
pub mod view;
pub mod widgets;

/// Hard bounds enforced across the crate.
pub mod limits {
    /// Maximum component nesting depth in one render pass.
    pub const MAX_RENDER_DEPTH: usize = 64;

    /// Maximum account or category name length, in bytes.
    pub const MAX_NAME_LEN: usize = 64;

    /// Maximum transaction memo length, in bytes.
    pub const MAX_MEMO_LEN: usize = 256;
}

pub use adapter::{with_error_boundary, WithErrorBoundary};
pub use boundary::{BoundaryState, ErrorBoundary};
pub use component::{Child, Component, ErrorContext, RenderCtx, RenderError, RenderResult};
pub use fallback::{Fallback, RouteFallback};
pub use health::{assess, assess_stage, FinanceStage, HealthSnapshot, HealthStatus, StageAssessment};
pub use ledger::{
    Account, AccountId, AccountKind, Budget, Category, CategoryId, Ledger, LedgerError, MonthKey,
    Transaction, TransactionDraft, TxId, TxKind,
};
pub use money::{Money, MoneyError};
pub use reports::{build_report, Report, ReportKind};
pub use storage::{LedgerStore, RedbStore, StorageError};
pub use view::View;
