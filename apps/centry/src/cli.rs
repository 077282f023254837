//! # CLI
//!
//! Command implementations behind the clap surface in `main.rs`.
//!
//! Every command goes through [`LedgerStore`], so the same code path
//! serves both persistence backends: `file` (canonical bytes in a
//! single file) and `redb` (transactional key-value database).
//! Commands are plain functions over paths and strings, which keeps
//! them callable from integration tests without spawning the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use centry_core::formats::{decode_ledger, encode_ledger, to_json_string, FormatError};
use centry_core::health::{assess_stage, StageAssessment};
use centry_core::ledger::TransactionDraft;
use centry_core::reports::{build_report, UnknownReportKind};
use centry_core::{
    AccountId, AccountKind, CategoryId, Ledger, LedgerError, LedgerStore, Money, MoneyError,
    MonthKey, RedbStore, ReportKind, StorageError, TxId, TxKind,
};

use crate::api::{serve, AppConfig, AppState};
use crate::pages::current_month;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("unknown backend: {0} (expected file or redb)")]
    UnknownBackend(String),
    #[error("database already exists: {} (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),
    #[error("ledger already has data (use --force to reseed)")]
    NotEmpty,
    #[error("unknown export format: {0} (expected canonical or json)")]
    UnknownExportFormat(String),
    #[error("account not found: {0}")]
    UnknownAccount(String),
    #[error("category not found: {0}")]
    UnknownCategory(String),
    #[error("invalid date: {0}")]
    Date(#[from] chrono::ParseError),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Money(#[from] MoneyError),
    #[error("{0}")]
    Report(#[from] UnknownReportKind),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Format(#[from] FormatError),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// BACKENDS
// =============================================================================

/// Plain-file persistence: the canonical byte format in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LedgerStore for FileStore {
    fn load(&self) -> Result<Option<Ledger>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        Ok(Some(decode_ledger(&bytes)?))
    }

    fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let bytes = encode_ledger(ledger)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

fn ensure_backend(backend: &str) -> Result<(), CliError> {
    match backend {
        "file" | "redb" => Ok(()),
        other => Err(CliError::UnknownBackend(other.to_owned())),
    }
}

/// Open the persistence backend selected on the command line.
pub fn open_store(
    db: &Path,
    backend: &str,
) -> Result<Box<dyn LedgerStore + Send + Sync>, CliError> {
    match backend {
        "file" => Ok(Box::new(FileStore::new(db))),
        "redb" => Ok(Box::new(RedbStore::open(db)?)),
        other => Err(CliError::UnknownBackend(other.to_owned())),
    }
}

/// Load the ledger, or start a fresh one if the database is missing.
pub fn load_or_create_ledger(db: &Path, backend: &str) -> Result<Ledger, CliError> {
    let store = open_store(db, backend)?;
    Ok(store.load()?.unwrap_or_default())
}

/// Write the ledger back through the selected backend.
pub fn save_ledger(ledger: &Ledger, db: &Path, backend: &str) -> Result<(), CliError> {
    let store = open_store(db, backend)?;
    store.save(ledger)?;
    Ok(())
}

fn parse_month(raw: Option<&str>) -> Result<MonthKey, CliError> {
    match raw {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(current_month()),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Create an empty ledger database. Refuses to clobber an existing one
/// unless forced.
pub fn cmd_init(db: &Path, backend: &str, force: bool) -> Result<(), CliError> {
    ensure_backend(backend)?;
    if db.exists() {
        if !force {
            return Err(CliError::AlreadyExists(db.to_path_buf()));
        }
        fs::remove_file(db)?;
    }
    save_ledger(&Ledger::new(), db, backend)?;
    println!("initialized {} ledger at {}", backend, db.display());
    Ok(())
}

/// Deterministic demo data: three accounts, four categories, a summer
/// of transactions, and budgets for June and July.
pub fn seed_ledger() -> Result<Ledger, CliError> {
    let mut ledger = Ledger::new();
    let checking =
        ledger.add_account("Checking", AccountKind::Checking, Money::from_cents(250_000))?;
    let savings =
        ledger.add_account("Savings", AccountKind::Savings, Money::from_cents(1_200_000))?;
    let card = ledger.add_account("Visa", AccountKind::CreditCard, Money::ZERO)?;

    let groceries = ledger.add_category("Groceries")?;
    let dining = ledger.add_category("Dining")?;
    let transport = ledger.add_category("Transport")?;
    let salary = ledger.add_category("Salary")?;

    let entries: [(AccountId, &str, &str, TxKind, Option<CategoryId>, &str); 12] = [
        (checking, "2025-06-01", "4200.00", TxKind::Income, Some(salary), "June salary"),
        (checking, "2025-06-03", "82.45", TxKind::Expense, Some(groceries), "weekly shop"),
        (card, "2025-06-07", "36.20", TxKind::Expense, Some(dining), "thai takeout"),
        (checking, "2025-06-10", "15.00", TxKind::Expense, Some(transport), "metro card"),
        (checking, "2025-06-14", "64.10", TxKind::Expense, Some(groceries), "weekly shop"),
        (card, "2025-06-21", "48.80", TxKind::Expense, Some(dining), "birthday dinner"),
        (checking, "2025-07-01", "4200.00", TxKind::Income, Some(salary), "July salary"),
        (checking, "2025-07-05", "91.35", TxKind::Expense, Some(groceries), "weekly shop"),
        (card, "2025-07-12", "22.50", TxKind::Expense, Some(transport), "airport train"),
        (card, "2025-07-19", "57.60", TxKind::Expense, Some(dining), "team lunch"),
        (savings, "2025-08-01", "4200.00", TxKind::Income, Some(salary), "August salary"),
        (checking, "2025-08-09", "78.25", TxKind::Expense, Some(groceries), "weekly shop"),
    ];
    for (account, date, amount, kind, category, memo) in entries {
        ledger.record(TransactionDraft {
            account,
            date: date.parse()?,
            amount: amount.parse()?,
            kind,
            category,
            memo: memo.to_owned(),
        })?;
    }

    let june = MonthKey::new(2025, 6)?;
    let july = MonthKey::new(2025, 7)?;
    ledger.set_budget(groceries, june, Money::from_cents(30_000))?;
    ledger.set_budget(dining, june, Money::from_cents(12_000))?;
    ledger.set_budget(transport, june, Money::from_cents(6_000))?;
    ledger.set_budget(groceries, july, Money::from_cents(30_000))?;

    Ok(ledger)
}

/// Populate the database with the demo dataset.
pub fn cmd_seed(db: &Path, backend: &str, force: bool) -> Result<(), CliError> {
    ensure_backend(backend)?;
    let existing = load_or_create_ledger(db, backend)?;
    if (existing.account_count() > 0 || existing.transaction_count() > 0) && !force {
        return Err(CliError::NotEmpty);
    }
    let ledger = seed_ledger()?;
    save_ledger(&ledger, db, backend)?;
    println!(
        "seeded {} accounts, {} transactions",
        ledger.account_count(),
        ledger.transaction_count()
    );
    Ok(())
}

pub fn cmd_add_account(
    db: &Path,
    backend: &str,
    name: &str,
    kind: &str,
    opening: &str,
) -> Result<AccountId, CliError> {
    let kind: AccountKind = kind.parse()?;
    let opening: Money = opening.parse()?;
    let mut ledger = load_or_create_ledger(db, backend)?;
    let id = ledger.add_account(name, kind, opening)?;
    save_ledger(&ledger, db, backend)?;
    println!("added account {name} ({id})");
    Ok(id)
}

pub fn cmd_add_category(db: &Path, backend: &str, name: &str) -> Result<CategoryId, CliError> {
    let mut ledger = load_or_create_ledger(db, backend)?;
    let id = ledger.add_category(name)?;
    save_ledger(&ledger, db, backend)?;
    println!("added category {name} ({id})");
    Ok(id)
}

/// Record a transaction against an account named on the command line.
pub fn cmd_add(
    db: &Path,
    backend: &str,
    account: &str,
    amount: &str,
    date: Option<&str>,
    kind: &str,
    category: Option<&str>,
    memo: &str,
) -> Result<TxId, CliError> {
    let amount: Money = amount.parse()?;
    let kind: TxKind = kind.parse()?;
    let date = match date {
        Some(raw) => raw.parse()?,
        None => today(),
    };
    let mut ledger = load_or_create_ledger(db, backend)?;
    let account = ledger
        .account_by_name(account)
        .map(|a| a.id)
        .ok_or_else(|| CliError::UnknownAccount(account.to_owned()))?;
    let category = match category {
        None => None,
        Some(name) => Some(
            ledger
                .category_by_name(name)
                .map(|c| c.id)
                .ok_or_else(|| CliError::UnknownCategory(name.to_owned()))?,
        ),
    };
    let id = ledger.record(TransactionDraft {
        account,
        date,
        amount,
        kind,
        category,
        memo: memo.to_owned(),
    })?;
    save_ledger(&ledger, db, backend)?;
    println!("recorded transaction {id}");
    Ok(id)
}

pub fn cmd_set_budget(
    db: &Path,
    backend: &str,
    category: &str,
    limit: &str,
    month: Option<&str>,
) -> Result<(), CliError> {
    let limit: Money = limit.parse()?;
    let month = parse_month(month)?;
    let mut ledger = load_or_create_ledger(db, backend)?;
    let category_id = ledger
        .category_by_name(category)
        .map(|c| c.id)
        .ok_or_else(|| CliError::UnknownCategory(category.to_owned()))?;
    ledger.set_budget(category_id, month, limit)?;
    save_ledger(&ledger, db, backend)?;
    println!("budget for {category} in {month}: {limit}");
    Ok(())
}

#[derive(Serialize)]
struct StatusOut {
    accounts: usize,
    categories: usize,
    transactions: usize,
    net_worth: String,
    ledger_version: u64,
    finance: StageAssessment,
}

/// Show ledger counts, net worth, and the finance stage, as text or
/// JSON. The stage grades the current month.
pub fn cmd_status(db: &Path, backend: &str, json: bool) -> Result<(), CliError> {
    let ledger = load_or_create_ledger(db, backend)?;
    let status = StatusOut {
        accounts: ledger.account_count(),
        categories: ledger.categories().count(),
        transactions: ledger.transaction_count(),
        net_worth: ledger.net_worth().to_string(),
        ledger_version: ledger.version(),
        finance: assess_stage(&ledger, current_month()),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("accounts:     {}", status.accounts);
        println!("categories:   {}", status.categories);
        println!("transactions: {}", status.transactions);
        println!("net worth:    {}", status.net_worth);
        println!("version:      {}", status.ledger_version);
        println!(
            "stage:        {} ({}/100)",
            status.finance.stage.label(),
            status.finance.score
        );
    }
    Ok(())
}

/// Print a report for the given month (current month by default).
pub fn cmd_report(
    db: &Path,
    backend: &str,
    kind: &str,
    month: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let kind: ReportKind = kind.parse()?;
    let month = parse_month(month)?;
    let ledger = load_or_create_ledger(db, backend)?;
    let report = build_report(&ledger, kind, month);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}

/// Write the ledger to `output` as `canonical` bytes or pretty JSON.
/// Both forms are deterministic for a given ledger state.
pub fn cmd_export(db: &Path, backend: &str, output: &Path, format: &str) -> Result<(), CliError> {
    let ledger = load_or_create_ledger(db, backend)?;
    match format {
        "canonical" => fs::write(output, encode_ledger(&ledger)?)?,
        "json" => fs::write(output, to_json_string(&ledger)?)?,
        other => return Err(CliError::UnknownExportFormat(other.to_owned())),
    }
    println!("exported {} to {}", format, output.display());
    Ok(())
}

/// Read a canonical export and replace the target database with it.
pub fn cmd_import(db: &Path, backend: &str, input: &Path) -> Result<(), CliError> {
    ensure_backend(backend)?;
    let bytes = fs::read(input)?;
    let ledger = decode_ledger(&bytes)?;
    save_ledger(&ledger, db, backend)?;
    println!("imported {} transactions", ledger.transaction_count());
    Ok(())
}

/// Load the ledger and serve HTTP until shutdown. API mutations write
/// back through the same backend.
pub async fn cmd_serve(
    db: &Path,
    backend: &str,
    bind: &str,
    auth_token: Option<String>,
) -> Result<(), CliError> {
    let ledger = load_or_create_ledger(db, backend)?;
    let store = open_store(db, backend)?;
    let state = AppState::new(
        ledger,
        AppConfig {
            auth_token,
            store: Some(store),
            ..AppConfig::default()
        },
    );
    serve(state, bind).await?;
    Ok(())
}
