//! # Ledger Module
//!
//! The in-memory book of record: accounts, categories, transactions,
//! and monthly budgets.
//!
//! All collections are `BTreeMap`s so iteration order, serialization,
//! and report output are deterministic. Identifiers are assigned from
//! monotonic counters and never reused. Every successful mutation bumps
//! the ledger version, which callers use to invalidate derived data.

use crate::limits::{MAX_MEMO_LEN, MAX_NAME_LEN};
use crate::money::Money;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Account identifier, unique within one ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(u32);

/// Category identifier, unique within one ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CategoryId(u32);

/// Transaction identifier, unique within one ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TxId(u64);

impl AccountId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        AccountId(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl CategoryId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        CategoryId(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl TxId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        TxId(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Validation and lookup failures on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("account name already in use: {0}")]
    DuplicateAccount(String),
    #[error("category name already in use: {0}")]
    DuplicateCategory(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("name too long: {0} bytes")]
    NameTooLong(usize),
    #[error("memo too long: {0} bytes")]
    MemoTooLong(usize),
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("month must be 1-12, got {0}")]
    InvalidMonth(u32),
    #[error("invalid month key: {0}")]
    InvalidMonthKey(String),
    #[error("unknown account kind: {0}")]
    InvalidAccountKind(String),
    #[error("unknown transaction kind: {0}")]
    InvalidTxKind(String),
}

// =============================================================================
// DOMAIN TYPES
// =============================================================================

/// What kind of account holds the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKind {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
}

impl AccountKind {
    /// Stable lowercase label, also the parse form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::CreditCard => "credit-card",
            AccountKind::Cash => "cash",
            AccountKind::Investment => "investment",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccountKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "credit-card" => Ok(AccountKind::CreditCard),
            "cash" => Ok(AccountKind::Cash),
            "investment" => Ok(AccountKind::Investment),
            other => Err(LedgerError::InvalidAccountKind(other.to_owned())),
        }
    }
}

/// Direction of a transaction relative to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TxKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            other => Err(LedgerError::InvalidTxKind(other.to_owned())),
        }
    }
}

/// A calendar month, used to key budgets and monthly reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Build a month key, validating the month number.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidMonth(month));
        }
        Ok(MonthKey { year, month })
    }

    /// The month a date falls in.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| LedgerError::InvalidMonthKey(s.to_owned()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| LedgerError::InvalidMonthKey(s.to_owned()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| LedgerError::InvalidMonthKey(s.to_owned()))?;
        MonthKey::new(year, month)
    }
}

/// A money container: checking account, credit card, cash jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: Money,
}

/// A spending or income category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// One recorded movement of money.
///
/// The amount is always positive; `kind` carries the direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub account: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: TxKind,
    pub category: Option<CategoryId>,
    pub memo: String,
}

impl Transaction {
    /// The amount with direction applied: income positive, expense
    /// negative.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TxKind::Income => self.amount,
            TxKind::Expense => self.amount.saturating_neg(),
        }
    }
}

/// Input for recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub account: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: TxKind,
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub memo: String,
}

/// A monthly spending limit for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub category: CategoryId,
    pub month: MonthKey,
    pub limit: Money,
}

// =============================================================================
// LEDGER
// =============================================================================

/// The book of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, Account>,
    categories: BTreeMap<CategoryId, Category>,
    transactions: BTreeMap<TxId, Transaction>,
    budgets: BTreeMap<(MonthKey, CategoryId), Budget>,
    next_account_id: u32,
    next_category_id: u32,
    next_tx_id: u64,
    version: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Ledger {
            accounts: BTreeMap::new(),
            categories: BTreeMap::new(),
            transactions: BTreeMap::new(),
            budgets: BTreeMap::new(),
            next_account_id: 1,
            next_category_id: 1,
            next_tx_id: 1,
            version: 0,
        }
    }

    /// Monotonic mutation counter.
    ///
    /// Strictly increases on every successful mutation; derived data
    /// keyed on a version is stale once the versions differ.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    // -------------------------------------------------------------------------
    // ACCOUNTS
    // -------------------------------------------------------------------------

    /// Create an account.
    pub fn add_account(
        &mut self,
        name: impl Into<String>,
        kind: AccountKind,
        opening_balance: Money,
    ) -> Result<AccountId, LedgerError> {
        let name = name.into();
        validate_name(&name)?;
        if self.accounts.values().any(|a| a.name == name) {
            return Err(LedgerError::DuplicateAccount(name));
        }
        let id = AccountId(self.next_account_id);
        self.next_account_id = self.next_account_id.saturating_add(1);
        self.accounts.insert(
            id,
            Account {
                id,
                name,
                kind,
                opening_balance,
            },
        );
        self.touch();
        Ok(id)
    }

    /// Look up an account.
    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Look up an account by exact name.
    #[must_use]
    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.name == name)
    }

    /// All accounts in id order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Number of accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Current balance of one account: opening balance plus all signed
    /// transaction amounts, saturating at the range ends.
    pub fn account_balance(&self, id: AccountId) -> Result<Money, LedgerError> {
        let account = self
            .accounts
            .get(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        let balance = self
            .transactions
            .values()
            .filter(|tx| tx.account == id)
            .fold(account.opening_balance, |acc, tx| {
                acc.saturating_add(tx.signed_amount())
            });
        Ok(balance)
    }

    /// Sum of all account balances.
    #[must_use]
    pub fn net_worth(&self) -> Money {
        self.accounts.keys().fold(Money::ZERO, |acc, id| {
            match self.account_balance(*id) {
                Ok(balance) => acc.saturating_add(balance),
                Err(_) => acc,
            }
        })
    }

    // -------------------------------------------------------------------------
    // CATEGORIES
    // -------------------------------------------------------------------------

    /// Create a category.
    pub fn add_category(&mut self, name: impl Into<String>) -> Result<CategoryId, LedgerError> {
        let name = name.into();
        validate_name(&name)?;
        if self.categories.values().any(|c| c.name == name) {
            return Err(LedgerError::DuplicateCategory(name));
        }
        let id = CategoryId(self.next_category_id);
        self.next_category_id = self.next_category_id.saturating_add(1);
        self.categories.insert(id, Category { id, name });
        self.touch();
        Ok(id)
    }

    /// Look up a category.
    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    /// Look up a category by exact name.
    #[must_use]
    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.values().find(|c| c.name == name)
    }

    /// All categories in id order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    // -------------------------------------------------------------------------
    // TRANSACTIONS
    // -------------------------------------------------------------------------

    /// Record a transaction.
    pub fn record(&mut self, draft: TransactionDraft) -> Result<TxId, LedgerError> {
        if !self.accounts.contains_key(&draft.account) {
            return Err(LedgerError::AccountNotFound(draft.account));
        }
        if let Some(category) = draft.category {
            if !self.categories.contains_key(&category) {
                return Err(LedgerError::CategoryNotFound(category));
            }
        }
        if !draft.amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount);
        }
        if draft.memo.len() > MAX_MEMO_LEN {
            return Err(LedgerError::MemoTooLong(draft.memo.len()));
        }

        let id = TxId(self.next_tx_id);
        self.next_tx_id = self.next_tx_id.saturating_add(1);
        self.transactions.insert(
            id,
            Transaction {
                id,
                account: draft.account,
                date: draft.date,
                amount: draft.amount,
                kind: draft.kind,
                category: draft.category,
                memo: draft.memo,
            },
        );
        self.touch();
        Ok(id)
    }

    /// Look up a transaction.
    #[must_use]
    pub fn transaction(&self, id: TxId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    /// All transactions in id (insertion) order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Number of transactions.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Transactions dated within one month.
    pub fn transactions_in_month(&self, month: MonthKey) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .values()
            .filter(move |tx| MonthKey::from_date(tx.date) == month)
    }

    // -------------------------------------------------------------------------
    // BUDGETS
    // -------------------------------------------------------------------------

    /// Set (or replace) the monthly limit for a category.
    pub fn set_budget(
        &mut self,
        category: CategoryId,
        month: MonthKey,
        limit: Money,
    ) -> Result<(), LedgerError> {
        if !self.categories.contains_key(&category) {
            return Err(LedgerError::CategoryNotFound(category));
        }
        if !limit.is_positive() {
            return Err(LedgerError::NonPositiveAmount);
        }
        self.budgets.insert(
            (month, category),
            Budget {
                category,
                month,
                limit,
            },
        );
        self.touch();
        Ok(())
    }

    /// The budget for one category in one month.
    #[must_use]
    pub fn budget_for(&self, category: CategoryId, month: MonthKey) -> Option<&Budget> {
        self.budgets.get(&(month, category))
    }

    /// All budgets for one month, in category order.
    pub fn budgets_in_month(&self, month: MonthKey) -> impl Iterator<Item = &Budget> {
        self.budgets
            .range((month, CategoryId(u32::MIN))..=(month, CategoryId(u32::MAX)))
            .map(|(_, budget)| budget)
    }

    /// All budgets in (month, category) order.
    pub fn budgets(&self) -> impl Iterator<Item = &Budget> {
        self.budgets.values()
    }
}

fn validate_name(name: &str) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(LedgerError::NameTooLong(name.len()));
    }
    Ok(())
}

// =============================================================================
// SERIALIZABLE FORM
// =============================================================================

/// Flat, map-free form of a ledger for JSON export.
///
/// JSON maps need string keys, which the budget map does not have, so
/// the export form carries plain vectors. Order is the ledger's own
/// BTreeMap order, making exports byte-for-byte reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableLedger {
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub next_account_id: u32,
    pub next_category_id: u32,
    pub next_tx_id: u64,
    pub version: u64,
}

impl From<&Ledger> for SerializableLedger {
    fn from(ledger: &Ledger) -> Self {
        SerializableLedger {
            accounts: ledger.accounts.values().cloned().collect(),
            categories: ledger.categories.values().cloned().collect(),
            transactions: ledger.transactions.values().cloned().collect(),
            budgets: ledger.budgets.values().cloned().collect(),
            next_account_id: ledger.next_account_id,
            next_category_id: ledger.next_category_id,
            next_tx_id: ledger.next_tx_id,
            version: ledger.version,
        }
    }
}

impl From<SerializableLedger> for Ledger {
    fn from(flat: SerializableLedger) -> Self {
        Ledger {
            accounts: flat.accounts.into_iter().map(|a| (a.id, a)).collect(),
            categories: flat.categories.into_iter().map(|c| (c.id, c)).collect(),
            transactions: flat.transactions.into_iter().map(|t| (t.id, t)).collect(),
            budgets: flat
                .budgets
                .into_iter()
                .map(|b| ((b.month, b.category), b))
                .collect(),
            next_account_id: flat.next_account_id,
            next_category_id: flat.next_category_id,
            next_tx_id: flat.next_tx_id,
            version: flat.version,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
