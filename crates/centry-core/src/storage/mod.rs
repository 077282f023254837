//! # Storage Module
//!
//! Durable ledger storage using redb.
//!
//! Uses the redb embedded database for:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! [`LedgerStore`] is the seam between the domain and its backing
//! store; the app layer adds a plain-file implementation for setups
//! that do not want a database.

mod redb_ledger;

pub use redb_ledger::RedbStore;

use crate::formats::FormatError;
use crate::ledger::Ledger;
use thiserror::Error;

/// Failures while loading or saving a ledger.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] redb::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::Db(err.into())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Db(err.into())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::Db(err.into())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::Db(err.into())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Db(err.into())
    }
}

/// Load and save whole ledgers.
///
/// The ledger is small enough to persist as one value; stores exchange
/// complete snapshots rather than deltas.
pub trait LedgerStore {
    /// Load the current ledger, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Ledger>, StorageError>;

    /// Persist the ledger, replacing any previous snapshot.
    fn save(&self, ledger: &Ledger) -> Result<(), StorageError>;
}
