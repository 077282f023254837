//! # Redb-backed Ledger Store
//!
//! Stores the encoded ledger as a single value in a redb table. Every
//! save is one ACID write transaction, so a crash mid-save leaves the
//! previous snapshot intact.

use crate::formats::{decode_ledger, encode_ledger};
use crate::ledger::Ledger;
use crate::storage::{LedgerStore, StorageError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

const LEDGER_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("ledger");
const CURRENT_KEY: &str = "current";

/// Durable ledger storage in a redb database file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path)?;
        Ok(RedbStore { db })
    }
}

impl LedgerStore for RedbStore {
    fn load(&self) -> Result<Option<Ledger>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(LEDGER_TABLE) {
            Ok(table) => table,
            // A fresh database has no table yet; that is an empty store.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match table.get(CURRENT_KEY)? {
            Some(bytes) => {
                let ledger = decode_ledger(bytes.value())?;
                Ok(Some(ledger))
            }
            None => Ok(None),
        }
    }

    fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let bytes = encode_ledger(ledger)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(LEDGER_TABLE)?;
            table.insert(CURRENT_KEY, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
