//! Integration tests for Centry CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use centry::cli::{
    cmd_add, cmd_add_account, cmd_add_category, cmd_export, cmd_import, cmd_init, cmd_report,
    cmd_seed, cmd_set_budget, cmd_status, load_or_create_ledger, save_ledger, seed_ledger,
};
use centry_core::{AccountKind, Ledger, Money, MonthKey};
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Seed a file-backed database and return its path.
fn seeded_file_db(temp: &TempDir) -> PathBuf {
    let db_path = temp.path().join("centry.db");
    cmd_seed(&db_path, "file", false).unwrap();
    db_path
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_file_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    let result = cmd_init(&db_path, "file", false);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_creates_redb_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    let result = cmd_init(&db_path, "redb", false);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    // First init
    cmd_init(&db_path, "file", false).unwrap();

    // Second init should fail
    let result = cmd_init(&db_path, "file", false);
    assert!(result.is_err());
}

#[test]
fn test_init_succeeds_with_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    // First init
    cmd_init(&db_path, "file", false).unwrap();

    // Second init with force should succeed
    let result = cmd_init(&db_path, "file", true);
    assert!(result.is_ok());
}

#[test]
fn test_init_rejects_unknown_backend() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    let result = cmd_init(&db_path, "sqlite", false);
    assert!(result.is_err());
    assert!(!db_path.exists());
}

// =============================================================================
// LOAD/SAVE LEDGER TESTS
// =============================================================================

#[test]
fn test_load_nonexistent_creates_new() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("nonexistent.db");

    let ledger = load_or_create_ledger(&db_path, "file");
    assert!(ledger.is_ok());
    let ledger = ledger.unwrap();
    assert_eq!(ledger.account_count(), 0);
    assert_eq!(ledger.transaction_count(), 0);
}

#[test]
fn test_save_and_load_ledger_file_backend() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    let mut ledger = Ledger::new();
    let checking = ledger
        .add_account("Checking", AccountKind::Checking, Money::from_cents(12_345))
        .unwrap();
    save_ledger(&ledger, &db_path, "file").unwrap();

    let loaded = load_or_create_ledger(&db_path, "file").unwrap();
    assert_eq!(loaded.account_count(), 1);
    assert_eq!(
        loaded.account_balance(checking).unwrap(),
        Money::from_cents(12_345)
    );
}

#[test]
fn test_save_and_load_ledger_redb_backend() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    let mut ledger = Ledger::new();
    ledger
        .add_account("Savings", AccountKind::Savings, Money::from_cents(99_000))
        .unwrap();
    save_ledger(&ledger, &db_path, "redb").unwrap();

    let loaded = load_or_create_ledger(&db_path, "redb").unwrap();
    assert_eq!(loaded.account_count(), 1);
    assert!(loaded.account_by_name("Savings").is_some());
}

// =============================================================================
// SEED COMMAND TESTS
// =============================================================================

#[test]
fn test_seed_populates_the_ledger() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let ledger = load_or_create_ledger(&db_path, "file").unwrap();
    assert_eq!(ledger.account_count(), 3);
    assert_eq!(ledger.transaction_count(), 12);
    assert!(ledger.category_by_name("Groceries").is_some());
}

#[test]
fn test_seed_fails_on_existing_data_without_force() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let result = cmd_seed(&db_path, "file", false);
    assert!(result.is_err());

    // Forced reseed starts over instead of stacking duplicates.
    cmd_seed(&db_path, "file", true).unwrap();
    let ledger = load_or_create_ledger(&db_path, "file").unwrap();
    assert_eq!(ledger.transaction_count(), 12);
}

#[test]
fn test_seed_ledger_is_deterministic() {
    let a = seed_ledger().unwrap();
    let b = seed_ledger().unwrap();
    assert_eq!(a.version(), b.version());
    assert_eq!(a.net_worth(), b.net_worth());
    assert_eq!(a.transaction_count(), b.transaction_count());
}

// =============================================================================
// ADD COMMAND TESTS
// =============================================================================

#[test]
fn test_add_account_persists() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    let id = cmd_add_account(&db_path, "file", "Brokerage", "investment", "5000.00").unwrap();

    let ledger = load_or_create_ledger(&db_path, "file").unwrap();
    let account = ledger.account_by_name("Brokerage").unwrap();
    assert_eq!(account.id, id);
    assert_eq!(account.kind, AccountKind::Investment);
    assert_eq!(account.opening_balance, Money::from_cents(500_000));
}

#[test]
fn test_add_account_rejects_bad_kind() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    let result = cmd_add_account(&db_path, "file", "Brokerage", "stocks", "0.00");
    assert!(result.is_err());
}

#[test]
fn test_add_records_a_transaction() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    cmd_add_account(&db_path, "file", "Checking", "checking", "100.00").unwrap();
    cmd_add_category(&db_path, "file", "Groceries").unwrap();
    cmd_add(
        &db_path,
        "file",
        "Checking",
        "12.50",
        Some("2025-06-15"),
        "expense",
        Some("Groceries"),
        "corner store",
    )
    .unwrap();

    let ledger = load_or_create_ledger(&db_path, "file").unwrap();
    assert_eq!(ledger.transaction_count(), 1);
    let checking = ledger.account_by_name("Checking").unwrap().id;
    assert_eq!(
        ledger.account_balance(checking).unwrap(),
        Money::from_cents(8_750)
    );
}

#[test]
fn test_add_fails_for_unknown_account() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");
    cmd_init(&db_path, "file", false).unwrap();

    let result = cmd_add(
        &db_path,
        "file",
        "Nowhere",
        "1.00",
        Some("2025-06-15"),
        "expense",
        None,
        "",
    );
    assert!(result.is_err());
}

#[test]
fn test_add_fails_for_unknown_category() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");
    cmd_add_account(&db_path, "file", "Checking", "checking", "0.00").unwrap();

    let result = cmd_add(
        &db_path,
        "file",
        "Checking",
        "1.00",
        Some("2025-06-15"),
        "expense",
        Some("Mystery"),
        "",
    );
    assert!(result.is_err());
}

// =============================================================================
// BUDGET COMMAND TESTS
// =============================================================================

#[test]
fn test_set_budget_upserts() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");

    cmd_add_category(&db_path, "file", "Dining").unwrap();
    cmd_set_budget(&db_path, "file", "Dining", "100.00", Some("2025-06")).unwrap();
    cmd_set_budget(&db_path, "file", "Dining", "150.00", Some("2025-06")).unwrap();

    let ledger = load_or_create_ledger(&db_path, "file").unwrap();
    let dining = ledger.category_by_name("Dining").unwrap().id;
    let month = MonthKey::new(2025, 6).unwrap();
    let budget = ledger.budget_for(dining, month).unwrap();
    assert_eq!(budget.limit, Money::from_cents(15_000));
}

#[test]
fn test_set_budget_requires_existing_category() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.db");
    cmd_init(&db_path, "file", false).unwrap();

    let result = cmd_set_budget(&db_path, "file", "Dining", "100.00", Some("2025-06"));
    assert!(result.is_err());
}

// =============================================================================
// STATUS AND REPORT COMMAND TESTS
// =============================================================================

#[test]
fn test_status_runs_in_both_modes() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    assert!(cmd_status(&db_path, "file", false).is_ok());
    assert!(cmd_status(&db_path, "file", true).is_ok());
}

#[test]
fn test_report_accepts_every_kind() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    for kind in ["net-worth", "spending", "budgets"] {
        assert!(cmd_report(&db_path, "file", kind, Some("2025-06"), false).is_ok());
        assert!(cmd_report(&db_path, "file", kind, Some("2025-06"), true).is_ok());
    }
}

#[test]
fn test_report_rejects_unknown_kind() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let result = cmd_report(&db_path, "file", "cashflow", Some("2025-06"), false);
    assert!(result.is_err());
}

// =============================================================================
// EXPORT/IMPORT COMMAND TESTS
// =============================================================================

#[test]
fn test_export_canonical_is_deterministic() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let out_a = temp.path().join("a.bin");
    let out_b = temp.path().join("b.bin");
    cmd_export(&db_path, "file", &out_a, "canonical").unwrap();
    cmd_export(&db_path, "file", &out_b, "canonical").unwrap();

    let bytes_a = std::fs::read(&out_a).unwrap();
    let bytes_b = std::fs::read(&out_b).unwrap();
    assert_eq!(bytes_a, bytes_b);
    assert!(!bytes_a.is_empty());
}

#[test]
fn test_export_json_is_deterministic() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let out_a = temp.path().join("a.json");
    let out_b = temp.path().join("b.json");
    cmd_export(&db_path, "file", &out_a, "json").unwrap();
    cmd_export(&db_path, "file", &out_b, "json").unwrap();

    let text_a = std::fs::read_to_string(&out_a).unwrap();
    assert_eq!(text_a, std::fs::read_to_string(&out_b).unwrap());
    assert!(text_a.contains("\"Groceries\""));
}

#[test]
fn test_export_rejects_unknown_format() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let out = temp.path().join("out.xml");
    let result = cmd_export(&db_path, "file", &out, "xml");
    assert!(result.is_err());
}

#[test]
fn test_import_round_trips_through_canonical_bytes() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let export = temp.path().join("export.bin");
    cmd_export(&db_path, "file", &export, "canonical").unwrap();

    let restored = temp.path().join("restored.db");
    cmd_import(&restored, "file", &export).unwrap();

    // Re-exporting the restored database yields identical bytes.
    let reexport = temp.path().join("reexport.bin");
    cmd_export(&restored, "file", &reexport, "canonical").unwrap();
    assert_eq!(
        std::fs::read(&export).unwrap(),
        std::fs::read(&reexport).unwrap()
    );
}

#[test]
fn test_import_into_redb_backend() {
    let temp = create_temp_dir();
    let db_path = seeded_file_db(&temp);

    let export = temp.path().join("export.bin");
    cmd_export(&db_path, "file", &export, "canonical").unwrap();

    let redb_path = temp.path().join("restored.redb");
    cmd_import(&redb_path, "redb", &export).unwrap();

    let ledger = load_or_create_ledger(&redb_path, "redb").unwrap();
    assert_eq!(ledger.transaction_count(), 12);
    assert_eq!(ledger.account_count(), 3);
}

#[test]
fn test_import_rejects_garbage_input() {
    let temp = create_temp_dir();
    let garbage = temp.path().join("garbage.bin");
    std::fs::write(&garbage, b"not a ledger export").unwrap();

    let db_path = temp.path().join("test.db");
    let result = cmd_import(&db_path, "file", &garbage);
    assert!(result.is_err());
}
