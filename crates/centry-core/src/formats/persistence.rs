//! # Persistence Format
//!
//! Binary and JSON encodings of a ledger.
//!
//! The binary format is a four-byte magic, one format version byte,
//! then the postcard-encoded ledger. The magic catches files that were
//! never ledgers; the version byte lets a future format evolve without
//! guessing.
//!
//! JSON export goes through [`SerializableLedger`] so the output has no
//! non-string map keys and is stable byte-for-byte for a given ledger.

use crate::ledger::{Ledger, SerializableLedger};
use thiserror::Error;

/// File magic for binary ledgers.
pub const LEDGER_MAGIC: [u8; 4] = *b"CNTR";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

/// Encoding and decoding failures.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The input does not start with the ledger magic.
    #[error("not a ledger file (bad magic)")]
    BadMagic,
    /// The input is shorter than the fixed header.
    #[error("truncated ledger file")]
    Truncated,
    /// A newer (or corrupt) format version byte.
    #[error("unsupported ledger format version {0}")]
    UnsupportedVersion(u8),
    /// Postcard payload failure.
    #[error("binary encoding error: {0}")]
    Binary(#[from] postcard::Error),
    /// JSON payload failure.
    #[error("json encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// BINARY FORMAT
// =============================================================================

/// Encode a ledger into the binary persistence format.
pub fn encode_ledger(ledger: &Ledger) -> Result<Vec<u8>, FormatError> {
    let payload = postcard::to_stdvec(ledger)?;
    let mut out = Vec::with_capacity(payload.len().saturating_add(5));
    out.extend_from_slice(&LEDGER_MAGIC);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a ledger from the binary persistence format.
pub fn decode_ledger(bytes: &[u8]) -> Result<Ledger, FormatError> {
    if bytes.len() < 5 {
        return Err(FormatError::Truncated);
    }
    let (header, payload) = bytes.split_at(5);
    if header[0..4] != LEDGER_MAGIC {
        return Err(FormatError::BadMagic);
    }
    if header[4] != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(header[4]));
    }
    let ledger = postcard::from_bytes(payload)?;
    Ok(ledger)
}

// =============================================================================
// JSON EXPORT
// =============================================================================

/// Export a ledger as pretty-printed JSON.
///
/// Deterministic: the same ledger always yields the same bytes.
pub fn to_json_string(ledger: &Ledger) -> Result<String, FormatError> {
    let flat = SerializableLedger::from(ledger);
    let json = serde_json::to_string_pretty(&flat)?;
    Ok(json)
}

/// Import a ledger from its JSON export form.
pub fn from_json_str(json: &str) -> Result<Ledger, FormatError> {
    let flat: SerializableLedger = serde_json::from_str(json)?;
    Ok(Ledger::from(flat))
}

// =============================================================================
// INTEGRITY
// =============================================================================

/// Hex BLAKE3 digest of an encoded ledger.
///
/// Used to compare snapshots across machines without shipping the data.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn ledger_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ledger::AccountKind;
    use crate::money::Money;

    fn sample() -> Ledger {
        let mut ledger = Ledger::new();
        let account = ledger
            .add_account("Checking", AccountKind::Checking, Money::from_cents(12_345))
            .unwrap();
        let category = ledger.add_category("Groceries").unwrap();
        ledger
            .record(crate::ledger::TransactionDraft {
                account,
                date: chrono::NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
                amount: Money::from_cents(4_500),
                kind: crate::ledger::TxKind::Expense,
                category: Some(category),
                memo: "weekly shop".to_owned(),
            })
            .unwrap();
        ledger
    }

    #[test]
    fn binary_round_trip_preserves_the_ledger() {
        let ledger = sample();
        let bytes = encode_ledger(&ledger).unwrap();
        assert_eq!(&bytes[0..4], &LEDGER_MAGIC);
        assert_eq!(bytes[4], FORMAT_VERSION);

        let decoded = decode_ledger(&bytes).unwrap();
        assert_eq!(decoded, ledger);
    }

    #[test]
    fn decode_rejects_foreign_and_truncated_input() {
        assert!(matches!(decode_ledger(b"CN"), Err(FormatError::Truncated)));
        assert!(matches!(
            decode_ledger(b"XXXX\x01rest"),
            Err(FormatError::BadMagic)
        ));

        let mut bytes = encode_ledger(&sample()).unwrap();
        bytes[4] = 9;
        assert!(matches!(
            decode_ledger(&bytes),
            Err(FormatError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn json_round_trip_preserves_the_ledger() {
        let ledger = sample();
        let json = to_json_string(&ledger).unwrap();
        assert!(json.contains("\"Checking\""));
        assert_eq!(from_json_str(&json).unwrap(), ledger);
    }

    #[test]
    fn json_export_is_deterministic() {
        let ledger = sample();
        assert_eq!(
            to_json_string(&ledger).unwrap(),
            to_json_string(&ledger).unwrap()
        );
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn digest_is_stable_for_equal_ledgers() {
        let bytes = encode_ledger(&sample()).unwrap();
        let again = encode_ledger(&sample()).unwrap();
        assert_eq!(ledger_digest(&bytes), ledger_digest(&again));
        assert_eq!(ledger_digest(&bytes).len(), 64);
    }
}
