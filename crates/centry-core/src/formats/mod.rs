//! # Formats Module
//!
//! Serialization formats for ledgers.
//!
//! This module contains:
//! - Binary persistence format (postcard behind a magic/version header)
//! - Deterministic JSON export and import
//!
//! Everything here is a pure byte transformation; file and database IO
//! live in the storage module and the app layer.

mod persistence;

pub use persistence::*;
