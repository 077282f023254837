//! # Centry Library
//!
//! This library exposes the Centry modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod pages;

// Re-export centry_core for convenience
pub use centry_core;
