//! Subcommand implementations.
//!
//! Each command writes its human-readable output to the given writer so the
//! output can be checked in tests.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod newsletter;
