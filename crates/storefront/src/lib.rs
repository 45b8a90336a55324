//! Shopfront storefront library.
//!
//! Durable cart store, content-store API client, and checkout. The `shop`
//! binary drives these; everything here is usable and testable on its own.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
