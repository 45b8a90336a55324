//! Shopfront Core - Shared cart and order types.
//!
//! This crate provides the domain types used across all Shopfront components:
//! - `storefront` - Cart store, persistence, and content-store API client
//! - `cli` - Command-line front end for browsing, cart management, and checkout
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! storage access, no HTTP clients. The cart rules live here so every caller
//! shares one implementation of them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`cart`] - Cart lines, cart state, and the mutations that keep it consistent

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartLine, CartState, NewCartLine, QuantityUpdate, ValidationError};
pub use types::*;
