// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Atrium Protocol Core Library
//!
//! The shared foundation of the Atrium settlement engine: role-based access
//! control, price feeds and the token the vaults mint and burn.
//!
//! ## Architecture
//!
//! - **types**: Addresses and amounts.
//! - **config**: Protocol constants, fee math bounds, role names.
//! - **access**: Role registry and the access gate privileged components carry.
//! - **oracle**: Aggregator capability and the price oracle adapter.
//! - **token**: The managed-token capability and an in-memory ledger.
//!
//! The vault state machines live in `atrium-contracts` and build on this crate.
//!
//! ## Design Philosophy
//!
//! 1. If it touches money, it uses checked integer arithmetic.
//! 2. A failed operation leaves every piece of state exactly as it found it.
//! 3. External collaborators are traits; the engine never assumes a transport.

pub mod access;
pub mod config;
pub mod oracle;
pub mod token;
pub mod types;

pub use types::{Address, Amount};
