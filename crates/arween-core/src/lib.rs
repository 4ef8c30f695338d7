//! # arween-core
//!
//! Primitives for the ARWEEN logistics marketplace.
//!
//! This crate provides:
//!
//! - [`Amount`] - Baht amount with satang (1/100) fixed-point precision
//! - [`Rate`] - Percentage expressed in basis points, applied with half-even rounding
//! - [`Wallet`] - Per-party balance sheet with checked balance movements
//! - [`TrustScore`] / [`Tier`] - Clamped reputation and the tiers derived from it
//! - [`Ledger`] - Append-only, newest-first audit trail of money movements

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod error;
pub mod ledger;
pub mod reputation;
pub mod wallet;

pub use amount::{Amount, Rate};
pub use error::CoreError;
pub use ledger::{EntryKind, EntryId, Ledger, LedgerEntry};
pub use reputation::{Tier, TrustScore};
pub use wallet::Wallet;
