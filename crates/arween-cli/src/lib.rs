//! # arween-cli
//!
//! Command-line front end for the ARWEEN marketplace.
//!
//! The snapshot lives in a single JSON file (`--state`). Every command loads
//! it, applies at most one step through the market shell, and saves the
//! result, so consecutive invocations behave like one session.
//!
//! Provides commands for:
//! - Wallet and job overviews
//! - The job lifecycle, from posting to the second payout
//! - Disputes and their arbitration
//! - Compliance reports and advice

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
