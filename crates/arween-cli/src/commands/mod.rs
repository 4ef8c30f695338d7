//! CLI command implementations.
//!
//! - [`session`] - Snapshot store and market constants
//! - [`init`] - Seeds the demo snapshot
//! - [`query`] - Read-only views
//! - [`transition`] - Steps that change the snapshot

pub mod init;
pub mod query;
pub mod session;
pub mod transition;

pub use init::InitCommand;
pub use query::QueryCommand;
pub use session::Session;
pub use transition::{Step, TransitionCommand};
