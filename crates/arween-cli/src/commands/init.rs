//! Seeds a fresh snapshot.

use std::io::Write;

use arween_market::AppState;
use tracing::info;

use super::query::status_view;
use super::session::Session;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Init command executor.
pub struct InitCommand<'a> {
    session: &'a Session,
}

impl<'a> InitCommand<'a> {
    /// Create a new init command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Writes the demo snapshot and prints its status.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::AlreadyInitialized`] if a snapshot exists and
    /// `force` is false.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat, force: bool) -> Result<(), CliError> {
        if !force && self.session.store().path().exists() {
            return Err(CliError::AlreadyInitialized(self.session.store().path().to_path_buf()));
        }
        let state = AppState::demo();
        self.session.save(&state)?;
        info!(path = %self.session.store().path().display(), "snapshot initialized");
        format.write(writer, &status_view(self.session, &state)?)
    }
}
