//! Read-only commands: status, jobs, ledger, stalled jobs, report and advice.

use std::io::Write;

use arween_market::{AppState, JobState, ledger_digest};

use super::session::Session;
use crate::error::CliError;
use crate::output::{JobTable, LedgerTable, OutputFormat, StatusView, TextBlock, WalletView};

/// Builds the status overview of `state`.
///
/// # Errors
///
/// Returns an error if the ledger cannot be digested.
pub fn status_view(session: &Session, state: &AppState) -> Result<StatusView, CliError> {
    let point_value = session.config().carbon_point_value();
    let digest = ledger_digest(&state.ledger)
        .map_err(|e| CliError::Format(format!("ledger digest failed: {e}")))?;
    Ok(StatusView {
        role: state.current_role,
        operator: WalletView::new(&state.operator_wallet, point_value),
        driver: WalletView::new(&state.driver_wallet, point_value),
        job_count: state.jobs.len(),
        escrow_committed: state.escrow_committed(),
        ledger_entries: state.ledger.len(),
        ledger_digest: digest.to_hex().to_string(),
    })
}

fn parse_state(name: &str) -> Result<JobState, CliError> {
    JobState::ALL
        .into_iter()
        .find(|state| state.as_str().eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::InvalidArgument(format!("unknown job state: {name}")))
}

/// Read-only command executor.
pub struct QueryCommand<'a> {
    session: &'a Session,
}

impl<'a> QueryCommand<'a> {
    /// Create a new query command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Prints both wallets and the acting role.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or output fails.
    pub fn status<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let state = self.session.load()?;
        format.write(writer, &status_view(self.session, &state)?)
    }

    /// Prints jobs, optionally only those in one state.
    ///
    /// # Errors
    ///
    /// Returns an error if `filter` names no state, or loading or output fails.
    pub fn jobs<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        filter: Option<&str>,
    ) -> Result<(), CliError> {
        let wanted = filter.map(parse_state).transpose()?;
        let state = self.session.load()?;
        let jobs = state
            .jobs
            .into_iter()
            .filter(|job| wanted.is_none_or(|s| job.state == s))
            .collect();
        format.write(writer, &JobTable { jobs })
    }

    /// Prints up to `limit` ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or output fails.
    pub fn ledger<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        job: Option<&str>,
        limit: usize,
    ) -> Result<(), CliError> {
        let state = self.session.load()?;
        let entries = match job {
            Some(id) => state.ledger.for_job(id).take(limit).cloned().collect(),
            None => state.ledger.entries().take(limit).cloned().collect(),
        };
        format.write(writer, &LedgerTable { entries })
    }

    /// Prints jobs stuck between a verification and its payout.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or output fails.
    pub fn stalled<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let state = self.session.load()?;
        let shell = self.session.shell(state);
        let jobs = shell.stalled_jobs().into_iter().cloned().collect();
        format.write(writer, &JobTable { jobs })
    }

    /// Prints the compliance report for the acting role.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, reporting, or output fails.
    pub async fn report<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let state = self.session.load()?;
        let role = state.current_role;
        let shell = self.session.shell(state);
        let body = shell.compliance_report(&self.session.reporter()).await?;
        format.write(writer, &TextBlock { role, body })
    }

    /// Prints advice for the acting role.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, advising, or output fails.
    pub async fn advice<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let state = self.session.load()?;
        let role = state.current_role;
        let shell = self.session.shell(state);
        let body = shell.advice(&self.session.reporter()).await?;
        format.write(writer, &TextBlock { role, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;

    fn seeded() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(&dir.path().join("state.json"), None).unwrap();
        session.save(&AppState::demo()).unwrap();
        (dir, session)
    }

    #[test]
    fn parse_state_ignores_case() {
        assert_eq!(parse_state("phase1_paid").unwrap(), JobState::Phase1Paid);
        assert_eq!(parse_state("FUNDED").unwrap(), JobState::Funded);
        assert!(matches!(parse_state("LOST"), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn jobs_filter() {
        let (_dir, session) = seeded();
        let format = OutputFormat::new(Format::Json);
        let mut out = Vec::new();
        QueryCommand::new(&session).jobs(&mut out, &format, Some("created")).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn ledger_limit() {
        let (_dir, session) = seeded();
        let engine = session.lifecycle();
        let mut state = engine
            .switch_role(&session.load().unwrap(), arween_market::Role::Operator)
            .unwrap();
        for _ in 0..3 {
            state = engine.top_up_wallet(&state, arween_core::Amount::from_baht(1)).unwrap();
        }
        session.save(&state).unwrap();

        let format = OutputFormat::new(Format::Json);
        let mut out = Vec::new();
        QueryCommand::new(&session).ledger(&mut out, &format, None, 2).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn status_digest_is_hex() {
        let (_dir, session) = seeded();
        let view = status_view(&session, &session.load().unwrap()).unwrap();
        assert_eq!(view.ledger_digest.len(), 64);
        assert_eq!(view.job_count, 5);
    }

    #[tokio::test]
    async fn report_is_markdown() {
        let (_dir, session) = seeded();
        let mut out = Vec::new();
        QueryCommand::new(&session)
            .report(&mut out, &OutputFormat::default())
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# ARWEEN Compliance Report"));
    }
}
