//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use arween_core::{Amount, LedgerEntry, Tier, Wallet};
use arween_market::{AppState, Job, Role};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// One party's balance sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletView {
    /// Wallet ID.
    pub id: String,
    /// Owner ID.
    pub owner_id: String,
    /// Spendable balance.
    pub available: Amount,
    /// Funds locked for jobs.
    pub escrow: Amount,
    /// Funds held for active work.
    pub reserved: Amount,
    /// Earnings awaiting settlement.
    pub pending: Amount,
    /// Reputation, 0 to 100.
    pub reputation: u8,
    /// Reputation tier.
    pub tier: Tier,
    /// Carbon points earned.
    pub carbon_points: u64,
    /// Carbon points valued as a tax shield.
    pub carbon_tax_shield: Amount,
    /// Tax withheld so far.
    pub tax_withheld: Amount,
}

impl WalletView {
    /// Builds a view of `wallet`, valuing carbon points at `point_value`.
    #[must_use]
    pub fn new(wallet: &Wallet, point_value: Amount) -> Self {
        Self {
            id: wallet.id().to_string(),
            owner_id: wallet.owner_id().to_string(),
            available: wallet.available(),
            escrow: wallet.escrow(),
            reserved: wallet.reserved(),
            pending: wallet.pending(),
            reputation: wallet.reputation().value(),
            tier: wallet.tier(),
            carbon_points: wallet.carbon_points(),
            carbon_tax_shield: wallet.carbon_tax_shield(point_value),
            tax_withheld: wallet.tax_withheld(),
        }
    }

    fn write_rows<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "  Wallet:         {} ({})", self.id, self.owner_id)?;
        writeln!(writer, "  Available:      {}", self.available)?;
        writeln!(writer, "  Escrow:         {}", self.escrow)?;
        writeln!(writer, "  Reserved:       {}", self.reserved)?;
        writeln!(writer, "  Pending:        {}", self.pending)?;
        writeln!(writer, "  Reputation:     {} ({})", self.reputation, self.tier)?;
        writeln!(
            writer,
            "  Carbon points:  {} (tax shield {})",
            self.carbon_points, self.carbon_tax_shield
        )?;
        writeln!(writer, "  Tax withheld:   {}", self.tax_withheld)?;
        Ok(())
    }
}

/// Overview of the whole snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    /// Acting role.
    pub role: Role,
    /// Operator wallet.
    pub operator: WalletView,
    /// Driver wallet.
    pub driver: WalletView,
    /// Number of jobs.
    pub job_count: usize,
    /// Sum of escrow still held by jobs.
    pub escrow_committed: Amount,
    /// Number of ledger entries.
    pub ledger_entries: usize,
    /// BLAKE3 digest of the ledger.
    pub ledger_digest: String,
}

impl TableDisplay for StatusView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "ARWEEN Status")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Acting role:      {}", self.role)?;
        writeln!(writer)?;
        writeln!(writer, "Operator")?;
        self.operator.write_rows(writer)?;
        writeln!(writer)?;
        writeln!(writer, "Driver")?;
        self.driver.write_rows(writer)?;
        writeln!(writer)?;
        writeln!(writer, "Jobs:             {}", self.job_count)?;
        writeln!(writer, "Escrow committed: {}", self.escrow_committed)?;
        writeln!(writer, "Ledger entries:   {}", self.ledger_entries)?;
        writeln!(writer, "Ledger digest:    {}", self.ledger_digest)?;
        Ok(())
    }
}

/// A list of jobs.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct JobTable {
    /// Jobs, in snapshot order.
    pub jobs: Vec<Job>,
}

impl TableDisplay for JobTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.jobs.is_empty() {
            writeln!(writer, "No jobs.")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<22}  {:<15}  {:>16}  {:>16}  {:>4}  {:<12}  TITLE",
            "ID", "STATE", "VALUE", "ESCROW", "RISK", "DRIVER"
        )?;
        for job in &self.jobs {
            writeln!(
                writer,
                "{:<22}  {:<15}  {:>16}  {:>16}  {:>4}  {:<12}  {}",
                job.id.as_str(),
                job.state.as_str(),
                job.value_total.to_string(),
                job.escrow_outstanding.to_string(),
                job.risk_score,
                job.driver_id.as_deref().unwrap_or("-"),
                job.title,
            )?;
        }
        Ok(())
    }
}

/// Ledger entries, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LedgerTable {
    /// Entries to show.
    pub entries: Vec<LedgerEntry>,
}

impl TableDisplay for LedgerTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.entries.is_empty() {
            writeln!(writer, "No ledger entries.")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<20}  {:<6}  {:>16}  {:<22}  DESCRIPTION",
            "TIME", "KIND", "AMOUNT", "JOB"
        )?;
        for entry in &self.entries {
            writeln!(
                writer,
                "{:<20}  {:<6}  {:>16}  {:<22}  {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.kind.to_string(),
                entry.amount.to_string(),
                entry.related_job_id.as_deref().unwrap_or("-"),
                entry.description,
            )?;
        }
        Ok(())
    }
}

/// What a committed command changed.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// Action that committed.
    pub action: &'static str,
    /// Job affected, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
    /// Acting role afterwards.
    pub role: Role,
    /// Operator spendable balance afterwards.
    pub operator_available: Amount,
    /// Operator escrow afterwards.
    pub operator_escrow: Amount,
    /// Driver spendable balance afterwards.
    pub driver_available: Amount,
    /// Driver pending balance afterwards.
    pub driver_pending: Amount,
    /// Ledger entries the command recorded, newest first.
    pub recorded: Vec<LedgerEntry>,
}

impl Receipt {
    /// Describes the step from `before` to `after`.
    #[must_use]
    pub fn between(action: &'static str, job: Option<&str>, before: &AppState, after: &AppState) -> Self {
        let added = after.ledger.len().saturating_sub(before.ledger.len());
        Self {
            action,
            job: job.and_then(|id| after.jobs.iter().find(|j| j.id.as_str() == id).cloned()),
            role: after.current_role,
            operator_available: after.operator_wallet.available(),
            operator_escrow: after.operator_wallet.escrow(),
            driver_available: after.driver_wallet.available(),
            driver_pending: after.driver_wallet.pending(),
            recorded: after.ledger.entries().take(added).cloned().collect(),
        }
    }
}

impl TableDisplay for Receipt {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ {}", self.action)?;
        if let Some(job) = &self.job {
            writeln!(writer, "  Job:                {} [{}]", job.id, job.state)?;
        }
        writeln!(writer, "  Role:               {}", self.role)?;
        writeln!(writer, "  Operator available: {}", self.operator_available)?;
        writeln!(writer, "  Operator escrow:    {}", self.operator_escrow)?;
        writeln!(writer, "  Driver available:   {}", self.driver_available)?;
        writeln!(writer, "  Driver pending:     {}", self.driver_pending)?;
        for entry in &self.recorded {
            writeln!(writer, "  + {} {} {}", entry.kind, entry.amount, entry.description)?;
        }
        Ok(())
    }
}

/// Free-form text such as a report or advice.
#[derive(Debug, Clone, Serialize)]
pub struct TextBlock {
    /// Role the text was produced for.
    pub role: Role,
    /// The text.
    pub body: String,
}

impl TableDisplay for TextBlock {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.body.trim_end())?;
        Ok(())
    }
}
