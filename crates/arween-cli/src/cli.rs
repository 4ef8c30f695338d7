//! Command-line argument parsing with clap.

use std::path::PathBuf;

use arween_core::Amount;
use arween_market::{DisputeRuling, Role};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// ARWEEN - logistics marketplace escrow and ledger.
#[derive(Parser, Debug, Clone)]
#[command(name = "arween")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Snapshot file holding the marketplace state.
    #[arg(short, long, env = "ARWEEN_STATE", default_value = "arween-state.json")]
    pub state: PathBuf,

    /// JSON file overriding fee, tax and compliance constants.
    #[arg(short, long, env = "ARWEEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Skip the audit trail for this run.
    #[arg(long, env = "ARWEEN_NO_AUDIT")]
    pub no_audit: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a seeded demo snapshot.
    Init {
        /// Overwrite an existing snapshot.
        #[arg(long)]
        force: bool,
    },

    /// Show both wallets and the acting role.
    Status,

    /// List jobs.
    Jobs {
        /// Only jobs in this state (e.g. FUNDED, phase1_paid).
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show ledger entries, newest first.
    Ledger {
        /// Only entries for this job.
        #[arg(long)]
        job: Option<String>,

        /// Maximum number of entries.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Post a new job (operator).
    CreateJob(CreateJobArgs),

    /// Lock a job's value in escrow (operator).
    Fund {
        /// Job ID.
        job_id: String,
    },

    /// Take a funded job (driver).
    Accept {
        /// Job ID.
        job_id: String,

        /// Driver ID; defaults to the driver wallet's owner.
        #[arg(long)]
        driver: Option<String>,
    },

    /// Submit pickup proof, then release phase 1.
    Pickup(ProofArgs),

    /// Submit delivery proof, then complete and release phase 2.
    Deliver(ProofArgs),

    /// Clear the driver's pending balance (T+1).
    Settle,

    /// Freeze a job for arbitration.
    Dispute {
        /// Job ID.
        job_id: String,

        /// Why the job is disputed.
        #[arg(short, long)]
        reason: String,
    },

    /// Arbitrate a disputed job.
    Resolve {
        /// Job ID.
        job_id: String,

        /// Outcome of the arbitration.
        #[arg(long, value_enum)]
        ruling: RulingArg,
    },

    /// Add funds to the operator wallet.
    TopUp {
        /// Amount in THB, up to two decimals.
        amount: Amount,
    },

    /// Withdraw funds from the operator wallet.
    Withdraw {
        /// Amount in THB, up to two decimals.
        amount: Amount,
    },

    /// Switch the acting role.
    Role {
        /// Role to act as.
        #[arg(value_enum)]
        role: RoleArg,
    },

    /// Compliance report for the acting role.
    Report,

    /// Advice for the acting role.
    Advice,

    /// Jobs waiting between a verification and its payout.
    Stalled,
}

/// Arguments for `create-job`.
#[derive(Args, Debug, Clone)]
pub struct CreateJobArgs {
    /// Cargo description.
    #[arg(long)]
    pub title: String,

    /// Pickup location.
    #[arg(long)]
    pub origin: String,

    /// Drop-off location.
    #[arg(long)]
    pub destination: String,

    /// Contract value in THB.
    #[arg(long)]
    pub value: Amount,

    /// Risk score, 0 to 100.
    #[arg(long)]
    pub risk: Option<u8>,

    /// Carbon points awarded on completion.
    #[arg(long, default_value_t = 0)]
    pub carbon: u64,
}

/// Arguments for `pickup` and `deliver`.
#[derive(Args, Debug, Clone)]
pub struct ProofArgs {
    /// Job ID.
    pub job_id: String,

    /// Reject the proof with this reason instead of accepting it.
    #[arg(long, value_name = "REASON")]
    pub reject: Option<String>,
}

/// Role as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Posts and funds jobs.
    Operator,
    /// Accepts and carries jobs.
    Driver,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Operator => Self::Operator,
            RoleArg::Driver => Self::Driver,
        }
    }
}

/// Dispute ruling as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RulingArg {
    /// Return remaining escrow to the operator.
    Refund,
    /// Pay remaining escrow, less fee, to the driver.
    Payout,
}

impl From<RulingArg> for DisputeRuling {
    fn from(arg: RulingArg) -> Self {
        match arg {
            RulingArg::Refund => Self::Refund,
            RulingArg::Payout => Self::Payout,
        }
    }
}
