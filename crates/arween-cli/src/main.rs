//! ARWEEN CLI binary entrypoint.
//!
//! This is the main entry point for the `arween` command-line tool.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arween_cli::cli::{Cli, Commands};
use arween_cli::commands::{InitCommand, QueryCommand, Session, Step, TransitionCommand};
use arween_cli::output::OutputFormat;
use arween_market::{Intent, JobDraft, JobId};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let session = Session::open(&cli.state, cli.config.as_deref())
        .context("failed to open session")?
        .with_audit(!cli.no_audit);
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();
    let query = QueryCommand::new(&session);

    let step = match cli.command {
        Commands::Init { force } => {
            InitCommand::new(&session).execute(&mut stdout, &format, force)?;
            return Ok(());
        }
        Commands::Status => return Ok(query.status(&mut stdout, &format)?),
        Commands::Jobs { filter } => return Ok(query.jobs(&mut stdout, &format, filter.as_deref())?),
        Commands::Ledger { job, limit } => {
            return Ok(query.ledger(&mut stdout, &format, job.as_deref(), limit)?);
        }
        Commands::Stalled => return Ok(query.stalled(&mut stdout, &format)?),
        Commands::Report => return Ok(query.report(&mut stdout, &format).await?),
        Commands::Advice => return Ok(query.advice(&mut stdout, &format).await?),

        Commands::CreateJob(args) => {
            let mut draft = JobDraft::new(args.title, args.origin, args.destination, args.value)
                .with_carbon_credits(args.carbon);
            if let Some(risk) = args.risk {
                draft = draft.with_risk_score(risk);
            }
            Step::Intent(Intent::CreateJob(draft))
        }
        Commands::Fund { job_id } => Step::Intent(Intent::FundJob(JobId::new(job_id))),
        Commands::Accept { job_id, driver } => {
            let driver_id = match driver {
                Some(id) => id,
                None => session.load()?.driver_wallet.owner_id().to_string(),
            };
            Step::Intent(Intent::AcceptJob {
                job_id: JobId::new(job_id),
                driver_id,
            })
        }
        Commands::Pickup(args) => Step::Pickup {
            job_id: JobId::new(args.job_id),
            reject: args.reject,
        },
        Commands::Deliver(args) => Step::Deliver {
            job_id: JobId::new(args.job_id),
            reject: args.reject,
        },
        Commands::Settle => Step::Intent(Intent::SettleDriverFunds),
        Commands::Dispute { job_id, reason } => Step::Intent(Intent::RaiseDispute {
            job_id: JobId::new(job_id),
            reason,
        }),
        Commands::Resolve { job_id, ruling } => Step::Intent(Intent::ResolveDispute {
            job_id: JobId::new(job_id),
            ruling: ruling.into(),
        }),
        Commands::TopUp { amount } => Step::Intent(Intent::TopUp(amount)),
        Commands::Withdraw { amount } => Step::Intent(Intent::Withdraw(amount)),
        Commands::Role { role } => Step::Intent(Intent::SwitchRole(role.into())),
    };

    TransitionCommand::new(&session)
        .execute(&mut stdout, &format, step)
        .await?;
    Ok(())
}
