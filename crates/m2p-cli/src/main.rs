//! m2p entry point.
//!
//! This file is intentionally thin: it loads the environment, sets up
//! tracing, builds the repositories from the two database pools and hands
//! control to `m2p_reconcile::SyncEngine`. The job runs to completion; the
//! external scheduler owns periodicity, timeout and retry.

use anyhow::Result;
use clap::{Parser, Subcommand};

use m2p_db::{MesDb, PlusDb};
use m2p_reconcile::{BatchOutcome, RunReport, SyncConfig, SyncEngine};

#[derive(Parser)]
#[command(name = "m2p")]
#[command(about = "MES → PLUS serial-number reconciliation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass over recently updated MES batches
    Sync {
        /// Window start, days before now (default 2)
        #[arg(long)]
        back_days: Option<i64>,

        /// Window end, days after now (default 1)
        #[arg(long)]
        forward_days: Option<i64>,

        /// MES inventory category id (default 270)
        #[arg(long)]
        category: Option<i64>,

        /// Abort the run (non-zero exit) on the first failed reimport
        /// transaction instead of logging it and continuing
        #[arg(long, default_value_t = false)]
        fail_on_reimport_error: bool,

        /// Print the run report as JSON instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Print the canonical order code extracted from a raw order string
    Extract {
        /// Raw order string as stored in MES
        raw: String,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Probe connectivity of both databases
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Sync {
            back_days,
            forward_days,
            category,
            fail_on_reimport_error,
            json,
        } => {
            let mut config = SyncConfig::default();
            if let Some(d) = back_days {
                config.back_days = d;
            }
            if let Some(d) = forward_days {
                config.forward_days = d;
            }
            if let Some(id) = category {
                config.category_id = id;
            }
            config.fail_on_reimport_error = fail_on_reimport_error;

            let mes_pool = m2p_db::connect_mes_from_env().await?;
            let plus_pool = m2p_db::connect_plus_from_env().await?;

            let upstream = MesDb::new(mes_pool, config.category_id);
            let downstream = PlusDb::new(
                plus_pool,
                config.import_source.clone(),
                config.entered_by.clone(),
            );

            let engine = SyncEngine::new(upstream, downstream, config);
            let report = engine.run().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Db { cmd } => match cmd {
            DbCmd::Check => {
                let mes_pool = m2p_db::connect_mes_from_env().await?;
                let plus_pool = m2p_db::connect_plus_from_env().await?;
                println!("mes_ok={}", m2p_db::ping(&mes_pool).await?);
                println!("plus_ok={}", m2p_db::ping(&plus_pool).await?);
            }
        },

        Commands::Extract { raw } => {
            println!("order_code={}", m2p_ordercode::extract(&raw));
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn print_report(report: &RunReport) {
    for b in &report.batches {
        println!(
            "batch_id={} task={} order={} {}",
            b.batch_id,
            b.task_code.as_deref().unwrap_or("-"),
            b.order_code,
            outcome_line(&b.outcome),
        );
    }
    println!(
        "processed={} reimported={} in_sync={} movement_locked={} failed={}",
        report.processed(),
        report.reimported(),
        report.in_sync(),
        report.movement_locked(),
        report.failed(),
    );
}

fn outcome_line(outcome: &BatchOutcome) -> String {
    match outcome {
        BatchOutcome::Reimported { deleted, inserted } => {
            format!("outcome=reimported deleted={deleted} inserted={inserted}")
        }
        BatchOutcome::InSync => "outcome=in_sync".to_string(),
        BatchOutcome::MovementLocked { incoming, outgoing } => {
            format!("outcome=movement_locked incoming={incoming} outgoing={outgoing}")
        }
        BatchOutcome::Failed { error } => format!("outcome=failed error={error:?}"),
    }
}
