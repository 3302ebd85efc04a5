//! # Mailchimp Sync CLI
//!
//! Command-line front end for the "Sync Contacts" form: plans and runs a sync
//! against the CRM database, resumes an aborted or partial run, and prints
//! the status counts of the latest run.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mailchimp_sync::config::SyncConfig;
use mailchimp_sync::constants::NOTHING_TO_SYNC_MESSAGE;
use mailchimp_sync::database::{
    ContactStore, DatabaseConnection, PgContactStore, PgSyncStatusStore, SyncStatusStore,
};
use mailchimp_sync::form::{state_param, FormOutcome, SyncForm, SUBMIT_LABEL};
use mailchimp_sync::logging::init_structured_logging;
use mailchimp_sync::mailchimp::MailchimpClient;
use mailchimp_sync::messaging::{PgWorkQueue, WorkQueue};
use mailchimp_sync::models::SyncStats;
use mailchimp_sync::orchestration::{RunOutcome, StepOutcome, SyncService};
use mailchimp_sync::planner;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mailchimp-sync")]
#[command(about = "Sync CRM group members to Mailchimp lists")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (default: config/mailchimp-sync.yaml if present)
    #[arg(short, long, env = "MCSYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan a fresh run, enqueue every batch and run them ("Sync Contacts")
    Sync,

    /// Continue with the tasks left in the queue
    Resume {
        /// Run only the next task
        #[arg(long)]
        step: bool,
    },

    /// Show the batches a run would enqueue without touching anything
    Plan,

    /// Show the counts of the latest run
    Stats,

    /// Create the sync tables
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = SyncConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_structured_logging(&config.logging);

    let connection = DatabaseConnection::new(&config.database)
        .await
        .context("connecting to the database")?;
    let pool = connection.pool().clone();
    let contacts = Arc::new(PgContactStore::new(pool.clone()));

    match cli.command {
        Commands::Migrate => {
            connection.migrate().await?;
            println!("Sync tables are up to date");
        }
        Commands::Plan => {
            let total = contacts.member_count_for_groups_to_sync().await?;
            let tasks = planner::plan(total, config.sync.batch_size)?;
            if tasks.is_empty() {
                println!("{NOTHING_TO_SYNC_MESSAGE}");
            }
            for task in tasks {
                println!("offset {:>6}  {}", task.offset, task.label);
            }
        }
        Commands::Stats => {
            let stats = PgSyncStatusStore::new(pool.clone()).stats().await?;
            print_stats(&stats);
        }
        Commands::Sync => {
            let service = build_service(&config, contacts, pool.clone())?;
            let form = SyncForm::new(&service);

            println!("{SUBMIT_LABEL}");
            match form.post_process().await? {
                FormOutcome::Notice(message) => println!("{message}"),
                FormOutcome::Ran(outcome) => finish(&form, &outcome).await?,
            }
        }
        Commands::Resume { step: true } => {
            let service = build_service(&config, contacts, pool.clone())?;
            match service.run_next().await? {
                StepOutcome::QueueEmpty => println!("Queue is empty"),
                StepOutcome::Completed(run) => {
                    println!("{}: completed", run.task.label);
                    println!("{} task(s) left", service.queue().len().await?);
                }
                StepOutcome::Failed(run) => {
                    bail!("{}: {}", run.task.label, run.error.unwrap_or_default())
                }
            }
        }
        Commands::Resume { step: false } => {
            let service = build_service(&config, contacts, pool.clone())?;
            let outcome = service.run().await?;
            finish(&SyncForm::new(&service), &outcome).await?;
        }
    }

    connection.close().await;
    Ok(())
}

fn build_service(
    config: &SyncConfig,
    contacts: Arc<PgContactStore>,
    pool: PgPool,
) -> anyhow::Result<SyncService<PgWorkQueue>> {
    let api = MailchimpClient::new(&config.mailchimp).context("creating Mailchimp client")?;

    Ok(SyncService::new(
        contacts,
        Arc::new(api),
        Arc::new(PgSyncStatusStore::new(pool.clone())),
        PgWorkQueue::new(pool, &config.sync.queue_name),
        config,
    ))
}

async fn finish<Q: WorkQueue>(form: &SyncForm<'_, Q>, outcome: &RunOutcome) -> anyhow::Result<()> {
    for run in &outcome.completed {
        println!("{}: completed", run.task.label);
    }
    for run in &outcome.failed {
        println!("{}: failed: {}", run.task.label, run.error.as_deref().unwrap_or(""));
    }

    let state = outcome.end_url.as_deref().and_then(state_param);
    if let Some(stats) = form.pre_process(state.as_deref()).await?
    {
        print_stats(&stats);
    }

    if outcome.aborted {
        bail!(
            "{} aborted: {}",
            outcome.title,
            outcome.abort_reason().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_stats(stats: &SyncStats) {
    println!("Added:   {}", stats.added);
    println!("Updated: {}", stats.updated);
    println!("Errors:  {}", stats.errors);
}
