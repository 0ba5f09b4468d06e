//! Dossier CLI - drive the reconciliation engine from the terminal.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dossier_engine::{Engine, EngineError};
use dossier_logging::LogConfig;
use dossier_protocol::DocSlot;
use dossier_remote::HttpRemote;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

mod cases;
mod config;
mod output;

use cases::SqliteCaseRepo;
use config::DossierConfig;

#[derive(Parser, Debug)]
#[command(name = "dossier", about = "Case-document reconciliation engine", version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.dossier/dossier.toml)
    #[arg(short, long, global = true, env = "DOSSIER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the remote tree on the configured interval until interrupted
    Run,

    /// Run one reconciliation cycle and exit
    Sync,

    /// List pending suggestions
    Pending {
        /// Only suggestions guessed to belong to this case id
        #[arg(long)]
        case: Option<String>,
    },

    /// Attach a pending suggestion to a case slot
    Link {
        /// Suggestion id (prefix accepted)
        suggestion_id: String,
        case_id: String,
        /// Document slot key, e.g. doc_birth
        slot: String,
        /// Reviewer recorded in the audit trail
        #[arg(long, default_value = "cli")]
        by: String,
        /// Replace a different file already occupying the slot
        #[arg(long)]
        overwrite: bool,
    },

    /// Dismiss a pending suggestion without attaching anything
    Ignore {
        /// Suggestion id (prefix accepted)
        suggestion_id: String,
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "cli")]
        by: String,
    },

    /// Create a case and link the suggestion into it
    LinkNew {
        /// Suggestion id (prefix accepted)
        suggestion_id: String,
        /// Display name for the new case
        case_name: String,
        /// Document slot key, e.g. doc_passport
        slot: String,
        #[arg(long, default_value = "cli")]
        by: String,
    },

    /// Show recent audit entries
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Manage known cases
    Case {
        #[command(subcommand)]
        command: CaseCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CaseCommands {
    /// Register a case under an explicit code
    Add { code: String, display_name: String },
    /// List known cases
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = dossier_logging::init_logging(LogConfig {
        app_name: "dossier",
        verbose: cli.verbose,
    })?;

    let config_path = cli.config.clone().unwrap_or_else(DossierConfig::default_path);
    let config = DossierConfig::load(&config_path)?;

    let database_path = std::path::Path::new(&config.database_path);
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }
    let pool = dossier_store::open_database(database_path)
        .await
        .with_context(|| format!("Failed to open database: {}", config.database_path))?;
    let case_repo = Arc::new(SqliteCaseRepo::new(pool.clone()).await?);
    let remote = Arc::new(HttpRemote::new(
        config.remote.base_url.clone(),
        config.remote.resolved_token(),
    ));
    let engine = Arc::new(Engine::new(
        config.engine.clone(),
        remote,
        case_repo.clone(),
        pool,
    ));

    match cli.command {
        Commands::Run => run_until_interrupted(&engine).await,
        Commands::Sync => {
            let report = engine.sync().await?;
            println!(
                "Discovered {} entries: {} new, {} updated, {} skipped, {} errors",
                report.discovered,
                report.inserted,
                report.updated,
                report.skipped,
                report.errors.len()
            );
            for issue in &report.errors {
                println!("  error: {}: {}", issue.path, issue.message);
            }
            Ok(())
        }
        Commands::Pending { case } => {
            let suggestions = match case {
                Some(case_id) => engine.pending_for_case(&case_id).await?,
                None => engine.pending().await?,
            };
            if suggestions.is_empty() {
                println!("No pending suggestions.");
            } else {
                println!("{}", output::suggestions_table(&suggestions));
            }
            Ok(())
        }
        Commands::Link {
            suggestion_id,
            case_id,
            slot,
            by,
            overwrite,
        } => {
            let id = engine.store().resolve_id_prefix(&suggestion_id).await?;
            let slot = parse_slot(&slot)?;
            match engine.link(&id, &case_id, slot, &by, overwrite).await {
                Ok(()) => {
                    println!("Linked {} to case {} slot {}", output::short_id(&id), case_id, slot);
                    Ok(())
                }
                Err(EngineError::SlotConflict { existing_hash, .. }) => {
                    bail!(
                        "slot {} of case {} already holds a different file (hash {}); \
                         pass --overwrite to replace it",
                        slot,
                        case_id,
                        output::short_id(&existing_hash)
                    )
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Ignore {
            suggestion_id,
            reason,
            by,
        } => {
            let id = engine.store().resolve_id_prefix(&suggestion_id).await?;
            engine.ignore(&id, &reason, &by).await?;
            println!("Ignored {}", output::short_id(&id));
            Ok(())
        }
        Commands::LinkNew {
            suggestion_id,
            case_name,
            slot,
            by,
        } => {
            let id = engine.store().resolve_id_prefix(&suggestion_id).await?;
            let slot = parse_slot(&slot)?;
            let case = engine.link_as_new_case(&id, &case_name, slot, &by).await?;
            println!(
                "Created case {} ({}) and linked {} into slot {}",
                case.code,
                case.display_name,
                output::short_id(&id),
                slot
            );
            Ok(())
        }
        Commands::Audit { limit } => {
            let entries = engine.audit().recent(limit).await?;
            if entries.is_empty() {
                println!("Audit log is empty.");
            } else {
                println!("{}", output::audit_table(&entries));
            }
            Ok(())
        }
        Commands::Case { command } => match command {
            CaseCommands::Add { code, display_name } => {
                let case = case_repo.add_case(&code, &display_name).await?;
                println!("Added case {} ({})", case.code, case.display_name);
                Ok(())
            }
            CaseCommands::List => {
                use dossier_engine::CaseRepository;
                for case in case_repo.list_cases().await? {
                    println!("{}  {}  {}", case.code, case.id, case.display_name);
                }
                Ok(())
            }
        },
    }
}

async fn run_until_interrupted(engine: &Arc<Engine>) -> Result<()> {
    engine.start();
    info!("engine running; press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("shutting down");
    engine.stop().await;

    let stats = engine.store().stats().await?;
    println!(
        "Queue: {} pending, {} linked, {} ignored, {} errored",
        stats.pending, stats.linked, stats.ignored, stats.error
    );
    Ok(())
}

fn parse_slot(raw: &str) -> Result<DocSlot> {
    DocSlot::from_str(raw).map_err(|_| {
        let valid: Vec<&str> = DocSlot::ALL.iter().map(|s| s.as_str()).collect();
        anyhow::anyhow!("unknown slot '{}'; valid slots: {}", raw, valid.join(", "))
    })
}
