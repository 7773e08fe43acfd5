use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triago_core::{
    import_tickets, load_config, validate_config, AnalyzedDirectory, Coordinator,
    HttpTicketService, NewTicket, RunDirectory, RunEvent, RunId, TicketDirectory, TicketId,
    TicketService,
};

#[derive(Parser)]
#[command(name = "triago", version, about = "Support ticket analysis client")]
struct Cli {
    /// Configuration file (default: $TRIAGO_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tickets that are ready to analyze
    Tickets {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List analyzed tickets with their results
    Analyzed {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List analysis runs
    Runs {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one analysis run with per-ticket results
    Show { run_id: RunId },
    /// Create a ticket
    Create { title: String, description: String },
    /// Import tickets from a CSV file (title,description rows)
    Import { file: PathBuf },
    /// Submit an analysis run and follow it to completion
    Submit {
        /// Ticket ids to analyze (omit and pass --all for every ready ticket)
        ids: Vec<TicketId>,
        /// Analyze all currently ready tickets
        #[arg(long)]
        all: bool,
    },
    /// Recover in-flight runs after a restart and follow them
    Watch,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Determine config path
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("TRIAGO_CONFIG").map(PathBuf::from).ok())
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {config_path:?}"))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Using ticket service at {}", config.service.base_url);

    let service: Arc<dyn TicketService> = Arc::new(HttpTicketService::new(&config.service));
    let tickets = Arc::new(TicketDirectory::new(
        Arc::clone(&service),
        config.directory.ticket_page_size,
    ));
    let analyzed = Arc::new(AnalyzedDirectory::new(
        Arc::clone(&service),
        config.directory.analyzed_page_size,
    ));
    let runs = Arc::new(RunDirectory::new(
        Arc::clone(&service),
        config.directory.run_page_size,
    ));
    let coordinator = Coordinator::new(
        config.coordinator.clone(),
        Arc::clone(&service),
        Arc::clone(&tickets),
        Arc::clone(&analyzed),
    );

    match cli.command {
        Command::Tickets { page } => {
            tickets.load_page(page).await;
            if let Some(error) = tickets.error().await {
                anyhow::bail!("Failed to load tickets: {error}");
            }
            let items = tickets.visible_tickets().await;
            if items.is_empty() {
                println!("No ready tickets on page {page}.");
            }
            for ticket in items {
                println!(
                    "#{:<6} {:<40} {}",
                    ticket.id,
                    truncate(&ticket.title, 40),
                    ticket.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            if tickets.has_more().await {
                println!("(more on page {})", page + 1);
            }
        }

        Command::Analyzed { page } => {
            analyzed.load_page(page).await;
            if let Some(error) = analyzed.error().await {
                anyhow::bail!("Failed to load analyzed tickets: {error}");
            }
            for ticket in analyzed.tickets().await {
                println!(
                    "#{:<6} [{:<6}] {:<16} {}",
                    ticket.id,
                    format!("{:?}", ticket.priority).to_lowercase(),
                    truncate(&ticket.category, 16),
                    truncate(&ticket.title, 40)
                );
            }
            if analyzed.has_more().await {
                println!("(more on page {})", page + 1);
            }
        }

        Command::Runs { page } => {
            runs.load_page(page).await;
            if let Some(error) = runs.error().await {
                anyhow::bail!("Failed to load runs: {error}");
            }
            for run in runs.runs().await {
                println!(
                    "run {:<6} {} tickets={:<4} {}",
                    run.id,
                    run.created_at.format("%Y-%m-%d %H:%M"),
                    run.ticket_count,
                    run.summary.as_deref().unwrap_or("-")
                );
            }
            if runs.has_more().await {
                println!("(more on page {})", page + 1);
            }
        }

        Command::Show { run_id } => {
            let run = runs
                .run_detail(run_id)
                .await
                .with_context(|| format!("Failed to fetch run {run_id}"))?;
            println!(
                "run {} [{}] created {}",
                run.id,
                run.status.as_str(),
                run.created_at.format("%Y-%m-%d %H:%M")
            );
            if let Some(summary) = &run.summary {
                println!("summary: {summary}");
            }
            for analysis in &run.ticket_analyses {
                println!(
                    "  ticket #{:<6} [{:<6}] {:<16} {}",
                    analysis.ticket_id,
                    format!("{:?}", analysis.priority).to_lowercase(),
                    truncate(&analysis.category, 16),
                    analysis.notes.as_deref().unwrap_or("-")
                );
            }
        }

        Command::Create { title, description } => {
            let created = tickets
                .create_tickets(vec![NewTicket::new(title, description)])
                .await
                .context("Failed to create ticket")?;
            println!("Created ticket #{}", created[0].id);
        }

        Command::Import { file } => {
            let input = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {file:?}"))?;
            let report = import_tickets(&service, &input)
                .await
                .context("Import failed")?;
            println!(
                "Imported {} tickets ({} rows skipped).",
                report.created.len(),
                report.skipped.len()
            );
            for skipped in &report.skipped {
                println!("  line {}: {}", skipped.line, skipped.reason);
            }
        }

        Command::Submit { ids, all } => {
            tickets.load_page(1).await;
            let run_id = if all || ids.is_empty() {
                coordinator
                    .submit_all()
                    .await
                    .context("Failed to submit analysis run")?
            } else {
                let visible = tickets.visible_tickets().await;
                for id in &ids {
                    if !visible.iter().any(|t| t.id == *id) {
                        anyhow::bail!("Ticket {id} is not in the ready set");
                    }
                    tickets.toggle_selection(*id).await;
                }
                coordinator
                    .submit_selected()
                    .await
                    .context("Failed to submit analysis run")?
            };
            println!("Submitted analysis run {run_id}.");
            follow_runs(&coordinator, Some(run_id)).await?;
        }

        Command::Watch => {
            let report = coordinator.recover().await;
            println!(
                "Recovered {} runs ({} tickets in flight).",
                report.runs_resumed, report.tickets_reclaimed
            );
            if report.runs_resumed == 0 {
                return Ok(());
            }
            follow_runs(&coordinator, None).await?;
        }
    }

    Ok(())
}

/// Follow run events until the given run (or every tracked run) reaches a
/// terminal state, or until Ctrl+C.
async fn follow_runs(coordinator: &Coordinator, only: Option<RunId>) -> Result<()> {
    let mut events = coordinator.subscribe();

    loop {
        // Check before waiting: the run may already be done, with its event
        // published before this subscription existed.
        let done = match only {
            Some(run_id) => !coordinator.is_polling(run_id).await,
            None => coordinator.status().await.active_runs == 0,
        };
        if done {
            return Ok(());
        }

        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("Interrupted; stopping pollers.");
                coordinator.stop_all().await;
                return Ok(());
            }
            event = events.recv() => {
                match event {
                    Ok(RunEvent::Completed { run_id }) => {
                        println!("Run {run_id} completed.");
                    }
                    Ok(RunEvent::Failed { run_id, error }) => {
                        println!("Run {run_id} failed: {error}");
                    }
                    Err(_) => return Ok(()),
                }
            }
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
