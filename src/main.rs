use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use draftdesk::cost::format_usd;
use draftdesk::drafting::JobRequest;
use draftdesk::queue::{TaskQueue, TokioClock};
use draftdesk::runtime::archetypes;
use draftdesk::store::FileStateStore;
use draftdesk::toolkit::{score_tool, SelectionRequest};
use draftdesk::{server, WorkspaceConfig, WorkspaceController, WorkspaceError};

/// Exit status for rejected operator input (unknown ids, invalid documents,
/// unmet gates). Other failures exit with 1.
const EXIT_OPERATOR_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "draftdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./draftdesk.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State document path, overriding the configuration
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the workspace over HTTP
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the rendered workspace as JSON
    Show,

    /// Replace all beats with those in a job file
    Submit {
        /// JSON file of the form {"beats": [...]}
        file: PathBuf,
    },

    /// Print the prompt a draft would be generated from
    Prompt {
        beat_id: String,

        /// Donor option id to borrow style from
        #[arg(short, long)]
        donor: Option<String>,

        #[arg(short, long, default_value = "")]
        instruction: String,
    },

    /// Generate a new draft for a beat and select it
    Draft {
        beat_id: String,

        #[arg(short, long)]
        donor: Option<String>,

        #[arg(short, long, default_value = "")]
        instruction: String,
    },

    /// Select (or roll back to) a version of a beat
    Select { beat_id: String, version_id: String },

    /// Estimate the cost of a call with the configured pricing
    Cost {
        input_tokens: u64,
        output_tokens: u64,
    },

    /// Select comedic tools by tag and keep them as the working selection
    Tools {
        /// Catalog tags to favour, e.g. satire or timing
        tags: Vec<String>,

        /// Visual texture words, comma or space separated
        #[arg(short, long, default_value = "")]
        texture: String,

        /// Draw from the middle of the ranking
        #[arg(long)]
        contrarian: bool,

        /// Seed for the contrarian shuffle
        #[arg(long)]
        seed: Option<u64>,

        #[arg(short, long, default_value_t = 8)]
        limit: usize,
    },

    /// List archetypes, or lay the beats out from one
    Archetype {
        /// Archetype to apply; lists all when omitted
        name: Option<String>,
    },

    /// Print the runtime of each beat against the budget
    Runtime,
}

fn open_controller(config: &WorkspaceConfig) -> Result<WorkspaceController> {
    let queue = TaskQueue::new(config.queue.clone(), Arc::new(TokioClock::new())).into_shared();
    let store = Arc::new(FileStateStore::new(config.state_path.clone()));
    WorkspaceController::open(config, store, queue).with_context(|| {
        format!(
            "failed to open workspace state at {}",
            config.state_path.display()
        )
    })
}

async fn ensure_synced(controller: &WorkspaceController) -> Result<()> {
    controller.flush().await;
    if let Some(failure) = controller.sync_failures().last() {
        bail!("change applied but not saved: {}", failure.message);
    }
    Ok(())
}

fn cmd_show(config: &WorkspaceConfig) -> Result<()> {
    let controller = open_controller(config)?;
    let view = controller.view()?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

async fn cmd_submit(config: &WorkspaceConfig, file: &Path) -> Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let job: JobRequest = serde_json::from_str(&content).context("invalid job file")?;

    let mut controller = open_controller(config)?;
    let count = controller.submit_job(job)?.beats.len();
    ensure_synced(&controller).await?;
    println!("Submitted {} beat(s)", count);
    Ok(())
}

fn cmd_prompt(
    config: &WorkspaceConfig,
    beat_id: &str,
    donor: Option<&str>,
    instruction: &str,
) -> Result<()> {
    let controller = open_controller(config)?;
    println!("{}", controller.preview_prompt(beat_id, donor, instruction)?);
    Ok(())
}

async fn cmd_draft(
    config: &WorkspaceConfig,
    beat_id: &str,
    donor: Option<&str>,
    instruction: &str,
) -> Result<()> {
    let mut controller = open_controller(config)?;
    let version = controller.draft(beat_id, donor, instruction).await?;
    ensure_synced(&controller).await?;
    println!("{}", serde_json::to_string_pretty(&version)?);
    Ok(())
}

async fn cmd_select(config: &WorkspaceConfig, beat_id: &str, version_id: &str) -> Result<()> {
    let mut controller = open_controller(config)?;
    let version = controller.select_version(beat_id, version_id)?;
    ensure_synced(&controller).await?;
    println!("Selected {} for {}", version.id, beat_id);
    Ok(())
}

fn cmd_cost(config: &WorkspaceConfig, input_tokens: u64, output_tokens: u64) {
    let breakdown = config.pricing.cost(input_tokens, output_tokens);
    println!("Pricing:       {}", config.pricing.model_name);
    println!(
        "Input tokens:  {} ({})",
        input_tokens,
        format_usd(breakdown.input_cost)
    );
    println!(
        "Output tokens: {} ({})",
        output_tokens,
        format_usd(breakdown.output_cost)
    );
    println!("Total:         {}", format_usd(breakdown.total));
}

async fn cmd_tools(config: &WorkspaceConfig, request: SelectionRequest) -> Result<()> {
    let mut controller = open_controller(config)?;
    let tools = controller.select_tools(request.clone());
    ensure_synced(&controller).await?;
    for tool in &tools {
        println!(
            "{:<28} {:<26} {:>4.1}",
            tool.id,
            tool.name,
            score_tool(tool, &request)
        );
    }
    Ok(())
}

async fn cmd_archetype(config: &WorkspaceConfig, name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        for archetype in archetypes() {
            println!(
                "{} ({}s): {}",
                archetype.name,
                archetype.suggested_total_secs(),
                archetype.description
            );
        }
        return Ok(());
    };

    let mut controller = open_controller(config)?;
    let titles: Vec<String> = controller
        .apply_archetype(name)?
        .beats
        .iter()
        .map(|beat| beat.title.clone())
        .collect();
    ensure_synced(&controller).await?;
    println!("Laid out {} beat(s): {}", titles.len(), titles.join(", "));
    Ok(())
}

fn cmd_runtime(config: &WorkspaceConfig) -> Result<()> {
    let controller = open_controller(config)?;
    let summary = controller.runtime_summary();
    for beat in &summary.beats {
        println!(
            "{:<16} {:>7.1}s {:>8.1}s{}",
            beat.beat_id,
            beat.total_secs,
            beat.cumulative_secs,
            if beat.over_budget { "  over budget" } else { "" }
        );
    }
    println!(
        "Total: {:.1} min of {:.1} min",
        summary.total_minutes(),
        summary.budget_secs / 60.0
    );
    for note in controller.continuity_notes() {
        println!("Note: {}", note);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = WorkspaceConfig::load(cli.config.as_deref())?;
    if let Some(state) = cli.state {
        config = config.with_state_path(state);
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config = config.with_bind_addr(bind);
            }
            server::serve(config).await?;
        }
        Commands::Show => cmd_show(&config)?,
        Commands::Submit { file } => cmd_submit(&config, &file).await?,
        Commands::Prompt {
            beat_id,
            donor,
            instruction,
        } => cmd_prompt(&config, &beat_id, donor.as_deref(), &instruction)?,
        Commands::Draft {
            beat_id,
            donor,
            instruction,
        } => cmd_draft(&config, &beat_id, donor.as_deref(), &instruction).await?,
        Commands::Select {
            beat_id,
            version_id,
        } => cmd_select(&config, &beat_id, &version_id).await?,
        Commands::Cost {
            input_tokens,
            output_tokens,
        } => cmd_cost(&config, input_tokens, output_tokens),
        Commands::Tools {
            tags,
            texture,
            contrarian,
            seed,
            limit,
        } => {
            let mut request = SelectionRequest::new()
                .with_tags(tags)
                .with_visual_texture(texture)
                .with_limit(limit);
            if contrarian {
                request = request.contrarian(seed);
            }
            cmd_tools(&config, request).await?
        }
        Commands::Archetype { name } => cmd_archetype(&config, name.as_deref()).await?,
        Commands::Runtime => cmd_runtime(&config)?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays parseable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        let operator = err
            .downcast_ref::<WorkspaceError>()
            .is_some_and(WorkspaceError::is_operator_error);
        std::process::exit(if operator { EXIT_OPERATOR_ERROR } else { 1 });
    }
}
