mod config;
mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mirror_core::Responder;
use mirror_store::InteractionLog;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::{Overrides, Settings};

/// Inputs the demonstration runs through, one per built-in category.
const DEMO_INPUTS: &[&str] = &[
    "I am more enlightened than most people and they are chosen to suffer",
    "Why me? It is so unfair, everyone else is to blame",
    "I am afraid and anxious about what comes next",
    "Everything must be perfect, I should be in control",
    "I feel gratitude and love for my friends",
    "I trust the process and let go",
    "",
];

#[derive(Parser)]
#[command(name = "mirror", about = "Keyword pattern-match responder CLI and HTTP server")]
struct Cli {
    /// Category table file (TOML) instead of the built-in table
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, e.g. 127.0.0.1:8528
        #[arg(long)]
        addr: Option<String>,

        /// Seed for phrase selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show which category a text falls into, with every score
    Classify {
        /// Text to classify
        text: String,

        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reply to a text and append it to the interaction log
    Respond {
        /// Text to reply to
        text: String,

        /// Name to address
        #[arg(long)]
        name: Option<String>,

        /// Seed for phrase selection
        #[arg(long)]
        seed: Option<u64>,

        /// Do not write to the interaction log
        #[arg(long)]
        no_log: bool,
    },

    /// Run the demonstration sequence (nothing is logged)
    Demo {
        /// Seed for phrase selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the active categories
    Categories {
        /// Print the table as TOML, suitable for --table
        #[arg(long)]
        toml: bool,
    },

    /// Show interaction log statistics
    Stats,

    /// Show recent logged interactions
    History {
        /// Number of interactions to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Export the interaction log to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_settings(cli: &Cli, addr: Option<&str>, seed: Option<u64>) -> Result<Settings> {
    Settings::load(Overrides {
        table: cli.table.clone(),
        addr: addr.map(str::to_string),
        seed,
    })
    .context("failed to load settings")
}

fn open_log(settings: &Settings) -> Result<InteractionLog> {
    let path = settings.log_path();
    InteractionLog::open(&path)
        .with_context(|| format!("failed to open interaction log {}", path.display()))
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve { addr, seed } => cmd_serve(&cli, addr.as_deref(), *seed).await,
        Commands::Classify { text, json } => cmd_classify(&cli, text, *json),
        Commands::Respond {
            text,
            name,
            seed,
            no_log,
        } => cmd_respond(&cli, text, name.as_deref(), *seed, *no_log),
        Commands::Demo { seed } => cmd_demo(&cli, *seed),
        Commands::Categories { toml } => cmd_categories(&cli, *toml),
        Commands::Stats => cmd_stats(&cli),
        Commands::History { limit } => cmd_history(&cli, *limit),
        Commands::Export { path } => cmd_export(&cli, path),
    }
}

async fn cmd_serve(cli: &Cli, addr: Option<&str>, seed: Option<u64>) -> Result<()> {
    let settings = load_settings(cli, addr, seed)?;
    let responder = settings.build_responder()?;
    let log = open_log(&settings)?;
    tracing::info!(
        "serving {} categories, logging to {}",
        responder.table().len(),
        settings.log_path().display()
    );

    let state = server::AppState::new(responder, log, make_rng(settings.seed));
    server::run(state, &settings.addr).await
}

fn cmd_classify(cli: &Cli, text: &str, json: bool) -> Result<()> {
    let settings = load_settings(cli, None, None)?;
    let responder = settings.build_responder()?;
    let classification = responder.classify(text);

    if json {
        let out = serde_json::to_string_pretty(&classification)
            .context("failed to serialize classification")?;
        println!("{out}");
        return Ok(());
    }

    if classification.is_default {
        println!(
            "category: {} (default, no keywords matched)",
            classification.category
        );
    } else {
        println!(
            "category: {} (score {:.2})",
            classification.category, classification.score
        );
    }
    let width = classification
        .scores
        .iter()
        .map(|s| s.category.len())
        .max()
        .unwrap_or(0);
    for s in &classification.scores {
        println!("  {:<width$}  {:.2}", s.category, s.score);
    }
    Ok(())
}

fn cmd_respond(
    cli: &Cli,
    text: &str,
    name: Option<&str>,
    seed: Option<u64>,
    no_log: bool,
) -> Result<()> {
    let settings = load_settings(cli, None, seed)?;
    let responder = settings.build_responder()?;
    let mut rng = make_rng(settings.seed);
    let response = responder.respond(text, name, &mut rng);

    println!("{}", response.message);

    if cli.verbose {
        eprintln!(
            "--- category={}, tone={}, score={:.2} ---",
            response.category, response.tone, response.score
        );
    }

    if !no_log {
        let log = open_log(&settings)?;
        log.append(text, &response)
            .context("failed to append to interaction log")?;
    }
    Ok(())
}

fn cmd_demo(cli: &Cli, seed: Option<u64>) -> Result<()> {
    let settings = load_settings(cli, None, seed)?;
    let responder = settings.build_responder()?;
    let mut rng = make_rng(settings.seed);
    run_demo(&responder, &mut rng);
    Ok(())
}

fn run_demo(responder: &Responder, rng: &mut SmallRng) {
    for input in DEMO_INPUTS {
        let response = responder.respond(input, None, rng);
        let shown = if input.is_empty() { "(empty)" } else { input };
        println!("> {shown}");
        println!(
            "[{} {} {:.2}] {}",
            response.category, response.tone, response.score, response.message
        );
        println!();
    }
}

fn cmd_categories(cli: &Cli, as_toml: bool) -> Result<()> {
    let settings = load_settings(cli, None, None)?;
    let table = settings.load_table()?;

    if as_toml {
        let out = mirror_store::table_to_toml(&table).context("failed to encode table")?;
        print!("{out}");
        return Ok(());
    }

    let default = table.default_category().name();
    for cat in table.categories() {
        let marker = if cat.name() == default {
            " (default)"
        } else {
            ""
        };
        println!("{} [{}]{}", cat.name(), cat.tone(), marker);
        if !cat.keywords().is_empty() {
            println!("  keywords: {}", cat.keywords().join(", "));
        }
    }
    println!("phrases:  {}", table.phrases().len());
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli, None, None)?;
    let log = open_log(&settings)?;

    let total = log.count().context("failed to count interactions")?;
    let counts = log
        .category_counts()
        .context("failed to count categories")?;

    println!("logged:     {total}");
    for (category, n) in counts {
        println!("  {category}: {n}");
    }
    Ok(())
}

fn cmd_history(cli: &Cli, limit: usize) -> Result<()> {
    let settings = load_settings(cli, None, None)?;
    let log = open_log(&settings)?;
    let records = log.recent(limit).context("failed to read history")?;

    if records.is_empty() {
        println!("(no interactions logged)");
        return Ok(());
    }
    for rec in records {
        println!("#{} {} [{}] {}", rec.seq, rec.created_at, rec.category, rec.query);
        println!("  {}", rec.message);
    }
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let settings = load_settings(cli, None, None)?;
    let log = open_log(&settings)?;
    let n = log
        .export_json_file(path)
        .with_context(|| format!("failed to export to {}", path.display()))?;

    println!("exported {n} interactions to {}", path.display());
    Ok(())
}
