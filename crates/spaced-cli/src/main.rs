//! spaced CLI: review queue and query tool over deck files.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Session;

#[derive(Parser)]
#[command(name = "spaced", version, about = "Spaced-repetition review queue")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example deck
    Init,

    /// Validate deck files
    Validate {
        /// Path to deck file or directory (default: configured deck)
        #[arg(long)]
        deck: Option<PathBuf>,
    },

    /// Filter and order items with a query
    Query {
        /// Query, e.g. "graph company:google is:due order:fsrs"
        query: String,

        /// Deck file (default: configured deck)
        #[arg(long)]
        deck: Option<PathBuf>,

        /// Evaluation time, RFC 3339 or ms since epoch (default: now)
        #[arg(long)]
        now: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Show how the query was parsed
        #[arg(long)]
        explain: bool,
    },

    /// Show what each grade would do to an item
    Preview {
        /// Deck file (default: configured deck)
        #[arg(long)]
        deck: Option<PathBuf>,

        /// Item ID
        #[arg(long)]
        item: String,

        /// Review time, RFC 3339 or ms since epoch (default: now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Grade an item and save the new schedule
    Review {
        /// Deck file (default: configured deck)
        #[arg(long)]
        deck: Option<PathBuf>,

        /// Item ID
        #[arg(long)]
        item: String,

        /// Grade: again, hard, good, easy (or 1-4)
        #[arg(long)]
        grade: String,

        /// Review time, RFC 3339 or ms since epoch (default: now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Suspend or resume an item
    Suspend {
        /// Deck file (default: configured deck)
        #[arg(long)]
        deck: Option<PathBuf>,

        /// Item ID
        #[arg(long)]
        item: String,

        /// Resume instead of suspending
        #[arg(long)]
        off: bool,
    },

    /// Add a new reviewable item
    Add {
        /// Deck file (default: configured deck)
        #[arg(long)]
        deck: Option<PathBuf>,

        /// Item title
        #[arg(long)]
        title: String,

        /// Tags, repeatable (e.g. --tag company:google --tag graphs)
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        category: Option<String>,

        /// Content kind, e.g. problem, note, article
        #[arg(long)]
        kind: Option<String>,

        /// Creation time, RFC 3339 or ms since epoch (default: now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Summarize a deck
    Stats {
        /// Deck file (default: configured deck)
        #[arg(long)]
        deck: Option<PathBuf>,

        /// Evaluation time, RFC 3339 or ms since epoch (default: now)
        #[arg(long)]
        now: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

fn main() {
    let filter = EnvFilter::from_default_env()
        .add_directive("spaced=info".parse().unwrap_or_else(|_| LevelFilter::INFO.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init = cli.command {
        return commands::init::execute();
    }

    let session = Session::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Validate { deck } => commands::validate::execute(&session, deck),
        Commands::Query {
            query,
            deck,
            now,
            format,
            explain,
        } => commands::query::execute(&session, deck, query, now, format, explain),
        Commands::Preview { deck, item, now } => {
            commands::preview::execute(&session, deck, item, now)
        }
        Commands::Review {
            deck,
            item,
            grade,
            now,
        } => commands::review::execute(&session, deck, item, grade, now),
        Commands::Suspend { deck, item, off } => {
            commands::suspend::execute(&session, deck, item, off)
        }
        Commands::Add {
            deck,
            title,
            tags,
            category,
            kind,
            now,
        } => commands::add::execute(
            &session,
            deck,
            commands::add::AddArgs {
                title,
                tags,
                category,
                kind,
                now,
            },
        ),
        Commands::Stats { deck, now, format } => {
            commands::stats::execute(&session, deck, now, format)
        }
    }
}
