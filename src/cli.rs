use clap::{Parser, Subcommand, ValueEnum};
use nu_plugin_storyline::algo::extract::ClusterConfig;
use nu_plugin_storyline::error::{Result, StorylineError};
use nu_plugin_storyline::ops;
use serde_json::Value;
use std::io::{self, Read};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "storyline",
    version,
    about = "Group news articles from many feeds into ranked story clusters"
)]
struct Cli {
    /// Log debug details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a JSON snapshot read from stdin
    Cluster {
        /// JSON file with cluster settings
        #[arg(short, long)]
        config: Option<String>,
        /// Number of extraction rounds
        #[arg(short, long)]
        rounds: Option<usize>,
        /// Articles shown per cluster
        #[arg(short, long)]
        members: Option<usize>,
        /// Edge weight factor for two articles from the same source
        #[arg(long)]
        same_source_penalty: Option<f64>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the entity terms found in a text
    Entities {
        /// Text to annotate (reads stdin if omitted)
        text: Option<String>,
    },
    /// Top keywords of a JSON snapshot read from stdin
    Keywords {
        /// Number of keywords
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Cluster {
            config,
            rounds,
            members,
            same_source_penalty,
            format,
        } => cmd_cluster(
            config.as_deref(),
            rounds,
            members,
            same_source_penalty,
            format,
        ),
        Commands::Entities { text } => cmd_entities(text),
        Commands::Keywords { count } => cmd_keywords(count),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| StorylineError::InvalidSnapshot(format!("failed to read stdin: {e}")))?;
    Ok(buf)
}

fn read_stdin_json() -> Result<Value> {
    Ok(serde_json::from_str(&read_stdin()?)?)
}

fn load_config(path: Option<&str>) -> Result<ClusterConfig> {
    let Some(path) = path else {
        return Ok(ClusterConfig::default());
    };
    let raw = std::fs::read_to_string(Path::new(path))
        .map_err(|e| StorylineError::InvalidConfig(format!("{path}: {e}")))?;
    serde_json::from_str(&raw).map_err(|e| StorylineError::InvalidConfig(format!("{path}: {e}")))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Subcommands ──────────────────────────────────────────────────────────────

fn cmd_cluster(
    config_path: Option<&str>,
    rounds: Option<usize>,
    members: Option<usize>,
    same_source_penalty: Option<f64>,
    format: Format,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(rounds) = rounds {
        config.rounds = rounds;
    }
    if let Some(members) = members {
        config.members = members;
    }
    if let Some(penalty) = same_source_penalty {
        config.same_source_penalty = penalty;
    }

    let input = read_stdin_json()?;
    match format {
        Format::Text => print!("{}", ops::op_clusters_text(&input, &config)?),
        Format::Json => print_json(&ops::op_clusters(&input, &config)?)?,
    }
    Ok(())
}

fn cmd_entities(text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => read_stdin()?,
    };
    print_json(&ops::op_entities(&text))
}

fn cmd_keywords(count: usize) -> Result<()> {
    let input = read_stdin_json()?;
    print_json(&ops::op_keywords(&input, count)?)
}
