mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "vento",
    version,
    about = "Wind suitability analysis: weighted overlay and candidate site selection"
)]
struct Cli {
    /// Log engine stages (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the wind suitability index from criterion grids
    Compute {
        /// Criterion grid as NAME=FILE (JSON grid document); repeat per criterion
        #[arg(short, long = "layer", value_name = "NAME=FILE", required = true)]
        layers: Vec<String>,

        /// Custom JSON configuration file
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Predefined configuration: default, balanced
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the WSI grid to a JSON file
        #[arg(long = "wsi-out", value_name = "FILE")]
        wsi_out: Option<PathBuf>,

        /// Show at most this many sites in the table
        #[arg(long, default_value_t = 10)]
        sites: usize,
    },
    /// Manage and inspect configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List predefined configurations
    List,
    /// Explain a configuration in plain language
    Explain {
        /// Preset name (e.g., "default")
        preset: String,
    },
    /// Print the JSON schema with field descriptions and example
    Schema,
    /// Validate a custom configuration file
    Validate {
        /// Path to JSON configuration file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compute {
            layers,
            config,
            preset,
            output,
            wsi_out,
            sites,
        } => commands::compute::run(layers, config, preset, &output, wsi_out, sites),
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::list(),
            ConfigAction::Explain { preset } => commands::config::explain(&preset),
            ConfigAction::Schema => commands::config::schema(),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
