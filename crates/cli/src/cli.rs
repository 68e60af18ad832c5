//! Command-line definitions.

use ak_protocol::check_models::CheckCategory;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "assess", version, about = "Assess media against creative checks")]
pub struct Cli {
    /// Project root containing `.assess-kit/`.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Debug logging on stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write `.assess-kit/` with the default settings and checks
    Init {
        /// Overwrite an existing `.assess-kit/` directory
        #[arg(long)]
        force: bool,

        /// Only write the long-form ABCD checks
        #[arg(long)]
        minimal: bool,
    },

    /// List registered checks grouped by category and group
    Checks {
        /// Only show one category, e.g. SHORTS
        #[arg(long, value_parser = parse_category)]
        category: Option<CheckCategory>,
    },

    /// Run one assessment and stream its NDJSON events
    Run {
        /// Request JSON file, or `-` for stdin
        #[arg(long, short)]
        request: PathBuf,

        /// Write events to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print the stage plan without running it
        #[arg(long)]
        plan: bool,
    },

    /// Serve the HTTP endpoints
    Serve {
        /// Listen address; defaults to `[server] bind`
        #[arg(long)]
        bind: Option<String>,

        /// Bearer token clients must present
        #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
        token: String,
    },
}

fn parse_category(value: &str) -> Result<CheckCategory, String> {
    CheckCategory::parse(value).ok_or_else(|| {
        format!("unknown category '{value}', expected LONG_FORM_ABCD, SHORTS or CUSTOM")
    })
}
