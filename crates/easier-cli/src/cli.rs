use std::path::PathBuf;

use clap::Parser;
use easier_core::aggregate::SortState;

use crate::config::ConfigKey;

#[derive(Parser, Debug)]
#[command(
    name = "easier",
    version,
    about = "Client for the AI Made Easier service",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Service address (overrides EASIER_API_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to the config file (defaults to <config dir>/easier/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Upload a PDF or text file for question answering
    Upload { file: PathBuf },
    /// Ask a question about the uploaded document
    Ask { question: String },
    /// Show the passages most similar to a query
    Retrieve {
        query: String,
        /// Passages to return (defaults to the configured top_k)
        #[arg(long)]
        top_k: Option<u32>,
        /// Minimum similarity (defaults to the configured similarity_threshold)
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Upload a document, then ask questions about it interactively
    Chat { file: PathBuf },
    /// Describe an image
    Describe {
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Summarise recent articles about a topic
    Summarize {
        topic: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate synthetic users
    Users {
        #[arg(long)]
        json: bool,
    },
    /// Token usage per request, per feature and per user (admin only)
    Usage {
        /// Sort for the detailed table, e.g. `timestamp:desc`
        #[arg(long, value_name = "FIELD[:DIR]")]
        sort_detailed: Option<SortState>,
        /// Sort for the per-feature table
        #[arg(long, value_name = "FIELD[:DIR]")]
        sort_feature: Option<SortState>,
        /// Sort for the per-user table
        #[arg(long, value_name = "FIELD[:DIR]")]
        sort_user: Option<SortState>,
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Change one setting
    Set { key: ConfigKey, value: String },
    /// Print where the config file lives
    Path,
}
