use clap::{Parser, Subcommand};
use std::path::PathBuf;
use studymem_core::Module;

#[derive(Parser)]
#[command(name = "studymem")]
#[command(version)]
#[command(about = "Per-student learning memory: insight extraction and compression")]
pub struct Cli {
    /// Data directory (defaults to $STUDYMEM_HOME, then the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// API key enabling AI-written summaries
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and a default config
    Init,

    /// Record completed sessions from a JSONL file, compressing when due
    Ingest {
        /// Path to session JSONL, one session per line
        #[arg(short, long)]
        file: PathBuf,

        /// Use deterministic summaries only
        #[arg(long)]
        no_ai: bool,
    },

    /// Show per-module compression progress for a student
    Status {
        #[arg(short, long)]
        student: String,
    },

    /// Compress a module's pending insights now, regardless of the threshold
    Compress {
        #[arg(short, long)]
        student: String,

        #[arg(short, long)]
        module: Module,

        /// Leave the summary unset instead of asking the summarizer
        #[arg(long)]
        no_ai: bool,
    },

    /// Print compressed memory for one module or the whole board
    Memory {
        #[arg(short, long)]
        student: String,

        #[arg(short, long)]
        module: Option<Module>,
    },

    /// Print adaptive hints (reading by default)
    Hints {
        #[arg(short, long)]
        student: String,

        #[arg(short, long)]
        module: Option<Module>,
    },

    /// Print version information
    Version,
}
