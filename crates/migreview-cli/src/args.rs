use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use migreview_core::OutputMode;

#[derive(Parser, Debug)]
#[command(
    name = "migreview",
    about = "Review planned schema migrations with Gemini before you run them",
    version,
    after_help = "Examples:\n  migreview                                  # interactive shell\n  migreview review --schema schema.sql --ddl migration.sql\n  migreview review --schema schema.sql --ddl migration.sql --output plain\n  migreview review --schema schema.sql --ddl migration.sql --format json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a migreview.toml (default: ./migreview.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the interactive review shell (default)
    Shell(ShellArgs),

    /// Review one migration from files and exit
    Review(ReviewArgs),
}

#[derive(Parser, Debug, Default)]
pub struct ShellArgs {
    /// Output mode to start in
    #[arg(long)]
    pub output: Option<OutputArg>,
}

#[derive(Parser, Debug)]
pub struct ReviewArgs {
    /// File containing the current schema definition
    #[arg(long)]
    pub schema: PathBuf,

    /// File containing the DDL you plan to run
    #[arg(long)]
    pub ddl: PathBuf,

    /// Rulebook file (default: built-in rulebook or [session] rulebook_file)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Incident log file (default: built-in log or [session] incidents_file)
    #[arg(long)]
    pub incidents: Option<PathBuf>,

    /// Send neither rulebook nor incident log
    #[arg(long, conflicts_with_all = ["rules", "incidents"])]
    pub no_context: bool,

    /// Ask for a prose answer or a structured JSON review
    #[arg(long)]
    pub output: Option<OutputArg>,

    /// How to print the result
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Plain,
    Structured,
}

impl From<OutputArg> for OutputMode {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Plain => OutputMode::Plain,
            OutputArg::Structured => OutputMode::Structured,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}
