use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// featpack - resolve build profiles into per-component build plans
#[derive(Parser, Debug)]
#[command(name = "featpack")]
#[command(about = "Validates feature-toggle build profiles and resolves them into build plans")]
#[command(version)]
pub struct Cli {
    /// JSON component catalog to resolve against (defaults to the builtin catalog)
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a profile and report every violation
    Validate {
        /// Path to the profile file
        profile: PathBuf,
    },
    /// Print the resolved build plan of a profile
    Resolve {
        /// Path to the profile file
        profile: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the components, groups and options of the catalog
    Catalog {
        /// Print the catalog as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// How `resolve` prints the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `component STATE` line per component
    Text,
    /// The full plan as JSON
    Json,
    /// Preprocessor defines, one per line
    Defines,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
