use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conformity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Policy conformance checker for Kubernetes manifests")]
#[command(
    long_about = "Evaluates Kubernetes workload manifests against a catalog of conformance rules covering security posture, resource governance, availability, networking and observability. Reads files, directories or stdin and reports findings in human or machine form."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (default: .conformity.yaml if present)
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "CONFORMITY_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check manifests against the rule catalog
    Check {
        /// Manifest files or directories; `-` or no input reads stdin
        #[arg(value_name = "PATH")]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Lowest severity that makes the run fail
        #[arg(long, value_enum)]
        fail_on: Option<SeverityThreshold>,

        /// Worker threads for rule evaluation (default: one per core)
        #[arg(short = 'j', long, value_name = "N")]
        jobs: Option<usize>,

        /// Run only these rule ids
        #[arg(long, value_delimiter = ',', value_name = "ID")]
        rules: Vec<String>,

        /// Run only rules in these categories
        #[arg(long, value_delimiter = ',', value_name = "CATEGORY")]
        categories: Vec<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Input format (auto infers from file extension)
        #[arg(long, value_enum, default_value = "auto")]
        input_format: InputFormat,
    },

    /// List the rule catalog
    Rules {
        /// Show only rules in this category
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityThreshold {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Auto,
    Yaml,
    Json,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
