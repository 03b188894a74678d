//! Command line arguments for shadowhunter.
//!
//! Flags override the config file, which overrides built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{secs_to_duration, timeout_from_secs, FileConfig, CONFIG_ENV};
use crate::engine::report::ToolInfo;
use crate::identity::TargetMode;
use crate::version::{DEFAULT_AUTHOR, TOOL_NAME};
use crate::{RunParameters, DEFAULT_CONCURRENCY, DEFAULT_DELAY, DEFAULT_TIMEOUT};

/// Default JSON report path
pub const DEFAULT_OUT: &str = "shadowhunter_results.json";

/// How to interpret the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TargetKind {
    /// Email if the target contains '@', username otherwise
    #[default]
    Auto,
    Username,
    Email,
}

impl From<TargetKind> for TargetMode {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Auto => TargetMode::Auto,
            TargetKind::Username => TargetMode::Username,
            TargetKind::Email => TargetMode::Email,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "shadowhunter",
    version,
    about = "Conservative OSINT username/email presence scanner",
    after_help = "Exit codes: 0 success, 2 invalid target or usage, 3 runtime error"
)]
pub struct Args {
    /// Username or email address to scan
    #[arg(required_unless_present = "list_platforms")]
    pub target: Option<String>,

    /// How to interpret the target
    #[arg(long = "type", value_enum, default_value_t = TargetKind::Auto)]
    pub kind: TargetKind,

    /// Platforms to check (space or comma separated; default: all enabled)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub platforms: Vec<String>,

    /// Per-request timeout in seconds [default: 10]
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Pause between requests in seconds [default: 0.15]
    #[arg(long, value_parser = parse_delay)]
    pub delay: Option<Duration>,

    /// Checks in flight at once; 1 is sequential [default: 1]
    #[arg(long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// For email targets, also check usernames derived from the local-part
    #[arg(long)]
    pub also_derive: bool,

    /// Write only positive hits to the JSON/CSV reports
    #[arg(long)]
    pub only_found: bool,

    /// Print a concise summary of positives instead of the live listing
    #[arg(long)]
    pub summary: bool,

    /// JSON report path ("-" for stdout)
    #[arg(long, default_value = DEFAULT_OUT)]
    pub out: String,

    /// Also write a CSV report to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Tool name shown in the banner and report
    #[arg(long, default_value = TOOL_NAME)]
    pub name: String,

    /// Author shown in the banner and report
    #[arg(long, default_value = DEFAULT_AUTHOR)]
    pub author: String,

    /// TOML configuration file
    #[arg(long, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Disable colored output (also honors NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    /// Suppress banner and live output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// List built-in platforms and exit
    #[arg(long)]
    pub list_platforms: bool,
}

impl Args {
    /// Merge flags over the config file into run parameters
    pub fn to_run_parameters(&self, file: &FileConfig) -> RunParameters {
        let file_secs = |secs: Option<f64>| secs.and_then(|s| secs_to_duration(s).ok());
        let file_timeout = |secs: Option<f64>| secs.and_then(|s| timeout_from_secs(s).ok());

        RunParameters {
            mode: self.kind.into(),
            platforms: if self.platforms.is_empty() {
                file.platforms.clone()
            } else {
                Some(self.platforms.clone())
            },
            timeout: self
                .timeout
                .or_else(|| file_timeout(file.timeout_secs))
                .unwrap_or(DEFAULT_TIMEOUT),
            delay: self
                .delay
                .or_else(|| file_secs(file.delay_secs))
                .unwrap_or(DEFAULT_DELAY),
            concurrency: self
                .concurrency
                .or(file.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
            derive: self.also_derive,
            only_found: self.only_found,
            summary: self.summary,
        }
    }

    pub fn tool_info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            author: self.author.clone(),
            ..ToolInfo::default()
        }
    }

    /// JSON report goes to stdout instead of a file
    pub fn json_to_stdout(&self) -> bool {
        self.out == "-"
    }

    /// Default tracing filter when RUST_LOG is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    timeout_from_secs(secs)
}

fn parse_delay(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    secs_to_duration(secs)
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("concurrency must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a positive integer", s)),
    }
}
