//! Output formatting for shadowhunter.
//!
//! Provides terminal, JSON and CSV renderings of a report, plus the live
//! printer that lists verdicts as checks complete.
//!
//! # Graceful Degradation
//!
//! - Non-TTY output: color disabled via NO_COLOR, --no-color or when the
//!   stream is not a terminal (decided by the caller)
//! - Empty reports: valid output with zero rows
//! - Missing title/source: empty CSV cells
//!
//! No function in this module will panic.

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::engine::orchestrator::ScanObserver;
use crate::engine::report::{ScanReport, ToolInfo};
use crate::{Existence, Verdict};

/// CSV header row
pub const CSV_HEADER: &str = "timestamp,mode,subject,platform,url,exists,title,source";

/// Trait for output formatters
pub trait OutputFormatter {
    fn format(&self, report: &ScanReport) -> String;
}

/// ANSI coloring that collapses to plain text when disabled
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Palette { color }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    pub fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    pub fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    pub fn cyan(&self, text: &str) -> String {
        self.colorize(text, "36")
    }

    pub fn gray(&self, text: &str) -> String {
        self.colorize(text, "90")
    }
}

/// Banner printed before a scan
pub fn banner(tool: &ToolInfo, palette: Palette) -> String {
    let rule = "-".repeat(60);
    format!(
        "{}\n{} v{}  by {}\nConservative presence checks: a hit needs a named signal.\n{}",
        rule,
        palette.cyan(&tool.name),
        tool.version,
        tool.author,
        rule
    )
}

/// One human-readable line for a verdict
pub fn verdict_line(verdict: &Verdict, palette: Palette) -> String {
    match verdict.existence() {
        Existence::Found => format!(
            "{} {:<14} {} ({})",
            palette.green("[+] FOUND    "),
            verdict.platform(),
            verdict.url(),
            verdict.source().unwrap_or_default()
        ),
        Existence::NotFound => palette.gray(&format!(
            "[-] NOT FOUND {:<14} {}",
            verdict.platform(),
            verdict.url()
        )),
        Existence::Unknown => format!(
            "{} {:<14} {}{}",
            palette.yellow("[?] UNKNOWN  "),
            verdict.platform(),
            verdict.url(),
            verdict
                .reason()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default()
        ),
        Existence::Error { message } => format!(
            "{} {:<14} {} ({})",
            palette.red("[!] ERROR    "),
            verdict.platform(),
            verdict.url(),
            message
        ),
    }
}

/// Where live and summary text goes; stderr when the JSON report is on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn line(self, text: &str) {
        match self {
            Stream::Stdout => println!("{}", text),
            Stream::Stderr => eprintln!("{}", text),
        }
    }
}

/// Prints each verdict as it completes. Silent in quiet or summary mode.
pub struct LivePrinter {
    palette: Palette,
    stream: Stream,
    enabled: bool,
}

impl LivePrinter {
    pub fn new(palette: Palette, stream: Stream, enabled: bool) -> Self {
        LivePrinter {
            palette,
            stream,
            enabled,
        }
    }
}

impl ScanObserver for LivePrinter {
    fn on_candidate(&self, candidate: &str, index: usize, total: usize) {
        if !self.enabled {
            return;
        }
        if total > 1 {
            self.stream.line(&format!(
                "{} trying '{}' ({}/{})",
                self.palette.cyan("[DERIVE]"),
                candidate,
                index + 1,
                total
            ));
        } else {
            self.stream
                .line(&format!("{} checking '{}'", self.palette.cyan("[*]"), candidate));
        }
    }

    fn on_verdict(&self, verdict: &Verdict) {
        if self.enabled {
            self.stream.line(&verdict_line(verdict, self.palette));
        }
    }
}

/// Counts and positive hits
pub struct TerminalFormatter {
    palette: Palette,
}

impl TerminalFormatter {
    pub fn new(palette: Palette) -> Self {
        TerminalFormatter { palette }
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &ScanReport) -> String {
        let summary = report.summary();
        let mut output = String::new();

        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("Target: {}\n", report.target()));
        output.push_str(&format!("Timestamp: {}\n", report.timestamp_string()));
        for diagnostic in &report.diagnostics {
            output.push_str(&format!("{} {}\n", self.palette.yellow("[WARN]"), diagnostic));
        }

        if summary.positives.is_empty() {
            output.push_str("No positive hits.\n");
        } else {
            output.push_str("Positive hits:\n");
            for hit in &summary.positives {
                let subject = if hit.subject == report.target() {
                    String::new()
                } else {
                    format!(" [{}]", hit.subject)
                };
                output.push_str(&format!(
                    "  {} {}{} {} ({})\n",
                    self.palette.green("+"),
                    hit.platform,
                    subject,
                    hit.url,
                    hit.source
                ));
            }
        }

        output.push_str(&format!(
            "SUMMARY: {} found, {} not found, {} unknown ({} errors), {} checks\n",
            summary.found, summary.not_found, summary.unknown, summary.errors, summary.total
        ));
        output.push_str(&"-".repeat(60));
        output
    }
}

/// Pretty-printed JSON report
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &ScanReport) -> String {
        // Serialize is infallible for reports: string keys, finite floats
        serde_json::to_string_pretty(report).unwrap_or_else(|e| {
            format!("{{\"error\": \"{}\"}}", e.to_string().replace('"', "'"))
        })
    }
}

/// One CSV row per verdict in report order
pub struct CsvFormatter;

impl CsvFormatter {
    fn escape_csv(field: &str) -> String {
        if field.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

impl OutputFormatter for CsvFormatter {
    fn format(&self, report: &ScanReport) -> String {
        let timestamp = report.timestamp_string();
        let mut output = String::from(CSV_HEADER);
        output.push('\n');

        for entry in report.entries() {
            let verdict = entry.verdict;
            let exists = match verdict.existence().exists() {
                Some(true) => "true",
                Some(false) => "false",
                None => "",
            };
            let row = [
                timestamp.as_str(),
                entry.mode,
                entry.subject,
                verdict.platform(),
                verdict.url(),
                exists,
                verdict.title().unwrap_or_default(),
                verdict.source().unwrap_or_default(),
            ];
            let cells: Vec<String> = row.iter().map(|f| Self::escape_csv(f)).collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }

        output
    }
}

/// Write `content` to `path`, creating parent directories
pub fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
