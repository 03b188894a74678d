//! CLI module for argument parsing and output formatting.
//!
//! `args` parses flags with clap and merges them over the config file;
//! `output` renders reports for the terminal, JSON and CSV.

pub mod args;
pub mod output;
