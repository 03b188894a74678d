//! CLI integration tests.
//!
//! Argument parsing, config-file layering and the binary's exit codes.

use std::io::Write;
use std::process::Command;
use std::time::Duration;

use clap::Parser;

use shadowhunter::cli::args::{Args, TargetKind, DEFAULT_OUT};
use shadowhunter::config::FileConfig;
use shadowhunter::identity::TargetMode;

fn parse(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("shadowhunter").chain(argv.iter().copied())).unwrap()
}

#[test]
fn test_default_args() {
    let args = parse(&["alice"]);
    assert_eq!(args.kind, TargetKind::Auto);
    assert!(args.platforms.is_empty());
    assert_eq!(args.out, DEFAULT_OUT);
    assert!(args.csv.is_none());
    assert!(!args.quiet && !args.summary && !args.only_found);
    assert_eq!(args.verbose, 0);
}

#[test]
fn test_type_values() {
    assert_eq!(parse(&["a", "--type", "username"]).kind, TargetKind::Username);
    assert_eq!(parse(&["a@b.c", "--type", "email"]).kind, TargetKind::Email);
}

#[test]
fn test_output_options() {
    let args = parse(&["alice", "--out", "r.json", "--csv", "r.csv", "--name", "Hunter", "--author", "me"]);
    assert_eq!(args.out, "r.json");
    assert_eq!(args.csv.as_deref(), Some(std::path::Path::new("r.csv")));
    let tool = args.tool_info();
    assert_eq!(tool.name, "Hunter");
    assert_eq!(tool.author, "me");
}

#[test]
fn test_config_file_layering() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timeout_secs = 4\ndelay_secs = 0.25\nplatforms = [\"gitlab\"]").unwrap();
    let config = FileConfig::load(Some(file.path())).unwrap();

    let params = parse(&["alice", "--type", "username"]).to_run_parameters(&config);
    assert_eq!(params.mode, TargetMode::Username);
    assert_eq!(params.timeout, Duration::from_secs(4));
    assert_eq!(params.delay, Duration::from_millis(250));
    assert_eq!(params.platforms, Some(vec!["gitlab".to_string()]));
    assert_eq!(params.concurrency, 1);

    let params = parse(&["alice", "--delay", "0"]).to_run_parameters(&config);
    assert_eq!(params.delay, Duration::ZERO);
}

#[test]
fn test_binary_lists_platforms() {
    let output = Command::new(env!("CARGO_BIN_EXE_shadowhunter"))
        .arg("--list-platforms")
        .env_remove("SHADOWHUNTER_CONFIG")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("github"));
    assert!(stdout.contains("twitch") && stdout.contains("[disabled]"));
}

#[test]
fn test_binary_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_shadowhunter"))
            .args(args)
            .current_dir(dir.path())
            .env_remove("SHADOWHUNTER_CONFIG")
            .output()
            .unwrap()
            .status
            .code()
    };

    // rejected before any network activity
    assert_eq!(run(&["a@b@c"]), Some(2));
    assert_eq!(run(&["alice@example.com", "--type", "username"]), Some(2));
    assert_eq!(run(&["alice", "--concurrency", "0"]), Some(2));
    assert_eq!(run(&["alice", "--config", "missing.toml"]), Some(3));
    assert!(!dir.path().join(DEFAULT_OUT).exists());
}
