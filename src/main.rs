//! shadowhunter CLI entry point
//!
//! Checks a username or email address against public platforms.

use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use shadowhunter::cli::args::Args;
use shadowhunter::cli::output::{
    banner, write_output, CsvFormatter, JsonFormatter, LivePrinter, OutputFormatter, Palette,
    Stream, TerminalFormatter,
};
use shadowhunter::config::FileConfig;
use shadowhunter::engine::registry::PlatformRegistry;
use shadowhunter::engine::Scanner;
use shadowhunter::http::ReqwestFetcher;
use shadowhunter::identity::resolve_target;
use shadowhunter::version::get_build_info;
use shadowhunter::ScanError;

/// Raised by the first Ctrl-C; checks not yet started are skipped
static STOP: AtomicBool = AtomicBool::new(false);

fn main() -> ExitCode {
    // clap exits with code 2 on usage errors
    let long_version: &'static str = Box::leak(get_build_info().to_string().into_boxed_str());
    let matches = Args::command().long_version(long_version).get_matches();
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };
    init_tracing(args.log_level());

    let stream = if args.json_to_stdout() {
        Stream::Stderr
    } else {
        Stream::Stdout
    };
    let color = !args.no_color
        && std::env::var_os("NO_COLOR").is_none()
        && match stream {
            Stream::Stdout => std::io::stdout().is_terminal(),
            Stream::Stderr => std::io::stderr().is_terminal(),
        };
    let palette = Palette::new(color);

    if args.list_platforms {
        print_platforms(palette);
        return ExitCode::SUCCESS;
    }

    match run(&args, palette, stream) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<ScanError>() {
                Some(ScanError::InvalidTarget { .. }) => ExitCode::from(2),
                _ => ExitCode::from(3),
            }
        }
    }
}

/// First Ctrl-C lets in-flight checks finish and saves partial reports; a
/// second one exits at once.
fn install_interrupt_handler() {
    let result = ctrlc::set_handler(|| {
        if STOP.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("\n[!] Interrupted: finishing current checks, then saving partial results");
    });
    if let Err(e) = result {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_platforms(palette: Palette) {
    let registry = PlatformRegistry::builtin();
    println!("Built-in platforms:");
    for platform in registry.all() {
        let signals: Vec<String> = platform
            .signals()
            .iter()
            .map(|s| format!("{} ({})", s.tag, s.tier))
            .collect();
        let state = if platform.is_enabled() {
            String::new()
        } else {
            palette.gray(" [disabled]")
        };
        println!("  {:<14}{} {}", platform.name(), state, signals.join(", "));
    }
}

fn run(args: &Args, palette: Palette, stream: Stream) -> anyhow::Result<()> {
    let target = args.target.as_deref().unwrap_or_default();
    let file = FileConfig::load(args.config.as_deref())?;
    let params = args.to_run_parameters(&file);

    // reject malformed targets before anything touches the network
    resolve_target(target, params.mode)?;

    let http = ReqwestFetcher::new(file.http_config(params.timeout)).map_err(ScanError::from)?;
    let registry = PlatformRegistry::builtin();
    let tool = args.tool_info();

    if !args.quiet {
        stream.line(&banner(&tool, palette));
    }

    install_interrupt_handler();
    let printer = LivePrinter::new(palette, stream, !args.quiet && !params.summary);
    let report = Scanner::new(&registry, &http)
        .with_tool(tool)
        .with_stop(&STOP)
        .scan(target, &params, &printer)?;

    let written = if params.only_found {
        report.only_found()
    } else {
        report.clone()
    };

    let json = JsonFormatter.format(&written);
    if args.json_to_stdout() {
        println!("{}", json);
    } else {
        write_output(Path::new(&args.out), &json)
            .context("could not save JSON report")?;
    }
    if let Some(csv) = &args.csv {
        write_output(csv, &CsvFormatter.format(&written)).context("could not save CSV report")?;
    }

    if !args.quiet || params.summary {
        stream.line(&TerminalFormatter::new(palette).format(&report));
        if !args.json_to_stdout() {
            stream.line(&format!("[*] JSON report saved to {}", args.out));
        }
        if let Some(csv) = &args.csv {
            stream.line(&format!("[*] CSV report saved to {}", csv.display()));
        }
    }
    if STOP.load(Ordering::SeqCst) {
        stream.line(&palette.yellow("[!] Scan was interrupted; unchecked pairs are marked skipped"));
    }

    Ok(())
}
