//! Version and build information.
//!
//! Provides tool identity, version, git commit, and build metadata.

use std::fmt;

/// Display name of the tool, used in banners and reports
pub const TOOL_NAME: &str = "ShadowHunter";

/// Default author credited in reports
pub const DEFAULT_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Build information, shown by `--version`
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    pub build_date: Option<&'static str>,
    pub target: &'static str,
    pub rustc_version: Option<&'static str>,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.version)?;

        if let Some(commit) = self.commit {
            writeln!(f, "Commit: {}", commit)?;
        }

        if let Some(date) = self.build_date {
            writeln!(f, "Built: {}", date)?;
        }

        write!(f, "Target: {}", self.target)?;

        if let Some(rustc) = self.rustc_version {
            write!(f, "\nRustc: {}", rustc)?;
        }

        Ok(())
    }
}

/// Get build information
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("SHADOWHUNTER_GIT_HASH"),
        build_date: option_env!("SHADOWHUNTER_BUILD_DATE"),
        target: env!("TARGET"),
        rustc_version: option_env!("SHADOWHUNTER_RUSTC_VERSION"),
    }
}

/// User-Agent sent with every request
pub fn user_agent() -> String {
    format!(
        "Mozilla/5.0 (OSINT-Collector; {}/{})",
        TOOL_NAME,
        env!("CARGO_PKG_VERSION")
    )
}
