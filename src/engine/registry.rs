//! Ordered, immutable table of platforms.
//!
//! The registry is built once and shared read-only. Registry order is the
//! order platforms are checked and reported in.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::platforms::{
    devto, generic, github, gitlab, hackernews, keybase, reddit, social, stackoverflow, steam,
    tiktok, youtube, Platform,
};
use crate::ScanError;

/// Non-fatal problem with the requested platform list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "platform", rename_all = "snake_case")]
pub enum Diagnostic {
    UnknownPlatform(String),
    DisabledPlatform(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownPlatform(name) => write!(f, "unknown platform '{}' ignored", name),
            Diagnostic::DisabledPlatform(name) => {
                write!(f, "platform '{}' is disabled and was skipped", name)
            }
        }
    }
}

/// Platforms selected for a run, plus what was dropped from the request.
#[derive(Debug)]
pub struct Resolution<'r> {
    pub platforms: Vec<&'r Platform>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution<'_> {
    pub fn names(&self) -> Vec<String> {
        self.platforms.iter().map(|p| p.name().to_string()).collect()
    }
}

pub struct PlatformRegistry {
    platforms: Vec<Platform>,
}

impl PlatformRegistry {
    /// Build a registry, rejecting duplicate names
    pub fn new(platforms: Vec<Platform>) -> Result<Self, ScanError> {
        let mut seen = HashSet::new();
        for platform in &platforms {
            if !seen.insert(platform.name().to_lowercase()) {
                return Err(ScanError::DuplicatePlatform(platform.name().to_string()));
            }
        }
        Ok(PlatformRegistry { platforms })
    }

    /// The built-in platform table
    pub fn builtin() -> Self {
        PlatformRegistry {
            platforms: builtin_platforms(),
        }
    }

    pub fn all(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn get(&self, name: &str) -> Option<&Platform> {
        self.platforms
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Enabled platforms in registry order
    pub fn default_platforms(&self) -> Vec<&Platform> {
        self.platforms.iter().filter(|p| p.is_enabled()).collect()
    }

    /// Resolve a requested subset; `None` or empty means the defaults.
    ///
    /// Requested names are matched case-insensitively and deduplicated in
    /// request order. Unknown and disabled names become diagnostics.
    pub fn resolve(&self, requested: Option<&[String]>) -> Resolution<'_> {
        let requested = match requested {
            Some(names) if !names.is_empty() => names,
            _ => {
                return Resolution {
                    platforms: self.default_platforms(),
                    diagnostics: Vec::new(),
                }
            }
        };

        let mut platforms: Vec<&Platform> = Vec::new();
        let mut diagnostics = Vec::new();

        for name in requested {
            let name = name.trim();
            match self.get(name) {
                Some(p) if !p.is_enabled() => {
                    let diagnostic = Diagnostic::DisabledPlatform(p.name().to_string());
                    if !diagnostics.contains(&diagnostic) {
                        warn!("{}", diagnostic);
                        diagnostics.push(diagnostic);
                    }
                }
                Some(p) => {
                    if !platforms.iter().any(|q| q.name() == p.name()) {
                        platforms.push(p);
                    }
                }
                None => {
                    let diagnostic = Diagnostic::UnknownPlatform(name.to_string());
                    if !diagnostics.contains(&diagnostic) {
                        warn!("{}", diagnostic);
                        diagnostics.push(diagnostic);
                    }
                }
            }
        }

        Resolution {
            platforms,
            diagnostics,
        }
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_platforms() -> Vec<Platform> {
    vec![
        github::platform(),
        gitlab::platform(),
        reddit::platform(),
        stackoverflow::platform(),
        tiktok::platform(),
        youtube::platform(),
        generic::medium(),
        devto::platform(),
        generic::pinterest(),
        generic::soundcloud(),
        generic::vimeo(),
        steam::platform(),
        keybase::platform(),
        social::instagram(),
        generic::facebook(),
        social::x(),
        generic::kaggle(),
        hackernews::platform(),
        social::linkedin(),
        generic::twitch(),
    ]
}
