//! Scan engine.
//!
//! Provides the platform registry, check orchestration and report assembly,
//! and `Scanner`, which ties them together for one target.

pub mod orchestrator;
pub mod registry;
pub mod report;

use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::http::HttpFetch;
use crate::identity::{resolve_target, ScanPlan};
use crate::{RunParameters, ScanError};
use orchestrator::{ScanObserver, ScanOrchestrator};
use registry::PlatformRegistry;
use report::{ReportAssembler, ScanReport, ToolInfo};

/// Resolves a target, runs the checks and assembles the report.
pub struct Scanner<'a> {
    registry: &'a PlatformRegistry,
    http: &'a dyn HttpFetch,
    tool: ToolInfo,
    stop: Option<&'a AtomicBool>,
}

impl<'a> Scanner<'a> {
    pub fn new(registry: &'a PlatformRegistry, http: &'a dyn HttpFetch) -> Self {
        Scanner {
            registry,
            http,
            tool: ToolInfo::default(),
            stop: None,
        }
    }

    /// Override the tool name/author stamped on reports
    pub fn with_tool(mut self, tool: ToolInfo) -> Self {
        self.tool = tool;
        self
    }

    /// Stop flag checked before each check; see `ScanOrchestrator::with_stop`
    pub fn with_stop(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Scan `target`, stamping the report with the current time
    pub fn scan(
        &self,
        target: &str,
        params: &RunParameters,
        observer: &dyn ScanObserver,
    ) -> Result<ScanReport, ScanError> {
        self.scan_at(target, params, observer, Utc::now())
    }

    /// Scan `target` with a fixed report timestamp.
    ///
    /// Fails only with `ScanError::InvalidTarget`, before any request is made.
    pub fn scan_at(
        &self,
        target: &str,
        params: &RunParameters,
        observer: &dyn ScanObserver,
        timestamp: DateTime<Utc>,
    ) -> Result<ScanReport, ScanError> {
        let identifier = resolve_target(target, params.mode)?;
        let plan = ScanPlan::build(identifier, params.derive);
        let resolution = self.registry.resolve(params.platforms.as_deref());

        info!(
            target = %plan.identifier,
            candidates = plan.candidates.len(),
            platforms = resolution.platforms.len(),
            concurrency = params.concurrency,
            "starting scan"
        );

        let mut orchestrator = ScanOrchestrator::new(self.http, params);
        if let Some(stop) = self.stop {
            orchestrator = orchestrator.with_stop(stop);
        }
        let results = orchestrator.run(&plan, &resolution.platforms, observer);

        Ok(ReportAssembler::new(self.tool.clone()).assemble(
            params,
            &plan,
            &resolution,
            results,
            timestamp,
        ))
    }
}
