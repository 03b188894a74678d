//! Scan execution orchestrator.
//!
//! Drives one check per (candidate, platform) pair under the run's
//! concurrency and pacing policy.
//!
//! # Graceful Degradation
//!
//! - Transport errors and checker panics: caught in `Platform::check`,
//!   recorded as an `Error` verdict for that pair only
//! - A slot left empty (observer panicked mid-task): filled with an `Error`
//!   verdict when results are collected
//! - Empty plan or empty platform list: returns empty results (not an error)
//! - Stop flag raised (Ctrl-C): checks already in flight finish, every task
//!   not yet started becomes an Unknown verdict with reason
//!   `skipped (interrupted)`, and the results are returned as usual
//!
//! Report order is candidate order then platform order, whatever order the
//! workers finish in. Each task writes its own slot exactly once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::http::HttpFetch;
use crate::identity::{Identifier, ScanPlan};
use crate::platforms::{gravatar, Outcome, Platform};
use crate::{RunParameters, Verdict};

/// Live progress callbacks. Observers see verdicts as they complete and
/// have no influence on report content or order.
pub trait ScanObserver: Sync {
    /// A candidate's checks are about to be scheduled
    fn on_candidate(&self, _candidate: &str, _index: usize, _total: usize) {}

    /// A check finished (completion order, not report order)
    fn on_verdict(&self, _verdict: &Verdict) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Verdicts for one candidate, in platform order.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateVerdicts {
    pub candidate: String,
    pub verdicts: Vec<Verdict>,
}

/// Everything a run produced, in report order.
#[derive(Debug, Clone)]
pub struct ScanResults {
    /// Gravatar probe (email targets only)
    pub gravatar: Option<Verdict>,
    /// One group per candidate, in plan order
    pub groups: Vec<CandidateVerdicts>,
    /// Wall-clock time of the run
    pub elapsed: Duration,
    /// The stop flag was raised before every check had started
    pub interrupted: bool,
}

impl ScanResults {
    /// Number of verdicts, gravatar included
    pub fn len(&self) -> usize {
        self.gravatar.iter().count() + self.groups.iter().map(|g| g.verdicts.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One (candidate, platform) pair, addressed by its slot index
struct Task<'p> {
    candidate: usize,
    platform: &'p Platform,
}

/// Reason on verdicts for checks that never started
pub const SKIPPED_REASON: &str = "skipped (interrupted)";

pub struct ScanOrchestrator<'a> {
    http: &'a dyn HttpFetch,
    params: &'a RunParameters,
    stop: Option<&'a AtomicBool>,
}

impl<'a> ScanOrchestrator<'a> {
    pub fn new(http: &'a dyn HttpFetch, params: &'a RunParameters) -> Self {
        ScanOrchestrator {
            http,
            params,
            stop: None,
        }
    }

    /// Stop starting new checks once `stop` is set
    pub fn with_stop(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stopped(&self) -> bool {
        self.stop.is_some_and(|stop| stop.load(Ordering::SeqCst))
    }

    /// Run every check the plan calls for against `platforms`
    pub fn run(
        &self,
        plan: &ScanPlan,
        platforms: &[&Platform],
        observer: &dyn ScanObserver,
    ) -> ScanResults {
        let start = Instant::now();

        let gravatar = match &plan.identifier {
            Identifier::Email { .. } => {
                let email = plan.identifier.to_string();
                debug!("probing gravatar");
                let verdict = gravatar::probe(self.http, &email);
                observer.on_verdict(&verdict);
                Some(verdict)
            }
            Identifier::Username(_) => None,
        };

        // candidate-major: slot index = candidate * platforms + platform
        let tasks: Vec<Task<'_>> = (0..plan.candidates.len())
            .flat_map(|candidate| {
                platforms
                    .iter()
                    .map(move |platform| Task {
                        candidate,
                        platform: *platform,
                    })
            })
            .collect();
        let slots: Vec<OnceLock<Verdict>> = tasks.iter().map(|_| OnceLock::new()).collect();

        // the gravatar probe counts as the previous request for pacing
        let paced = gravatar.is_some();

        if self.params.concurrency <= 1 || tasks.len() <= 1 {
            self.run_sequential(plan, &tasks, &slots, observer, paced);
        } else {
            self.run_parallel(plan, &tasks, &slots, observer, paced);
        }

        let interrupted = self.stopped() && slots.iter().any(|slot| slot.get().is_none());
        if interrupted {
            warn!("scan interrupted, remaining checks skipped");
        }

        let mut verdicts = slots.into_iter().zip(&tasks).map(|(slot, task)| {
            slot.into_inner().unwrap_or_else(|| {
                let username = &plan.candidates[task.candidate];
                let name = task.platform.name();
                let url = task.platform.profile_url(username);
                if interrupted {
                    Verdict::from_outcome(name, username, &url, Outcome::unknown(SKIPPED_REASON))
                } else {
                    Verdict::error(name, username, &url, "check did not complete")
                }
            })
        });

        let groups = plan
            .candidates
            .iter()
            .map(|candidate| CandidateVerdicts {
                candidate: candidate.clone(),
                verdicts: verdicts.by_ref().take(platforms.len()).collect(),
            })
            .collect();

        let results = ScanResults {
            gravatar,
            groups,
            elapsed: start.elapsed(),
            interrupted,
        };
        info!(
            checks = results.len(),
            elapsed_ms = results.elapsed.as_millis() as u64,
            "scan finished"
        );
        results
    }

    /// Strict sequential loop with `delay` between consecutive requests
    fn run_sequential(
        &self,
        plan: &ScanPlan,
        tasks: &[Task<'_>],
        slots: &[OnceLock<Verdict>],
        observer: &dyn ScanObserver,
        paced: bool,
    ) {
        let mut previous_request = paced;
        let mut current_candidate = None;

        for (index, task) in tasks.iter().enumerate() {
            if !self.ready(previous_request) {
                break;
            }
            previous_request = true;

            if current_candidate != Some(task.candidate) {
                current_candidate = Some(task.candidate);
                observer.on_candidate(
                    &plan.candidates[task.candidate],
                    task.candidate,
                    plan.candidates.len(),
                );
            }

            let verdict = self.execute(plan, task);
            observer.on_verdict(&verdict);
            let _ = slots[index].set(verdict);
        }
    }

    /// Bounded worker pool: `min(concurrency, tasks)` scoped threads pull
    /// task indices from a shared cursor; each paces its own requests.
    fn run_parallel(
        &self,
        plan: &ScanPlan,
        tasks: &[Task<'_>],
        slots: &[OnceLock<Verdict>],
        observer: &dyn ScanObserver,
        paced: bool,
    ) {
        for (index, candidate) in plan.candidates.iter().enumerate() {
            observer.on_candidate(candidate, index, plan.candidates.len());
        }

        let workers = self.params.concurrency.min(tasks.len());
        let cursor = AtomicUsize::new(0);
        debug!(workers, tasks = tasks.len(), "starting worker pool");

        thread::scope(|s| {
            for worker in 0..workers {
                let cursor = &cursor;
                s.spawn(move || {
                    let mut previous_request = paced;
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let task = match tasks.get(index) {
                            Some(task) => task,
                            None => break,
                        };
                        if !self.ready(previous_request) {
                            break;
                        }
                        previous_request = true;

                        debug!(worker, index, "task picked up");
                        let verdict = self.execute(plan, task);
                        observer.on_verdict(&verdict);
                        let _ = slots[index].set(verdict);
                    }
                });
            }
        });
    }

    fn execute(&self, plan: &ScanPlan, task: &Task<'_>) -> Verdict {
        let username = &plan.candidates[task.candidate];
        let verdict = task.platform.check(self.http, username);
        info!(
            platform = verdict.platform(),
            username = %username,
            status = verdict.existence().label(),
            source = verdict.source().unwrap_or("-"),
            "check complete"
        );
        verdict
    }

    /// Pace after a previous request, then report whether the next task may
    /// start. The stop flag is checked on both sides of the pause.
    fn ready(&self, previous_request: bool) -> bool {
        if self.stopped() {
            return false;
        }
        if previous_request {
            self.pace();
        }
        !self.stopped()
    }

    fn pace(&self) {
        if !self.params.delay.is_zero() {
            thread::sleep(self.params.delay);
        }
    }
}
