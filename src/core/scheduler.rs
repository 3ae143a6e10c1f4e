use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

use super::backoff;
use super::detector;
use super::fetcher::Fetcher;
use super::store::DataStore;
use super::target::{MonitoredTarget, TargetStatus, TargetUpdate};
use crate::error::{PagesentryError, Result};

/// Outcome of one target within a sweep.
#[derive(Debug)]
pub enum TargetOutcome {
    /// Content changed; target flagged for review and re-captured
    Changed { id: String },
    /// Content identical; stability streak extended
    Unchanged { id: String, stable_count: u32 },
    /// Not due under the backoff policy
    Skipped { id: String },
    /// Fetch or persistence failed; stored state left untouched
    Failed { id: String, error: PagesentryError },
}

/// Typed record of one sweep. Tests and the administrative trigger assert
/// on this instead of scraping logs.
#[derive(Debug)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<TargetOutcome>,
}

impl TickReport {
    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Changed { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Unchanged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&TargetOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Runs the periodic change-detection sweep over all eligible targets.
///
/// At most one sweep executes at a time regardless of trigger source; the
/// guard is owned by the instance so independent schedulers can coexist in
/// tests.
pub struct MonitoringScheduler {
    store: Arc<dyn DataStore>,
    fetcher: Arc<dyn Fetcher>,
    running: AtomicBool,
}

impl MonitoringScheduler {
    pub fn new(store: Arc<dyn DataStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            running: AtomicBool::new(false),
        }
    }

    /// Run one sweep. Returns `Ok(None)` when another sweep is already in
    /// flight; the overlapping invocation is a logged no-op.
    pub async fn run_tick(&self) -> Result<Option<TickReport>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Sweep already in progress, skipping overlapping trigger");
            return Ok(None);
        }

        let result = self.sweep().await;
        self.running.store(false, Ordering::SeqCst);
        result.map(Some)
    }

    async fn sweep(&self) -> Result<TickReport> {
        let started_at = Utc::now();
        let targets = self.store.list_monitored_targets().await?;
        info!("🔍 Starting sweep over {} monitored targets", targets.len());

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in &targets {
            outcomes.push(self.process_target(target, started_at).await);
        }

        let report = TickReport {
            started_at,
            outcomes,
        };
        info!(
            "✅ Sweep complete: {} changed, {} unchanged, {} skipped, {} failed",
            report.changed(),
            report.unchanged(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Check a single target. Every failure is absorbed into the returned
    /// outcome; one bad target never aborts the sweep.
    async fn process_target(&self, target: &MonitoredTarget, now: DateTime<Utc>) -> TargetOutcome {
        let id = target.id.clone();

        if target.source_url.trim().is_empty() {
            warn!(target_id = %id, "Skipping malformed target without a source URL");
            return TargetOutcome::Failed {
                id: id.clone(),
                error: PagesentryError::MalformedTarget {
                    id,
                    reason: "missing source_url".to_string(),
                },
            };
        }

        if !backoff::is_due(target, now) {
            return TargetOutcome::Skipped { id };
        }

        let fetched = match self.fetcher.fetch(&target.source_url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                // State stays exactly as before the attempt, so the target
                // remains due and is retried at the next tick
                warn!(target_id = %id, error = %e, "Fetch failed");
                return TargetOutcome::Failed { id, error: e };
            }
        };

        let changed = detector::has_changed(&fetched.hash, target.last_content_hash.as_deref());
        let update = if changed {
            TargetUpdate {
                last_checked_at: Some(now),
                last_content_hash: Some(fetched.hash),
                stable_count: Some(0),
                status: Some(TargetStatus::NeedsReview),
                original_content: Some(fetched.text),
            }
        } else {
            TargetUpdate {
                last_checked_at: Some(now),
                stable_count: Some(target.stable_count + 1),
                ..Default::default()
            }
        };

        match self.store.update_target(&target.id, update).await {
            Ok(Some(_)) => {
                if changed {
                    info!(target_id = %id, "Content change detected, flagged for review");
                    TargetOutcome::Changed { id }
                } else {
                    TargetOutcome::Unchanged {
                        id,
                        stable_count: target.stable_count + 1,
                    }
                }
            }
            Ok(None) => {
                warn!(target_id = %id, "Target disappeared during sweep");
                TargetOutcome::Failed {
                    id,
                    error: PagesentryError::Persistence("record not found".to_string()),
                }
            }
            Err(e) => {
                warn!(target_id = %id, error = %e, "Failed to persist check result");
                TargetOutcome::Failed { id, error: e }
            }
        }
    }
}

/// Fire the sweep once a day at the configured local wall-clock time,
/// fire-and-log. Runs until the task is dropped.
pub async fn run_daily(scheduler: Arc<MonitoringScheduler>, hour: u32, minute: u32) {
    loop {
        let wait = duration_until_next(Local::now(), hour, minute);
        info!(
            "⏰ Next scheduled sweep in {} minutes",
            wait.as_secs() / 60
        );
        tokio::time::sleep(wait).await;

        if let Err(e) = scheduler.run_tick().await {
            warn!(error = %e, "Scheduled sweep failed");
        }
    }
}

fn duration_until_next(now: DateTime<Local>, hour: u32, minute: u32) -> Duration {
    let at = now
        .date_naive()
        .and_hms_opt(hour.min(23), minute.min(59), 0)
        .expect("Invalid schedule time");
    let next = if at > now.naive_local() {
        at
    } else {
        at + chrono::Duration::days(1)
    };
    (next - now.naive_local())
        .to_std()
        .unwrap_or(Duration::from_secs(60))
}
