//! Weekly scan trigger and the process-wide scan guard.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tracing::{error, info, warn};

use crate::config::ScheduleConfig;
use crate::error::{AuditError, AuditResult};
use crate::scan::Scanner;
use crate::types::ScanResult;

/// Allows at most one scan at a time across the whole process.
#[derive(Debug, Clone, Default)]
pub struct ScanGuard {
    running: Arc<AtomicBool>,
}

/// Held for the duration of a scan; releases the guard on drop.
#[derive(Debug)]
pub struct ScanPermit {
    running: Arc<AtomicBool>,
}

impl ScanGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard, or `None` if a scan is already running.
    #[must_use]
    pub fn try_acquire(&self) -> Option<ScanPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanPermit {
                running: Arc::clone(&self.running),
            })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Cron schedule evaluated in a fixed time zone.
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    expression: String,
    schedule: Schedule,
    timezone: Tz,
}

impl WeeklySchedule {
    pub fn new(expression: &str, timezone: Tz) -> AuditResult<Self> {
        let schedule = Schedule::from_str(expression).map_err(|err| {
            AuditError::config(format!("invalid SCAN_SCHEDULE `{expression}`: {err}"))
        })?;
        Ok(Self {
            expression: expression.to_string(),
            schedule,
            timezone,
        })
    }

    pub fn from_config(config: &ScheduleConfig) -> AuditResult<Self> {
        Self::new(&config.cron, config.tz()?)
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// First fire time strictly after `now`.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        self.schedule
            .after(&now.with_timezone(&self.timezone))
            .next()
    }
}

/// Result of one scheduled trigger.
#[derive(Debug)]
pub enum ScheduledOutcome {
    /// Another scan held the guard.
    Skipped,
    Completed(ScanResult),
    Failed(AuditError),
}

/// Run one scheduled scan unless another scan is in flight.
pub async fn scheduled_run(scanner: &Scanner, guard: &ScanGuard) -> ScheduledOutcome {
    let Some(_permit) = guard.try_acquire() else {
        info!("scheduled scan skipped: a scan is already in progress");
        return ScheduledOutcome::Skipped;
    };

    info!("starting scheduled scan");
    match scanner.run().await {
        Ok(result) => {
            info!(
                missing = result.missing_count,
                report = %result.report_file_path,
                "scheduled scan sent"
            );
            ScheduledOutcome::Completed(result)
        }
        Err(err) => {
            error!(error = %err, kind = err.kind(), "scheduled scan failed");
            ScheduledOutcome::Failed(err)
        }
    }
}

/// Sleep until each fire time and trigger a scan. Runs until cancelled.
pub async fn run_schedule(schedule: WeeklySchedule, scanner: Arc<Scanner>, guard: ScanGuard) {
    info!(
        schedule = schedule.expression(),
        timezone = %schedule.timezone(),
        "scheduler started"
    );
    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_after(now) else {
            warn!("schedule has no upcoming fire times, scheduler stopping");
            return;
        };
        let wait = (next.with_timezone(&Utc) - now).to_std().unwrap_or_default();
        info!(next = %next, "next scheduled scan");
        tokio::time::sleep(wait).await;

        scheduled_run(&scanner, &guard).await;
    }
}
