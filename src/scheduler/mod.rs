mod window;

pub use window::{build_plan, is_valid_window, NotificationPlan, TimeWindow};

use chrono::{DateTime, Local, NaiveTime};
use tracing::{info, warn};

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Preferences, SettingKey};

/// OS-level local notification facility.
pub trait NotificationSink {
    fn schedule_at(&self, fire_times: &[DateTime<Local>]) -> Result<()>;
    fn cancel_all(&self) -> Result<()>;
}

/// Sink for headless use: logs the plan instead of handing it to an OS.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn schedule_at(&self, fire_times: &[DateTime<Local>]) -> Result<()> {
        for at in fire_times {
            info!(at = %at.format("%Y-%m-%d %H:%M"), "Notification scheduled");
        }
        Ok(())
    }

    fn cancel_all(&self) -> Result<()> {
        info!("Cancelled scheduled notifications");
        Ok(())
    }
}

/// Derives the notification plan from stored settings. Holds no state of
/// its own; every change re-reads settings and recomputes from scratch.
pub struct Scheduler<S: NotificationSink> {
    repository: Repository,
    defaults: Preferences,
    sink: S,
}

impl<S: NotificationSink> Scheduler<S> {
    pub fn new(repository: Repository, defaults: Preferences, sink: S) -> Self {
        Self {
            repository,
            defaults,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn preferences(&self) -> Result<Preferences> {
        self.repository.load_preferences(&self.defaults).await
    }

    /// Cancel everything scheduled and hand the fresh plan to the sink.
    /// Pending notifications are cancelled even if the stored settings turn
    /// out to be unusable.
    pub async fn recompute(&self) -> Result<NotificationPlan<Local>> {
        self.sink.cancel_all()?;

        let prefs = self.preferences().await?;
        let plan = build_plan(&prefs, &Local::now())
            .inspect_err(|e| warn!(error = %e, "Couldn't build notification plan"))?;
        if !plan.is_empty() {
            self.sink.schedule_at(&plan.fire_times)?;
        }
        info!(
            enabled = prefs.allow_notifications,
            count = plan.len(),
            "Recomputed notification schedule"
        );
        Ok(plan)
    }

    pub async fn set_start_time(&self, start: NaiveTime) -> Result<NotificationPlan<Local>> {
        let prefs = self.preferences().await?;
        check_window(start, prefs.end_time)?;
        self.repository.save(SettingKey::StartTime, &start).await?;
        self.recompute().await
    }

    pub async fn set_end_time(&self, end: NaiveTime) -> Result<NotificationPlan<Local>> {
        let prefs = self.preferences().await?;
        check_window(prefs.start_time, end)?;
        self.repository.save(SettingKey::EndTime, &end).await?;
        self.recompute().await
    }

    /// Update both ends at once, e.g. when moving the window past the old end.
    pub async fn set_window(&self, start: NaiveTime, end: NaiveTime) -> Result<NotificationPlan<Local>> {
        check_window(start, end)?;
        let prefs = Preferences {
            start_time: start,
            end_time: end,
            ..self.preferences().await?
        };
        self.repository.save_preferences(&prefs).await?;
        self.recompute().await
    }

    pub async fn set_spacing(&self, minutes: i64) -> Result<NotificationPlan<Local>> {
        let spacing = u32::try_from(minutes)
            .ok()
            .filter(|m| *m >= 1)
            .ok_or(AppError::InvalidSpacing(minutes))?;
        self.repository.save(SettingKey::Spacing, &spacing).await?;
        self.recompute().await
    }

    pub async fn set_allow_notifications(&self, allow: bool) -> Result<NotificationPlan<Local>> {
        self.repository
            .save(SettingKey::AllowNotifications, &allow)
            .await?;
        self.recompute().await
    }
}

fn check_window(start: NaiveTime, end: NaiveTime) -> Result<()> {
    TimeWindow::new(start, end)
        .map(|_| ())
        .inspect_err(|_| warn!(%start, %end, "Rejected notification window"))
}
