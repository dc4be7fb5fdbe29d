use chrono::NaiveTime;

use crate::error::{AppError, Result};
use crate::scheduler::TimeWindow;

/// Fixed set of persisted setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    AllowNotifications,
    StartTime,
    EndTime,
    Spacing,
    Query,
    Filter,
    Title,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::AllowNotifications,
        SettingKey::StartTime,
        SettingKey::EndTime,
        SettingKey::Spacing,
        SettingKey::Query,
        SettingKey::Filter,
        SettingKey::Title,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::AllowNotifications => "allowNotifications",
            SettingKey::StartTime => "startTime",
            SettingKey::EndTime => "endTime",
            SettingKey::Spacing => "spacing",
            SettingKey::Query => "query",
            SettingKey::Filter => "filter",
            SettingKey::Title => "title",
        }
    }
}

/// Typed view over every setting, read and written as one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub allow_notifications: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub spacing_minutes: u32,
    pub query: String,
    pub filter: String,
}

impl Preferences {
    pub fn title(&self) -> String {
        compose_title(&self.filter, &self.query)
    }

    /// Reject an inverted window or zero spacing.
    pub fn validate(&self) -> Result<()> {
        TimeWindow::new(self.start_time, self.end_time)?;
        if self.spacing_minutes == 0 {
            return Err(AppError::InvalidSpacing(0));
        }
        Ok(())
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            allow_notifications: true,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default(),
            spacing_minutes: 30,
            query: "Top 100".to_string(),
            filter: "Subject".to_string(),
        }
    }
}

pub(crate) fn compose_title(filter: &str, query: &str) -> String {
    format!("{}: {}", filter, query)
}
