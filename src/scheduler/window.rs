use chrono::{DateTime, Days, NaiveTime, TimeZone, Timelike};

use crate::error::{AppError, Result};
use crate::models::Preferences;

const MINUTES_PER_HOUR: u32 = 60;

/// Daily range within which notifications may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if is_valid_window(start, end) {
            Ok(Self { start, end })
        } else {
            Err(AppError::WindowInvalid { start, end })
        }
    }

    /// Times of day from `start` every `spacing_minutes`, last one at or
    /// before `end`.
    pub fn fire_times(&self, spacing_minutes: u32) -> Result<Vec<NaiveTime>> {
        if spacing_minutes == 0 {
            return Err(AppError::InvalidSpacing(0));
        }
        let start = minute_of_day(self.start);
        let end = minute_of_day(self.end);

        Ok((start..=end)
            .step_by(spacing_minutes as usize)
            .filter_map(|m| NaiveTime::from_hms_opt(m / MINUTES_PER_HOUR, m % MINUTES_PER_HOUR, 0))
            .collect())
    }
}

/// Start must not be after end, compared by hour and then minute.
pub fn is_valid_window(start: NaiveTime, end: NaiveTime) -> bool {
    if start.hour() != end.hour() {
        start.hour() < end.hour()
    } else {
        start.minute() <= end.minute()
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * MINUTES_PER_HOUR + time.minute()
}

/// Absolute fire timestamps, ascending. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPlan<Tz: TimeZone> {
    pub fire_times: Vec<DateTime<Tz>>,
}

impl<Tz: TimeZone> NotificationPlan<Tz> {
    pub fn empty() -> Self {
        Self {
            fire_times: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fire_times.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fire_times.len()
    }
}

/// Place each fire time on the day of `now`, or the following day if it has
/// already passed. Disabled notifications give an empty plan.
pub fn build_plan<Tz: TimeZone>(prefs: &Preferences, now: &DateTime<Tz>) -> Result<NotificationPlan<Tz>> {
    if !prefs.allow_notifications {
        return Ok(NotificationPlan::empty());
    }

    let window = TimeWindow::new(prefs.start_time, prefs.end_time)?;
    let tz = now.timezone();
    let today = now.date_naive();

    let mut fire_times: Vec<DateTime<Tz>> = window
        .fire_times(prefs.spacing_minutes)?
        .into_iter()
        .filter_map(|time| {
            // A time skipped by a DST gap today still fires tomorrow
            if let Some(at) = tz.from_local_datetime(&today.and_time(time)).earliest() {
                if at > *now {
                    return Some(at);
                }
            }
            let tomorrow = today.checked_add_days(Days::new(1))?;
            tz.from_local_datetime(&tomorrow.and_time(time)).earliest()
        })
        .collect();
    fire_times.sort();

    Ok(NotificationPlan { fire_times })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Utc};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn prefs(start: NaiveTime, end: NaiveTime, spacing: u32) -> Preferences {
        Preferences {
            start_time: start,
            end_time: end,
            spacing_minutes: spacing,
            ..Preferences::default()
        }
    }

    #[test]
    fn test_window_validity() {
        assert!(!is_valid_window(t(10, 0), t(9, 59)));
        assert!(is_valid_window(t(9, 0), t(9, 0)));
        assert!(is_valid_window(t(9, 0), t(17, 0)));
        assert!(!is_valid_window(t(9, 30), t(9, 15)));
        assert!(is_valid_window(t(8, 59), t(9, 0)));
    }

    #[test]
    fn test_validity_ignores_seconds() {
        let start = NaiveTime::from_hms_opt(9, 0, 45).unwrap();
        let end = NaiveTime::from_hms_opt(9, 0, 10).unwrap();
        assert!(is_valid_window(start, end));
    }

    #[test]
    fn test_invalid_window_is_rejected() {
        let err = TimeWindow::new(t(10, 0), t(9, 59)).unwrap_err();
        assert!(matches!(err, AppError::WindowInvalid { .. }));
    }

    #[test]
    fn test_fire_times_include_end() {
        let window = TimeWindow::new(t(9, 0), t(9, 10)).unwrap();
        assert_eq!(window.fire_times(5).unwrap(), vec![t(9, 0), t(9, 5), t(9, 10)]);
    }

    #[test]
    fn test_fire_times_stop_before_end() {
        let window = TimeWindow::new(t(9, 0), t(9, 9)).unwrap();
        assert_eq!(window.fire_times(5).unwrap(), vec![t(9, 0), t(9, 5)]);
    }

    #[test]
    fn test_single_point_window() {
        let window = TimeWindow::new(t(12, 0), t(12, 0)).unwrap();
        assert_eq!(window.fire_times(30).unwrap(), vec![t(12, 0)]);
    }

    #[test]
    fn test_zero_spacing_is_rejected() {
        let window = TimeWindow::new(t(9, 0), t(10, 0)).unwrap();
        assert!(matches!(window.fire_times(0), Err(AppError::InvalidSpacing(0))));
    }

    #[test]
    fn test_window_crossing_hours() {
        let window = TimeWindow::new(t(9, 45), t(11, 0)).unwrap();
        assert_eq!(
            window.fire_times(30).unwrap(),
            vec![t(9, 45), t(10, 15), t(10, 45)]
        );
    }

    #[test]
    fn test_disabled_plan_is_empty() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        let mut p = prefs(t(9, 0), t(17, 0), 1);
        p.allow_notifications = false;
        assert!(build_plan(&p, &now).unwrap().is_empty());
    }

    #[test]
    fn test_plan_before_window_is_today() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        let plan = build_plan(&prefs(t(9, 0), t(9, 10), 5), &now).unwrap();

        let expected: Vec<_> = [0, 5, 10]
            .iter()
            .map(|m| Utc.with_ymd_and_hms(2026, 3, 1, 9, *m, 0).unwrap())
            .collect();
        assert_eq!(plan.fire_times, expected);
    }

    #[test]
    fn test_plan_rolls_past_times_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap();
        let plan = build_plan(&prefs(t(9, 0), t(9, 10), 5), &now).unwrap();

        assert_eq!(
            plan.fire_times,
            vec![
                Utc.with_ymd_and_hms(2026, 3, 1, 9, 10, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 3, 2, 9, 5, 0).unwrap(),
            ]
        );
    }

    /// UTC except that 02:00-02:59 local does not exist on 2026-03-08.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn offset() -> FixedOffset {
            FixedOffset::east_opt(0).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, _: &NaiveDate) -> LocalResult<FixedOffset> {
            LocalResult::Single(Self::offset())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
            if local.date() == gap_day && local.hour() == 2 {
                LocalResult::None
            } else {
                LocalResult::Single(Self::offset())
            }
        }

        fn offset_from_utc_date(&self, _: &NaiveDate) -> FixedOffset {
            Self::offset()
        }

        fn offset_from_utc_datetime(&self, _: &NaiveDateTime) -> FixedOffset {
            Self::offset()
        }
    }

    #[test]
    fn test_plan_moves_times_skipped_by_dst_to_tomorrow() {
        let gap_day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let now = SpringForward
            .from_local_datetime(&gap_day.and_time(t(1, 0)))
            .single()
            .unwrap();
        let plan = build_plan(&prefs(t(2, 0), t(3, 0), 30), &now).unwrap();

        let fire_times: Vec<_> = plan.fire_times.iter().map(|at| at.naive_local()).collect();
        let next_day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(
            fire_times,
            vec![
                gap_day.and_time(t(3, 0)),
                next_day.and_time(t(2, 0)),
                next_day.and_time(t(2, 30)),
            ]
        );
    }

    #[test]
    fn test_plan_with_stored_invalid_window_fails() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        let err = build_plan(&prefs(t(18, 0), t(8, 0), 30), &now).unwrap_err();
        assert!(matches!(err, AppError::WindowInvalid { .. }));
    }
}
