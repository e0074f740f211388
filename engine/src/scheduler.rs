//! Weekly planning trigger
//!
//! Times are local wall-clock times. The daemon asks the tracker on every
//! tick whether the weekly slot has passed since it last fired.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

/// Parses `mon`..`sun` (or full names, any case) and `0`..`6` with 0 = Monday
pub fn parse_weekday(value: &str) -> Option<Weekday> {
    let value = value.trim().to_lowercase();
    let day = match value.as_str() {
        "0" => Weekday::Mon,
        "1" => Weekday::Tue,
        "2" => Weekday::Wed,
        "3" => Weekday::Thu,
        "4" => Weekday::Fri,
        "5" => Weekday::Sat,
        "6" => Weekday::Sun,
        other => other.parse().ok()?,
    };
    Some(day)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub enabled: bool,
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(enabled: bool, weekday: Weekday, hour: u32, minute: u32) -> Option<Self> {
        Some(Self {
            enabled,
            weekday,
            time: NaiveTime::from_hms_opt(hour, minute, 0)?,
        })
    }

    /// First slot strictly after `now`; `None` when disabled
    pub fn next_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if !self.enabled {
            return None;
        }

        let days_ahead = (7 + self.weekday.num_days_from_monday() as i64
            - now.weekday().num_days_from_monday() as i64)
            % 7;
        let candidate = (now.date() + Duration::days(days_ahead)).and_time(self.time);

        if candidate > now {
            Some(candidate)
        } else {
            Some(candidate + Duration::days(7))
        }
    }
}

/// Remembers the upcoming slot so each slot fires once
#[derive(Debug, Clone)]
pub struct ScheduleTracker {
    schedule: WeeklySchedule,
    next: Option<NaiveDateTime>,
}

impl ScheduleTracker {
    pub fn new(schedule: WeeklySchedule, now: NaiveDateTime) -> Self {
        Self {
            next: schedule.next_after(now),
            schedule,
        }
    }

    pub fn next_fire(&self) -> Option<NaiveDateTime> {
        self.next
    }

    /// True once per slot, on the first call at or after it
    pub fn due(&mut self, now: NaiveDateTime) -> bool {
        match self.next {
            Some(next) if now >= next => {
                self.next = self.schedule.next_after(now);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        // March 2024: the 3rd is a Sunday
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sunday_ten() -> WeeklySchedule {
        WeeklySchedule::new(true, Weekday::Sun, 10, 0).unwrap()
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("sun"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("Monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("6"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("someday"), None);
    }

    #[test]
    fn test_next_after_same_day_before_slot() {
        assert_eq!(sunday_ten().next_after(at(3, 9, 0)), Some(at(3, 10, 0)));
    }

    #[test]
    fn test_next_after_slot_passed_rolls_a_week() {
        assert_eq!(sunday_ten().next_after(at(3, 10, 0)), Some(at(10, 10, 0)));
        assert_eq!(sunday_ten().next_after(at(5, 8, 0)), Some(at(10, 10, 0)));
    }

    #[test]
    fn test_disabled_never_fires() {
        let schedule = WeeklySchedule::new(false, Weekday::Sun, 10, 0).unwrap();
        let mut tracker = ScheduleTracker::new(schedule, at(3, 9, 0));
        assert_eq!(tracker.next_fire(), None);
        assert!(!tracker.due(at(3, 11, 0)));
    }

    #[test]
    fn test_tracker_fires_once_per_slot() {
        let mut tracker = ScheduleTracker::new(sunday_ten(), at(3, 9, 0));
        assert!(!tracker.due(at(3, 9, 59)));
        assert!(tracker.due(at(3, 10, 0)));
        assert!(!tracker.due(at(3, 10, 5)));
        assert_eq!(tracker.next_fire(), Some(at(10, 10, 0)));
    }

    #[test]
    fn test_invalid_time_rejected() {
        assert!(WeeklySchedule::new(true, Weekday::Mon, 24, 0).is_none());
        assert!(WeeklySchedule::new(true, Weekday::Mon, 10, 60).is_none());
    }
}
