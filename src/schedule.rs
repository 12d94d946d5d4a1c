//! Weekly programme stored on the thermostat and lookup of the next
//! programmed event.
//!
//! Event clock times are wall-clock times in the thermostat's own UTC offset,
//! not the caller's. Day entries are indexed Monday = 0 through Sunday = 6.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

/// `ScheduleType` of the sleep event.
pub const SLEEP_EVENT: i64 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DaySchedule {
    #[serde(default)]
    pub events: Vec<ScheduleEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduleEvent {
    pub clock: NaiveTime,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub schedule_type: i64,
    /// Floor target in device units.
    pub temp_floor: i32,
}

impl ScheduleEvent {
    /// The thermostat accepts sleep times up to 03:00 and files them under
    /// the previous day, so they actually fire on the day after their slot.
    fn fires_next_day(&self) -> bool {
        self.schedule_type == SLEEP_EVENT && Some(self.clock) <= NaiveTime::from_hms_opt(3, 0, 0)
    }
}

#[derive(Debug, Clone)]
pub struct NextEvent<Tz: TimeZone> {
    pub time: DateTime<Tz>,
    /// Floor target in device units.
    pub temperature: i32,
}

impl<Tz: TimeZone> NextEvent<Tz> {
    pub fn with_timezone<Tz2: TimeZone>(&self, tz: &Tz2) -> NextEvent<Tz2> {
        NextEvent {
            time: self.time.with_timezone(tz),
            temperature: self.temperature,
        }
    }
}

/// First active event strictly after `now`, in the thermostat's offset.
///
/// The scan starts with yesterday so that a sleep event filed under
/// yesterday's slot but firing after midnight is still found, and runs a full
/// week ahead to cover the wrap from Sunday to Monday.
pub fn next_event(
    schedules: &[DaySchedule],
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Option<NextEvent<FixedOffset>> {
    let now = now.with_timezone(&offset);
    let today = now.date_naive();

    for add_days in -1..=7 {
        let day = today + Duration::days(add_days);
        let index = day.weekday().num_days_from_monday() as usize;
        let Some(entry) = schedules.get(index) else {
            continue;
        };

        for event in &entry.events {
            let date = if event.fires_next_day() {
                match day.succ_opt() {
                    Some(next) => next,
                    None => continue,
                }
            } else {
                day
            };
            let Some(time) = offset
                .from_local_datetime(&date.and_time(event.clock))
                .single()
            else {
                continue;
            };
            if event.active && now < time {
                return Some(NextEvent {
                    time,
                    temperature: event.temp_floor,
                });
            }
        }
    }

    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn event(clock: &str, kind: i64, active: bool, floor: i32) -> Value {
        json!({"Clock": clock, "Active": active, "ScheduleType": kind, "TempFloor": floor})
    }

    fn weekday() -> Value {
        json!({"Events": [
            event("05:45:00", 0, true, 2666),
            event("08:00:00", 1, true, 2222),
            event("17:30:00", 2, false, 2666),
            event("22:00:00", 3, true, 2333),
        ]})
    }

    /// Monday..Thursday sleep at 22:00, Friday sleep at midnight (fires on
    /// Saturday), weekend wake at 08:00, Sunday sleep at 01:30 (fires on
    /// Monday).
    pub(crate) fn weekly_schedule() -> Value {
        json!([
            weekday(),
            weekday(),
            weekday(),
            weekday(),
            {"Events": [
                event("05:45:00", 0, true, 2666),
                event("08:00:00", 1, true, 2222),
                event("17:30:00", 2, false, 2666),
                event("00:00:00", 3, true, 2222),
            ]},
            {"Events": [
                event("08:00:00", 0, true, 2666),
                event("12:00:00", 1, false, 2222),
                event("16:00:00", 2, false, 2666),
                event("23:00:00", 3, true, 2333),
            ]},
            {"Events": [
                event("08:00:00", 0, true, 2666),
                event("12:00:00", 1, false, 2222),
                event("16:00:00", 2, false, 2666),
                event("01:30:00", 3, true, 2333),
            ]},
        ])
    }

    fn schedules() -> Vec<DaySchedule> {
        serde_json::from_value(weekly_schedule()).unwrap()
    }

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    fn at(hours: i32, y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<FixedOffset> {
        offset(hours).with_ymd_and_hms(y, m, d, hh, mm, 0).unwrap()
    }

    fn utc(time: DateTime<FixedOffset>) -> DateTime<Utc> {
        time.with_timezone(&Utc)
    }

    #[test]
    fn later_the_same_day() {
        // Monday 11:00
        let now = utc(at(1, 1918, 11, 11, 11, 0));
        let next = next_event(&schedules(), offset(1), now).unwrap();
        assert_eq!(next.time, at(1, 1918, 11, 11, 22, 0));
        assert_eq!(next.temperature, 2333);
    }

    #[test]
    fn yesterdays_sleep_event_after_midnight() {
        // Monday 01:00, Sunday's 01:30 sleep event fires today
        let now = utc(at(2, 1945, 5, 7, 1, 0));
        let next = next_event(&schedules(), offset(2), now).unwrap();
        assert_eq!(next.time, at(2, 1945, 5, 7, 1, 30));
        assert_eq!(next.temperature, 2333);

        // Monday 02:41, that event has passed
        let now = utc(at(2, 1945, 5, 7, 2, 41));
        let next = next_event(&schedules(), offset(2), now).unwrap();
        assert_eq!(next.time, at(2, 1945, 5, 7, 5, 45));
        assert_eq!(next.temperature, 2666);
    }

    #[test]
    fn three_am_boundary_is_inclusive() {
        let mut schedules = schedules();
        let now = utc(at(2, 1945, 5, 7, 2, 41));

        schedules[6].events[3].clock = NaiveTime::from_hms_opt(3, 0, 0).unwrap();
        let next = next_event(&schedules, offset(2), now).unwrap();
        assert_eq!(next.time, at(2, 1945, 5, 7, 3, 0));
        assert_eq!(next.temperature, 2333);

        schedules[6].events[3].clock = NaiveTime::from_hms_opt(3, 0, 1).unwrap();
        let next = next_event(&schedules, offset(2), now).unwrap();
        assert_eq!(next.time, at(2, 1945, 5, 7, 5, 45));
    }

    #[test]
    fn sleep_just_after_three_am_stays_put() {
        let mut schedules = schedules();
        let now = utc(at(2, 1945, 5, 7, 2, 41));

        schedules[6].events[3].clock = NaiveTime::from_hms_milli_opt(3, 0, 0, 500).unwrap();
        let next = next_event(&schedules, offset(2), now).unwrap();
        assert_eq!(next.time, at(2, 1945, 5, 7, 5, 45));
        assert_eq!(next.temperature, 2666);
    }

    #[test]
    fn only_sleep_events_shift() {
        let mut schedules = schedules();
        // Sunday's 01:30 event as a wake event stays on Sunday
        schedules[6].events[3].schedule_type = 0;
        let now = utc(at(2, 1945, 5, 7, 1, 0));
        let next = next_event(&schedules, offset(2), now).unwrap();
        assert_eq!(next.time, at(2, 1945, 5, 7, 5, 45));
    }

    #[test]
    fn midnight_sleep_event_fires_next_day() {
        // Friday 22:45, Friday's midnight sleep fires Saturday 00:00
        let now = utc(at(1, 1990, 11, 9, 22, 45));
        let next = next_event(&schedules(), offset(1), now).unwrap();
        assert_eq!(next.time, at(1, 1990, 11, 10, 0, 0));
        assert_eq!(next.temperature, 2222);
    }

    #[test]
    fn inactive_events_are_skipped() {
        let mut schedules = schedules();
        schedules[4].events[3].active = false;
        let now = utc(at(1, 1990, 11, 9, 22, 45));
        let next = next_event(&schedules, offset(1), now).unwrap();
        assert_eq!(next.time, at(1, 1990, 11, 10, 8, 0));
        assert_eq!(next.temperature, 2666);
    }

    #[test]
    fn schedule_follows_thermostat_offset() {
        let mut schedules = schedules();
        schedules[4].events[3].active = false;
        let now = utc(at(1, 1990, 11, 9, 22, 45));

        // Thermostat on UTC: Saturday 08:00 UTC is 09:00 at +01:00
        let next = next_event(&schedules, offset(0), now).unwrap();
        assert_eq!(next.time, at(1, 1990, 11, 10, 9, 0));
        assert_eq!(next.temperature, 2666);

        // Thermostat in Auckland where it is already Saturday 10:45
        let next = next_event(&schedules, offset(13), now).unwrap();
        assert_eq!(next.time, at(13, 1990, 11, 10, 23, 0));
        assert_eq!(next.temperature, 2333);
    }

    #[test]
    fn wraps_into_next_week() {
        let mut schedules = schedules();
        // Sunday 20:00 with Sunday's sleep event gone: next is Monday's wake
        schedules[6].events[3].active = false;
        let now = utc(at(0, 2024, 6, 9, 20, 0));
        let next = next_event(&schedules, offset(0), now).unwrap();
        assert_eq!(next.time, at(0, 2024, 6, 10, 5, 45));
    }

    #[test]
    fn event_exactly_now_is_not_next() {
        let now = utc(at(1, 1918, 11, 11, 22, 0));
        let next = next_event(&schedules(), offset(1), now).unwrap();
        assert_eq!(next.time, at(1, 1918, 11, 12, 5, 45));
    }

    #[test]
    fn nothing_active_yields_none() {
        let mut schedules = schedules();
        for day in &mut schedules {
            for event in &mut day.events {
                event.active = false;
            }
        }
        let now = utc(at(0, 2024, 6, 9, 20, 0));
        assert!(next_event(&schedules, offset(0), now).is_none());
        assert!(next_event(&[], offset(0), now).is_none());
    }

    #[test]
    fn converts_to_other_timezone() {
        let now = utc(at(1, 1918, 11, 11, 11, 0));
        let next = next_event(&schedules(), offset(1), now).unwrap();
        let in_utc = next.with_timezone(&Utc);
        assert_eq!(in_utc.time, Utc.with_ymd_and_hms(1918, 11, 11, 21, 0, 0).unwrap());
        assert_eq!(in_utc.temperature, 2333);
    }
}
