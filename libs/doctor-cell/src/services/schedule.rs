// libs/doctor-cell/src/services/schedule.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use tracing::debug;

use crate::models::WeeklySchedule;

/// Produces the candidate booking times for one doctor on one calendar date,
/// quantized to the configured granularity. Pure function of its inputs.
pub struct SlotGenerator {
    granularity_minutes: u32,
}

impl SlotGenerator {
    pub fn new(granularity_minutes: u32) -> Self {
        Self {
            granularity_minutes,
        }
    }

    /// All quantized times within the schedule's windows for `date`, ordered.
    /// Empty when the date falls outside the doctor's active range or the
    /// weekday has no window. For today, times at or before `now` are dropped.
    pub fn candidate_times(
        &self,
        schedule: &WeeklySchedule,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<NaiveTime> {
        if !schedule.covers(date) {
            debug!("Date {} outside doctor's active range", date);
            return vec![];
        }

        let day_of_week = day_of_week_index(date);
        let step = self.granularity_minutes;

        let mut times: Vec<NaiveTime> = Vec::new();
        for window in schedule.windows_for_day(day_of_week) {
            let start = minutes_of_day(window.start_time);
            let end = minutes_of_day(window.end_time);
            if start >= end {
                continue;
            }

            // First grid point at or after the window opens; each slot must
            // fit entirely before the window closes.
            let mut minute = start.div_ceil(step) * step;
            while minute + step <= end {
                times.push(time_from_minutes(minute));
                minute += step;
            }
        }

        times.sort();
        times.dedup();

        if date == now.date_naive() {
            let cutoff = now.time();
            times.retain(|t| *t > cutoff);
        }

        times
    }

    /// Whether a time-of-day sits on the quantization grid.
    pub fn is_aligned(&self, time: NaiveTime) -> bool {
        minutes_of_day(time) % self.granularity_minutes == 0
            && time == time_from_minutes(minutes_of_day(time))
    }
}

fn day_of_week_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .expect("minutes-of-day stays below 24h")
}
