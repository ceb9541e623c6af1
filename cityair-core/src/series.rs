//! Latest-value selection over index-aligned hourly series.
//!
//! Timestamps are compared as strings, so `now` must use the same layout as
//! the series (`YYYY-MM-DDTHH:MM` for Open-Meteo).

use chrono::{DateTime, Utc};

/// Timestamp layout used by Open-Meteo hourly series.
pub const SERIES_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// `now` truncated to the minute, in the series timestamp layout.
pub fn now_minute(now: DateTime<Utc>) -> String {
    now.format(SERIES_TIME_FORMAT).to_string()
}

/// Most recent present value at or before `now`.
///
/// Picks the qualifying entry with the greatest timestamp rather than the last
/// index, so unordered series still resolve correctly. Ties go to the later
/// index. When nothing qualifies, falls back to the last present value in the
/// whole series. Entries past the shorter of the two slices are ignored by the
/// primary scan. A series missing either its time axis or its values is absent.
pub fn latest_value<T: AsRef<str>>(times: &[T], values: &[Option<f64>], now: &str) -> Option<f64> {
    if times.is_empty() || values.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f64)> = None;

    for (time, value) in times.iter().zip(values) {
        let time = time.as_ref();
        let Some(value) = *value else { continue };
        if time > now {
            continue;
        }
        match best {
            Some((best_time, _)) if time < best_time => {}
            _ => best = Some((time, value)),
        }
    }

    best.map(|(_, value)| value)
        .or_else(|| values.iter().rev().find_map(|v| *v))
}
