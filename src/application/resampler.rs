// Window filtering and calendar-aligned bucket resampling
use crate::domain::series::Sample;
use crate::domain::window::{TimeWindow, WindowMode};

/// Restrict `samples` to the window (inclusive at both ends) and reduce the
/// result to one sample per bucket for named modes.
///
/// The bucket grid is anchored to the calendar: truncating the first
/// in-window timestamp to the mode's grid, not to `window.start` and not to
/// the data spacing. Each bucket `[start, start+interval)` contributes its
/// *first* qualifying sample: the displayed reading is always a real
/// measurement with exact provenance, never an average. Empty buckets are
/// skipped, not null-filled. Modes without a bucket interval (explicit
/// ranges, the 30-day view) are returned filtered but otherwise untouched.
pub fn resample(samples: &[Sample], window: &TimeWindow, mode: WindowMode) -> Vec<Sample> {
    let filtered: Vec<Sample> = samples
        .iter()
        .copied()
        .filter(|s| window.contains(s.timestamp) && s.value.is_finite())
        .collect();

    let Some(interval) = mode.bucket_interval() else {
        return filtered;
    };
    let Some(first) = filtered.first() else {
        return filtered;
    };
    let last_timestamp = filtered[filtered.len() - 1].timestamp;

    let mut out = Vec::new();
    let mut bucket_start = mode.align(first.timestamp);
    let mut idx = 0;

    while bucket_start <= last_timestamp {
        let bucket_end = bucket_start + interval;
        while idx < filtered.len() && filtered[idx].timestamp < bucket_start {
            idx += 1;
        }
        if idx < filtered.len() && filtered[idx].timestamp < bucket_end {
            out.push(filtered[idx]);
            while idx < filtered.len() && filtered[idx].timestamp < bucket_end {
                idx += 1;
            }
        }
        bucket_start = bucket_end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn dt(d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn window(start: NaiveDateTime, end: NaiveDateTime) -> TimeWindow {
        TimeWindow { start, end }
    }

    #[test]
    fn test_output_stays_inside_window() {
        let samples: Vec<Sample> = (0..48)
            .map(|h| Sample::new(dt(1, 0, 0) + Duration::hours(h), h as f64))
            .collect();
        let w = window(dt(1, 12, 0), dt(2, 6, 0));

        let out = resample(&samples, &w, WindowMode::H1);
        assert!(!out.is_empty());
        assert!(out.iter().all(|s| w.contains(s.timestamp)));
    }

    #[test]
    fn test_custom_window_is_not_resampled() {
        let samples = vec![
            Sample::new(dt(1, 10, 5), 1.0),
            Sample::new(dt(1, 10, 10), 2.0),
            Sample::new(dt(1, 10, 15), f64::NAN),
            Sample::new(dt(1, 11, 0), 3.0),
        ];
        let w = window(dt(1, 0, 0), dt(2, 0, 0));

        let out = resample(&samples, &w, WindowMode::Custom);
        // NaN dropped, everything else untouched even inside the same hour.
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].value, 2.0);
    }

    #[test]
    fn test_thirty_day_mode_keeps_native_density() {
        let samples = vec![
            Sample::new(dt(1, 10, 5), 1.0),
            Sample::new(dt(1, 10, 10), 2.0),
            Sample::new(dt(5, 10, 0), 3.0),
        ];
        let w = window(dt(1, 0, 0), dt(30, 0, 0));

        // No bucketing: both same-hour samples survive.
        let out = resample(&samples, &w, WindowMode::D30);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_buckets_align_to_midnight_not_to_data() {
        // First sample at 03:17; with daily buckets the grid still starts at
        // midnight, so 03:17 and 23:59 share one bucket.
        let samples = vec![
            Sample::new(dt(1, 3, 17), 1.0),
            Sample::new(dt(1, 23, 59), 2.0),
            Sample::new(dt(2, 0, 0), 3.0),
        ];
        let w = window(dt(1, 0, 0), dt(3, 0, 0));

        let out = resample(&samples, &w, WindowMode::H24);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, dt(1, 3, 17));
        assert_eq!(out[1].timestamp, dt(2, 0, 0));
    }

    #[test]
    fn test_first_sample_per_bucket_and_gaps_skipped() {
        // Hourly buckets; 13:00 bucket has no samples and must be absent.
        let samples = vec![
            Sample::new(dt(1, 12, 10), 1.0),
            Sample::new(dt(1, 12, 40), 2.0),
            Sample::new(dt(1, 14, 5), 3.0),
            Sample::new(dt(1, 14, 50), 4.0),
        ];
        let w = window(dt(1, 12, 0), dt(1, 15, 0));

        let out = resample(&samples, &w, WindowMode::H1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, 1.0);
        assert_eq!(out[1].value, 3.0);
    }

    #[test]
    fn test_output_timestamps_strictly_increase() {
        let samples: Vec<Sample> = (0..300)
            .map(|m| Sample::new(dt(1, 0, 0) + Duration::minutes(m * 7), m as f64))
            .collect();
        let w = window(dt(1, 0, 0), dt(3, 0, 0));

        let out = resample(&samples, &w, WindowMode::H6);
        assert!(out.windows(2).all(|p| p[0].timestamp < p[1].timestamp));
    }

    #[test]
    fn test_week_buckets_align_to_monday() {
        // 2024-01-03 is a Wednesday; the week bucket starts Monday 2024-01-01,
        // so everything up to Sunday night lands in one bucket.
        let samples = vec![
            Sample::new(dt(3, 9, 0), 1.0),
            Sample::new(dt(6, 9, 0), 2.0),
            Sample::new(dt(8, 9, 0), 3.0), // next Monday
        ];
        let w = window(dt(1, 0, 0), dt(14, 0, 0));

        let out = resample(&samples, &w, WindowMode::D7);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, 1.0);
        assert_eq!(out[1].value, 3.0);
    }

    #[test]
    fn test_dense_day_collapses_to_single_daily_bucket() {
        // 10 samples per hour over 48h, then a 24h-mode window over the last
        // 24h: one daily bucket, one sample, the first qualifying reading.
        let start = dt(1, 0, 0);
        let samples: Vec<Sample> = (0..48 * 10)
            .map(|i| Sample::new(start + Duration::minutes(i * 6), i as f64))
            .collect();
        let now = start + Duration::hours(48);
        let w = window(now - Duration::hours(24), now);

        let out = resample(&samples, &w, WindowMode::H24);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, w.start);
    }
}
