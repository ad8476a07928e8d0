//! Project duration in weeks, derived from the roadmap's phase intervals.

use serde::{Deserialize, Serialize};

use crate::types::{RoadmapInterval, ValueRange};

/// Productive days in a resource-week.
pub const WORK_DAYS_PER_WEEK: f64 = 4.0;
/// Productive hours in a working day.
pub const WORK_HOURS_PER_DAY: f64 = 6.0;
/// Capacity of one resource-week: 4 days x 6 hours.
pub const HOURS_PER_RESOURCE_WEEK: f64 = WORK_DAYS_PER_WEEK * WORK_HOURS_PER_DAY;
/// Longest schedule accepted: ten years of weeks. Also caps the grid width.
pub const MAX_WEEKS: u32 = 520;

// ---------------------------------------------------------------------------
// WeekSpan
// ---------------------------------------------------------------------------

/// A clamped, 1-based, inclusive week interval. `start >= 1` and
/// `end >= start` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekSpan {
    start: u32,
    end: u32,
}

impl WeekSpan {
    /// Clamp raw week numbers: a start below 1 becomes 1, an end before the
    /// start collapses onto the start.
    pub fn clamped(start_week: i64, end_week: i64) -> Self {
        let start = clamp_week(start_week.max(1));
        let end = clamp_week(end_week).max(start);
        WeekSpan { start, end }
    }

    pub fn start(self) -> u32 {
        self.start
    }

    pub fn end(self) -> u32 {
        self.end
    }

    /// Number of weeks covered, at least 1.
    pub fn weeks(self) -> u32 {
        self.end - self.start + 1
    }
}

impl From<&RoadmapInterval> for WeekSpan {
    fn from(interval: &RoadmapInterval) -> Self {
        WeekSpan::clamped(interval.start_week, interval.end_week)
    }
}

fn clamp_week(w: i64) -> u32 {
    w.clamp(0, u32::MAX as i64) as u32
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Latest end week across the roadmap, or `None` for an empty roadmap.
pub fn max_end_week(roadmap: &[RoadmapInterval]) -> Option<u32> {
    roadmap.iter().map(|i| WeekSpan::from(i).end()).max()
}

/// Hours-based fallback: whole resource-weeks needed for `total_hours`.
pub fn weeks_for_hours(total_hours: f64) -> u32 {
    if !total_hours.is_finite() || total_hours <= 0.0 {
        return 0;
    }
    let weeks = (total_hours / HOURS_PER_RESOURCE_WEEK).ceil();
    weeks.min(u32::MAX as f64) as u32
}

/// Critical-path duration: the latest end week when a roadmap exists
/// (parallel phases overlap, so this is not a sum), else the hours-based
/// fallback.
pub fn resolve_weeks(roadmap: &[RoadmapInterval], total_hours: f64) -> u32 {
    max_end_week(roadmap).unwrap_or_else(|| weeks_for_hours(total_hours))
}

/// Width of the timeline grid: never narrower than the advertised maximum,
/// the resolved duration, or any roadmap interval, and never wider than
/// [`MAX_WEEKS`].
pub fn grid_weeks(advisory: &ValueRange, resolved: u32, roadmap: &[RoadmapInterval]) -> u32 {
    let advertised = if advisory.max.is_finite() && advisory.max > 0.0 {
        advisory.max.ceil().min(u32::MAX as f64) as u32
    } else {
        0
    };
    advertised
        .max(resolved)
        .max(max_end_week(roadmap).unwrap_or(0))
        .min(MAX_WEEKS)
}

// ---------------------------------------------------------------------------
// DurationSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    /// Critical-path weeks.
    pub resolved_weeks: u32,
    /// Columns in the timeline grid.
    pub grid_weeks: u32,
    /// `true` when no roadmap was supplied and hours drove the result.
    pub from_hours: bool,
    /// Generated min/max, passed through unchanged.
    pub advisory: ValueRange,
}

impl DurationSummary {
    pub fn compute(roadmap: &[RoadmapInterval], advisory: ValueRange, total_hours: f64) -> Self {
        let resolved_weeks = resolve_weeks(roadmap, total_hours);
        Self {
            resolved_weeks,
            grid_weeks: grid_weeks(&advisory, resolved_weeks, roadmap),
            from_hours: roadmap.is_empty(),
            advisory,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::interval;

    #[test]
    fn resource_week_is_24_hours() {
        assert_eq!(HOURS_PER_RESOURCE_WEEK, 24.0);
    }

    #[test]
    fn parallel_phases_do_not_add_up() {
        let roadmap = vec![
            interval("Design", 1, 2),
            interval("Backend", 3, 6),
            interval("Frontend", 3, 6),
            interval("QA", 7, 8),
        ];
        assert_eq!(resolve_weeks(&roadmap, 10_000.0), 8);
    }

    #[test]
    fn empty_roadmap_uses_hours() {
        assert_eq!(resolve_weeks(&[], 110.0), 5);
        assert_eq!(resolve_weeks(&[], 24.0), 1);
        assert_eq!(resolve_weeks(&[], 24.5), 2);
        assert_eq!(resolve_weeks(&[], 0.0), 0);
    }

    #[test]
    fn start_below_one_is_clamped() {
        let span = WeekSpan::clamped(0, 3);
        assert_eq!((span.start(), span.end()), (1, 3));
        let span = WeekSpan::clamped(-4, -2);
        assert_eq!((span.start(), span.end()), (1, 1));
    }

    #[test]
    fn end_before_start_collapses() {
        let span = WeekSpan::clamped(5, 2);
        assert_eq!((span.start(), span.end()), (5, 5));
        assert_eq!(span.weeks(), 1);
    }

    #[test]
    fn clamped_end_counts_toward_max() {
        let roadmap = vec![interval("A", 1, 2), interval("B", 9, 3)];
        assert_eq!(max_end_week(&roadmap), Some(9));
    }

    #[test]
    fn grid_covers_advertised_max() {
        let advisory = ValueRange { min: 6.0, max: 9.5 };
        let roadmap = vec![interval("A", 1, 8)];
        assert_eq!(grid_weeks(&advisory, 8, &roadmap), 10);

        let advisory = ValueRange { min: 2.0, max: 4.0 };
        assert_eq!(grid_weeks(&advisory, 8, &roadmap), 8);

        let advisory = ValueRange {
            min: 0.0,
            max: f64::NAN,
        };
        assert_eq!(grid_weeks(&advisory, 0, &[]), 0);
    }

    #[test]
    fn grid_width_is_capped() {
        let advisory = ValueRange {
            min: 1.0,
            max: 1e12,
        };
        assert_eq!(grid_weeks(&advisory, 3, &[]), MAX_WEEKS);

        let summary = DurationSummary::compute(&[], ValueRange { min: 0.0, max: 0.0 }, 1e9);
        assert_eq!(summary.grid_weeks, MAX_WEEKS);
        assert!(summary.resolved_weeks > MAX_WEEKS);
    }

    #[test]
    fn summary_passes_advisory_through() {
        let advisory = ValueRange { min: 6.0, max: 9.0 };
        let summary = DurationSummary::compute(&[interval("A", 1, 4)], advisory, 500.0);
        assert_eq!(summary.resolved_weeks, 4);
        assert_eq!(summary.grid_weeks, 9);
        assert!(!summary.from_hours);
        assert_eq!(summary.advisory, advisory);

        let summary = DurationSummary::compute(&[], advisory, 500.0);
        assert_eq!(summary.resolved_weeks, 21);
        assert_eq!(summary.grid_weeks, 21);
        assert!(summary.from_hours);
    }
}
