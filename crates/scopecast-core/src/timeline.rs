//! Calendar grid for the roadmap view: week columns grouped under real
//! month headers, plus proportional bar placement for each phase.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::duration::WeekSpan;
use crate::types::RoadmapInterval;

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// First day of the month after `today`.
pub fn anchor_for(today: NaiveDate) -> NaiveDate {
    today
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
        .unwrap_or(today)
}

/// Start date of 1-based week `week`, or `None` past the calendar's range.
pub fn week_start(anchor: NaiveDate, week: u32) -> Option<NaiveDate> {
    let offset = u64::from(week.checked_sub(1)?) * 7;
    anchor.checked_add_days(Days::new(offset))
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

// ---------------------------------------------------------------------------
// MonthGroup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGroup {
    pub label: String,
    pub year: i32,
    pub month: u32,
    /// Contiguous, increasing 1-based week indices starting in this month.
    pub weeks: Vec<u32>,
}

impl MonthGroup {
    /// Share of the grid's width this header spans.
    pub fn width_fraction(&self, total_weeks: u32) -> f64 {
        if total_weeks == 0 {
            return 0.0;
        }
        self.weeks.len() as f64 / f64::from(total_weeks)
    }
}

/// Group weeks `1..=total_weeks` by the month their start date falls in.
///
/// The groups partition the week range exactly once, in order.
pub fn build_grid(anchor: NaiveDate, total_weeks: u32) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for week in 1..=total_weeks {
        let Some(date) = week_start(anchor, week) else {
            tracing::warn!(week, "week start overflows the calendar; grid truncated");
            break;
        };
        match groups.last_mut() {
            Some(g) if g.year == date.year() && g.month == date.month() => g.weeks.push(week),
            _ => groups.push(MonthGroup {
                label: month_label(date),
                year: date.year(),
                month: date.month(),
                weeks: vec![week],
            }),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// PhaseBar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseBar {
    pub phase: String,
    pub milestone: String,
    pub span: WeekSpan,
    /// `(start - 1) / total_weeks`.
    pub offset: f64,
    /// `(end - start + 1) / total_weeks`.
    pub width: f64,
}

pub fn phase_bars(roadmap: &[RoadmapInterval], total_weeks: u32) -> Vec<PhaseBar> {
    if total_weeks == 0 {
        return Vec::new();
    }
    let total = f64::from(total_weeks);
    roadmap
        .iter()
        .map(|interval| {
            let span = WeekSpan::from(interval);
            PhaseBar {
                phase: interval.phase.clone(),
                milestone: interval.milestone.clone(),
                span,
                offset: f64::from(span.start() - 1) / total,
                width: f64::from(span.weeks()) / total,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub anchor: NaiveDate,
    pub total_weeks: u32,
    pub months: Vec<MonthGroup>,
    pub bars: Vec<PhaseBar>,
}

impl Timeline {
    pub fn build(anchor: NaiveDate, total_weeks: u32, roadmap: &[RoadmapInterval]) -> Self {
        Self {
            anchor,
            total_weeks,
            months: build_grid(anchor, total_weeks),
            bars: phase_bars(roadmap, total_weeks),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
