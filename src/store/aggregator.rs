//! Heatmap and chart aggregation.
//!
//! Turns the sparse submission calendar into the dense day grid used by
//! the contribution heatmap, and into per-month totals for the chart.
//! Everything here is a pure function of the calendar and `today`.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::calendar::{day_key, SubmissionCalendar};

/// Days before `today` covered by the default heatmap.
pub const DEFAULT_WINDOW_DAYS: u32 = 365;

/// Highest heatmap level; counts at or above it saturate.
pub const MAX_LEVEL: u8 = 6;

const DAYS_PER_WEEK: usize = 7;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One cell of the heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    /// UTC-midnight UNIX timestamp of `date`.
    pub timestamp: i64,
    pub count: u64,
    pub level: u8,
}

/// Seven consecutive days; the last week of a grid may be shorter.
pub type Week = Vec<ContributionDay>;

/// Consecutive weeks whose first day falls in the same month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGroup {
    pub year: i32,
    pub month: u32,
    pub label: &'static str,
    pub weeks: Vec<Week>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapSummary {
    pub total_submissions: u64,
    pub active_days: u32,
}

/// Dense grid over a trailing window of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub weeks: Vec<Week>,
    pub months: Vec<MonthGroup>,
    pub summary: HeatmapSummary,
}

/// Submissions in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    /// e.g. "Jan 24"
    pub label: String,
    pub count: u64,
}

/// Heatmap level for a day's submission count: the count itself up to
/// `MAX_LEVEL - 1`, then `MAX_LEVEL`.
pub fn level_for(count: u64) -> u8 {
    count.min(MAX_LEVEL as u64) as u8
}

/// Builds the grid for `today - window_days ..= today`, grouped
/// positionally into weeks of seven (no weekday alignment). The start is
/// clamped to the earliest representable date.
pub fn bucketize(calendar: &SubmissionCalendar, today: NaiveDate, window_days: u32) -> Heatmap {
    let start = today
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);

    let mut weeks: Vec<Week> = Vec::new();
    let mut current: Week = Vec::with_capacity(DAYS_PER_WEEK);

    for date in start.iter_days().take_while(|d| *d <= today) {
        let count = calendar.count_on(date);
        current.push(ContributionDay {
            date,
            timestamp: day_key(date),
            count,
            level: level_for(count),
        });

        if current.len() == DAYS_PER_WEEK {
            weeks.push(std::mem::replace(
                &mut current,
                Vec::with_capacity(DAYS_PER_WEEK),
            ));
        }
    }
    if !current.is_empty() {
        weeks.push(current);
    }

    let months = group_by_month(&weeks);
    let summary = summarize(&weeks);

    Heatmap {
        start,
        end: today,
        weeks,
        months,
        summary,
    }
}

/// Groups consecutive weeks by the month of their first day.
pub fn group_by_month(weeks: &[Week]) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();

    for week in weeks {
        let Some(first) = week.first() else {
            continue;
        };
        let (year, month) = (first.date.year(), first.date.month());

        match groups.last_mut() {
            Some(group) if group.year == year && group.month == month => {
                group.weeks.push(week.clone());
            }
            _ => groups.push(MonthGroup {
                year,
                month,
                label: month_label(month),
                weeks: vec![week.clone()],
            }),
        }
    }

    groups
}

/// Total submissions and number of days with at least one.
pub fn summarize(weeks: &[Week]) -> HeatmapSummary {
    weeks
        .iter()
        .flatten()
        .filter(|day| day.count > 0)
        .fold(HeatmapSummary::default(), |mut acc, day| {
            acc.total_submissions = acc.total_submissions.saturating_add(day.count);
            acc.active_days = acc.active_days.saturating_add(1);
            acc
        })
}

/// Per-month submission totals over the whole calendar, oldest first.
pub fn monthly_totals(calendar: &SubmissionCalendar) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<(i32, u32), u64> = BTreeMap::new();

    for (date, count) in calendar.days() {
        let total = by_month.entry((date.year(), date.month())).or_insert(0);
        *total = total.saturating_add(count);
    }

    by_month
        .into_iter()
        .map(|((year, month), count)| MonthlyTotal {
            year,
            month,
            label: format!("{} {:02}", month_label(month), year.rem_euclid(100)),
            count,
        })
        .collect()
}

fn month_label(month: u32) -> &'static str {
    MONTH_LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}
