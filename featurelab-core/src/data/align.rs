//! Calendar alignment of external series.
//!
//! Lower-frequency or irregular series (monthly CPI, weekly spreads, daily
//! indices with their own holidays) are forward-filled onto a trading
//! calendar. Values only ever move forward in time: no interpolation, no
//! averaging, no back-fill.

use crate::domain::{AlignedSeries, ExternalSeries, Observation, TradingCalendar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a series is mapped onto the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    /// Forward-fill to a dense daily grid, then reindex onto the calendar
    /// taking the latest grid value at or before each calendar day.
    #[default]
    TwoStage,
    /// Take exact-date matches only, then forward-fill along the calendar.
    /// Observations dated between calendar days are ignored.
    Direct,
}

pub struct CalendarAligner;

impl CalendarAligner {
    /// Two-stage alignment.
    pub fn align(series: &ExternalSeries, calendar: &TradingCalendar) -> AlignedSeries {
        Self::align_with(series, calendar, AlignMode::TwoStage)
    }

    pub fn align_with(
        series: &ExternalSeries,
        calendar: &TradingCalendar,
        mode: AlignMode,
    ) -> AlignedSeries {
        let observations = series.sorted_finite();
        let values = match mode {
            AlignMode::TwoStage => reindex_dense(&observations, calendar.dates()),
            AlignMode::Direct => reindex_exact(&observations, calendar.dates()),
        };

        let aligned = AlignedSeries::new(series.name.clone(), values);
        debug!(
            series = %series.name,
            ?mode,
            observations = observations.len(),
            calendar_days = calendar.len(),
            missing = aligned.missing_count(),
            "aligned series"
        );
        aligned
    }

    /// Dense daily grid from the first to the last observation, forward-filled.
    ///
    /// Duplicate dates resolve to the latest entry in provider order.
    pub fn dense_daily(series: &ExternalSeries) -> Vec<(NaiveDate, f64)> {
        let observations = series.sorted_finite();
        match (observations.first(), dense_grid(&observations)) {
            (Some(first), Some(grid)) => grid
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (first.date + chrono::Duration::days(i as i64), v)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

// ── Helpers ──

/// One slot per calendar day in [first, last]; `None` never survives past
/// index 0 because the first slot is always an observation.
fn dense_grid(observations: &[Observation]) -> Option<Vec<Option<f64>>> {
    let first = observations.first()?.date;
    let last = observations.last()?.date;
    let span = (last - first).num_days() as usize + 1;

    let mut grid = vec![None; span];
    for obs in observations {
        grid[(obs.date - first).num_days() as usize] = Some(obs.value);
    }

    let mut carry = None;
    for slot in grid.iter_mut() {
        match slot {
            Some(v) => carry = Some(*v),
            None => *slot = carry,
        }
    }
    Some(grid)
}

fn reindex_dense(observations: &[Observation], dates: &[NaiveDate]) -> Vec<Option<f64>> {
    let (Some(first), Some(grid)) = (observations.first(), dense_grid(observations)) else {
        return vec![None; dates.len()];
    };
    let first = first.date;
    let last_slot = grid.len() - 1;

    dates
        .iter()
        .map(|&day| {
            if day < first {
                None
            } else {
                let offset = ((day - first).num_days() as usize).min(last_slot);
                grid[offset]
            }
        })
        .collect()
}

fn reindex_exact(observations: &[Observation], dates: &[NaiveDate]) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(dates.len());
    let mut cursor = 0;
    let mut carry = None;

    for &day in dates {
        while cursor < observations.len() && observations[cursor].date < day {
            cursor += 1;
        }
        // last duplicate on the exact day wins
        while cursor < observations.len() && observations[cursor].date == day {
            carry = Some(observations[cursor].value);
            cursor += 1;
        }
        values.push(carry);
    }
    values
}
