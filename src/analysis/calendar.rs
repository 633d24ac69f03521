//! Per-day heat indicators for a calendar month.

use super::aggregator::band_of;
use crate::models::{Episode, IntensityBand, YearMonth};
use chrono::NaiveDate;
use serde::Serialize;

/// One day of the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub episodes: usize,
    /// Highest intensity recorded that day.
    pub max_intensity: Option<u8>,
    /// Band of `max_intensity`; drives the heat indicator.
    pub band: Option<IntensityBand>,
}

/// Build one row per day of `month`, including days without episodes.
pub fn calendar_month(episodes: &[Episode], month: YearMonth) -> Vec<CalendarDay> {
    let mut days: Vec<CalendarDay> = month
        .days()
        .map(|date| CalendarDay {
            date,
            episodes: 0,
            max_intensity: None,
            band: None,
        })
        .collect();

    let first = month.first_day();
    for episode in episodes.iter().filter(|e| month.contains(e.date)) {
        let offset = (episode.date - first).num_days() as usize;
        let Some(day) = days.get_mut(offset) else {
            continue;
        };
        day.episodes += 1;
        let max = day.max_intensity.map_or(episode.intensity, |m| m.max(episode.intensity));
        day.max_intensity = Some(max);
        day.band = Some(band_of(max));
    }

    days
}

/// Number of days in the month with at least one episode.
pub fn days_with_episodes(days: &[CalendarDay]) -> usize {
    days.iter().filter(|d| d.episodes > 0).count()
}
