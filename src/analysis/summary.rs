//! Composed summaries behind the dashboard and trends views.

use super::aggregator::{
    average_duration, average_intensity, average_sleep_hours, average_stress, band_distribution,
    busiest_weekday, current_month, days_since_last, medication_frequency, monthly_series,
    mood_distribution, relief_frequency, round1, symptom_frequency, top_label, top_n,
    trailing_months, trigger_frequency, weekday_distribution, weekday_name, worst_episode,
    LabelCount, WEEKDAYS,
};
use crate::models::{Episode, IntensityBand, Mood, YearMonth};
use chrono::NaiveDate;
use serde::Serialize;

/// Shown in place of a ranking leader when nothing was recorded.
pub const NONE_LABEL: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandCount {
    pub band: IntensityBand,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    pub day: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: usize,
}

/// One point of the monthly trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    pub episodes: usize,
    pub average_intensity: f64,
    pub average_duration: f64,
    pub total_hours: f64,
}

/// Headline numbers for the current month plus all-time leaders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub today: NaiveDate,
    pub month: YearMonth,
    pub episodes_this_month: usize,
    pub average_intensity_this_month: f64,
    pub hours_this_month: f64,
    pub total_episodes: usize,
    pub top_medication: Option<String>,
    pub top_trigger: Option<String>,
    pub busiest_weekday: Option<&'static str>,
    pub days_since_last: Option<i64>,
    pub bands_this_month: Vec<BandCount>,
}

impl DashboardSummary {
    pub fn top_medication_label(&self) -> &str {
        self.top_medication.as_deref().unwrap_or(NONE_LABEL)
    }

    pub fn top_trigger_label(&self) -> &str {
        self.top_trigger.as_deref().unwrap_or(NONE_LABEL)
    }

    pub fn busiest_weekday_label(&self) -> &str {
        self.busiest_weekday.unwrap_or(NONE_LABEL)
    }
}

/// Build the dashboard for the month containing `today`.
pub fn dashboard(episodes: &[Episode], today: NaiveDate) -> DashboardSummary {
    let this_month = current_month(episodes, today);
    let weekdays = weekday_distribution(episodes);

    DashboardSummary {
        today,
        month: YearMonth::from_date(today),
        episodes_this_month: this_month.len(),
        average_intensity_this_month: round1(average_intensity(this_month.iter().copied())),
        hours_this_month: round1(this_month.iter().map(|e| e.duration).sum()),
        total_episodes: episodes.len(),
        top_medication: top_label(&medication_frequency(episodes)).map(str::to_string),
        top_trigger: top_label(&trigger_frequency(episodes)).map(str::to_string),
        busiest_weekday: busiest_weekday(&weekdays).map(weekday_name),
        days_since_last: days_since_last(episodes, today),
        bands_this_month: band_counts(band_distribution(this_month.iter().copied())),
    }
}

/// Knobs for [`trends`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendOptions {
    /// Most recent months to include in the series.
    pub months: usize,
    /// Length of each ranking.
    pub top_n: usize,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            months: 12,
            top_n: 5,
        }
    }
}

/// Everything the trends view charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendsSummary {
    pub total_episodes: usize,
    pub monthly: Vec<MonthlyPoint>,
    pub weekdays: Vec<WeekdayCount>,
    pub bands: Vec<BandCount>,
    pub top_medications: Vec<LabelCount>,
    pub top_triggers: Vec<LabelCount>,
    pub top_symptoms: Vec<LabelCount>,
    pub relief_methods: Vec<LabelCount>,
    pub moods: Vec<MoodCount>,
    pub average_intensity: f64,
    pub average_duration: f64,
    pub average_stress: f64,
    pub average_sleep_hours: Option<f64>,
    /// Most intense episode, the first recorded one on ties.
    pub worst_episode: Option<Episode>,
}

/// Build the trends summary over the whole collection.
pub fn trends(episodes: &[Episode], options: TrendOptions) -> TrendsSummary {
    let monthly = trailing_months(monthly_series(episodes), options.months)
        .into_iter()
        .map(|bucket| MonthlyPoint {
            month: bucket.month,
            episodes: bucket.count,
            average_intensity: bucket.average_intensity(),
            average_duration: bucket.average_duration(),
            total_hours: round1(bucket.total_duration),
        })
        .collect();

    let weekdays = WEEKDAYS
        .iter()
        .zip(weekday_distribution(episodes))
        .map(|(day, count)| WeekdayCount {
            day: weekday_name(*day),
            count,
        })
        .collect();

    TrendsSummary {
        total_episodes: episodes.len(),
        monthly,
        weekdays,
        bands: band_counts(band_distribution(episodes)),
        top_medications: top_n(medication_frequency(episodes), options.top_n),
        top_triggers: top_n(trigger_frequency(episodes), options.top_n),
        top_symptoms: top_n(symptom_frequency(episodes), options.top_n),
        relief_methods: top_n(relief_frequency(episodes), options.top_n),
        moods: mood_distribution(episodes)
            .into_iter()
            .map(|(mood, count)| MoodCount { mood, count })
            .collect(),
        average_intensity: round1(average_intensity(episodes)),
        average_duration: round1(average_duration(episodes)),
        average_stress: round1(average_stress(episodes)),
        average_sleep_hours: average_sleep_hours(episodes).map(round1),
        worst_episode: worst_episode(episodes).cloned(),
    }
}

fn band_counts(distribution: [usize; 4]) -> Vec<BandCount> {
    IntensityBand::ALL
        .iter()
        .zip(distribution)
        .map(|(band, count)| BandCount { band: *band, count })
        .collect()
}
