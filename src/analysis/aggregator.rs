//! Episode aggregation and statistics.
//!
//! Every function here is a pure transform of a slice of episodes. Nothing
//! reads the clock; callers pass `today` where it matters. Empty input
//! yields zeros or empty collections, and out-of-range field values are
//! aggregated as they are.

use crate::models::{Episode, IntensityBand, Mood, YearMonth};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Days of the week in bucket order, Sunday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// A label and how many times it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Per-month accumulator for the trends series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub month: YearMonth,
    pub count: usize,
    pub total_intensity: u32,
    /// Sum of durations in hours.
    pub total_duration: f64,
}

impl MonthlyBucket {
    fn empty(month: YearMonth) -> Self {
        Self {
            month,
            count: 0,
            total_intensity: 0,
            total_duration: 0.0,
        }
    }

    /// Mean intensity rounded to one decimal place.
    pub fn average_intensity(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        round1(f64::from(self.total_intensity) / self.count as f64)
    }

    /// Mean duration in hours, rounded to one decimal place.
    pub fn average_duration(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        round1(self.total_duration / self.count as f64)
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Episodes whose date falls within `month`.
pub fn episodes_in_month(episodes: &[Episode], month: YearMonth) -> Vec<&Episode> {
    episodes.iter().filter(|e| month.contains(e.date)).collect()
}

/// Episodes in the same calendar month as `today`.
pub fn current_month(episodes: &[Episode], today: NaiveDate) -> Vec<&Episode> {
    episodes_in_month(episodes, YearMonth::from_date(today))
}

/// Arithmetic mean of `intensity`; 0 for no episodes.
pub fn average_intensity<'a, I>(episodes: I) -> f64
where
    I: IntoIterator<Item = &'a Episode>,
{
    mean(episodes.into_iter().map(|e| f64::from(e.intensity)))
}

/// Mean duration in hours; 0 for no episodes.
pub fn average_duration<'a, I>(episodes: I) -> f64
where
    I: IntoIterator<Item = &'a Episode>,
{
    mean(episodes.into_iter().map(|e| e.duration))
}

/// Mean stress level; 0 for no episodes.
pub fn average_stress<'a, I>(episodes: I) -> f64
where
    I: IntoIterator<Item = &'a Episode>,
{
    mean(episodes.into_iter().map(|e| f64::from(e.stress_level)))
}

/// Mean sleep over the episodes that recorded it.
pub fn average_sleep_hours<'a, I>(episodes: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Episode>,
{
    let hours: Vec<f64> = episodes.into_iter().filter_map(|e| e.sleep_hours).collect();
    (!hours.is_empty()).then(|| mean(hours))
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Count each distinct label, most frequent first.
///
/// Equal counts are ordered lexicographically so the ranking does not
/// depend on the order episodes were recorded in.
pub fn frequency_ranking<'a, I>(labels: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }

    let mut ranking: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    ranking
}

pub fn medication_frequency(episodes: &[Episode]) -> Vec<LabelCount> {
    frequency_ranking(episodes.iter().flat_map(|e| &e.medications).map(String::as_str))
}

pub fn trigger_frequency(episodes: &[Episode]) -> Vec<LabelCount> {
    frequency_ranking(episodes.iter().flat_map(|e| &e.triggers).map(String::as_str))
}

pub fn symptom_frequency(episodes: &[Episode]) -> Vec<LabelCount> {
    frequency_ranking(episodes.iter().flat_map(|e| &e.symptoms).map(String::as_str))
}

pub fn relief_frequency(episodes: &[Episode]) -> Vec<LabelCount> {
    frequency_ranking(episodes.iter().flat_map(|e| &e.relieved_by).map(String::as_str))
}

/// The highest-ranked label, if any.
pub fn top_label(ranking: &[LabelCount]) -> Option<&str> {
    ranking.first().map(|entry| entry.label.as_str())
}

/// Keep the first `n` entries of a ranking.
pub fn top_n(mut ranking: Vec<LabelCount>, n: usize) -> Vec<LabelCount> {
    ranking.truncate(n);
    ranking
}

/// Episode count per day of the week, indexed as [`WEEKDAYS`].
pub fn weekday_distribution(episodes: &[Episode]) -> [usize; 7] {
    let mut buckets = [0usize; 7];
    for episode in episodes {
        buckets[episode.date.weekday().num_days_from_sunday() as usize] += 1;
    }
    buckets
}

/// Day with the most episodes. Ties go to the earliest day, Sunday first.
pub fn busiest_weekday(distribution: &[usize; 7]) -> Option<Weekday> {
    let mut best: Option<(Weekday, usize)> = None;
    for (day, &count) in WEEKDAYS.iter().zip(distribution) {
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((*day, count));
        }
    }
    best.map(|(day, _)| day)
}

/// Full English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Episodes grouped by month, in chronological order.
pub fn monthly_series(episodes: &[Episode]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<YearMonth, MonthlyBucket> = BTreeMap::new();

    for episode in episodes {
        let month = episode.month();
        let bucket = buckets
            .entry(month)
            .or_insert_with(|| MonthlyBucket::empty(month));
        bucket.count += 1;
        bucket.total_intensity += u32::from(episode.intensity);
        bucket.total_duration += episode.duration;
    }

    buckets.into_values().collect()
}

/// Keep the most recent `n` buckets of a chronological series.
pub fn trailing_months(mut series: Vec<MonthlyBucket>, n: usize) -> Vec<MonthlyBucket> {
    let skip = series.len().saturating_sub(n);
    series.drain(..skip);
    series
}

/// Episode count per intensity band, indexed as [`IntensityBand::ALL`].
pub fn band_distribution<'a, I>(episodes: I) -> [usize; 4]
where
    I: IntoIterator<Item = &'a Episode>,
{
    let mut buckets = [0usize; 4];
    for episode in episodes {
        buckets[episode.band().index()] += 1;
    }
    buckets
}

/// Recorded moods with their counts, worst mood first. Moods never
/// recorded are omitted.
pub fn mood_distribution(episodes: &[Episode]) -> Vec<(Mood, usize)> {
    let mut counts: HashMap<Mood, usize> = HashMap::new();
    for mood in episodes.iter().filter_map(|e| e.mood) {
        *counts.entry(mood).or_default() += 1;
    }

    Mood::ALL
        .iter()
        .filter_map(|mood| counts.get(mood).map(|&count| (*mood, count)))
        .collect()
}

/// Whole days between the most recent episode and `today`.
///
/// Episodes dated after `today` count as zero days ago.
pub fn days_since_last(episodes: &[Episode], today: NaiveDate) -> Option<i64> {
    episodes
        .iter()
        .map(|e| e.date)
        .max()
        .map(|last| (today - last).num_days().max(0))
}

/// The most intense episode, the first recorded one on ties.
pub fn worst_episode(episodes: &[Episode]) -> Option<&Episode> {
    episodes
        .iter()
        .reduce(|worst, e| if e.intensity > worst.intensity { e } else { worst })
}

/// Band of an intensity, shorthand used by the renderers.
pub fn band_of(intensity: u8) -> IntensityBand {
    IntensityBand::from_intensity(intensity)
}
