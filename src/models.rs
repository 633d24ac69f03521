//! Data models for the migraine diary.
//!
//! This module contains the persisted `Episode` record and the small value
//! types derived from it: mood, intensity band and calendar month.

use crate::error::ParseError;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lowest valid intensity on the 1-10 scale.
pub const MIN_INTENSITY: u8 = 1;
/// Highest valid intensity on the 1-10 scale.
pub const MAX_INTENSITY: u8 = 10;
/// Lowest valid stress level on the 1-5 scale.
pub const MIN_STRESS: u8 = 1;
/// Highest valid stress level on the 1-5 scale.
pub const MAX_STRESS: u8 = 5;

/// Severity band of an intensity value.
///
/// Boundaries are closed at 3, 6 and 8. The same banding drives the
/// calendar heat indicators and the distribution tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntensityBand {
    /// Mild, intensity up to 3
    Leve,
    /// Moderate, 4 to 6
    Moderado,
    /// Severe, 7 and 8
    Severo,
    /// Extreme, 9 and above
    Extremo,
}

impl IntensityBand {
    /// All bands from mildest to most extreme.
    pub const ALL: [IntensityBand; 4] = [
        IntensityBand::Leve,
        IntensityBand::Moderado,
        IntensityBand::Severo,
        IntensityBand::Extremo,
    ];

    /// Classify an intensity value. Out-of-range values fall into the
    /// nearest band rather than being rejected.
    pub fn from_intensity(intensity: u8) -> Self {
        match intensity {
            0..=3 => IntensityBand::Leve,
            4..=6 => IntensityBand::Moderado,
            7..=8 => IntensityBand::Severo,
            _ => IntensityBand::Extremo,
        }
    }

    /// Returns an emoji heat indicator for the band.
    pub fn emoji(&self) -> &'static str {
        match self {
            IntensityBand::Leve => "🟢",
            IntensityBand::Moderado => "🟡",
            IntensityBand::Severo => "🟠",
            IntensityBand::Extremo => "🔴",
        }
    }

    /// Index of the band in [`IntensityBand::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for IntensityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntensityBand::Leve => write!(f, "Leve"),
            IntensityBand::Moderado => write!(f, "Moderado"),
            IntensityBand::Severo => write!(f, "Severo"),
            IntensityBand::Extremo => write!(f, "Extremo"),
        }
    }
}

/// Mood recorded alongside an episode.
///
/// New data is always stored with one of these five lowercase values.
/// Older diaries used free text in English or Spanish; [`Mood::from_str`]
/// accepts those spellings so they can be migrated on load or import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Terrible,
    Bad,
    Neutral,
    Good,
    Great,
}

impl Mood {
    /// All moods from worst to best.
    pub const ALL: [Mood; 5] = [
        Mood::Terrible,
        Mood::Bad,
        Mood::Neutral,
        Mood::Good,
        Mood::Great,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Terrible => "😫",
            Mood::Bad => "😞",
            Mood::Neutral => "😐",
            Mood::Good => "🙂",
            Mood::Great => "😄",
        }
    }

    /// Canonical storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Terrible => "terrible",
            Mood::Bad => "bad",
            Mood::Neutral => "neutral",
            Mood::Good => "good",
            Mood::Great => "great",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Underscores, dashes and repeated spaces are interchangeable
        let normalized = s
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "terrible" | "very bad" | "awful" | "horrible" | "muy mal" | "fatal" | "😫" => {
                Ok(Mood::Terrible)
            }
            "bad" | "sad" | "mal" | "malo" | "triste" | "😞" => Ok(Mood::Bad),
            "neutral" | "normal" | "ok" | "okay" | "meh" | "regular" | "😐" => Ok(Mood::Neutral),
            "good" | "happy" | "bien" | "bueno" | "feliz" | "🙂" => Ok(Mood::Good),
            "great" | "very good" | "excellent" | "muy bien" | "excelente" | "genial" | "😄" => {
                Ok(Mood::Great)
            }
            _ => Err(ParseError::UnknownMood(s.to_string())),
        }
    }
}

/// A single logged headache episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// Unique id, assigned at creation from the clock. Never changes.
    pub id: String,
    /// Local calendar date of the onset.
    pub date: NaiveDate,
    /// Local time of the onset, minute precision.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Pain intensity, 1-10.
    pub intensity: u8,
    /// Duration in hours.
    pub duration: f64,
    /// Medications taken, in the order they were taken.
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// What helped, if anything.
    #[serde(default)]
    pub relieved_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menstrual_cycle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    /// Stress level, 1-5.
    pub stress_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Episode {
    /// Creates an episode with the required fields and empty lists.
    ///
    /// The id is left empty; the store assigns one on insert.
    pub fn new(date: NaiveDate, time: NaiveTime, intensity: u8) -> Self {
        Self {
            id: String::new(),
            date,
            time,
            intensity,
            duration: 0.0,
            medications: Vec::new(),
            triggers: Vec::new(),
            symptoms: Vec::new(),
            relieved_by: Vec::new(),
            mood: None,
            weather: None,
            menstrual_cycle: None,
            sleep_hours: None,
            stress_level: 3,
            notes: None,
        }
    }

    /// Severity band of this episode's intensity.
    pub fn band(&self) -> IntensityBand {
        IntensityBand::from_intensity(self.intensity)
    }

    /// Month this episode belongs to.
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Parse a time of day in `HH:MM` form. `HH:MM:SS` is accepted and
/// truncated to the minute.
pub fn parse_time(raw: &str) -> Result<NaiveTime, ParseError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .and_then(truncate_to_minute)
        .ok_or_else(|| ParseError::InvalidTime(raw.to_string()))
}

/// Trim labels and drop blanks. With `dedupe`, later repeats are dropped too.
pub fn clean_labels(items: &[String], dedupe: bool) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let label = item.trim();
        if label.is_empty() || (dedupe && labels.iter().any(|l| l == label)) {
            continue;
        }
        labels.push(label.to_string());
    }
    labels
}

/// Drop seconds and sub-seconds from a time.
pub fn truncate_to_minute(time: NaiveTime) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
}

/// Serde adapter storing a `NaiveTime` as `HH:MM`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

/// A calendar month, used as the bucket key for monthly statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl YearMonth {
    /// Returns `None` when `month` is not 1-12 or the month falls outside
    /// the range of dates chrono can represent.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let candidate = Self { year, month };
        NaiveDate::from_ymd_opt(year, month, 1)?;
        let (next_year, next_month) = candidate.successor()?;
        NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
        Some(candidate)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    fn successor(&self) -> Option<(i32, u32)> {
        if self.month >= 12 {
            Some((self.year.checked_add(1)?, 1))
        } else {
            Some((self.year, self.month + 1))
        }
    }

    /// The following month, or `None` at the end of the calendar.
    pub fn next(&self) -> Option<Self> {
        let (year, month) = self.successor()?;
        Self::new(year, month)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .and_then(|next| next.first_day().pred_opt())
            // Only December of the last representable year lands here
            .or_else(|| NaiveDate::from_ymd_opt(self.year, 12, 31))
            .unwrap_or_else(|| self.first_day())
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Iterate over every date of the month.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        first.iter_days().take(self.days_in_month() as usize)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_band_boundaries() {
        let expected = [
            (1, IntensityBand::Leve),
            (3, IntensityBand::Leve),
            (4, IntensityBand::Moderado),
            (6, IntensityBand::Moderado),
            (7, IntensityBand::Severo),
            (8, IntensityBand::Severo),
            (9, IntensityBand::Extremo),
            (10, IntensityBand::Extremo),
        ];
        for (intensity, band) in expected {
            assert_eq!(IntensityBand::from_intensity(intensity), band, "{intensity}");
        }
    }

    #[test]
    fn test_band_out_of_range_is_not_rejected() {
        assert_eq!(IntensityBand::from_intensity(0), IntensityBand::Leve);
        assert_eq!(IntensityBand::from_intensity(42), IntensityBand::Extremo);
    }

    #[test]
    fn test_band_ordering_and_index() {
        assert!(IntensityBand::Leve < IntensityBand::Extremo);
        for (i, band) in IntensityBand::ALL.iter().enumerate() {
            assert_eq!(band.index(), i);
        }
    }

    #[test]
    fn test_mood_legacy_spellings() {
        for raw in ["muy_mal", "Muy Mal", "very-bad", "TERRIBLE", "😫"] {
            assert_eq!(raw.parse::<Mood>(), Ok(Mood::Terrible), "{raw}");
        }
        for raw in ["muy bien", "very_good", "Great"] {
            assert_eq!(raw.parse::<Mood>(), Ok(Mood::Great), "{raw}");
        }
        assert_eq!("normal".parse::<Mood>(), Ok(Mood::Neutral));
        assert_eq!(" bien ".parse::<Mood>(), Ok(Mood::Good));
        assert!("sleepy".parse::<Mood>().is_err());
    }

    #[test]
    fn test_mood_canonical_round_trip() {
        for mood in Mood::ALL {
            assert_eq!(mood.as_str().parse::<Mood>(), Ok(mood));
        }
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("07:30").unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time("23:05:59").unwrap(),
            NaiveTime::from_hms_opt(23, 5, 0).unwrap()
        );
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("noon").is_err());
    }

    #[test]
    fn test_clean_labels() {
        let raw = vec![
            " Stress ".to_string(),
            "".to_string(),
            "Light".to_string(),
            "Stress".to_string(),
        ];
        assert_eq!(clean_labels(&raw, true), vec!["Stress", "Light"]);
        assert_eq!(clean_labels(&raw, false), vec!["Stress", "Light", "Stress"]);
    }

    #[test]
    fn test_episode_json_shape() {
        let mut episode = Episode::new(date(2024, 3, 9), parse_time("14:20").unwrap(), 7);
        episode.id = "1710000000000".to_string();
        episode.duration = 2.5;
        episode.relieved_by = vec!["Dark room".to_string()];
        episode.mood = Some(Mood::Bad);
        episode.sleep_hours = Some(6.0);

        let json = serde_json::to_value(&episode).unwrap();
        assert_eq!(json["date"], "2024-03-09");
        assert_eq!(json["time"], "14:20");
        assert_eq!(json["relievedBy"][0], "Dark room");
        assert_eq!(json["stressLevel"], 3);
        assert_eq!(json["sleepHours"], 6.0);
        assert_eq!(json["mood"], "bad");
        assert!(json.get("weather").is_none());

        let back: Episode = serde_json::from_value(json).unwrap();
        assert_eq!(back, episode);
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let ym: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(ym, YearMonth::new(2024, 2).unwrap());
        assert_eq!(ym.to_string(), "2024-02");
        assert_eq!(ym.days_in_month(), 29);
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024".parse::<YearMonth>().is_err());
        assert!("abcd-01".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_next_and_contains() {
        let dec = YearMonth::new(2023, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2024, 1));
        assert_eq!(dec.last_day(), date(2023, 12, 31));
        assert!(dec.contains(date(2023, 12, 1)));
        assert!(!dec.contains(date(2024, 12, 1)));
        assert_eq!(dec.days().count(), 31);
        assert!(YearMonth::new(2023, 1).unwrap() < dec);
    }

    #[test]
    fn test_year_month_rejects_years_outside_calendar() {
        assert!("300000-01".parse::<YearMonth>().is_err());
        assert!("2147483647-12".parse::<YearMonth>().is_err());
        assert!("-2147483648-01".parse::<YearMonth>().is_err());
        assert_eq!(YearMonth::new(i32::MAX, 12), None);

        let last = YearMonth::from_date(NaiveDate::MAX);
        assert_eq!(last.next(), None);
        assert_eq!(last.last_day(), NaiveDate::MAX);
        assert_eq!(last.days().count(), 31);
    }
}
