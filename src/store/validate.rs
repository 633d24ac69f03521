//! Schema validation for episode data read from disk or imported.
//!
//! Records arrive as untyped JSON. Each one is either repaired into a valid
//! [`Episode`] or rejected with a [`ValidationError`] naming the problem.
//! Repairs cover harmless drift in older files (numeric ids, numeric
//! strings, legacy mood spellings, padded labels); anything that would
//! change the meaning of a record is rejected instead.

use crate::error::ValidationError;
use crate::models::{
    clean_labels, parse_time, truncate_to_minute, Episode, Mood, MAX_INTENSITY, MAX_STRESS,
    MIN_INTENSITY, MIN_STRESS,
};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Stress level assumed when an older record does not carry one.
pub const DEFAULT_STRESS_LEVEL: u8 = 3;

/// Result of validating a whole collection.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    /// Records that passed, in source order.
    pub episodes: Vec<Episode>,
    /// Records that were dropped.
    pub rejected: Vec<ValidationError>,
    /// Number of individual field repairs applied to accepted records.
    pub repairs: usize,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Parse and validate a JSON document holding an array of episodes.
///
/// Only a syntax error is returned as `Err`; structural problems end up in
/// [`ValidationOutcome::rejected`].
pub fn parse_collection(text: &str) -> Result<ValidationOutcome, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(validate_collection(&value))
}

/// Validate an already-parsed JSON value.
pub fn validate_collection(value: &Value) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    let Some(records) = value.as_array() else {
        outcome.rejected.push(ValidationError {
            index: 0,
            id: None,
            message: "expected a JSON array of episodes".to_string(),
        });
        return outcome;
    };

    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        match validate_record(index, record) {
            Ok((episode, repairs)) => {
                if seen.insert(episode.id.clone()) {
                    outcome.repairs += repairs;
                    outcome.episodes.push(episode);
                } else {
                    outcome.rejected.push(ValidationError {
                        index,
                        id: Some(episode.id),
                        message: "duplicate id".to_string(),
                    });
                }
            }
            Err(e) => outcome.rejected.push(e),
        }
    }

    outcome
}

/// Validate a single record, returning the episode and its repair count.
pub fn validate_record(index: usize, value: &Value) -> Result<(Episode, usize), ValidationError> {
    let Some(fields) = value.as_object() else {
        return Err(ValidationError {
            index,
            id: None,
            message: "record is not a JSON object".to_string(),
        });
    };

    let mut check = RecordCheck {
        index,
        id: None,
        fields,
        repairs: 0,
    };

    let id = check.id()?;
    check.id = Some(id.clone());

    let date = check.date()?;
    let time = check.time()?;

    let intensity = check
        .integer_in("intensity", MIN_INTENSITY, MAX_INTENSITY)?
        .ok_or_else(|| check.fail("missing intensity"))?;

    let duration = match check.non_negative("duration")? {
        Some(hours) => hours,
        None => {
            check.repairs += 1;
            0.0
        }
    };

    let stress_level = match check.integer_in("stressLevel", MIN_STRESS, MAX_STRESS)? {
        Some(level) => level,
        None => {
            check.repairs += 1;
            DEFAULT_STRESS_LEVEL
        }
    };

    let sleep_hours = check.non_negative("sleepHours")?;

    let episode = Episode {
        id,
        date,
        time,
        intensity,
        duration,
        medications: check.labels("medications", false)?,
        triggers: check.labels("triggers", true)?,
        symptoms: check.labels("symptoms", true)?,
        relieved_by: check.labels("relievedBy", true)?,
        mood: check.mood()?,
        weather: check.text("weather")?,
        menstrual_cycle: check.text("menstrualCycle")?,
        sleep_hours,
        stress_level,
        notes: check.text("notes")?,
    };

    let episode = normalize_episode(index, episode)?;
    Ok((episode, check.repairs))
}

/// Check a typed episode against the rules every stored record obeys.
///
/// Labels are trimmed, blanks dropped and set-typed lists deduplicated;
/// blank text becomes `None` and the time loses its seconds. Values out of
/// range are rejected. `index` is the record's position in the collection.
pub fn normalize_episode(index: usize, mut episode: Episode) -> Result<Episode, ValidationError> {
    episode.id = episode.id.trim().to_string();
    if episode.id.is_empty() {
        return Err(ValidationError {
            index,
            id: None,
            message: "blank id".to_string(),
        });
    }

    let fail = |message: String| ValidationError {
        index,
        id: Some(episode.id.clone()),
        message,
    };

    if !(MIN_INTENSITY..=MAX_INTENSITY).contains(&episode.intensity) {
        return Err(fail(out_of_range(
            "intensity",
            f64::from(episode.intensity),
            MIN_INTENSITY,
            MAX_INTENSITY,
        )));
    }
    if !(MIN_STRESS..=MAX_STRESS).contains(&episode.stress_level) {
        return Err(fail(out_of_range(
            "stressLevel",
            f64::from(episode.stress_level),
            MIN_STRESS,
            MAX_STRESS,
        )));
    }
    check_hours("duration", episode.duration).map_err(&fail)?;
    if let Some(sleep) = episode.sleep_hours {
        check_hours("sleepHours", sleep).map_err(&fail)?;
    }

    if let Some(time) = truncate_to_minute(episode.time) {
        episode.time = time;
    }
    episode.medications = clean_labels(&episode.medications, false);
    episode.triggers = clean_labels(&episode.triggers, true);
    episode.symptoms = clean_labels(&episode.symptoms, true);
    episode.relieved_by = clean_labels(&episode.relieved_by, true);
    for text in [
        &mut episode.weather,
        &mut episode.menstrual_cycle,
        &mut episode.notes,
    ] {
        *text = text
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }

    Ok(episode)
}

fn out_of_range(name: &str, value: f64, min: u8, max: u8) -> String {
    format!("{name} {value} is outside {min}-{max} or not a whole number")
}

/// Hours must be a finite, non-negative number.
fn check_hours(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() {
        Err(format!("{name} is not a finite number"))
    } else if value < 0.0 {
        Err(format!("{name} {value} is negative"))
    } else {
        Ok(())
    }
}

struct RecordCheck<'a> {
    index: usize,
    id: Option<String>,
    fields: &'a Map<String, Value>,
    repairs: usize,
}

impl<'a> RecordCheck<'a> {
    fn fail(&self, message: impl Into<String>) -> ValidationError {
        ValidationError {
            index: self.index,
            id: self.id.clone(),
            message: message.into(),
        }
    }

    /// Field value, with `null` treated as absent.
    fn field(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    fn id(&mut self) -> Result<String, ValidationError> {
        match self.field("id") {
            Some(Value::String(raw)) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(self.fail("blank id"));
                }
                if trimmed.len() != raw.len() {
                    self.repairs += 1;
                }
                Ok(trimmed.to_string())
            }
            Some(Value::Number(n)) => {
                self.repairs += 1;
                Ok(n.to_string())
            }
            Some(_) => Err(self.fail("id must be a string")),
            None => Err(self.fail("missing id")),
        }
    }

    fn required_text(&self, name: &str) -> Result<&'a str, ValidationError> {
        match self.field(name) {
            Some(Value::String(raw)) => Ok(raw.trim()),
            Some(_) => Err(self.fail(format!("{name} must be a string"))),
            None => Err(self.fail(format!("missing {name}"))),
        }
    }

    fn date(&mut self) -> Result<NaiveDate, ValidationError> {
        let raw = self.required_text("date")?;
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(date);
        }
        // Full timestamps like 2024-03-09T10:00:00.000Z keep their date part
        let prefix = raw.split_once('T').map(|(day, _)| day);
        match prefix.and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()) {
            Some(date) => {
                self.repairs += 1;
                Ok(date)
            }
            None => Err(self.fail(format!("invalid date `{raw}`"))),
        }
    }

    fn time(&mut self) -> Result<chrono::NaiveTime, ValidationError> {
        let raw = self.required_text("time")?.to_string();
        let time = parse_time(&raw).map_err(|e| self.fail(e.to_string()))?;
        if time.format("%H:%M").to_string() != raw {
            self.repairs += 1;
        }
        Ok(time)
    }

    /// A number, or a string holding one.
    fn number(&mut self, name: &str) -> Result<Option<f64>, ValidationError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.fail(format!("{name} is not a finite number"))),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
            Some(Value::String(raw)) => {
                let parsed = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| self.fail(format!("{name} `{raw}` is not a number")))?;
                self.repairs += 1;
                Ok(Some(parsed))
            }
            Some(_) => Err(self.fail(format!("{name} must be a number"))),
        }
    }

    fn integer_in(&mut self, name: &str, min: u8, max: u8) -> Result<Option<u8>, ValidationError> {
        let Some(value) = self.number(name)? else {
            return Ok(None);
        };
        if value.fract() != 0.0 || value < f64::from(min) || value > f64::from(max) {
            return Err(self.fail(out_of_range(name, value, min, max)));
        }
        Ok(Some(value as u8))
    }

    fn non_negative(&mut self, name: &str) -> Result<Option<f64>, ValidationError> {
        match self.number(name)? {
            Some(value) => check_hours(name, value)
                .map(|()| Some(value))
                .map_err(|message| self.fail(message)),
            None => Ok(None),
        }
    }

    /// Optional free text; blank strings become `None`.
    fn text(&mut self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::String(raw)) => {
                let trimmed = raw.trim();
                if trimmed.len() != raw.len() {
                    self.repairs += 1;
                }
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Some(_) => Err(self.fail(format!("{name} must be a string"))),
        }
    }

    /// A list of labels. A bare string is accepted as a one-element list.
    fn labels(&mut self, name: &str, dedupe: bool) -> Result<Vec<String>, ValidationError> {
        let raw: Vec<&Value> = match self.field(name) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single @ Value::String(_)) => {
                self.repairs += 1;
                vec![single]
            }
            Some(_) => return Err(self.fail(format!("{name} must be a list of strings"))),
        };

        let mut labels: Vec<String> = Vec::with_capacity(raw.len());
        for item in raw {
            let Value::String(label) = item else {
                return Err(self.fail(format!("{name} must be a list of strings")));
            };
            let trimmed = label.trim();
            if trimmed.is_empty() || (dedupe && labels.iter().any(|l| l == trimmed)) {
                self.repairs += 1;
                continue;
            }
            if trimmed.len() != label.len() {
                self.repairs += 1;
            }
            labels.push(trimmed.to_string());
        }
        Ok(labels)
    }

    fn mood(&mut self) -> Result<Option<Mood>, ValidationError> {
        let Some(raw) = self.text("mood")? else {
            return Ok(None);
        };
        match raw.parse::<Mood>() {
            Ok(mood) => {
                if mood.as_str() != raw {
                    self.repairs += 1;
                }
                Ok(Some(mood))
            }
            Err(e) => {
                debug!("Record {}: dropping {}", self.index, e);
                self.repairs += 1;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal(id: &str) -> Value {
        json!({
            "id": id,
            "date": "2024-05-01",
            "time": "08:15",
            "intensity": 6,
            "duration": 3,
            "medications": ["Ibuprofen (400mg)"],
            "triggers": ["Stress"],
            "symptoms": ["Nausea"],
            "stressLevel": 4
        })
    }

    #[test]
    fn test_clean_record_needs_no_repair() {
        let (episode, repairs) = validate_record(0, &minimal("1")).unwrap();
        assert_eq!(repairs, 0);
        assert_eq!(episode.id, "1");
        assert_eq!(episode.intensity, 6);
        assert_eq!(episode.duration, 3.0);
        assert_eq!(episode.stress_level, 4);
        assert!(episode.relieved_by.is_empty());
        assert_eq!(episode.mood, None);
    }

    #[test]
    fn test_legacy_record_is_repaired() {
        let legacy = json!({
            "id": 1714550400000u64,
            "date": "2024-05-01T10:00:00.000Z",
            "time": "08:15:42",
            "intensity": "7",
            "medications": ["  Sumatriptan (50mg) ", ""],
            "triggers": ["Stress", "Stress", "Light"],
            "symptoms": "Aura",
            "mood": "Muy_Mal",
            "weather": "   ",
            "notes": "woke up with it"
        });

        let (episode, repairs) = validate_record(0, &legacy).unwrap();
        assert_eq!(episode.id, "1714550400000");
        assert_eq!(episode.date.to_string(), "2024-05-01");
        assert_eq!(episode.time.format("%H:%M").to_string(), "08:15");
        assert_eq!(episode.intensity, 7);
        assert_eq!(episode.duration, 0.0);
        assert_eq!(episode.stress_level, DEFAULT_STRESS_LEVEL);
        assert_eq!(episode.medications, vec!["Sumatriptan (50mg)"]);
        assert_eq!(episode.triggers, vec!["Stress", "Light"]);
        assert_eq!(episode.symptoms, vec!["Aura"]);
        assert_eq!(episode.mood, Some(Mood::Terrible));
        assert_eq!(episode.weather, None);
        assert_eq!(episode.notes.as_deref(), Some("woke up with it"));
        assert!(repairs >= 10);
    }

    #[test]
    fn test_unknown_mood_is_dropped_not_rejected() {
        let mut record = minimal("1");
        record["mood"] = json!("sleepy");
        let (episode, repairs) = validate_record(0, &record).unwrap();
        assert_eq!(episode.mood, None);
        assert_eq!(repairs, 1);
    }

    #[test]
    fn test_rejections() {
        let cases = [
            ("intensity", json!(11), "intensity"),
            ("intensity", json!(4.5), "intensity"),
            ("stressLevel", json!(0), "stressLevel"),
            ("duration", json!(-1), "negative"),
            ("sleepHours", json!("lots"), "sleepHours"),
            ("date", json!("yesterday"), "invalid date"),
            ("time", json!("8am"), "invalid time"),
            ("triggers", json!([1, 2]), "list of strings"),
        ];

        for (field, value, expected) in cases {
            let mut record = minimal("abc");
            record[field] = value;
            let err = validate_record(5, &record).unwrap_err();
            assert_eq!(err.index, 5);
            assert_eq!(err.id.as_deref(), Some("abc"));
            assert!(
                err.message.contains(expected),
                "{field}: `{}` should mention `{expected}`",
                err.message
            );
        }
    }

    #[test]
    fn test_missing_id_and_non_object() {
        let mut record = minimal("x");
        record.as_object_mut().unwrap().remove("id");
        assert_eq!(validate_record(0, &record).unwrap_err().message, "missing id");

        let err = validate_record(3, &json!("episode")).unwrap_err();
        assert_eq!(err.index, 3);
        assert!(err.id.is_none());
    }

    #[test]
    fn test_collection_rejects_duplicates_and_keeps_order() {
        let doc = json!([minimal("a"), minimal("b"), minimal("a"), minimal("c")]);
        let outcome = validate_collection(&doc);

        let ids: Vec<_> = outcome.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].index, 2);
        assert_eq!(outcome.rejected[0].message, "duplicate id");
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_collection_must_be_array() {
        let outcome = validate_collection(&json!({"episodes": []}));
        assert!(outcome.episodes.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn test_parse_collection_syntax_error() {
        assert!(parse_collection("[{").is_err());
        assert!(parse_collection("[]").unwrap().is_clean());
    }

    #[test]
    fn test_out_of_range_intensity_message() {
        let mut record = minimal("z");
        record["intensity"] = json!(0);
        let err = validate_record(0, &record).unwrap_err();
        assert_eq!(
            err.message,
            "intensity 0 is outside 1-10 or not a whole number"
        );
    }

    #[test]
    fn test_sample_diary_fixture() {
        let outcome = parse_collection(include_str!("../../fixtures/episodes.json")).unwrap();

        let ids: Vec<&str> = outcome.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            ["1709301600000", "1709647200000", "1710079200000", "1712412000000"]
        );

        let rejected: Vec<usize> = outcome.rejected.iter().map(|e| e.index).collect();
        assert_eq!(rejected, [3, 5]);
        assert_eq!(outcome.rejected[1].message, "duplicate id");

        let legacy = &outcome.episodes[1];
        assert_eq!(legacy.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(legacy.intensity, 3);
        assert_eq!(legacy.medications, ["Paracetamol (1g)"]);
        assert_eq!(legacy.triggers, ["Coffee"]);
        assert_eq!(legacy.stress_level, DEFAULT_STRESS_LEVEL);
        assert_eq!(legacy.notes, None);
        assert_eq!(outcome.episodes[2].mood, Some(Mood::Terrible));
        assert!(outcome.repairs >= 10);
    }
}
