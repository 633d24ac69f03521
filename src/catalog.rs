//! Medication and trigger catalogs.
//!
//! The catalog only feeds suggestions to the `add` command and the
//! `catalog` listings. Episodes store free text and never reference
//! catalog ids.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a medication is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationKind {
    /// Taken during an attack
    Acute,
    /// Taken daily to reduce frequency
    Preventive,
    Other,
}

impl fmt::Display for MedicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicationKind::Acute => write!(f, "acute"),
            MedicationKind::Preventive => write!(f, "preventive"),
            MedicationKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for MedicationKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "acute" | "rescue" | "agudo" => Ok(MedicationKind::Acute),
            "preventive" | "preventative" | "preventivo" => Ok(MedicationKind::Preventive),
            "other" | "otro" => Ok(MedicationKind::Other),
            _ => Err(ParseError::UnknownMedicationKind(s.to_string())),
        }
    }
}

/// A medication the user can pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationOption {
    pub id: String,
    pub name: String,
    /// Free-text dosage, e.g. "400mg".
    #[serde(default)]
    pub dosage: String,
    #[serde(rename = "type")]
    pub kind: MedicationKind,
}

impl MedicationOption {
    /// Label as it is written into an episode's medication list.
    pub fn label(&self) -> String {
        if self.dosage.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.dosage)
        }
    }
}

/// A trigger the user can pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOption {
    pub id: String,
    pub name: String,
    pub category: String,
}

fn medication(id: &str, name: &str, dosage: &str, kind: MedicationKind) -> MedicationOption {
    MedicationOption {
        id: id.to_string(),
        name: name.to_string(),
        dosage: dosage.to_string(),
        kind,
    }
}

fn trigger(id: &str, name: &str, category: &str) -> TriggerOption {
    TriggerOption {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
    }
}

/// Built-in medication list, used until the user customizes it.
pub fn default_medications() -> Vec<MedicationOption> {
    use MedicationKind::*;
    vec![
        medication("ibuprofen", "Ibuprofen", "400mg", Acute),
        medication("paracetamol", "Paracetamol", "1g", Acute),
        medication("naproxen", "Naproxen", "550mg", Acute),
        medication("aspirin", "Aspirin", "1000mg", Acute),
        medication("sumatriptan", "Sumatriptan", "50mg", Acute),
        medication("rizatriptan", "Rizatriptan", "10mg", Acute),
        medication("zolmitriptan", "Zolmitriptan", "2.5mg", Acute),
        medication("metoclopramide", "Metoclopramide", "10mg", Acute),
        medication("propranolol", "Propranolol", "40mg", Preventive),
        medication("topiramate", "Topiramate", "50mg", Preventive),
        medication("amitriptyline", "Amitriptyline", "25mg", Preventive),
        medication("magnesium", "Magnesium", "400mg", Other),
    ]
}

/// Built-in trigger list.
pub fn default_triggers() -> Vec<TriggerOption> {
    vec![
        trigger("stress", "Stress", "emotional"),
        trigger("anxiety", "Anxiety", "emotional"),
        trigger("lack-of-sleep", "Lack of sleep", "sleep"),
        trigger("oversleeping", "Oversleeping", "sleep"),
        trigger("skipped-meal", "Skipped meal", "diet"),
        trigger("dehydration", "Dehydration", "diet"),
        trigger("alcohol", "Alcohol", "diet"),
        trigger("caffeine", "Caffeine", "diet"),
        trigger("chocolate", "Chocolate", "diet"),
        trigger("bright-light", "Bright light", "environment"),
        trigger("loud-noise", "Loud noise", "environment"),
        trigger("strong-smell", "Strong smell", "environment"),
        trigger("weather-change", "Weather change", "environment"),
        trigger("screen-time", "Screen time", "environment"),
        trigger("menstruation", "Menstruation", "hormonal"),
        trigger("exercise", "Exercise", "physical"),
    ]
}

/// Derive a catalog id from a display name: lowercase, words joined by `-`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
