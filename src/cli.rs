//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::catalog::{MedicationKind, MedicationOption};
use crate::models::{clean_labels, parse_time, Episode, Mood, YearMonth};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Migralog - a local migraine diary
///
/// Log headache episodes and review them as a dashboard, monthly trends,
/// a calendar of heat indicators or a plain list. Data stays in a local
/// directory as JSON.
///
/// Examples:
///   migralog add -i 7 --duration 3 -m "Ibuprofen (400mg)" -t Stress
///   migralog edit 1718000000000 --notes "woke up with it"
///   migralog dashboard
///   migralog trends --months 6 --format json
///   migralog calendar --month 2024-06
///   migralog export backup.json
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .migralog.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the diary files
    #[arg(short, long, global = true, env = "MIGRALOG_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, global = true, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log a new episode
    Add(EpisodeArgs),

    /// Change fields of an existing episode
    ///
    /// Only the given fields change. Pass an empty string to clear a text
    /// field or a list.
    Edit {
        /// Episode id
        id: String,

        #[command(flatten)]
        changes: EpisodeArgs,
    },

    /// Delete an episode
    Delete {
        /// Episode id
        id: String,
    },

    /// Show every field of one episode
    Show {
        /// Episode id
        id: String,
    },

    /// List episodes, newest first
    List {
        /// Only episodes from this month (YYYY-MM)
        #[arg(long, value_name = "MONTH")]
        month: Option<YearMonth>,

        /// Maximum number of episodes to show
        #[arg(long, value_name = "COUNT")]
        limit: Option<usize>,

        /// Show all episodes
        #[arg(long, conflicts_with = "limit")]
        all: bool,
    },

    /// Current month at a glance
    Dashboard,

    /// Monthly series, distributions and rankings
    Trends {
        /// Number of recent months in the series
        #[arg(long, value_name = "COUNT")]
        months: Option<usize>,

        /// Entries per ranking
        #[arg(long, value_name = "COUNT")]
        top: Option<usize>,
    },

    /// Per-day heat indicators for a month
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long, value_name = "MONTH")]
        month: Option<YearMonth>,
    },

    /// Write all episodes to a JSON file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Replace all episodes with the contents of a JSON file
    ///
    /// The file is validated first; nothing changes if any record is invalid.
    Import {
        /// Source file
        file: PathBuf,
    },

    /// Show or change display settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage the medication and trigger catalogs
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Generate a default .migralog.toml configuration file
    InitConfig,
}

/// Episode fields accepted by `add` and `edit`.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct EpisodeArgs {
    /// Date of the episode (YYYY-MM-DD), defaults to today
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Time of onset (HH:MM), defaults to now
    #[arg(long, value_name = "TIME", value_parser = parse_time)]
    pub time: Option<NaiveTime>,

    /// Pain intensity, 1-10 (required for add)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub intensity: Option<u8>,

    /// Duration in hours
    #[arg(long, value_name = "HOURS")]
    pub duration: Option<f64>,

    /// Medication taken, with optional dosage (repeatable)
    #[arg(short = 'm', long = "medication", value_name = "NAME")]
    pub medications: Vec<String>,

    /// Medication from the catalog, by id (repeatable)
    #[arg(long = "med-id", value_name = "ID")]
    pub medication_ids: Vec<String>,

    /// Suspected trigger (repeatable)
    #[arg(short = 't', long = "trigger", value_name = "NAME")]
    pub triggers: Vec<String>,

    /// Symptom (repeatable)
    #[arg(short = 's', long = "symptom", value_name = "NAME")]
    pub symptoms: Vec<String>,

    /// What helped (repeatable)
    #[arg(long = "relieved-by", value_name = "METHOD")]
    pub relieved_by: Vec<String>,

    /// Mood: terrible, bad, neutral, good, great
    #[arg(long)]
    pub mood: Option<String>,

    #[arg(long)]
    pub weather: Option<String>,

    /// Menstrual cycle phase
    #[arg(long, value_name = "PHASE")]
    pub menstrual_cycle: Option<String>,

    /// Hours slept the night before
    #[arg(long = "sleep", value_name = "HOURS")]
    pub sleep_hours: Option<f64>,

    /// Stress level, 1-5
    #[arg(long = "stress", value_parser = clap::value_parser!(u8).range(1..=5))]
    pub stress_level: Option<u8>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsAction {
    /// Print the current settings
    Show,

    /// Change one or more settings
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CatalogAction {
    /// List catalog medications
    Medications,

    /// List catalog triggers
    Triggers,

    /// Add a medication to the catalog
    AddMedication {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        dosage: String,

        /// acute, preventive or other
        #[arg(long, default_value = "acute")]
        kind: MedicationKind,

        /// Catalog id, derived from the name when omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Remove a medication from the catalog
    RemoveMedication {
        id: String,
    },

    /// Restore the built-in medication list
    ResetMedications,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Add(fields) => {
                if fields.intensity.is_none() {
                    return Err("--intensity is required when adding an episode".to_string());
                }
                fields.validate()
            }
            Command::Edit { changes, .. } => changes.validate(),
            Command::List { limit: Some(0), .. } => Err("Limit must be at least 1".to_string()),
            Command::Trends {
                months: Some(0), ..
            } => Err("Months must be at least 1".to_string()),
            Command::Trends { top: Some(0), .. } => Err("Top must be at least 1".to_string()),
            Command::Catalog {
                action: CatalogAction::AddMedication { name, .. },
            } if name.trim().is_empty() => Err("Medication name cannot be empty".to_string()),
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl EpisodeArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err("Duration must be zero or more hours".to_string());
            }
        }
        if let Some(sleep) = self.sleep_hours {
            if !sleep.is_finite() || sleep < 0.0 {
                return Err("Sleep must be zero or more hours".to_string());
            }
        }
        if let Some(ref mood) = self.mood {
            if !mood.trim().is_empty() {
                mood.parse::<Mood>().map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }

    /// Whether any list of medications was given.
    fn has_medications(&self) -> bool {
        !self.medications.is_empty() || !self.medication_ids.is_empty()
    }

    /// Copy the given fields onto `episode`. Fields left out are untouched.
    ///
    /// `catalog` resolves `--med-id` values to medication labels.
    pub fn apply_to(&self, episode: &mut Episode, catalog: &[MedicationOption]) -> Result<(), String> {
        if let Some(date) = self.date {
            episode.date = date;
        }
        if let Some(time) = self.time {
            episode.time = time;
        }
        if let Some(intensity) = self.intensity {
            episode.intensity = intensity;
        }
        if let Some(duration) = self.duration {
            episode.duration = duration;
        }

        if self.has_medications() {
            let mut medications = clean_labels(&self.medications, false);
            for id in &self.medication_ids {
                let option = catalog
                    .iter()
                    .find(|m| m.id == *id)
                    .ok_or_else(|| format!("Unknown catalog medication: {}", id))?;
                medications.push(option.label());
            }
            episode.medications = medications;
        }
        if !self.triggers.is_empty() {
            episode.triggers = clean_labels(&self.triggers, true);
        }
        if !self.symptoms.is_empty() {
            episode.symptoms = clean_labels(&self.symptoms, true);
        }
        if !self.relieved_by.is_empty() {
            episode.relieved_by = clean_labels(&self.relieved_by, true);
        }

        if let Some(ref mood) = self.mood {
            episode.mood = match mood.trim() {
                "" => None,
                raw => Some(raw.parse::<Mood>().map_err(|e| e.to_string())?),
            };
        }
        if let Some(ref weather) = self.weather {
            episode.weather = non_blank(weather);
        }
        if let Some(ref cycle) = self.menstrual_cycle {
            episode.menstrual_cycle = non_blank(cycle);
        }
        if let Some(sleep) = self.sleep_hours {
            episode.sleep_hours = Some(sleep);
        }
        if let Some(stress) = self.stress_level {
            episode.stress_level = stress;
        }
        if let Some(ref notes) = self.notes {
            episode.notes = non_blank(notes);
        }

        Ok(())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
