//! Markdown and JSON report generation.
//!
//! This module renders the dashboard, trends, calendar and episode views
//! from the summaries computed in `analysis`.

use crate::analysis::summary::{BandCount, MonthlyPoint};
use crate::analysis::{days_with_episodes, CalendarDay, DashboardSummary, LabelCount, TrendsSummary};
use crate::models::{Episode, IntensityBand, YearMonth};
use crate::store::AppSettings;
use anyhow::Result;
use serde::Serialize;

/// Generate the dashboard report.
pub fn generate_dashboard_markdown(summary: &DashboardSummary, settings: &AppSettings) -> String {
    let mut output = String::new();

    output.push_str(&generate_header("Dashboard", settings));

    output.push_str(&format!("## This Month ({})\n\n", summary.month));
    output.push_str(&format!(
        "- **Episodes:** {}\n",
        summary.episodes_this_month
    ));
    output.push_str(&format!(
        "- **Average Intensity:** {:.1}/10\n",
        summary.average_intensity_this_month
    ));
    output.push_str(&format!(
        "- **Hours With Pain:** {:.1}\n\n",
        summary.hours_this_month
    ));

    output.push_str(&generate_band_table(&summary.bands_this_month));

    output.push_str("## All Time\n\n");
    output.push_str(&format!("- **Episodes Logged:** {}\n", summary.total_episodes));
    output.push_str(&format!(
        "- **Most Used Medication:** {}\n",
        summary.top_medication_label()
    ));
    output.push_str(&format!(
        "- **Most Common Trigger:** {}\n",
        summary.top_trigger_label()
    ));
    output.push_str(&format!(
        "- **Day With Most Episodes:** {}\n",
        summary.busiest_weekday_label()
    ));
    match summary.days_since_last {
        Some(0) => output.push_str("- **Last Episode:** today\n"),
        Some(days) => output.push_str(&format!("- **Days Since Last Episode:** {}\n", days)),
        None => output.push_str("- **Last Episode:** none recorded\n"),
    }
    output.push('\n');

    output.push_str(&generate_footer());
    output
}

/// Generate the trends report.
pub fn generate_trends_markdown(summary: &TrendsSummary, settings: &AppSettings) -> String {
    let mut output = String::new();

    output.push_str(&generate_header("Trends", settings));

    if summary.total_episodes == 0 {
        output.push_str("No episodes recorded yet.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    output.push_str("## Overview\n\n");
    output.push_str(&format!("- **Episodes:** {}\n", summary.total_episodes));
    output.push_str(&format!(
        "- **Average Intensity:** {:.1}/10\n",
        summary.average_intensity
    ));
    output.push_str(&format!(
        "- **Average Duration:** {:.1}h\n",
        summary.average_duration
    ));
    output.push_str(&format!(
        "- **Average Stress:** {:.1}/5\n",
        summary.average_stress
    ));
    if let Some(sleep) = summary.average_sleep_hours {
        output.push_str(&format!("- **Average Sleep:** {:.1}h\n", sleep));
    }
    if let Some(ref worst) = summary.worst_episode {
        output.push_str(&format!(
            "- **Worst Episode:** {} {} ({} {}/10, `{}`)\n",
            worst.date,
            worst.time.format("%H:%M"),
            worst.band().emoji(),
            worst.intensity,
            worst.id
        ));
    }
    output.push('\n');

    output.push_str(&generate_monthly_table(&summary.monthly));
    output.push_str(&generate_band_table(&summary.bands));

    output.push_str("### Episodes by Day of Week\n\n");
    output.push_str("| Day | Episodes |\n");
    output.push_str("|:---|:---:|\n");
    for weekday in &summary.weekdays {
        output.push_str(&format!("| {} | {} |\n", weekday.day, weekday.count));
    }
    output.push('\n');

    output.push_str(&generate_ranking_table("Top Medications", "Medication", &summary.top_medications));
    output.push_str(&generate_ranking_table("Top Triggers", "Trigger", &summary.top_triggers));
    output.push_str(&generate_ranking_table("Top Symptoms", "Symptom", &summary.top_symptoms));
    output.push_str(&generate_ranking_table("What Helped", "Method", &summary.relief_methods));

    if !summary.moods.is_empty() {
        output.push_str("### Mood\n\n");
        output.push_str("| Mood | Episodes |\n");
        output.push_str("|:---|:---:|\n");
        for entry in &summary.moods {
            output.push_str(&format!(
                "| {} {} | {} |\n",
                entry.mood.emoji(),
                entry.mood,
                entry.count
            ));
        }
        output.push('\n');
    }

    output.push_str(&generate_footer());
    output
}

/// Generate the calendar report: one row per day that has episodes.
pub fn generate_calendar_markdown(
    month: YearMonth,
    days: &[CalendarDay],
    settings: &AppSettings,
) -> String {
    let mut output = String::new();

    output.push_str(&generate_header(&format!("Calendar {}", month), settings));

    let active = days_with_episodes(days);
    output.push_str(&format!(
        "*{} of {} days with episodes*\n\n",
        active,
        days.len()
    ));

    if active == 0 {
        output.push_str("No episodes this month.\n\n");
    } else {
        output.push_str("| Date | Day | Episodes | Max Intensity | Band |\n");
        output.push_str("|:---|:---|:---:|:---:|:---|\n");
        for day in days.iter().filter(|d| d.episodes > 0) {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                day.date,
                day.date.format("%a"),
                day.episodes,
                day.max_intensity.map(|i| i.to_string()).unwrap_or_default(),
                day.band.map(band_badge).unwrap_or_default(),
            ));
        }
        output.push('\n');
    }

    output.push_str(&generate_legend());
    output.push_str(&generate_footer());
    output
}

/// Generate the episode list, newest first as given.
pub fn generate_episode_list_markdown(episodes: &[&Episode], settings: &AppSettings) -> String {
    let mut output = String::new();

    output.push_str(&generate_header("Episodes", settings));

    if episodes.is_empty() {
        output.push_str("No episodes recorded.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    output.push_str("| Date | Time | Intensity | Duration | Medications | Triggers | ID |\n");
    output.push_str("|:---|:---:|:---|:---:|:---|:---|:---|\n");
    for episode in episodes {
        output.push_str(&format!(
            "| {} | {} | {} {} | {:.1}h | {} | {} | `{}` |\n",
            episode.date,
            episode.time.format("%H:%M"),
            episode.band().emoji(),
            episode.intensity,
            episode.duration,
            join_or_dash(&episode.medications),
            join_or_dash(&episode.triggers),
            escape_cell(&episode.id)
        ));
    }
    output.push('\n');

    output.push_str(&generate_footer());
    output
}

/// Generate the full detail block for one episode.
pub fn generate_episode_markdown(episode: &Episode) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "## {} {} {}\n\n",
        episode.date,
        episode.time.format("%H:%M"),
        band_badge(episode.band())
    ));
    block.push_str(&format!("- **ID:** `{}`\n", episode.id));
    block.push_str(&format!("- **Intensity:** {}/10\n", episode.intensity));
    block.push_str(&format!("- **Duration:** {:.1}h\n", episode.duration));
    block.push_str(&format!("- **Stress:** {}/5\n", episode.stress_level));
    block.push_str(&format!(
        "- **Medications:** {}\n",
        join_or_dash(&episode.medications)
    ));
    block.push_str(&format!("- **Triggers:** {}\n", join_or_dash(&episode.triggers)));
    block.push_str(&format!("- **Symptoms:** {}\n", join_or_dash(&episode.symptoms)));
    block.push_str(&format!(
        "- **Relieved By:** {}\n",
        join_or_dash(&episode.relieved_by)
    ));
    if let Some(mood) = episode.mood {
        block.push_str(&format!("- **Mood:** {} {}\n", mood.emoji(), mood));
    }
    if let Some(ref weather) = episode.weather {
        block.push_str(&format!("- **Weather:** {}\n", weather));
    }
    if let Some(ref cycle) = episode.menstrual_cycle {
        block.push_str(&format!("- **Menstrual Cycle:** {}\n", cycle));
    }
    if let Some(sleep) = episode.sleep_hours {
        block.push_str(&format!("- **Sleep:** {:.1}h\n", sleep));
    }
    if let Some(ref notes) = episode.notes {
        block.push_str(&format!("\n> {}\n", notes));
    }
    block.push('\n');

    block
}

/// Serialize any summary as pretty JSON.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

fn generate_header(title: &str, settings: &AppSettings) -> String {
    format!("# {} - {}\n\n", settings.name, title)
}

fn generate_monthly_table(points: &[MonthlyPoint]) -> String {
    if points.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("### Monthly Trend\n\n");
    section.push_str("| Month | Episodes | Avg Intensity | Avg Duration | Total Hours |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    for point in points {
        section.push_str(&format!(
            "| {} | {} | {:.1} | {:.1}h | {:.1} |\n",
            point.month,
            point.episodes,
            point.average_intensity,
            point.average_duration,
            point.total_hours
        ));
    }
    section.push('\n');
    section
}

fn generate_band_table(bands: &[BandCount]) -> String {
    let mut section = String::new();

    section.push_str("### Intensity Bands\n\n");
    let header: Vec<String> = bands.iter().map(|b| band_badge(b.band)).collect();
    section.push_str(&format!("| {} |\n", header.join(" | ")));
    section.push_str(&format!("|{}\n", ":---:|".repeat(bands.len())));
    let counts: Vec<String> = bands.iter().map(|b| b.count.to_string()).collect();
    section.push_str(&format!("| {} |\n\n", counts.join(" | ")));

    section
}

fn generate_ranking_table(title: &str, column: &str, ranking: &[LabelCount]) -> String {
    if ranking.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str(&format!("### {}\n\n", title));
    section.push_str(&format!("| {} | Count |\n", column));
    section.push_str("|:---|:---:|\n");
    for entry in ranking {
        section.push_str(&format!("| {} | {} |\n", escape_cell(&entry.label), entry.count));
    }
    section.push('\n');
    section
}

fn generate_legend() -> String {
    let ranges = ["1-3", "4-6", "7-8", "9-10"];
    let entries: Vec<String> = IntensityBand::ALL
        .iter()
        .zip(ranges)
        .map(|(band, range)| format!("{} ({})", band_badge(*band), range))
        .collect();
    format!("**Legend:** {}\n\n", entries.join(" · "))
}

fn band_badge(band: IntensityBand) -> String {
    format!("{} {}", band.emoji(), band)
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        escape_cell(&items.join(", "))
    }
}

/// Free text may contain `|`, which would split a table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn generate_footer() -> String {
    "---\n\n*Generated by migralog*\n".to_string()
}
