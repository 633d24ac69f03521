//! Migralog - a local migraine diary
//!
//! A CLI tool that records headache episodes in a local JSON store and
//! renders dashboard, trends, calendar and list reports from them.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, unknown episode, rejected import or I/O failure

mod analysis;
mod catalog;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod store;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use cli::{Args, CatalogAction, Command, EpisodeArgs, OutputFormat, SettingsAction};
use config::{Config, CONFIG_FILE};
use models::{truncate_to_minute, Episode, YearMonth};
use std::path::Path;
use store::DataDir;
use tracing::{debug, error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Load configuration before logging so it can raise verbosity
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    debug!("Migralog v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config) {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .migralog.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to change the data directory and report sizes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` refines the level chosen by the flags. Logs go to stderr so
/// reports on stdout stay clean.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Dispatch the parsed subcommand.
fn run(args: Args, config: Config) -> Result<()> {
    let data = DataDir::new(&config.general.data_dir);
    info!("Using data directory: {}", data.root().display());
    let today = Local::now().date_naive();

    match &args.command {
        Command::Add(fields) => handle_add(&data, fields),
        Command::Edit { id, changes } => handle_edit(&data, id, changes),
        Command::Delete { id } => handle_delete(&data, id),
        Command::Show { id } => handle_show(&args, &data, id),
        Command::List { month, limit, all } => {
            let limit = if *all {
                None
            } else {
                Some(limit.unwrap_or(config.report.list_limit))
            };
            handle_list(&args, &data, *month, limit)
        }
        Command::Dashboard => handle_dashboard(&args, &data, today),
        Command::Trends { months, top } => {
            let options = analysis::TrendOptions {
                months: months.unwrap_or(config.report.trend_months),
                top_n: top.unwrap_or(config.report.top_n),
            };
            handle_trends(&args, &data, options)
        }
        Command::Calendar { month } => {
            handle_calendar(&args, &data, month.unwrap_or_else(|| YearMonth::from_date(today)))
        }
        Command::Export { file } => handle_export(&data, file),
        Command::Import { file } => handle_import(&data, file),
        Command::Settings { action } => handle_settings(&args, &data, action),
        Command::Catalog { action } => handle_catalog(&args, &data, action),
        Command::InitConfig => handle_init_config(),
    }
}

fn handle_add(data: &DataDir, fields: &EpisodeArgs) -> Result<()> {
    let mut store = data.open_episodes()?;
    let catalog = data.load_medications();

    let now = Local::now();
    let time = truncate_to_minute(now.time()).unwrap_or_else(|| now.time());
    let intensity = fields
        .intensity
        .context("--intensity is required when adding an episode")?;

    let mut episode = Episode::new(now.date_naive(), time, intensity);
    fields
        .apply_to(&mut episode, &catalog)
        .map_err(anyhow::Error::msg)?;

    let band = episode.band();
    let id = store.add(episode)?;

    println!("✅ Episode {} saved ({} {}).", id, band.emoji(), band);
    Ok(())
}

fn handle_edit(data: &DataDir, id: &str, changes: &EpisodeArgs) -> Result<()> {
    let mut store = data.open_episodes()?;
    let catalog = data.load_medications();

    let mut episode = store
        .get(id)
        .cloned()
        .with_context(|| format!("No episode with id {}", id))?;
    changes
        .apply_to(&mut episode, &catalog)
        .map_err(anyhow::Error::msg)?;
    store.update(episode)?;

    println!("✅ Episode {} updated.", id);
    Ok(())
}

fn handle_delete(data: &DataDir, id: &str) -> Result<()> {
    let mut store = data.open_episodes()?;
    let removed = store.remove(id)?;

    println!(
        "🗑️  Deleted episode {} from {} {}.",
        removed.id,
        removed.date,
        removed.time.format("%H:%M")
    );
    Ok(())
}

fn handle_show(args: &Args, data: &DataDir, id: &str) -> Result<()> {
    let store = data.open_episodes()?;
    let episode = store
        .get(id)
        .with_context(|| format!("No episode with id {}", id))?;

    let output = match args.format {
        OutputFormat::Json => report::generate_json(episode)?,
        OutputFormat::Markdown => report::generate_episode_markdown(episode),
    };
    emit(args, &output)
}

fn handle_list(
    args: &Args,
    data: &DataDir,
    month: Option<YearMonth>,
    limit: Option<usize>,
) -> Result<()> {
    let store = data.open_episodes()?;

    let mut episodes: Vec<&Episode> = match month {
        Some(month) => analysis::episodes_in_month(store.list(), month),
        None => store.list().iter().collect(),
    };
    episodes.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
    if let Some(limit) = limit {
        episodes.truncate(limit);
    }
    debug!("Listing {} of {} episodes", episodes.len(), store.len());

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&episodes)?,
        OutputFormat::Markdown => {
            report::generate_episode_list_markdown(&episodes, &data.load_settings())
        }
    };
    emit(args, &output)
}

fn handle_dashboard(args: &Args, data: &DataDir, today: NaiveDate) -> Result<()> {
    let store = data.open_episodes()?;
    let summary = analysis::dashboard(store.list(), today);

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&summary)?,
        OutputFormat::Markdown => {
            report::generate_dashboard_markdown(&summary, &data.load_settings())
        }
    };
    emit(args, &output)
}

fn handle_trends(args: &Args, data: &DataDir, options: analysis::TrendOptions) -> Result<()> {
    let store = data.open_episodes()?;
    let summary = analysis::trends(store.list(), options);

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&summary)?,
        OutputFormat::Markdown => report::generate_trends_markdown(&summary, &data.load_settings()),
    };
    emit(args, &output)
}

fn handle_calendar(args: &Args, data: &DataDir, month: YearMonth) -> Result<()> {
    let store = data.open_episodes()?;
    let days = analysis::calendar_month(store.list(), month);

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&days)?,
        OutputFormat::Markdown => {
            report::generate_calendar_markdown(month, &days, &data.load_settings())
        }
    };
    emit(args, &output)
}

fn handle_export(data: &DataDir, file: &Path) -> Result<()> {
    let store = data.open_episodes()?;
    let count = store.export_to(file)?;

    println!("✅ Exported {} episodes to {}", count, file.display());
    Ok(())
}

fn handle_import(data: &DataDir, file: &Path) -> Result<()> {
    let mut store = data.open_episodes()?;
    let previous = store.len();

    let summary = store
        .import_from(file)
        .with_context(|| format!("Import from {} rejected; the diary was not changed", file.display()))?;

    println!(
        "✅ Imported {} episodes from {} (replaced {}).",
        summary.imported,
        file.display(),
        previous
    );
    if summary.repairs > 0 {
        println!("   Normalized {} field value(s) on the way in.", summary.repairs);
    }
    Ok(())
}

fn handle_settings(args: &Args, data: &DataDir, action: &SettingsAction) -> Result<()> {
    let mut settings = data.load_settings();

    match action {
        SettingsAction::Show => {}
        SettingsAction::Set {
            name,
            theme,
            icon,
            locale,
            timezone,
        } => {
            let fields = [
                (&mut settings.name, name),
                (&mut settings.theme, theme),
                (&mut settings.icon, icon),
                (&mut settings.locale, locale),
                (&mut settings.timezone, timezone),
            ];
            let mut changed = false;
            for (field, value) in fields {
                if let Some(value) = value {
                    *field = value.trim().to_string();
                    changed = true;
                }
            }
            if !changed {
                bail!("Nothing to change; pass at least one of --name, --theme, --icon, --locale, --timezone");
            }
            data.save_settings(&settings)?;
            info!("Settings saved to {}", data.settings_path().display());
        }
    }

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&settings)?,
        OutputFormat::Markdown => format!(
            "name: {}\ntheme: {}\nicon: {}\nlocale: {}\ntimezone: {}\n",
            settings.name, settings.theme, settings.icon, settings.locale, settings.timezone
        ),
    };
    emit(args, &output)
}

fn handle_catalog(args: &Args, data: &DataDir, action: &CatalogAction) -> Result<()> {
    match action {
        CatalogAction::Medications => {
            let medications = data.load_medications();
            let output = match args.format {
                OutputFormat::Json => report::generate_json(&medications)?,
                OutputFormat::Markdown => medications
                    .iter()
                    .map(|m| format!("{}\t{}\t{}\n", m.id, m.label(), m.kind))
                    .collect(),
            };
            emit(args, &output)
        }
        CatalogAction::Triggers => {
            let triggers = catalog::default_triggers();
            let output = match args.format {
                OutputFormat::Json => report::generate_json(&triggers)?,
                OutputFormat::Markdown => triggers
                    .iter()
                    .map(|t| format!("{}\t{}\t{}\n", t.id, t.name, t.category))
                    .collect(),
            };
            emit(args, &output)
        }
        CatalogAction::AddMedication {
            name,
            dosage,
            kind,
            id,
        } => {
            let mut medications = data.load_medications();
            let id = id.clone().unwrap_or_else(|| catalog::slugify(name));
            if id.is_empty() {
                bail!("Cannot derive a catalog id from {:?}; pass --id", name);
            }
            if medications.iter().any(|m| m.id == id) {
                bail!("Catalog already has a medication with id {}", id);
            }

            let option = catalog::MedicationOption {
                id,
                name: name.trim().to_string(),
                dosage: dosage.trim().to_string(),
                kind: *kind,
            };
            println!("✅ Added {} as {}", option.label(), option.id);
            medications.push(option);
            data.save_medications(&medications)?;
            Ok(())
        }
        CatalogAction::RemoveMedication { id } => {
            let mut medications = data.load_medications();
            let before = medications.len();
            medications.retain(|m| m.id != *id);
            if medications.len() == before {
                bail!("No catalog medication with id {}", id);
            }
            data.save_medications(&medications)?;
            println!("🗑️  Removed {} from the catalog.", id);
            Ok(())
        }
        CatalogAction::ResetMedications => {
            if data.reset_medications()? {
                println!("✅ Medication catalog reset to the built-in list.");
            } else {
                println!("Medication catalog already uses the built-in list.");
            }
            Ok(())
        }
    }
}

/// Write a rendered report to `--output` or stdout.
fn emit(args: &Args, content: &str) -> Result<()> {
    match args.output {
        Some(ref path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ Report saved to: {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok(Config::default())
        }
    }
}
