use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use qexplore::export::{self, ExportFormat};
use qexplore::history::GenerationResponse;
use qexplore::remote::merge_from_source;
use qexplore::{
    units, util, Config, Database, DisplaySettings, HistoryRecord, HistoryStore,
    HttpHistorySource, ImportReport, ReplayEngine, SqliteStore, MAX_HISTORY_ENTRIES,
};

#[derive(Parser)]
#[command(name = "qexplore")]
#[command(about = "Browse, replay and sync q-explore generation history", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.qexplore)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored generations, newest first
    List {
        /// Show at most this many entries
        #[arg(short, long, default_value_t = MAX_HISTORY_ENTRIES)]
        limit: usize,
    },
    /// Record a generation response from a JSON file
    Add {
        file: PathBuf,
    },
    /// Show the map and result state of a stored generation
    Replay {
        id: String,
    },
    /// Delete a stored generation
    Delete {
        id: String,
    },
    /// Delete every stored generation
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
    /// Import records from a JSON export or server listing
    Import {
        file: PathBuf,
    },
    /// Export stored generations
    Export {
        /// json or gpx
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge history from the configured server
    Sync,
    /// Display settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Convert a distance between units
    Convert {
        value: f64,
        from: String,
        to: String,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
    /// Print every setting
    List,
}

fn init_logging() -> Result<()> {
    // Log to file (~/.qexplore/logs/qexplore.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_report(verb: &str, report: &ImportReport) {
    println!(
        "{} {} records ({} duplicates, {} malformed)",
        verb, report.accepted, report.duplicates, report.malformed
    );
    if report.evicted > 0 {
        println!("{} oldest records evicted to stay within capacity", report.evicted);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);
    init_logging()?;

    if let Commands::Convert { value, from, to } = &cli.command {
        let canonical = units::to_canonical_str(*value, from)?;
        println!("{}", units::display_string_str(canonical, to)?);
        return Ok(());
    }

    let config = Config::load();
    let db = Database::open(config.database.clone())
        .with_context(|| format!("Failed to open {}", config.database.display()))?;
    let kv = SqliteStore::from_database(&db);
    let mut store = HistoryStore::new(kv.clone());
    let mut settings = DisplaySettings::load(&kv);

    match cli.command {
        Commands::List { limit } => {
            let unit = settings.units.radius_unit();
            let records = store.recent(limit);
            if records.is_empty() {
                println!("No history");
            }
            for record in records {
                let request = record.request();
                println!(
                    "{} {}  {}  {:.5},{:.5}  {}  {}  {}",
                    if record.is_favorite() { "*" } else { " " },
                    record.id(),
                    record.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    request.lat,
                    request.lng,
                    units::display_string(request.radius, unit),
                    request.mode,
                    record.display_name()
                );
            }
            let skipped = store.load_skipped();
            if skipped > 0 {
                eprintln!("{} unreadable records were skipped", skipped);
            }
        }
        Commands::Add { file } => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let response: GenerationResponse = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not a generation response", file.display()))?;
            response.request.validate()?;
            let record = HistoryRecord::from_response(&response)?;
            let id = record.id().to_string();
            let len = store.add(record)?;
            println!("Added {} ({} entries)", id, len);
        }
        Commands::Replay { id } => {
            let state = ReplayEngine::replay(&mut store, &id, &settings)?;
            if let Some(record) = store.get(&id) {
                println!("Name:   {}", record.display_name());
                if let Some(notes) = record.notes() {
                    println!("Notes:  {}", notes);
                }
                if record.is_favorite() {
                    println!("Favorite");
                }
            }
            println!("Center: {:.6}, {:.6}", state.map.center.lat, state.map.center.lng);
            println!("Zoom:   {}", state.map.zoom);
            println!("Radius: {}", state.radius_display.text);
            println!("Mode:   {}", state.request.mode);
            println!("Type:   {}", state.result_type);
            match state.active_winner() {
                Some(winner) => println!(
                    "Winner: {:.6}, {:.6} ({})",
                    winner.result.coords.lat, winner.result.coords.lng, winner.circle_id
                ),
                None => println!("Winner: none"),
            }
            println!("Link:   {}", settings.map_link(state.focus())?);
        }
        Commands::Delete { id } => {
            if store.remove(&id)? {
                println!("Deleted {}", id);
            } else {
                println!("not found: {}", id);
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear history without --yes");
            }
            store.clear()?;
            println!("History cleared");
        }
        Commands::Import { file } => {
            let payload = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = store.import_bulk(&payload)?;
            print_report("Imported", &report);
        }
        Commands::Export { format, output } => {
            let format: ExportFormat = format.parse()?;
            let contents = export::export(store.list(), format)?;
            match output {
                Some(path) => {
                    fs::write(&path, contents)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported {} records to {}", store.len(), path.display());
                }
                None => println!("{}", contents.trim_end()),
            }
        }
        Commands::Sync => {
            let source = HttpHistorySource::from_config(&config)?;
            let report = merge_from_source(&mut store, &source)
                .await
                .with_context(|| format!("Failed to sync from {}", source.base_url()))?;
            print_report("Merged", &report);
        }
        Commands::Settings { command } => match command {
            SettingsCommands::Get { key } => println!("{}", settings.get(&key)?),
            SettingsCommands::Set { key, value } => {
                settings.set(&key, &value)?;
                settings.save(&kv)?;
                println!("{} = {}", key, settings.get(&key)?);
            }
            SettingsCommands::List => {
                for (key, value) in settings.entries() {
                    println!("{} = {}", key, value);
                }
            }
        },
        Commands::Convert { .. } => {}
    }

    Ok(())
}
