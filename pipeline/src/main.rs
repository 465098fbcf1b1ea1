//! CircuitView CLI - normalize electrical meter CSV exports
//!
//! ```bash
//! circuitview parse meter.csv              # Normalized dataset as JSON
//! circuitview parameters meter.csv         # Published parameters with unit and chart kind
//! circuitview summary meter.csv -p "Active power" -s "Power factor"
//! circuitview export meter.csv -o clean.csv
//! circuitview favorites list|toggle <param>|prune <csv>
//! ```
//!
//! Configuration comes from the environment (or `.env`), see [`circuitview::config`].

use chrono::Local;
use circuitview::config::parse_delimiter;
use circuitview::logs::LOG_BROADCASTER;
use circuitview::{
    export_csv, summary_file_name, ChartSelection, Config, Favorites, JsonFileStore, Session,
    SummaryReport,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "circuitview")]
#[command(about = "Normalize electrical meter CSV exports into time-ordered datasets", long_about = None)]
struct Cli {
    /// Do not echo progress messages to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a CSV file and output the dataset as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Cell delimiter (default: ';' or CIRCUITVIEW_DELIMITER)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the parameters a CSV file publishes
    Parameters {
        /// Input CSV file
        input: PathBuf,
    },

    /// Build the text summary report for one or two parameters
    Summary {
        /// Input CSV file
        input: PathBuf,

        /// Primary parameter (default: last selection or first parameter)
        #[arg(short, long)]
        parameter: Option<String>,

        /// Secondary parameter, enables compare mode
        #[arg(short, long)]
        secondary: Option<String>,

        /// Output file; a directory gets the default report name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the normalized dataset back out as CSV
    Export {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage favorite parameters
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Show favorite parameters
    List,

    /// Add or remove a favorite
    Toggle {
        /// Parameter name
        parameter: String,
    },

    /// Drop favorites a CSV file does not publish
    Prune {
        /// Input CSV file
        input: PathBuf,
    },
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    LOG_BROADCASTER.set_quiet(cli.quiet);

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&config, &input, delimiter.as_deref(), output.as_deref()).await,

        Commands::Parameters { input } => cmd_parameters(&config, &input).await,

        Commands::Summary {
            input,
            parameter,
            secondary,
            output,
        } => {
            cmd_summary(
                &config,
                &input,
                parameter.as_deref(),
                secondary.as_deref(),
                output.as_deref(),
            )
            .await
        }

        Commands::Export { input, output } => cmd_export(&config, &input, output.as_deref()).await,

        Commands::Favorites { action } => cmd_favorites(&config, action).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn load_session(config: &Config, input: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let mut session = Session::new(config.ingestor()?);
    session.ingest_file(input).await?;
    Ok(session)
}

async fn cmd_parse(config: &Config, input: &Path, delimiter: Option<&str>, output: Option<&Path>) -> CmdResult {
    let mut config = config.clone();
    if let Some(d) = delimiter {
        config.delimiter = parse_delimiter(d)?;
    }

    let session = load_session(&config, input).await?;
    let dataset = session.dataset().ok_or("no dataset")?;

    if let circuitview::IngestState::Ready(report) = session.state() {
        eprintln!("   Encoding: {}", report.csv_info.encoding);
        eprintln!("   Delimiter: '{}'", format_delimiter(report.csv_info.delimiter));
        eprintln!("   Rows: {}", report.csv_info.row_count);
        eprintln!("   Time column: {}", report.time_column);
        for skip in report.dropped.iter().take(5) {
            eprintln!("   ⚠️  Line {}: {} ({})", skip.line, skip.reason, skip.time_text);
        }
        eprintln!("✅ {} records, {} parameters", report.record_count, report.parameter_count);
    }

    let json = serde_json::to_string_pretty(&json!({
        "parameters": dataset.parameters,
        "descriptors": dataset.descriptors(),
        "records": dataset.records,
        "log": session.messages(),
    }))?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_parameters(config: &Config, input: &Path) -> CmdResult {
    let session = load_session(config, input).await?;
    let dataset = session.dataset().ok_or("no dataset")?;

    let favorites = Favorites::load(JsonFileStore::open(&config.prefs_path)?);

    for descriptor in dataset.descriptors() {
        let star = if favorites.contains(&descriptor.name) { "★" } else { " " };
        println!("{} {:<28} {:<6} {}", star, descriptor.name, descriptor.unit, descriptor.chart_type);
    }

    Ok(())
}

async fn cmd_summary(
    config: &Config,
    input: &Path,
    parameter: Option<&str>,
    secondary: Option<&str>,
    output: Option<&Path>,
) -> CmdResult {
    let session = load_session(config, input).await?;
    let dataset = session.dataset().ok_or("no dataset")?;

    let mut store = JsonFileStore::open(&config.prefs_path)?;
    let mut selection = ChartSelection::load(&store);
    if let Some(p) = parameter {
        selection.primary = Some(p.to_string());
    }
    if let Some(s) = secondary {
        selection.secondary = Some(s.to_string());
        selection.set_compare_mode(true);
    }
    selection.reconcile(&dataset.parameters);

    let primary = selection.primary.clone().ok_or("no parameter to summarize")?;
    let report = SummaryReport::build(&dataset, &primary, selection.active_secondary())?;
    selection.save(&mut store)?;

    let text = report.render();
    match output {
        Some(p) if p.is_dir() => {
            let path = p.join(summary_file_name(&primary, Local::now().date_naive()));
            write_output(&text, Some(&path))?;
        }
        other => write_output(&text, other)?,
    }

    Ok(())
}

async fn cmd_export(config: &Config, input: &Path, output: Option<&Path>) -> CmdResult {
    let session = load_session(config, input).await?;
    let dataset = session.dataset().ok_or("no dataset")?;

    let csv = export_csv(&dataset, config.delimiter)?;
    write_output(csv.trim_end(), output)?;

    Ok(())
}

async fn cmd_favorites(config: &Config, action: FavoritesAction) -> CmdResult {
    let mut favorites = Favorites::load(JsonFileStore::open(&config.prefs_path)?);

    match action {
        FavoritesAction::List => {
            eprintln!("⭐ Favorites ({}):", favorites.list().len());
            for name in favorites.list() {
                println!("  {}", name);
            }
        }

        FavoritesAction::Toggle { parameter } => {
            if favorites.toggle(&parameter)? {
                eprintln!("⭐ Added: {}", parameter);
            } else {
                eprintln!("🗑️  Removed: {}", parameter);
            }
        }

        FavoritesAction::Prune { input } => {
            let session = load_session(config, &input).await?;
            let dataset = session.dataset().ok_or("no dataset")?;
            let removed = favorites.retain_available(&dataset.parameters)?;
            eprintln!("🧹 Removed {} favorites not in {}", removed, input.display());
        }
    }

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> CmdResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
