use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scrobble_parse::config::Config;
use scrobble_parse::logging::init_logging;
use scrobble_parse::report::{write_error_report, ReportDisplayManager};
use scrobble_parse::{ConfiguredParser, FileFormat, ScrobbleMode};
use std::path::PathBuf;
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "scrobble-parse")]
#[command(about = "Extract scrobbles from CSV and JSON play-history exports")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to scrobble-parse.toml or the settings directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and list the scrobbles found in it
    Parse {
        /// File to parse
        file: PathBuf,
        /// Input format (guessed from the file extension when omitted)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Where record timestamps come from
        #[arg(long, value_enum, default_value_t = ModeArg::Import)]
        mode: ModeArg,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Write per-record errors to this file, one per line
        #[arg(long)]
        save_errors: Option<PathBuf>,
    },
    /// Write the current configuration to a file
    InitConfig {
        /// Destination (defaults to the settings directory)
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for FileFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => FileFormat::Csv,
            FormatArg::Json => FileFormat::Json,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Stamp every scrobble with the current time
    Import,
    /// Use the timestamp stored in the file
    UseScrobbleTimestamp,
}

impl From<ModeArg> for ScrobbleMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Import => ScrobbleMode::Import,
            ModeArg::UseScrobbleTimestamp => ScrobbleMode::UseScrobbleTimestamp,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let json = matches!(cli.command, Commands::Parse { json: true, .. });

    if let Err(e) = run(cli).await {
        handle_error(e, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let _guard = init_logging(&config.logging, &config.paths.log_directory);

    match &config.source {
        Some(path) => info!(config_file = %path.display(), "Loaded configuration from file"),
        None => info!("No configuration file found, using defaults"),
    }

    match cli.command {
        Commands::Parse {
            file,
            format,
            mode,
            json,
            save_errors,
        } => {
            let format = match format {
                Some(format) => FileFormat::from(format),
                None => FileFormat::from_path(&file).with_context(|| {
                    format!(
                        "Cannot tell the format of {}; pass --format csv or --format json",
                        file.display()
                    )
                })?,
            };

            let parser = match format {
                FileFormat::Csv => ConfiguredParser::Csv(config.csv_configuration()?),
                FileFormat::Json => ConfiguredParser::Json(config.json_configuration()?),
            };

            let mode = ScrobbleMode::from(mode);
            info!(file = %file.display(), %format, %mode, "Parsing file");

            let path = file.clone();
            let result = tokio::task::spawn_blocking(move || parser.parse(&path, mode))
                .await
                .context("Parsing worker failed")??;

            let display = ReportDisplayManager::new(&config.output);
            if json {
                println!("{}", display.render_json(format, &result)?);
            } else {
                print!("{}", display.render_text(&file, format, &result));
            }

            // The text listing already ends with the error summary
            if let Some(path) = save_errors.filter(|_| result.has_errors()) {
                write_error_report(&path, result.errors())?;
                if !json {
                    eprintln!("Error details written to {}", path.display());
                }
            }

            Ok(())
        }
        Commands::InitConfig { path } => {
            let path = path.unwrap_or_else(|| config.settings_file());
            config.save_to_file(&path)?;
            println!("Configuration written to {}", path.display());
            Ok(())
        }
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
