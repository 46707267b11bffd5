//! # clinic-print CLI
//!
//! Usage:
//!   clinic-print sample --kind rx [--settings settings.json] [-o out/]
//!   clinic-print render --kind reports --patient p.json --settings s.json [--prefix Session]
//!   clinic-print init --tenant clinic-1 --store ./settings
//!   clinic-print markup --kind rx [--patient p.json] [--layout 3]
//!   clinic-print tokens
//!
//! Logging goes to stderr, filtered by `RUST_LOG` (default `info`).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clinic_print::config::ExportOptions;
use clinic_print::datablock::{self, BlockOptions};
use clinic_print::error::PrintError;
use clinic_print::export::{export_filename, ExportPrefix, Exporter};
use clinic_print::model::{DocumentKind, PrintSettings};
use clinic_print::patient::PatientRecord;
use clinic_print::persistence::{JsonFileStore, PrintSettingsStore};
use clinic_print::placeholder::Token;

#[derive(Parser)]
#[command(name = "clinic-print", about = "Clinic document templates to PDF", version)]
struct Cli {
    /// Export options file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a template for the built-in sample patient
    Sample {
        /// Document kind: rx, requests or reports
        #[arg(short, long)]
        kind: DocumentKind,

        /// Print settings (JSON); the generic templates when omitted
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Capture resolution multiplier
        #[arg(long)]
        scale: Option<f64>,
    },

    /// Print a template for a patient record
    Render {
        #[arg(short, long)]
        kind: DocumentKind,

        /// Patient record (JSON)
        #[arg(short, long)]
        patient: PathBuf,

        /// Print settings (JSON)
        #[arg(short, long)]
        settings: PathBuf,

        /// Filename prefix, e.g. Rx, Session, Report
        #[arg(long)]
        prefix: Option<ExportPrefix>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        scale: Option<f64>,
    },

    /// Write the generic settings for a tenant that has none
    Init {
        #[arg(long)]
        tenant: String,

        /// Settings store directory
        #[arg(long)]
        store: PathBuf,

        /// Overwrite existing settings
        #[arg(long)]
        force: bool,
    },

    /// Print the data-block HTML for a patient
    Markup {
        #[arg(short, long)]
        kind: DocumentKind,

        /// Patient record (JSON); the sample patient when omitted
        #[arg(short, long)]
        patient: Option<PathBuf>,

        /// Prescription table layout (1-3)
        #[arg(long, default_value = "1")]
        layout: u8,

        #[arg(long, default_value = "14")]
        font_size: f64,

        /// Leave out the section header
        #[arg(long)]
        no_header: bool,
    },

    /// List the placeholder tokens
    Tokens,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, PrintError> {
    match cli.command {
        Commands::Sample {
            kind,
            settings,
            output,
            scale,
        } => {
            let options = export_options(cli.config.as_deref(), output, scale)?;
            let settings = match settings {
                Some(path) => read_json::<PrintSettings>(&path)?,
                None => PrintSettings::default(),
            };
            let exporter = Exporter::with_options(options);
            Ok(finish(exporter.download_sample(&settings, kind)))
        }

        Commands::Render {
            kind,
            patient,
            settings,
            prefix,
            output,
            scale,
        } => {
            let options = export_options(cli.config.as_deref(), output, scale)?;
            let settings: PrintSettings = read_json(&settings)?;
            let patient: PatientRecord = read_json(&patient)?;
            let prefix = prefix.unwrap_or_else(|| ExportPrefix::for_kind(kind));
            let filename = export_filename(prefix, patient.display_name());
            let exporter = Exporter::with_options(options);
            Ok(finish(exporter.export_pdf(
                &patient,
                settings.template(kind),
                &settings,
                &filename,
                kind,
            )))
        }

        Commands::Init { tenant, store, force } => {
            let mut store = JsonFileStore::new(store);
            if !force && store.load(&tenant)?.is_some() {
                eprintln!("Settings for '{}' already exist (use --force to overwrite)", tenant);
                return Ok(ExitCode::FAILURE);
            }
            store.save(&tenant, &PrintSettings::default())?;
            eprintln!("✓ Wrote {}", store.path_for(&tenant).display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Markup {
            kind,
            patient,
            layout,
            font_size,
            no_header,
        } => {
            let patient = match patient {
                Some(path) => read_json::<PatientRecord>(&path)?,
                None => PatientRecord::sample(),
            };
            let options = BlockOptions {
                font_size,
                data_layout: layout,
                show_section_header: !no_header,
            };
            println!("{}", datablock::render(kind, &patient, &options).to_html());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Tokens => {
            for token in Token::ALL {
                println!("{:<18} {}", token.placeholder(), token.label());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn export_options(config: Option<&Path>, output: Option<PathBuf>, scale: Option<f64>) -> Result<ExportOptions, PrintError> {
    let mut options = ExportOptions::load(config)?;
    if let Some(dir) = output {
        options.output_dir = dir;
    }
    if let Some(scale) = scale {
        options.raster_scale = scale;
    }
    Ok(options)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PrintError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn finish(written: Option<PathBuf>) -> ExitCode {
    match written {
        Some(path) => {
            eprintln!("✓ Written {}", path.display());
            ExitCode::SUCCESS
        }
        // The exporter has already reported the failure.
        None => ExitCode::FAILURE,
    }
}
