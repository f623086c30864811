//! Command-line interface for the survey processor.

use crate::config::PipelineConfig;
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::source::CsvSource;
use crate::writer::write_outputs;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tracing::debug;

/// Exit status when every validation rule passed
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for a fatal error
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when the run completed but a validation rule failed
pub const EXIT_VALIDATION_FAILED: i32 = 2;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "agri-survey",
    version,
    about = "Clean and validate agricultural field surveys and weather-station telemetry"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Process the three CSV inputs and print the validation report
    Run(RunArgs),
    /// Print the default configuration as JSON
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    /// Raw field survey export
    #[arg(long, value_name = "CSV")]
    pub fields: PathBuf,

    /// Weather station messages (Weather_station_ID, Message)
    #[arg(long, value_name = "CSV")]
    pub weather: PathBuf,

    /// Field to weather station proximity mapping
    #[arg(long, value_name = "CSV")]
    pub mapping: PathBuf,

    /// JSON configuration; omitted keys keep their defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write fields.parquet and weather_aggregates.parquet here
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl RunArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("agri_survey_processor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

/// Execute the parsed command and return the process exit status
pub fn run(args: Args) -> Result<i32> {
    match args.command {
        Commands::Config => {
            let json = serde_json::to_string_pretty(&PipelineConfig::default())
                .context("Failed to serialise default configuration")?;
            println!("{}", json);
            Ok(EXIT_SUCCESS)
        }
        Commands::Run(run_args) => run_pipeline(&run_args),
    }
}

fn run_pipeline(args: &RunArgs) -> Result<i32> {
    setup_logging(args.get_log_level());

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    let source = CsvSource::new(&args.fields, &args.weather, &args.mapping);
    let output = pipeline.run(&source).context("Survey processing failed")?;

    if let Some(dir) = &args.output_dir {
        let written = write_outputs(&output, dir)
            .with_context(|| format!("Failed to write Parquet output to {}", dir.display()))?;
        debug!(
            "Wrote {} and {} ({} bytes)",
            written.fields.display(),
            written.weather.display(),
            written.bytes_written
        );
    }

    match args.format {
        OutputFormat::Text => print_text_report(&output),
        OutputFormat::Json => print_json_report(&output)?,
    }

    Ok(if output.report.all_passed() {
        EXIT_SUCCESS
    } else {
        EXIT_VALIDATION_FAILED
    })
}

fn print_text_report(output: &PipelineOutput) {
    let stats = &output.stats;

    println!("\n{}", "Survey Processing Summary".bright_green().bold());
    println!("   • Field rows: {} in, {} out", stats.field_rows_in, stats.field_rows_out);
    if stats.excluded_fields > 0 {
        println!(
            "   • {}",
            format!(
                "Excluded fields: {:?}",
                output.fields.excluded_field_ids()
            )
            .yellow()
        );
    }
    println!("   • Values imputed: {}", stats.values_imputed);
    println!(
        "   • Messages decoded: {} ({} values, {} failures)",
        stats.messages_decoded, stats.measurements_decoded, stats.decode_failures
    );
    println!("   • Stations aggregated: {}", stats.stations_aggregated);
    println!("   • Processing time: {} ms", stats.processing_time_ms);

    println!("\n{}", "Validation".bright_green().bold());
    for result in &output.report.results {
        let status = if result.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!(
            "   {} {:<24} {}",
            status,
            result.rule.as_str(),
            result.detail.bright_black()
        );
    }
    println!();
}

fn print_json_report(output: &PipelineOutput) -> Result<()> {
    let json = serde_json::json!({
        "report": output.report,
        "stats": output.stats,
        "excluded_field_ids": output.fields.excluded_field_ids(),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
