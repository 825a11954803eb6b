//! Process command - extract fields from a single DARF PDF.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use darf_core::models::config::DarfConfig;
use darf_core::models::record::{ExtractionRecord, Field, FieldStatus};
use darf_core::{create_recognizer, DocumentAssembler};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Only extract this page (1-based)
    #[arg(short, long)]
    page: Option<u32>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip OCR and use only the PDF text layer
    #[arg(long)]
    text_only: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Extracting {}", args.input.display()));

    let assembler = build_assembler(&config, args.text_only);
    let records = match args.page {
        Some(page) => vec![assembler.extract_page(&args.input, page)?],
        None => assembler.extract_document(&args.input),
    };

    pb.finish_and_clear();

    let output = format_records(&records, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Assembler with a run-wide recognizer, or native text only.
pub fn build_assembler(config: &DarfConfig, text_only: bool) -> DocumentAssembler {
    if text_only {
        DocumentAssembler::native_only(config)
    } else {
        DocumentAssembler::from_config(config, Arc::new(create_recognizer(&config.ocr)))
    }
}

fn format_records(records: &[ExtractionRecord], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            write_records(&mut wtr, records)?;
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => Ok(format_text(records)),
    }
}

/// One row per record: the label, every field value, then every field error.
pub fn write_records<W: Write>(wtr: &mut csv::Writer<W>, records: &[ExtractionRecord]) -> anyhow::Result<()> {
    let mut header = vec!["Arquivo".to_string()];
    header.extend(Field::ALL.iter().map(|f| f.display_name().to_string()));
    header.extend(Field::ALL.iter().map(|f| format!("Erro {}", f.display_name())));
    wtr.write_record(&header)?;

    for record in records {
        let mut row = vec![record.source_label.as_str()];
        row.extend(record.fields().map(|(_, v)| v.as_deref().unwrap_or("")));
        row.extend(record.fields().map(|(_, v)| v.error.as_deref().unwrap_or("")));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn format_text(records: &[ExtractionRecord]) -> String {
    let mut output = String::new();

    for record in records {
        output.push_str(&format!("{}\n", record.source_label));
        for (field, value) in record.fields() {
            let shown = value.as_deref().unwrap_or("-");
            match (&value.error, value.status) {
                (Some(error), FieldStatus::Malformed) => {
                    output.push_str(&format!("  {}: {} ({})\n", field, shown, error))
                }
                (Some(error), _) => output.push_str(&format!("  {}: - ({})\n", field, error)),
                (None, _) => output.push_str(&format!("  {}: {}\n", field, shown)),
            }
        }
        output.push('\n');
    }

    output
}
