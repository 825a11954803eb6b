//! Batch command - extract many DARF PDFs into CSV reports.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use darf_core::models::record::ExtractionRecord;
use darf_core::output::{PatronalRow, PaymentRow, RowBuilder, ServidorRow};
use darf_core::report::{collect_issues, FieldIssue};

use super::process::{build_assembler, write_records};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Directory of PDFs or a glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (default: current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip OCR and use only the PDF text layer
    #[arg(long)]
    text_only: bool,
}

/// Everything collected over a batch run.
#[derive(Default)]
struct BatchOutput {
    records: Vec<ExtractionRecord>,
    servidor: Vec<ServidorRow>,
    patronal: Vec<PatronalRow>,
    issues: Vec<FieldIssue>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files = find_pdfs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No PDF files found for: {}", args.input);
    }

    println!("{} Found {} files to process", style("ℹ").blue(), files.len());

    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = Arc::clone(&cancelled);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancelled.store(true, Ordering::SeqCst);
            }
        });
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    let assembler = build_assembler(&config, args.text_only);
    let today = chrono::Local::now().date_naive();
    let rows = RowBuilder::new(&config.lookups, &config.output, today);
    let mut out = BatchOutput::default();
    let mut processed = 0;

    for path in &files {
        if cancelled.load(Ordering::SeqCst) {
            warn!("Cancelled, stopping before {}", path.display());
            break;
        }

        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        // extraction is blocking; keep the runtime free for the ctrl-c listener
        let records = tokio::task::block_in_place(|| assembler.extract_document(path));

        for record in records {
            out.issues.extend(collect_issues(&record, &config.lookups));
            match rows.build(&record) {
                Some(PaymentRow::Servidor(row)) => out.servidor.push(row),
                Some(PaymentRow::Patronal(row)) => out.patronal.push(row),
                None => debug!("{}: no category row", record.source_label),
            }
            out.records.push(record);
        }

        processed += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();

    write_outputs(&output_dir, &out)?;

    let with_errors = out.records.iter().filter(|r| r.has_errors()).count();
    println!();
    println!(
        "{} Processed {} of {} files ({} pages) in {:?}",
        style("✓").green(),
        processed,
        files.len(),
        out.records.len(),
        start.elapsed()
    );
    println!(
        "   {} servidor rows, {} patronal-gilrat rows, {} pages with errors",
        style(out.servidor.len()).green(),
        style(out.patronal.len()).green(),
        style(with_errors).red()
    );
    println!("   Reports written to {}", output_dir.display());

    if cancelled.load(Ordering::SeqCst) {
        anyhow::bail!("Cancelled after {} of {} files", processed, files.len());
    }

    Ok(())
}

/// PDFs in a directory, or the PDFs matched by a glob pattern, sorted.
fn find_pdfs(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);
    let pattern = if path.is_dir() {
        path.join("*").to_string_lossy().into_owned()
    } else {
        input.to_string()
    };

    let mut files: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();

    debug!("{} PDFs for {}", files.len(), input);
    Ok(files)
}

fn write_outputs(dir: &Path, out: &BatchOutput) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(dir.join("records.csv"))?;
    write_records(&mut wtr, &out.records)?;

    write_rows(&dir.join("servidor.csv"), ServidorRow::COLUMNS, &out.servidor)?;
    write_rows(&dir.join("patronal-gilrat.csv"), PatronalRow::COLUMNS, &out.patronal)?;
    write_rows(&dir.join("errors.csv"), FieldIssue::COLUMNS, &out.issues)?;

    info!("Wrote reports to {}", dir.display());
    Ok(())
}

/// Header first so that an empty table still names its columns.
fn write_rows<T: serde::Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(columns)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pdfs_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        fs::write(dir.path().join("a.PDF"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = find_pdfs(dir.path().to_str().unwrap()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    fn header_of<T: serde::Serialize>(row: &T) -> String {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.serialize(row).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        out.lines().next().unwrap().to_string()
    }

    fn columns_line(columns: &[&str]) -> String {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(columns).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap().trim_end().to_string()
    }

    #[test]
    fn test_columns_match_serialized_headers() {
        let record = ExtractionRecord::failed("a.pdf - Page 1", "x");
        let issue = collect_issues(&record, &darf_core::LookupTables::default()).remove(0);
        assert_eq!(header_of(&issue), columns_line(FieldIssue::COLUMNS));

        let servidor = ServidorRow {
            file: String::new(),
            creditor: String::new(),
            optical_reader: String::new(),
            payment_kind: String::new(),
            slip_type: String::new(),
            competence: String::new(),
            org_unit: String::new(),
            gmi_fp: String::new(),
            expense_authorizer: String::new(),
            document_number: String::new(),
            barcode: String::new(),
            total_amount: String::new(),
            payment_date: String::new(),
            history: String::new(),
        };
        assert_eq!(header_of(&servidor), columns_line(ServidorRow::COLUMNS));

        let patronal = PatronalRow {
            file: String::new(),
            creditor: String::new(),
            optical_reader: String::new(),
            payment_kind: String::new(),
            slip_type: String::new(),
            payroll: String::new(),
            org_unit: String::new(),
            expense_authorizer: String::new(),
            document_number: String::new(),
            barcode: String::new(),
            total_amount: String::new(),
            payment_date: String::new(),
            history: String::new(),
        };
        assert_eq!(header_of(&patronal), columns_line(PatronalRow::COLUMNS));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servidor.csv");
        write_rows::<ServidorRow>(&path, ServidorRow::COLUMNS, &[]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim_end(), columns_line(ServidorRow::COLUMNS));
    }
}
