//! Extract command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;

use ocrsift::config::ExtractorConfig;
use ocrsift::ocr::{save_report, ExtractionOutcome, ExtractionReport, TextExtractor};

/// How extraction results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Final text only
    #[default]
    Text,
    /// Full report with per-variant and per-page detail
    Json,
}

/// Extract text from files, several at a time.
///
/// Results are printed in input order regardless of which file finishes
/// first. A file that fails does not stop the others.
pub async fn cmd_extract(
    config: ExtractorConfig,
    files: Vec<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
    jobs: usize,
) -> anyhow::Result<()> {
    let extractor = Arc::new(TextExtractor::detect(config));
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut handles = Vec::with_capacity(files.len());
    for path in files.iter().cloned() {
        let extractor = extractor.clone();
        let semaphore = semaphore.clone();
        let pb = pb.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            pb.set_message(file_label(&path));
            let result =
                tokio::task::spawn_blocking(move || extractor.extract_report(&path)).await?;
            pb.inc(1);
            anyhow::Ok(result)
        }));
    }

    let mut reports = Vec::with_capacity(files.len());
    let mut failures = 0;
    for (path, handle) in files.iter().zip(handles) {
        match handle.await?? {
            Ok(report) => {
                warn_if_degraded(&report);
                reports.push(report);
            }
            Err(e) => {
                failures += 1;
                pb.suspend(|| eprintln!("{} {}: {}", style("✗").red(), path.display(), e));
            }
        }
    }
    pb.finish_and_clear();

    match (&output, format, reports.as_slice()) {
        (Some(out), OutputFormat::Json, [report]) => save_report(report, out)?,
        (Some(out), _, _) => std::fs::write(out, render(&reports, format)?)?,
        (None, _, _) => print!("{}", render(&reports, format)?),
    }
    if let Some(out) = &output {
        eprintln!("{} Wrote {}", style("✓").green(), out.display());
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files failed", failures, files.len());
    }
    Ok(())
}

/// Render reports for output.
///
/// Text mode prints each file's text, with a header line per file when
/// there is more than one. JSON mode prints one report, or an array.
fn render(reports: &[ExtractionReport], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = match reports {
                [report] => serde_json::to_string_pretty(report)?,
                _ => serde_json::to_string_pretty(reports)?,
            };
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Text => {
            let mut text = String::new();
            for report in reports {
                if reports.len() > 1 {
                    text.push_str(&format!("==> {} <==\n", report.file_path()));
                }
                text.push_str(report.combined_text());
                text.push('\n');
            }
            Ok(text)
        }
    }
}

fn warn_if_degraded(report: &ExtractionReport) {
    let note = match report.outcome() {
        ExtractionOutcome::Ok => return,
        ExtractionOutcome::DegradedQuality => "text extraction quality is poor",
        ExtractionOutcome::Empty => "no readable text found",
    };
    eprintln!(
        "{} {}: {}",
        style("!").yellow(),
        report.file_path(),
        style(note).yellow()
    );
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
