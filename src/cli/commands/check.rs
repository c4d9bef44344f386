//! Check command: report OCR tool and backend availability.

use console::style;

use ocrsift::config::ExtractorConfig;
use ocrsift::ocr::{OcrBackend, TesseractBackend, TextExtractor};

/// Check OCR tool availability.
pub async fn cmd_check(config: &ExtractorConfig) -> anyhow::Result<()> {
    println!("\n{}", style("OCR Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tools = TextExtractor::check_tools();
    println!("\n{}", style("External Tools:").cyan());
    let mut all_found = true;

    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n{}", style("OCR Backends:").cyan());

    let tesseract = TesseractBackend::with_language(&config.language);
    let tesseract_status = if !config.backends.tesseract {
        style("disabled in config").dim()
    } else if tesseract.is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {}", "Tesseract", tesseract_status);
    if config.backends.tesseract && !tesseract.is_available() {
        println!(
            "                  {}",
            style(tesseract.availability_hint()).dim()
        );
    }

    #[cfg(feature = "ocr-paddle")]
    {
        use ocrsift::ocr::PaddleBackend;
        let paddle = PaddleBackend::with_model_path(config.backends.model_path.clone());
        let paddle_status = if !config.backends.paddle {
            style("disabled in config").dim()
        } else if paddle.is_available() {
            style("✓ available").green()
        } else {
            style("○ models will auto-download").yellow()
        };
        println!("  {:<15} {}", "PaddleOCR", paddle_status);
        if config.backends.paddle {
            println!(
                "                  {}",
                style(paddle.availability_hint()).dim()
            );
        }
    }
    #[cfg(not(feature = "ocr-paddle"))]
    {
        println!(
            "  {:<15} {}",
            "PaddleOCR",
            style("not compiled (enable ocr-paddle feature)").dim()
        );
    }

    println!();

    if all_found {
        println!("{} All external tools are available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing. Install them for full OCR support:",
            style("!").yellow()
        );
        println!("  Ubuntu/Debian: apt install tesseract-ocr poppler-utils");
        println!("  macOS: brew install tesseract poppler");
    }

    Ok(())
}
