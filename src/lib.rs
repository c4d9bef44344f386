//! ocrsift - multi-engine OCR text extraction for images and PDFs.
//!
//! Runs several OCR engines over several preprocessed versions of each
//! image and keeps the most plausible text. Poor results are reported as
//! such instead of failing.
//!
//! ```no_run
//! use ocrsift::config::ExtractorConfig;
//! use ocrsift::ocr::{OutputMode, TextExtractor};
//!
//! let extractor = TextExtractor::detect(ExtractorConfig::default());
//! let result = extractor.extract("scan.png".as_ref(), OutputMode::Plain)?;
//! println!("{}", result.text());
//! # Ok::<(), ocrsift::ocr::ExtractError>(())
//! ```

#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod ocr;
