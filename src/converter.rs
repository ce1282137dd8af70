//! File-level conversion driver for Drill2Gerber
//!
//! Opens the Excellon input, streams it through the translator into a
//! buffered Gerber writer and reports how the run went.

use crate::{
    config::Config,
    error::{FileError, Result, ResultExt},
    gerber::{self, GerberSink, GerberWriter},
    progress::ProgressTracker,
    translator::{translate, ConversionOutcome, ConversionReport},
};
use anyhow::Context;
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter},
};
use tracing::{debug, info, warn};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_INPUT_UNAVAILABLE: i32 = 1;
pub const EXIT_OUTPUT_UNAVAILABLE: i32 = 2;
pub const EXIT_CONVERSION_FAILED: i32 = 3;

/// Drives one input file to one output file
pub struct Converter {
    config: Config,
    progress_tracker: ProgressTracker,
}

impl Converter {
    /// Create a new converter with the given configuration
    pub fn new(config: Config) -> Self {
        let progress_enabled = !config.no_progress;

        Self {
            config,
            progress_tracker: ProgressTracker::new(progress_enabled),
        }
    }

    /// Run the complete conversion.
    ///
    /// Translation problems end up in the returned report. An `Err` means
    /// a file could not be opened, read or written.
    pub fn run(&self) -> Result<ConversionReport> {
        let start = std::time::Instant::now();
        let input_path = &self.config.input_path;
        let output_path = &self.config.output_path;

        self.config
            .validate()
            .context("Configuration validation failed")?;

        let input = File::open(input_path).with_context(|| FileError::InputUnavailable {
            path: input_path.display().to_string(),
        })?;
        let total_bytes = input.metadata().map(|meta| meta.len()).unwrap_or(0);

        let output = File::create(output_path).with_context(|| FileError::OutputUnavailable {
            path: output_path.display().to_string(),
        })?;
        let mut writer = GerberWriter::new(BufWriter::new(output));

        info!(
            "Converting {} to {}",
            input_path.display(),
            output_path.display()
        );

        if self.config.stamp {
            writer
                .emit(&gerber::generator_comment())
                .with_path_context("write", output_path)?;
        }

        let file_name = input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_path.display().to_string());
        let progress = self
            .progress_tracker
            .create_conversion_progress(total_bytes, &file_name);

        // Comments may carry bytes that are not UTF-8; they never matter to
        // the translation, so decode lossily instead of failing the run.
        let lines = BufReader::new(input)
            .split(b'\n')
            .map(|bytes| bytes.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
            .inspect(|line| {
                if let Ok(line) = line {
                    ProgressTracker::update_progress(&progress, line.len() as u64 + 1, None);
                }
            });

        let mut report = match translate(lines, &mut writer).with_path_context("convert", input_path) {
            Ok(report) => report,
            Err(e) => {
                ProgressTracker::finish_with_error(progress, "Conversion aborted");
                return Err(e);
            }
        };

        writer
            .into_inner()
            .with_path_context("write", output_path)?;

        if self.config.stamp {
            report.lines_written += 1;
        }

        match report.outcome() {
            ConversionOutcome::Success => {
                ProgressTracker::finish_progress(progress, "Conversion completed")
            }
            ConversionOutcome::FormatUnrecognized => {
                warn!("No coordinate format was found in {}", input_path.display());
                ProgressTracker::finish_with_error(progress, "Unrecognised drill format")
            }
            ConversionOutcome::ConversionError => {
                ProgressTracker::finish_with_error(progress, "Conversion finished with errors")
            }
        }

        debug!(
            "Read {} lines, wrote {} lines",
            report.lines_read, report.lines_written
        );
        info!("Conversion completed in {} ms", start.elapsed().as_millis());
        Ok(report)
    }
}

/// Process exit code for the result of [`Converter::run`]
pub fn exit_code(result: &Result<ConversionReport>) -> i32 {
    match result {
        Ok(report) if report.is_success() => EXIT_SUCCESS,
        Ok(_) => EXIT_CONVERSION_FAILED,
        Err(e) => match e.downcast_ref::<FileError>() {
            Some(FileError::InputUnavailable { .. }) => EXIT_INPUT_UNAVAILABLE,
            Some(FileError::OutputUnavailable { .. }) => EXIT_OUTPUT_UNAVAILABLE,
            None => EXIT_CONVERSION_FAILED,
        },
    }
}
