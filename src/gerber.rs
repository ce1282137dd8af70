//! Gerber output
//!
//! This module handles the RS-274X side of the conversion: the line sink the
//! translator writes into and the fixed command texts it emits.

use crate::format::{NumericFormat, Units};
use crate::tools::aperture_number;
use std::io::{self, Write};
use tracing::debug;

/// Image polarity and interpolation prologue written when the body starts
pub const BODY_PROLOGUE: [&str; 2] = ["%LPD*%", "G01*"];

pub const LINEAR_INTERPOLATION: &str = "G01*";
pub const CLOCKWISE_INTERPOLATION: &str = "G02*";
pub const COUNTER_CLOCKWISE_INTERPOLATION: &str = "G03*";
pub const MULTI_QUADRANT: &str = "G75*";
pub const PROGRAM_END: &str = "M02*";

/// Commands written when a routing G-code changes the interpolation mode
pub const NO_PROLOGUE: &[&str] = &[];
pub const LINEAR_PROLOGUE: &[&str] = &[LINEAR_INTERPOLATION];
pub const CLOCKWISE_PROLOGUE: &[&str] = &[CLOCKWISE_INTERPOLATION, MULTI_QUADRANT];
pub const COUNTER_CLOCKWISE_PROLOGUE: &[&str] = &[COUNTER_CLOCKWISE_INTERPOLATION, MULTI_QUADRANT];

/// Append-only destination for generated Gerber lines
pub trait GerberSink {
    /// Append one complete line, without its terminator
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

impl GerberSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Sink writing `\n`-terminated lines to any writer
pub struct GerberWriter<W: Write> {
    inner: W,
}

impl<W: Write> GerberWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> GerberSink for GerberWriter<W> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")
    }
}

/// Forwards to another sink, counting the lines that pass through
pub struct CountingSink<'a, S: GerberSink> {
    inner: &'a mut S,
    count: usize,
}

impl<'a, S: GerberSink> CountingSink<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self { inner, count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<S: GerberSink> GerberSink for CountingSink<'_, S> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.inner.emit(line)?;
        self.count += 1;
        Ok(())
    }
}

/// `%FSLAX..Y..*MO..*%` for the given units and format
pub fn format_statement(units: Units, format: NumericFormat) -> String {
    format!(
        "%FSLAX{i}{f}Y{i}{f}*MO{units}*%",
        i = format.integer_digits,
        f = format.fraction_digits,
        units = units.gerber_code()
    )
}

/// Circular aperture definition for a drill tool
pub fn aperture_definition(tool: u32, diameter: &str) -> String {
    format!("%ADD{:02}C,{}*%", aperture_number(tool), diameter)
}

/// Aperture select command for a drill tool
pub fn aperture_select(tool: u32) -> String {
    format!("D{:02}*", aperture_number(tool))
}

/// `G04` comment identifying the generator and the conversion time
pub fn generator_comment() -> String {
    let now = chrono::Local::now();
    let comment = format!(
        "G04 Drill2Gerber {}, {}*",
        env!("CARGO_PKG_VERSION"),
        now.format("%Y-%m-%d %H:%M:%S")
    );
    debug!("Generator comment: {}", comment);
    comment
}
