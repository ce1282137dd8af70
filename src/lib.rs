// SPDX-FileCopyrightText: 2025 Drill2Gerber contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Drill2Gerber - Excellon drill and route files to RS-274X Gerber
//!
//! The translation core is a line-at-a-time [`Translator`] writing into any
//! [`GerberSink`]. [`Converter`] wraps it with file handling for the binary.

pub mod arc;
pub mod config;
pub mod converter;
pub mod coord;
pub mod error;
pub mod format;
pub mod gerber;
pub mod line;
pub mod motion;
pub mod progress;
pub mod tools;
pub mod translator;

pub use config::Config;
pub use converter::Converter;
pub use error::{FileError, Result, Severity, TranslationIssue};
pub use gerber::{GerberSink, GerberWriter};
pub use translator::{
    translate, translate_str, ConversionOutcome, ConversionReport, ConversionStatus, Translator,
};
