//! Configuration management for Drill2Gerber
//!
//! This module handles CLI argument parsing and application settings.

use crate::error::FileError;
use anyhow::{anyhow, Context, Result};
use clap::builder::styling;
use clap::{value_parser, Arg, ColorChoice, Command};
use std::path::{Path, PathBuf};
use tracing::info;

/// Extension appended to the input path when no output path is given
pub const OUTPUT_EXTENSION: &str = "grb";

/// Build the CLI command
pub fn build_cli() -> Command {
    let styles = styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Blue.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default());

    Command::new("drill2gerber")
        .about("Drill2Gerber - Convert Excellon drill/route files to RS-274X Gerber")
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(
            "Tested on drill files from Altium Designer, Autodesk Circuits, FreePCB, \
             KiCad, Mentor Graphics, Microchip and PCAD.",
        )
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("input")
                .help("Excellon drill file to convert")
                .value_parser(value_parser!(String))
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output Gerber file (default: <input>.grb)")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no_progress")
                .long("no-progress")
                .help("Disable progress indicators")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stamp")
                .long("stamp")
                .help("Start the output with a G04 comment naming the generator and time")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pause")
                .long("pause")
                .help("Wait for Enter before exiting")
                .action(clap::ArgAction::SetTrue),
        )
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Excellon input file
    pub input_path: PathBuf,

    /// Gerber output file
    pub output_path: PathBuf,

    /// Enable verbose logging
    pub verbose: bool,

    /// Disable progress bars
    pub no_progress: bool,

    /// Write a generator comment at the top of the output
    pub stamp: bool,

    /// Wait for Enter before exiting
    pub pause: bool,
}

impl Config {
    /// Configuration converting `input_path` to the default output path
    pub fn for_input<P: Into<PathBuf>>(input_path: P) -> Self {
        let input_path = input_path.into();
        let output_path = default_output_path(&input_path);

        Self {
            input_path,
            output_path,
            verbose: false,
            no_progress: true,
            stamp: false,
            pause: false,
        }
    }

    /// Parse arguments and apply initial configuration
    pub fn from_args() -> Result<Self> {
        let matches = build_cli().get_matches();

        let input_path = matches
            .get_one::<String>("input")
            .ok_or_else(|| anyhow!("Input path is required"))?;
        let input_path = PathBuf::from(input_path);

        let output_path = matches
            .get_one::<String>("output")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_output_path(&input_path));

        let config = Config {
            input_path,
            output_path,
            verbose: matches.get_flag("verbose"),
            no_progress: matches.get_flag("no_progress"),
            stamp: matches.get_flag("stamp"),
            pause: matches.get_flag("pause"),
        };

        // RUST_LOG takes precedence over the verbose flag. Translation
        // warnings stay visible by default.
        let default_level = if config.verbose { "debug" } else { "warn" };
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();

        if config.verbose {
            info!("Configuration: {:?}", config);
        }

        Ok(config)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.is_file() {
            return Err(anyhow::Error::new(FileError::InputUnavailable {
                path: self.input_path.display().to_string(),
            })
            .context("Input file does not exist"));
        }

        if self.input_path == self.output_path {
            return Err(anyhow::anyhow!(
                "Output would overwrite the input file: {}",
                self.output_path.display()
            ));
        }

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| FileError::OutputUnavailable {
                    path: self.output_path.display().to_string(),
                })?;
                info!("Created output directory: {}", parent.display());
            }
        }

        info!("Configuration validation completed successfully");
        Ok(())
    }
}

/// `<input>.grb`, keeping the input's own extension
pub fn default_output_path(input_path: &Path) -> PathBuf {
    let mut name = input_path.as_os_str().to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("boards/main.drl")),
            PathBuf::from("boards/main.drl.grb")
        );
        assert_eq!(default_output_path(Path::new("NCDRILL")), PathBuf::from("NCDRILL.grb"));
    }

    #[test]
    fn test_config_for_input() {
        let config = Config::for_input("board.txt");

        assert_eq!(config.input_path, PathBuf::from("board.txt"));
        assert_eq!(config.output_path, PathBuf::from("board.txt.grb"));
        assert!(config.no_progress);
        assert!(!config.stamp);
    }

    #[test]
    fn test_cli_parsing() {
        let matches = build_cli()
            .try_get_matches_from(["drill2gerber", "board.drl", "-o", "out.gbr", "--stamp"])
            .unwrap();

        assert_eq!(matches.get_one::<String>("input").unwrap(), "board.drl");
        assert_eq!(matches.get_one::<String>("output").unwrap(), "out.gbr");
        assert!(matches.get_flag("stamp"));
        assert!(!matches.get_flag("pause"));
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(build_cli().try_get_matches_from(["drill2gerber"]).is_err());
    }

    #[test]
    fn test_validate_missing_input() {
        let config = Config::for_input("does/not/exist.drl");
        let err = config.validate().unwrap_err();
        assert!(err.downcast_ref::<FileError>().is_some());
    }
}
