//! Drill2Gerber - Convert Excellon drill files to RS-274X Gerber
//!
//! Command line front end: parses arguments, runs one conversion and maps
//! the result onto the process exit code.

use drill2gerber::{
    config::Config,
    converter::{exit_code, Converter, EXIT_INPUT_UNAVAILABLE},
    translator::ConversionOutcome,
};
use std::io::BufRead;
use tracing::{error, info};

fn main() {
    // Parse configuration and initialize logging
    let config = Config::from_args().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(EXIT_INPUT_UNAVAILABLE);
    });
    let pause = config.pause;
    let output_path = config.output_path.clone();

    info!("Starting conversion process...");
    let converter = Converter::new(config);
    let result = converter.run();

    match &result {
        Ok(report) => match report.outcome() {
            ConversionOutcome::Success => {
                info!(
                    "Conversion completed with {} warnings",
                    report.warnings().count()
                );
                println!("Wrote {}", output_path.display());
            }
            ConversionOutcome::FormatUnrecognized => {
                eprintln!("Error: the drill coordinate format was not recognised");
                print_report_hint();
            }
            ConversionOutcome::ConversionError => {
                eprintln!(
                    "Error: conversion finished with {} errors",
                    report.errors().count()
                );
                print_report_hint();
            }
        },
        Err(e) => {
            error!("Conversion failed: {:#}", e);
            eprintln!("Error: {:#}", e);
        }
    }

    if pause {
        wait_for_enter();
    }

    std::process::exit(exit_code(&result));
}

fn print_report_hint() {
    eprintln!(
        "If this drill file came from a common CAD tool, please report it together with the file \
         so the conversion can be improved."
    );
}

fn wait_for_enter() {
    println!("Press Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}
