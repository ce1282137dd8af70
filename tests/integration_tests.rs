//! Integration tests for Drill2Gerber
//!
//! End-to-end runs through the public API, from drill text or files on disk
//! to the generated Gerber output.

use std::{fs, path::PathBuf};
use tempfile::TempDir;
use drill2gerber::{
    config::Config,
    converter::{exit_code, Converter, EXIT_CONVERSION_FAILED, EXIT_INPUT_UNAVAILABLE, EXIT_SUCCESS},
    translate, translate_str, ConversionOutcome, GerberWriter, TranslationIssue,
};

/// Drill file in the style KiCad writes
const KICAD_DRILL: &str = "M48\r\n\
; DRILL file {KiCad 7.0.0} date 2024-03-01\r\n\
; FORMAT={-:-/ absolute / metric / decimal}\r\n\
FMAT,2\r\n\
METRIC,TZ\r\n\
T1C0.800\r\n\
T2C1.000\r\n\
%\r\n\
G90\r\n\
G05\r\n\
T1\r\n\
X10.0Y5.0\r\n\
X12.5Y5.0\r\n\
T2\r\n\
X20.0Y10.0\r\n\
M30\r\n";

const KICAD_GERBER: &[&str] = &[
    "%FSLAX33Y33*MOMM*%",
    "%ADD11C,0.800*%",
    "%ADD12C,1.000*%",
    "%LPD*%",
    "G01*",
    "G01*",
    "D11*",
    "X10000Y5000D03*",
    "X12500D03*",
    "D12*",
    "X20000Y10000D03*",
    "M02*",
];

/// Create a temporary directory holding one input file
fn create_test_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    (temp_dir, path)
}

#[test]
fn test_kicad_drill_file_conversion() {
    let (_dir, input) = create_test_file("board-PTH.drl", KICAD_DRILL);
    let config = Config::for_input(&input);
    let output_path = config.output_path.clone();

    let result = Converter::new(config).run();
    assert_eq!(exit_code(&result), EXIT_SUCCESS);

    let output = fs::read_to_string(output_path).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines, KICAD_GERBER);

    let report = result.unwrap();
    assert_eq!(report.lines_read, 16);
    assert_eq!(report.lines_written, KICAD_GERBER.len());
}

#[test]
fn test_output_directory_is_created() {
    let (dir, input) = create_test_file("board.drl", KICAD_DRILL);
    let mut config = Config::for_input(&input);
    config.output_path = dir.path().join("gerber").join("drill.gbr");

    let report = Converter::new(config).run().unwrap();

    assert!(report.is_success());
    assert!(dir.path().join("gerber").join("drill.gbr").is_file());
}

#[test]
fn test_string_and_stream_apis_agree() {
    let (from_str, str_report) = translate_str(KICAD_DRILL);

    let lines = KICAD_DRILL.lines().map(|line| Ok(line.to_string()));
    let mut writer = GerberWriter::new(Vec::new());
    let stream_report = translate(lines, &mut writer).unwrap();
    let bytes = writer.into_inner().unwrap();

    assert_eq!(from_str, KICAD_GERBER);
    assert_eq!(String::from_utf8(bytes).unwrap(), KICAD_GERBER.join("\n") + "\n");
    assert_eq!(str_report.lines_written, stream_report.lines_written);
}

#[test]
fn test_routed_board_outline() {
    let input = "M48\n\
METRIC,TZ\n\
T1C2.0\n\
%\n\
T1\n\
G00X0Y0\n\
M15\n\
G01X10.0Y0\n\
Y10.0\n\
G03X0Y10.0A5.0\n\
G01Y0\n\
M16\n\
G05\n\
M30\n";

    let (output, report) = translate_str(input);

    assert!(report.is_success());
    assert_eq!(
        &output[4..],
        [
            "D11*",
            "D02*",
            "G01*",
            "X10000D01*",
            "Y10000D01*",
            "G03*",
            "G75*",
            "X0Y10000I-5000J0D01*",
            "G01*",
            "Y0D01*",
            "G01*",
            "M02*",
        ]
    );
}

#[test]
fn test_hole_size_converted_to_metric() {
    let input = "M48\n\
METRIC,TZ\n\
;Holesize 1 = 35.000000 Tolerance = +0.000/-0.000 PLATED MILS Quantity = 2\n\
%\n\
X1.0Y1.0\n";

    let (output, report) = translate_str(input);

    assert_eq!(output[1], "%ADD11C,0.889*%");
    assert_eq!(&output[4..], ["D11*", "X1000Y1000D03*"]);
    assert!(report.is_success());
}

#[test]
fn test_issues_are_reported_in_order() {
    let input = "M48\nINCH,LZ\nT1\n%\nG93\nX0100Y0100G99X0200\nG42\n";

    let (_, report) = translate_str(input);

    assert_eq!(report.outcome(), ConversionOutcome::ConversionError);
    assert_eq!(report.issues.len(), 4);
    assert!(matches!(report.issues[0], TranslationIssue::IgnoredCommand { .. }));
    assert!(matches!(report.issues[1], TranslationIssue::IgnoredCommand { .. }));
    assert!(matches!(
        report.issues[2],
        TranslationIssue::EmbeddedCommandInvalid { .. }
    ));
    assert_eq!(
        report.issues[3],
        TranslationIssue::UnsupportedGCode {
            code: "G42".to_string()
        }
    );
    assert_eq!(report.errors().count(), 1);
    assert_eq!(report.warnings().count(), 3);
}

#[test]
fn test_unrecognised_file_exit_code() {
    let (_dir, input) = create_test_file("readme.txt", "This is not a drill file\n");

    let result = Converter::new(Config::for_input(&input)).run();

    assert_eq!(
        result.as_ref().unwrap().outcome(),
        ConversionOutcome::FormatUnrecognized
    );
    assert_eq!(exit_code(&result), EXIT_CONVERSION_FAILED);
}

#[test]
fn test_missing_input_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = Config::for_input(dir.path().join("missing.drl"));

    let result = Converter::new(config).run();

    assert!(result.is_err());
    assert_eq!(exit_code(&result), EXIT_INPUT_UNAVAILABLE);
}

#[test]
fn test_non_utf8_comment_is_tolerated() {
    let mut content = b"M48\n; made by \xff\xfe tool\nINCH,TZ\nT1C0.035\n%\nX0250Y0500\n".to_vec();
    content.extend_from_slice(b"M30\n");

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("legacy.drl");
    fs::write(&input, content).unwrap();
    let config = Config::for_input(&input);
    let output_path = config.output_path.clone();

    let report = Converter::new(config).run().unwrap();

    assert!(report.is_success());
    let output = fs::read_to_string(output_path).unwrap();
    assert!(output.contains("X250Y500D03*\n"));
}
