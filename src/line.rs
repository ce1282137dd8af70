//! Line classification
//!
//! Each input line is classified once into a tagged variant, separately from
//! the translator acting on it. Header and body lines use different
//! vocabularies, so there is one classifier for each phase.

use crate::tools::{self, HoleSize, ToolDefinition};

/// Byte at `index`, or NUL past the end of the line
pub(crate) fn byte_at(bytes: &[u8], index: usize) -> u8 {
    bytes.get(index).copied().unwrap_or(0)
}

/// Parse the unsigned decimal digits starting at `start`, returning the
/// value and the number of digits consumed. No digits yields zero.
pub(crate) fn parse_unsigned(bytes: &[u8], start: usize) -> (u32, usize) {
    let mut value: u32 = 0;
    let mut index = start;

    while byte_at(bytes, index).is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(u32::from(bytes[index] - b'0'));
        index += 1;
    }

    (value, index - start)
}

/// Lines understood inside an `M48` header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine<'a> {
    /// `INCH...` or `METRIC...`, resolved against the full line
    Units,
    ToolDefinition(ToolDefinition<'a>),
    /// A line consisting solely of `%`
    EndOfHeader,
    /// `;FILE_FORMAT` with the text that follows the keyword
    FileFormat(&'a str),
    /// `;Holesize` comment carrying a tool definition
    HoleSize(HoleSize<'a>),
    Other,
}

/// Machine codes handled in the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MCode {
    /// `M48`
    HeaderStart,
    /// `M30`
    EndOfProgram,
    /// `M15`
    ZAxisDown,
    /// `M16` or `M17`
    ZAxisUp,
    /// `M00`
    NextTool,
}

/// Preparatory codes starting a body line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GCode {
    /// `G00`
    RouteMove,
    /// `G01`
    RouteLinear,
    /// `G02`
    RouteClockwise,
    /// `G03`
    RouteCounterClockwise,
    /// `G32`
    CannedClockwise,
    /// `G33`
    CannedCounterClockwise,
    /// `G05` or `G81`
    DrillMode,
    /// `G90`
    Absolute,
    /// `G93`
    ZeroSet,
    Unsupported(String),
}

impl GCode {
    fn from_digits(a: u8, b: u8) -> Self {
        match (a, b) {
            (b'0', b'0') => GCode::RouteMove,
            (b'0', b'1') => GCode::RouteLinear,
            (b'0', b'2') => GCode::RouteClockwise,
            (b'0', b'3') => GCode::RouteCounterClockwise,
            (b'3', b'2') => GCode::CannedClockwise,
            (b'3', b'3') => GCode::CannedCounterClockwise,
            (b'0', b'5') | (b'8', b'1') => GCode::DrillMode,
            (b'9', b'0') => GCode::Absolute,
            (b'9', b'3') => GCode::ZeroSet,
            _ => {
                let mut code = String::from("G");
                code.extend([a, b].iter().filter(|c| **c != 0).map(|c| *c as char));
                GCode::Unsupported(code)
            }
        }
    }
}

/// Offset of the coordinates that may follow a two-digit G-code
pub const GCODE_ARGUMENT_OFFSET: usize = 3;

/// Lines understood in the program body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyLine {
    ToolSelect(u32),
    /// Starts with `X`, `Y`, `I`, `J` or `A`
    Coordinates,
    /// `R` repeat-hole directive
    Repeat,
    MCode(MCode),
    GCode(GCode),
    Other,
}

/// Classify a line inside the header block
pub fn classify_header(line: &str) -> HeaderLine<'_> {
    if line.starts_with("INCH") || line.starts_with("METR") {
        return HeaderLine::Units;
    }

    if line.trim_end() == "%" {
        return HeaderLine::EndOfHeader;
    }

    if line.starts_with('T') {
        return HeaderLine::ToolDefinition(tools::parse_tool_definition(line));
    }

    if let Some(comment) = line.strip_prefix(';') {
        let comment = comment.trim_start_matches(' ');
        if let Some(value) = comment.strip_prefix("FILE_FORMAT") {
            return HeaderLine::FileFormat(value);
        }
        if let Some(rest) = comment.strip_prefix("Holesize") {
            if let Some(hole) = tools::parse_hole_size(rest) {
                return HeaderLine::HoleSize(hole);
            }
        }
    }

    HeaderLine::Other
}

/// Classify a line inside the program body
pub fn classify_body(line: &str) -> BodyLine {
    let bytes = line.as_bytes();

    match byte_at(bytes, 0) {
        b'T' => BodyLine::ToolSelect(tools::parse_tool_index(bytes, 1).0),
        b'X' | b'Y' | b'I' | b'J' | b'A' => BodyLine::Coordinates,
        b'R' => BodyLine::Repeat,
        b'M' => match line.trim_end() {
            "M48" => BodyLine::MCode(MCode::HeaderStart),
            "M30" => BodyLine::MCode(MCode::EndOfProgram),
            "M15" => BodyLine::MCode(MCode::ZAxisDown),
            "M16" | "M17" => BodyLine::MCode(MCode::ZAxisUp),
            "M00" => BodyLine::MCode(MCode::NextTool),
            _ => BodyLine::Other,
        },
        b'G' => BodyLine::GCode(GCode::from_digits(byte_at(bytes, 1), byte_at(bytes, 2))),
        _ => BodyLine::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_classification() {
        assert_eq!(classify_header("INCH,LZ"), HeaderLine::Units);
        assert_eq!(classify_header("METRIC,TZ,000.000"), HeaderLine::Units);
        assert_eq!(classify_header("%"), HeaderLine::EndOfHeader);
        assert_eq!(classify_header("M48"), HeaderLine::Other);
        assert_eq!(classify_header("; FILE_FORMAT=2:5"), HeaderLine::FileFormat("=2:5"));
        assert_eq!(
            classify_header("T3C0.035"),
            HeaderLine::ToolDefinition(ToolDefinition {
                tool: 3,
                diameter: Some("0.035")
            })
        );
    }

    #[test]
    fn test_hole_size_comment() {
        match classify_header(";Holesize 2. = 35.000000 Tolerance = +0.000/-0.000 PLATED MILS Quantity = 4") {
            HeaderLine::HoleSize(hole) => {
                assert_eq!(hole.tool, 2);
                assert_eq!(hole.size, "35.000000");
            }
            other => panic!("unexpected classification: {:?}", other),
        }

        assert_eq!(classify_header(";Holesize 2 = 35.0 NOTHING"), HeaderLine::Other);
        assert_eq!(classify_header("; a plain comment"), HeaderLine::Other);
    }

    #[test]
    fn test_body_classification() {
        assert_eq!(classify_body("T02"), BodyLine::ToolSelect(2));
        assert_eq!(classify_body("T0"), BodyLine::ToolSelect(0));
        assert_eq!(classify_body("X0250Y0500"), BodyLine::Coordinates);
        assert_eq!(classify_body("A0500"), BodyLine::Coordinates);
        assert_eq!(classify_body("R5X0100"), BodyLine::Repeat);
        assert_eq!(classify_body("M30"), BodyLine::MCode(MCode::EndOfProgram));
        assert_eq!(classify_body("M17"), BodyLine::MCode(MCode::ZAxisUp));
        assert_eq!(classify_body("M300"), BodyLine::Other);
        assert_eq!(classify_body(""), BodyLine::Other);
    }

    #[test]
    fn test_gcode_classification() {
        assert_eq!(classify_body("G00X01Y02"), BodyLine::GCode(GCode::RouteMove));
        assert_eq!(classify_body("G81"), BodyLine::GCode(GCode::DrillMode));
        assert_eq!(classify_body("G05"), BodyLine::GCode(GCode::DrillMode));
        assert_eq!(classify_body("G33X01Y02A03"), BodyLine::GCode(GCode::CannedCounterClockwise));
        assert_eq!(
            classify_body("G85"),
            BodyLine::GCode(GCode::Unsupported("G85".to_string()))
        );
        assert_eq!(
            classify_body("G"),
            BodyLine::GCode(GCode::Unsupported("G".to_string()))
        );
    }
}
