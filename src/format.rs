//! Numeric format resolution
//!
//! Works out how many integer and fraction digits the drill coordinates
//! carry, and whether the producer kept leading or trailing zeros, from the
//! unit directives in the header.

use crate::line::byte_at;
use tracing::{debug, warn};

/// Measurement units of the drill program and of the generated Gerber file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Inch,
    Metric,
}

impl Units {
    /// Gerber `MO` mode code
    pub fn gerber_code(&self) -> &'static str {
        match self {
            Units::Inch => "IN",
            Units::Metric => "MM",
        }
    }
}

/// Fixed-point layout of coordinate tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericFormat {
    pub integer_digits: u32,
    pub fraction_digits: u32,

    /// Leading zeros are written, so omitted digits are trailing ones
    pub leading_zeros: bool,
}

impl NumericFormat {
    /// Format assumed until the header says otherwise
    pub const UNDECLARED: NumericFormat = NumericFormat::new(3, 3, true);

    pub const INCH: NumericFormat = NumericFormat::new(2, 4, true);
    pub const METRIC: NumericFormat = NumericFormat::new(3, 3, true);

    pub const fn new(integer_digits: u32, fraction_digits: u32, leading_zeros: bool) -> Self {
        Self {
            integer_digits,
            fraction_digits,
            leading_zeros,
        }
    }

    pub fn total_digits(&self) -> u32 {
        self.integer_digits + self.fraction_digits
    }

    /// Default layout for a unit system
    pub fn for_units(units: Units) -> Self {
        match units {
            Units::Inch => Self::INCH,
            Units::Metric => Self::METRIC,
        }
    }
}

impl Default for NumericFormat {
    fn default() -> Self {
        Self::UNDECLARED
    }
}

/// Tracks the active numeric format across header blocks
#[derive(Debug, Clone)]
pub struct FormatResolver {
    format: NumericFormat,
    units: Option<Units>,

    /// Set by `;FILE_FORMAT=2:5`, widens the inch fraction to five digits
    inch_five_fraction: bool,
}

impl Default for FormatResolver {
    fn default() -> Self {
        Self {
            format: NumericFormat::UNDECLARED,
            units: None,
            inch_five_fraction: false,
        }
    }
}

impl FormatResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(&self) -> NumericFormat {
        self.format
    }

    pub fn units(&self) -> Option<Units> {
        self.units
    }

    pub fn is_recognised(&self) -> bool {
        self.units.is_some()
    }

    /// Handle the remainder of a `;FILE_FORMAT` comment
    pub fn apply_file_format(&mut self, value: &str) {
        if value == "=2:5" {
            debug!("Inch coordinates use 2:5 format");
            self.inch_five_fraction = true;
        }
    }

    /// Resolve an `INCH` or `METRIC` header directive.
    ///
    /// Returns the units and the new format when the line is a units
    /// directive. The zero-suppression flag and an optional zero pattern such
    /// as `00.0000` sit at fixed offsets after the keyword.
    pub fn resolve_units_directive(&mut self, line: &str) -> Option<(Units, NumericFormat)> {
        let bytes = line.as_bytes();

        let (units, flag_offset, pattern_offset) = if line.starts_with("INCH") {
            (Units::Inch, 5, 8)
        } else if line.starts_with("METR") {
            (Units::Metric, 7, 10)
        } else {
            return None;
        };

        let mut format = NumericFormat::for_units(units);
        if units == Units::Inch && self.inch_five_fraction {
            format.fraction_digits = 5;
        }

        if byte_at(bytes, flag_offset) == b'T' {
            format.leading_zeros = false;
        }
        if byte_at(bytes, flag_offset) == b'0' {
            apply_zero_pattern(bytes, flag_offset, &mut format);
        } else if byte_at(bytes, pattern_offset) == b'0' {
            apply_zero_pattern(bytes, pattern_offset, &mut format);
        }

        debug!(
            "Coordinate format {:?} {}.{} (leading zeros: {})",
            units, format.integer_digits, format.fraction_digits, format.leading_zeros
        );

        self.format = format;
        self.units = Some(units);
        Some((units, format))
    }

    /// Infer a format from a hole-size comment when no units directive has
    /// been seen yet. Returns the inferred format only when one was adopted.
    pub fn infer_from_hole_size(&mut self, units: Units) -> Option<NumericFormat> {
        if self.is_recognised() {
            return None;
        }

        let format = NumericFormat::for_units(units);
        warn!(
            "Hole size specified in header, but the coordinate format is not yet specified. Assuming {} {}.{}",
            match units {
                Units::Inch => "inch",
                Units::Metric => "metric",
            },
            format.integer_digits,
            format.fraction_digits
        );

        self.format = format;
        self.units = Some(units);
        Some(format)
    }
}

/// Count the zeros either side of the point in a pattern like `000.000`.
/// The fraction count is only replaced when a point follows the integer part.
fn apply_zero_pattern(bytes: &[u8], mut index: usize, format: &mut NumericFormat) {
    format.integer_digits = 0;
    while byte_at(bytes, index) == b'0' {
        index += 1;
        format.integer_digits += 1;
    }

    if byte_at(bytes, index) != b'.' {
        return;
    }
    index += 1;

    format.fraction_digits = 0;
    while byte_at(bytes, index) == b'0' {
        index += 1;
        format.fraction_digits += 1;
    }

    if format.total_digits() > 6 {
        warn!(
            "Zero pattern declares {} digits, more than the six an Excellon coordinate can hold",
            format.total_digits()
        );
    }
}
