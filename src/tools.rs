//! Tool table and tool definition parsing
//!
//! Drill tools become circular Gerber apertures. Aperture numbers start at
//! D10, so tool `n` is always aperture `n + 10`.

use crate::format::Units;
use crate::line::parse_unsigned;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

lazy_static! {
    static ref TOOL_DIAMETER: Regex = Regex::new(r"C([0-9.]*)").expect("valid diameter regex");
    static ref HOLE_SIZE: Regex =
        Regex::new(r"^[^0-9]*([0-9][0-9.]*).*?PLATED *(MM|MILS)")
            .expect("valid hole size regex");
}

/// First aperture number used for drill tools
pub const APERTURE_OFFSET: u32 = 10;

/// Gerber aperture number for a tool index
pub fn aperture_number(tool: u32) -> u32 {
    tool + APERTURE_OFFSET
}

/// Parse the tool index starting at `start`, returning the index and the
/// number of digits consumed. No digits yields tool 0.
pub fn parse_tool_index(bytes: &[u8], start: usize) -> (u32, usize) {
    parse_unsigned(bytes, start)
}

/// A `T<n>...C<diameter>` line from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDefinition<'a> {
    pub tool: u32,
    pub diameter: Option<&'a str>,
}

/// Parse a header tool line such as `T1C0.8` or `T01F00S00C0.0300`
pub fn parse_tool_definition(line: &str) -> ToolDefinition<'_> {
    let (tool, digits) = parse_tool_index(line.as_bytes(), 1);
    let rest = &line[1 + digits..];

    let diameter = TOOL_DIAMETER
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|d| !d.is_empty());

    ToolDefinition { tool, diameter }
}

/// Unit used by a hole-size comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleSizeUnit {
    Millimetres,
    Mils,
}

impl HoleSizeUnit {
    /// Coordinate units implied when the header has no units directive
    pub fn implied_units(&self) -> Units {
        match self {
            HoleSizeUnit::Millimetres => Units::Metric,
            HoleSizeUnit::Mils => Units::Inch,
        }
    }
}

/// Tool definition carried by a `;Holesize` comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleSize<'a> {
    pub tool: u32,
    pub size: &'a str,
    pub unit: HoleSizeUnit,
}

impl HoleSize<'_> {
    /// Diameter expressed in the output units
    pub fn diameter_in(&self, units: Units) -> String {
        let factor = match (self.unit, units) {
            (HoleSizeUnit::Millimetres, Units::Metric) => return self.size.to_string(),
            (HoleSizeUnit::Millimetres, Units::Inch) => 1.0 / 25.4,
            (HoleSizeUnit::Mils, Units::Inch) => 0.001,
            (HoleSizeUnit::Mils, Units::Metric) => 0.0254,
        };

        match self.size.parse::<f64>() {
            Ok(size) => format_decimal(size * factor),
            Err(_) => self.size.to_string(),
        }
    }
}

/// Parse what follows the `Holesize` keyword, e.g.
/// ` 1. = 35.000000 Tolerance = +0.000/-0.000 PLATED MILS Quantity = 12`.
/// Comments without a plating keyword followed by a unit are ignored.
pub fn parse_hole_size(rest: &str) -> Option<HoleSize<'_>> {
    let rest = rest.trim_start_matches(' ');
    let (tool, digits) = parse_tool_index(rest.as_bytes(), 0);
    let caps = HOLE_SIZE.captures(&rest[digits..])?;

    let size = caps.get(1)?.as_str();
    let unit = match caps.get(2)?.as_str() {
        "MM" => HoleSizeUnit::Millimetres,
        _ => HoleSizeUnit::Mils,
    };

    Some(HoleSize { tool, size, unit })
}

fn format_decimal(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Tools defined in the header blocks of one program
#[derive(Debug, Clone, Default)]
pub struct ToolTable {
    diameters: BTreeMap<u32, String>,
    max_tool: u32,
}

impl ToolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tool index without a diameter
    pub fn note_index(&mut self, tool: u32) {
        self.max_tool = self.max_tool.max(tool);
    }

    /// Record a tool and its diameter literal
    pub fn define(&mut self, tool: u32, diameter: &str) {
        debug!("Tool T{} = {}", tool, diameter);
        self.note_index(tool);
        self.diameters.insert(tool, diameter.to_string());
    }

    pub fn diameter(&self, tool: u32) -> Option<&str> {
        self.diameters.get(&tool).map(String::as_str)
    }

    /// Highest tool index seen in the header
    pub fn max_tool(&self) -> u32 {
        self.max_tool
    }

    /// Whether selecting `tool` in the body changes the aperture
    pub fn is_selectable(&self, tool: u32) -> bool {
        tool > 0 && tool <= self.max_tool
    }

    pub fn len(&self) -> usize {
        self.diameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diameters.is_empty()
    }
}
