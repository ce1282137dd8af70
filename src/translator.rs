//! Stateful Excellon to Gerber line translator
//!
//! One [`Translator`] owns all state of a single conversion run: the numeric
//! format, the tool table, the motion state and the issues found so far.
//! Lines are fed one at a time and each produces zero or more Gerber lines.

use crate::coord::decode_coordinate;
use crate::error::{Result, ResultExt, Severity, TranslationIssue};
use crate::format::FormatResolver;
use crate::gerber::{self, CountingSink, GerberSink};
use crate::line::{
    byte_at, classify_body, classify_header, parse_unsigned, BodyLine, GCode, HeaderLine, MCode,
    GCODE_ARGUMENT_OFFSET,
};
use crate::motion::{MotionMode, MotionState, Point, SavedMotion, ZAxis};
use crate::tools::{HoleSize, ToolDefinition, ToolTable};
use std::borrow::Cow;
use std::io;
use tracing::{debug, error, info, warn};

/// Which part of the drill program is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Header,
    Body,
    /// After `M30`, until a new header starts
    Ended,
}

/// Flags read once the whole input has been consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionStatus {
    pub recognised_format: bool,
    pub error: bool,
}

/// Final result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    Success,
    FormatUnrecognized,
    ConversionError,
}

impl ConversionStatus {
    pub fn outcome(&self) -> ConversionOutcome {
        if self.error {
            ConversionOutcome::ConversionError
        } else if !self.recognised_format {
            ConversionOutcome::FormatUnrecognized
        } else {
            ConversionOutcome::Success
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub status: ConversionStatus,
    pub issues: Vec<TranslationIssue>,
    pub lines_read: usize,
    pub lines_written: usize,
}

impl ConversionReport {
    pub fn outcome(&self) -> ConversionOutcome {
        self.status.outcome()
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == ConversionOutcome::Success
    }

    pub fn warnings(&self) -> impl Iterator<Item = &TranslationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &TranslationIssue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }
}

/// Why scanning the words of a coordinate line stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanStop {
    EndOfLine,
    /// Embedded `G85`; the slot end point starts at this index
    Slot(usize),
    /// Any other embedded G-command
    InvalidEmbedded,
}

/// Words accumulated while scanning a coordinate line
#[derive(Debug, Clone, Copy)]
struct ScannedWords {
    target: Point,
    parameter_only: bool,
    has_coordinates: bool,
    stop: ScanStop,
}

pub struct Translator {
    phase: Phase,
    resolver: FormatResolver,
    tools: ToolTable,
    motion: MotionState,
    current_tool: u32,
    tool_selected: bool,
    error: bool,
    issues: Vec<TranslationIssue>,
    lines_read: usize,
}

impl Default for Translator {
    fn default() -> Self {
        Self {
            phase: Phase::Header,
            resolver: FormatResolver::new(),
            tools: ToolTable::new(),
            motion: MotionState::new(),
            current_tool: 1,
            tool_selected: false,
            error: false,
            issues: Vec::new(),
            lines_read: 0,
        }
    }
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tools(&self) -> &ToolTable {
        &self.tools
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn status(&self) -> ConversionStatus {
        ConversionStatus {
            recognised_format: self.resolver.is_recognised(),
            error: self.error,
        }
    }

    /// Translate one input line, appending the generated lines to `sink`
    pub fn translate_line<S: GerberSink>(&mut self, line: &str, sink: &mut S) -> io::Result<()> {
        self.lines_read += 1;

        let line: Cow<'_, str> = if line.contains('\r') {
            Cow::Owned(line.replace('\r', ""))
        } else {
            Cow::Borrowed(line)
        };

        match self.phase {
            Phase::Header => self.header_line(&line, sink),
            Phase::Body => self.body_line(&line, sink),
            Phase::Ended => {
                if classify_body(&line) == BodyLine::MCode(MCode::HeaderStart) {
                    debug!("Header block restarted after end of program");
                    self.phase = Phase::Header;
                } else {
                    debug!("Ignoring line after end of program: {}", line);
                }
                Ok(())
            }
        }
    }

    /// Close the run and produce the report
    pub fn finish(mut self) -> ConversionReport {
        if !self.resolver.is_recognised() {
            self.record(TranslationIssue::FormatUnrecognized);
        }

        let status = self.status();
        info!(
            "Translated {} lines, {} issues, outcome {:?}",
            self.lines_read,
            self.issues.len(),
            status.outcome()
        );

        ConversionReport {
            status,
            issues: self.issues,
            lines_read: self.lines_read,
            lines_written: 0,
        }
    }

    fn record(&mut self, issue: TranslationIssue) {
        match issue.severity() {
            Severity::Warning => warn!("{}", issue),
            Severity::Error => {
                error!("{}", issue);
                self.error = true;
            }
        }
        self.issues.push(issue);
    }

    fn header_line<S: GerberSink>(&mut self, line: &str, sink: &mut S) -> io::Result<()> {
        match classify_header(line) {
            HeaderLine::Units => {
                if let Some((units, format)) = self.resolver.resolve_units_directive(line) {
                    sink.emit(&gerber::format_statement(units, format))?;
                }
            }
            HeaderLine::ToolDefinition(definition) => self.define_tool(definition, sink)?,
            HeaderLine::EndOfHeader => self.enter_body(sink)?,
            HeaderLine::FileFormat(value) => self.resolver.apply_file_format(value),
            HeaderLine::HoleSize(hole) => self.define_hole_size(hole, sink)?,
            HeaderLine::Other => {}
        }
        Ok(())
    }

    fn define_tool<S: GerberSink>(
        &mut self,
        definition: ToolDefinition<'_>,
        sink: &mut S,
    ) -> io::Result<()> {
        match definition.diameter {
            Some(diameter) => {
                self.tools.define(definition.tool, diameter);
                sink.emit(&gerber::aperture_definition(definition.tool, diameter))
            }
            None => {
                self.tools.note_index(definition.tool);
                self.record(TranslationIssue::IgnoredCommand {
                    reason: format!(
                        "Tool T{} has no diameter, no aperture defined",
                        definition.tool
                    ),
                });
                Ok(())
            }
        }
    }

    fn define_hole_size<S: GerberSink>(&mut self, hole: HoleSize<'_>, sink: &mut S) -> io::Result<()> {
        let implied = hole.unit.implied_units();
        if let Some(format) = self.resolver.infer_from_hole_size(implied) {
            sink.emit(&gerber::format_statement(implied, format))?;
        }

        let units = self.resolver.units().unwrap_or(implied);
        let diameter = hole.diameter_in(units);
        self.tools.define(hole.tool, &diameter);
        sink.emit(&gerber::aperture_definition(hole.tool, &diameter))
    }

    fn enter_body<S: GerberSink>(&mut self, sink: &mut S) -> io::Result<()> {
        if !self.resolver.is_recognised() {
            warn!("Header ended without a units directive, coordinate format is a guess");
        }

        debug!("Entering program body with {} tools", self.tools.len());
        self.phase = Phase::Body;
        self.current_tool = 1;
        self.tool_selected = false;

        for line in gerber::BODY_PROLOGUE {
            sink.emit(line)?;
        }
        Ok(())
    }

    fn body_line<S: GerberSink>(&mut self, line: &str, sink: &mut S) -> io::Result<()> {
        match classify_body(line) {
            BodyLine::ToolSelect(tool) => {
                self.current_tool = tool;
                self.select_current_tool(sink)
            }
            BodyLine::Coordinates => self.coordinate_line(line.as_bytes(), 0, sink),
            BodyLine::Repeat => self.repeat_line(line.as_bytes(), sink),
            BodyLine::MCode(code) => self.machine_code(code, sink),
            BodyLine::GCode(code) => self.preparatory_code(code, line.as_bytes(), sink),
            BodyLine::Other => Ok(()),
        }
    }

    fn select_current_tool<S: GerberSink>(&mut self, sink: &mut S) -> io::Result<()> {
        self.tool_selected = true;
        if self.tools.is_selectable(self.current_tool) {
            debug!(
                "Selected T{} ({})",
                self.current_tool,
                self.tools.diameter(self.current_tool).unwrap_or("no diameter")
            );
            sink.emit(&gerber::aperture_select(self.current_tool))
        } else {
            debug!(
                "Tool T{} is not defined (max T{}), aperture unchanged",
                self.current_tool,
                self.tools.max_tool()
            );
            Ok(())
        }
    }

    /// Select the current tool implicitly before the first motion
    fn ensure_tool_selected<S: GerberSink>(&mut self, sink: &mut S) -> io::Result<()> {
        if self.tool_selected {
            return Ok(());
        }
        self.select_current_tool(sink)
    }

    fn machine_code<S: GerberSink>(&mut self, code: MCode, sink: &mut S) -> io::Result<()> {
        match code {
            MCode::HeaderStart => {
                debug!("Header block restarted");
                self.phase = Phase::Header;
            }
            MCode::EndOfProgram => {
                sink.emit(gerber::PROGRAM_END)?;
                self.phase = Phase::Ended;
            }
            MCode::ZAxisDown => self.motion.set_z_axis(ZAxis::Routing),
            MCode::ZAxisUp => self.motion.set_z_axis(ZAxis::Retracted),
            MCode::NextTool => {
                self.current_tool = self.current_tool.saturating_add(1);
                self.select_current_tool(sink)?;
            }
        }
        Ok(())
    }

    fn preparatory_code<S: GerberSink>(
        &mut self,
        code: GCode,
        bytes: &[u8],
        sink: &mut S,
    ) -> io::Result<()> {
        let (mode, prologue) = match code {
            GCode::RouteMove => (MotionMode::RouteMove, gerber::NO_PROLOGUE),
            GCode::RouteLinear => (MotionMode::RouteLinear, gerber::LINEAR_PROLOGUE),
            GCode::RouteClockwise => (MotionMode::RouteClockwise, gerber::CLOCKWISE_PROLOGUE),
            GCode::RouteCounterClockwise => (
                MotionMode::RouteCounterClockwise,
                gerber::COUNTER_CLOCKWISE_PROLOGUE,
            ),
            GCode::CannedClockwise => (MotionMode::RouteCannedClockwise, gerber::CLOCKWISE_PROLOGUE),
            GCode::CannedCounterClockwise => (
                MotionMode::RouteCannedCounterClockwise,
                gerber::COUNTER_CLOCKWISE_PROLOGUE,
            ),
            GCode::DrillMode => {
                self.motion.return_to_drill();
                return sink.emit(gerber::LINEAR_INTERPOLATION);
            }
            GCode::Absolute => return Ok(()),
            GCode::ZeroSet => {
                self.record(TranslationIssue::IgnoredCommand {
                    reason: "Zero-set command (G93) ignored".to_string(),
                });
                return Ok(());
            }
            GCode::Unsupported(code) => {
                self.record(TranslationIssue::UnsupportedGCode { code });
                return Ok(());
            }
        };

        self.motion.set_mode(mode);
        for line in prologue {
            sink.emit(line)?;
        }
        self.coordinate_line(bytes, GCODE_ARGUMENT_OFFSET, sink)
    }

    /// Decode the token after the axis letter at `index`. Returns the value,
    /// if any, and the index of the next word.
    fn decode_word(&mut self, bytes: &[u8], index: usize) -> (Option<i64>, usize) {
        let decoded = decode_coordinate(bytes, index + 1, self.resolver.format());
        let next = index + 1 + decoded.consumed;

        if decoded.valid {
            (Some(decoded.value), next)
        } else {
            self.record(TranslationIssue::CoordinateParse {
                line: String::from_utf8_lossy(bytes).into_owned(),
                column: index + 2,
            });
            (None, next)
        }
    }

    /// Scan axis and arc words from `start` until the end of the line, an
    /// unknown character or an embedded G-command.
    fn scan_words(&mut self, bytes: &[u8], start: usize, origin: Point) -> ScannedWords {
        let mut words = ScannedWords {
            target: origin,
            parameter_only: false,
            has_coordinates: false,
            stop: ScanStop::EndOfLine,
        };

        let mut index = start;
        while index < bytes.len() {
            let letter = bytes[index];
            match letter {
                b'X' | b'Y' => {
                    words.parameter_only = false;
                    words.has_coordinates = true;
                    let (value, next) = self.decode_word(bytes, index);
                    if let Some(value) = value {
                        if letter == b'X' {
                            words.target.x = value;
                        } else {
                            words.target.y = value;
                        }
                    }
                    index = next;
                }
                b'I' | b'J' | b'A' => {
                    if index == 0 {
                        words.parameter_only = true;
                    }
                    words.has_coordinates = true;
                    let (value, next) = self.decode_word(bytes, index);
                    if let Some(value) = value {
                        let arc = self.motion.arc_mut();
                        match letter {
                            b'I' => arc.set_i(value),
                            b'J' => arc.set_j(value),
                            _ => arc.set_radius(value),
                        }
                    }
                    index = next;
                }
                b'G' => {
                    words.stop = if byte_at(bytes, index + 1) == b'8'
                        && byte_at(bytes, index + 2) == b'5'
                    {
                        ScanStop::Slot(index + 3)
                    } else {
                        ScanStop::InvalidEmbedded
                    };
                    return words;
                }
                _ => break,
            }
        }

        words
    }

    fn coordinate_line<S: GerberSink>(
        &mut self,
        bytes: &[u8],
        start: usize,
        sink: &mut S,
    ) -> io::Result<()> {
        if start < bytes.len() {
            self.ensure_tool_selected(sink)?;
        }

        let mut saved: Option<SavedMotion> = None;
        let result = self.coordinate_segments(bytes, start, &mut saved, sink);
        if let Some(saved) = saved {
            self.motion.end_slot(saved);
        }
        result
    }

    /// Process the segments of a coordinate line. An embedded `G85` drilled
    /// slot moves to the point before it, then routes linearly to the point
    /// after it with the motion state pushed into `saved`.
    fn coordinate_segments<S: GerberSink>(
        &mut self,
        bytes: &[u8],
        start: usize,
        saved: &mut Option<SavedMotion>,
        sink: &mut S,
    ) -> io::Result<()> {
        let mut start = start;

        loop {
            let origin = self.motion.position();
            let words = self.scan_words(bytes, start, origin);

            match words.stop {
                ScanStop::EndOfLine => return self.complete_motion(words, sink),
                ScanStop::Slot(resume) => {
                    sink.emit(&self.motion.rapid_to(words.target))?;
                    if saved.is_none() {
                        *saved = Some(self.motion.begin_slot());
                    }
                    start = resume;
                }
                ScanStop::InvalidEmbedded => {
                    self.record(TranslationIssue::EmbeddedCommandInvalid {
                        line: String::from_utf8_lossy(bytes).into_owned(),
                    });
                    return Ok(());
                }
            }
        }
    }

    fn complete_motion<S: GerberSink>(&mut self, words: ScannedWords, sink: &mut S) -> io::Result<()> {
        if words.parameter_only {
            self.motion.move_reference(words.target);
            return Ok(());
        }

        if !words.has_coordinates {
            return Ok(());
        }

        for command in self.motion.advance_to(words.target) {
            sink.emit(&command)?;
        }
        Ok(())
    }

    /// `R<count>X<dx>Y<dy>`: drill `count` holes stepping by the pitch
    fn repeat_line<S: GerberSink>(&mut self, bytes: &[u8], sink: &mut S) -> io::Result<()> {
        self.ensure_tool_selected(sink)?;

        let mut pitch = Point::default();
        let mut count: u32 = 0;

        let mut index = 0;
        while index < bytes.len() {
            match bytes[index] {
                b'X' => {
                    let (value, next) = self.decode_word(bytes, index);
                    pitch.x = value.unwrap_or(pitch.x);
                    index = next;
                }
                b'Y' => {
                    let (value, next) = self.decode_word(bytes, index);
                    pitch.y = value.unwrap_or(pitch.y);
                    index = next;
                }
                b'R' => {
                    let (value, digits) = parse_unsigned(bytes, index + 1);
                    count = value;
                    index += 1 + digits;
                }
                _ => break,
            }
        }

        debug!("Repeating {} holes at pitch {:?}", count, pitch);
        for _ in 0..count {
            let target = self.motion.position().offset(pitch.x, pitch.y);
            sink.emit(&self.motion.flash_at(target))?;
        }
        Ok(())
    }
}

/// Translate a whole stream of input lines into `sink`.
///
/// Translation problems never abort the run; they are collected in the
/// returned report. Only a failure to read a line or write to the sink
/// returns an error.
pub fn translate<I, S>(lines: I, sink: &mut S) -> Result<ConversionReport>
where
    I: IntoIterator<Item = io::Result<String>>,
    S: GerberSink,
{
    let mut translator = Translator::new();
    let mut counted = CountingSink::new(sink);

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.with_line_context(index + 1)?;
        translator
            .translate_line(&line, &mut counted)
            .with_line_context(index + 1)?;
    }

    let mut report = translator.finish();
    report.lines_written = counted.count();
    Ok(report)
}

/// Translate an in-memory drill program, returning the Gerber lines
pub fn translate_str(input: &str) -> (Vec<String>, ConversionReport) {
    let mut translator = Translator::new();
    let mut output = Vec::new();

    for line in input.lines() {
        // Writing into a Vec cannot fail
        let result = translator.translate_line(line, &mut output);
        debug_assert!(result.is_ok());
    }

    let mut report = translator.finish();
    report.lines_written = output.len();
    (output, report)
}
