//! Motion state machine
//!
//! Tracks the drill/route mode and Z axis, the last emitted point and the
//! modal arc parameters, and decides which Gerber commands a coordinate
//! update turns into.

use crate::arc::arc_center;
use tracing::trace;

/// A point in scaled integer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Direction of circular motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Current operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    #[default]
    Drill,
    RouteMove,
    RouteLinear,
    RouteClockwise,
    RouteCounterClockwise,
    RouteCannedClockwise,
    RouteCannedCounterClockwise,
}

/// Router Z axis state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZAxis {
    Routing,
    #[default]
    Retracted,
}

/// Modal arc parameters. `I`/`J` give a center offset whose length becomes
/// the radius; `A` sets the radius directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArcParameters {
    pub i: i64,
    pub j: i64,
    pub radius: i64,
}

impl ArcParameters {
    pub fn set_i(&mut self, i: i64) {
        self.i = i;
        self.update_radius();
    }

    pub fn set_j(&mut self, j: i64) {
        self.j = j;
        self.update_radius();
    }

    pub fn set_radius(&mut self, radius: i64) {
        self.radius = radius;
    }

    fn update_radius(&mut self) {
        let (i, j) = (self.i as f64, self.j as f64);
        self.radius = (i * i + j * j).sqrt().round() as i64;
    }
}

/// Mode and Z axis saved while an embedded slot temporarily routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedMotion {
    mode: MotionMode,
    z_axis: ZAxis,
}

#[derive(Debug, Clone, Default)]
pub struct MotionState {
    mode: MotionMode,
    z_axis: ZAxis,
    position: Point,
    arc: ArcParameters,
}

impl MotionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn z_axis(&self) -> ZAxis {
        self.z_axis
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn arc_mut(&mut self) -> &mut ArcParameters {
        &mut self.arc
    }

    pub fn set_mode(&mut self, mode: MotionMode) {
        trace!("Motion mode {:?}", mode);
        self.mode = mode;
    }

    pub fn set_z_axis(&mut self, z_axis: ZAxis) {
        trace!("Z axis {:?}", z_axis);
        self.z_axis = z_axis;
    }

    /// `G05`/`G81`: back to drilling with the router retracted
    pub fn return_to_drill(&mut self) {
        self.set_z_axis(ZAxis::Retracted);
        self.set_mode(MotionMode::Drill);
    }

    /// Switch to linear routing with the router down, returning what to restore
    pub fn begin_slot(&mut self) -> SavedMotion {
        let saved = SavedMotion {
            mode: self.mode,
            z_axis: self.z_axis,
        };
        self.set_z_axis(ZAxis::Routing);
        self.set_mode(MotionMode::RouteLinear);
        saved
    }

    pub fn end_slot(&mut self, saved: SavedMotion) {
        self.set_z_axis(saved.z_axis);
        self.set_mode(saved.mode);
    }

    /// Record `target` as the last point without emitting anything
    pub fn move_reference(&mut self, target: Point) {
        self.position = target;
    }

    /// Move with the tool up, then update the position
    pub fn rapid_to(&mut self, target: Point) -> String {
        let command = format!("{}D02*", axis_words(self.position, target));
        self.position = target;
        command
    }

    /// Drill a hole at `target`, then update the position
    pub fn flash_at(&mut self, target: Point) -> String {
        let command = format!("{}D03*", axis_words(self.position, target));
        self.position = target;
        command
    }

    /// Gerber commands for moving to `target` in the current mode. The
    /// position is updated afterwards.
    pub fn advance_to(&mut self, target: Point) -> Vec<String> {
        let from = self.position;
        let radius = self.arc.radius;

        let commands = match self.mode {
            MotionMode::Drill => vec![format!("{}D03*", axis_words(from, target))],

            MotionMode::RouteCannedClockwise | MotionMode::RouteCannedCounterClockwise => vec![
                format!("X{}Y{}D02*", target.x.saturating_add(radius), target.y),
                format!("I{}J0D01*", -radius),
                format!("X{}Y{}D02*", target.x, target.y),
            ],

            _ if self.z_axis == ZAxis::Retracted => {
                vec![format!("{}D02*", axis_words(from, target))]
            }

            MotionMode::RouteMove => vec![format!("{}D02*", axis_words(from, target))],

            MotionMode::RouteLinear => vec![format!("{}D01*", axis_words(from, target))],

            MotionMode::RouteClockwise => vec![arc_command(from, target, radius, Rotation::Clockwise)],

            MotionMode::RouteCounterClockwise => {
                vec![arc_command(from, target, radius, Rotation::CounterClockwise)]
            }
        };

        self.position = target;
        commands
    }
}

/// Axis words for the coordinates that changed since `from`
pub fn axis_words(from: Point, to: Point) -> String {
    let mut words = String::new();
    if from.x != to.x {
        words.push_str(&format!("X{}", to.x));
    }
    if from.y != to.y {
        words.push_str(&format!("Y{}", to.y));
    }
    words
}

fn arc_command(from: Point, to: Point, radius: i64, rotation: Rotation) -> String {
    let center = arc_center(from, to, radius as f64, rotation);
    format!("X{}Y{}I{}J{}D01*", to.x, to.y, center.i, center.j)
}
