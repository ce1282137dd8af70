//! Arc center reconstruction
//!
//! Excellon routes arcs by endpoint and radius, while Gerber circular
//! interpolation wants the center as an offset from the start point.

use crate::motion::{Point, Rotation};

/// Center offset of an arc relative to its start point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcCenter {
    pub i: i64,
    pub j: i64,
}

/// Reconstruct the center of the arc from `start` to `end` with `radius`.
///
/// Arcs are assumed to span less than 180 degrees, which picks one of the
/// two candidate centers. A radius shorter than half the chord has no real
/// solution, so the chord midpoint is used instead; the same holds for a
/// zero-length chord.
pub fn arc_center(start: Point, end: Point, radius: f64, rotation: Rotation) -> ArcCenter {
    // Saturated coordinates can sit at opposite ends of the i64 range
    let dx = end.x as f64 - start.x as f64;
    let dy = end.y as f64 - start.y as f64;

    let chord_squared = dx * dx + dy * dy;
    let h_squared = radius * radius - chord_squared / 4.0;

    let (i, j) = if h_squared <= 0.0 || chord_squared == 0.0 {
        (dx / 2.0, dy / 2.0)
    } else {
        let direction = match rotation {
            Rotation::CounterClockwise => 1.0,
            Rotation::Clockwise => -1.0,
        };
        let chord = chord_squared.sqrt();
        let h = h_squared.sqrt();

        (
            dx / 2.0 - direction * h * (dy / chord),
            dy / 2.0 + direction * h * (dx / chord),
        )
    };

    ArcCenter {
        i: i.round() as i64,
        j: j.round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: i64, y: i64) -> Point {
        Point { x, y }
    }

    #[test]
    fn test_clockwise_center() {
        let center = arc_center(point(0, 0), point(1000, 0), 1000.0, Rotation::Clockwise);
        assert_eq!(center, ArcCenter { i: 500, j: -866 });
    }

    #[test]
    fn test_counter_clockwise_center() {
        let center = arc_center(point(0, 0), point(1000, 0), 1000.0, Rotation::CounterClockwise);
        assert_eq!(center, ArcCenter { i: 500, j: 866 });
    }

    #[test]
    fn test_quarter_circle() {
        // Quarter circle centred on the origin
        let center = arc_center(point(1000, 0), point(0, 1000), 1000.0, Rotation::CounterClockwise);
        assert_eq!(center, ArcCenter { i: -1000, j: 0 });
    }

    #[test]
    fn test_radius_too_small_uses_midpoint() {
        let center = arc_center(point(0, 0), point(1000, 200), 100.0, Rotation::Clockwise);
        assert_eq!(center, ArcCenter { i: 500, j: 100 });
    }

    #[test]
    fn test_half_circle_uses_midpoint() {
        let center = arc_center(point(0, 0), point(0, 2000), 1000.0, Rotation::Clockwise);
        assert_eq!(center, ArcCenter { i: 0, j: 1000 });
    }

    #[test]
    fn test_endpoints_at_range_limits() {
        let center = arc_center(point(-i64::MAX, 0), point(i64::MAX, 0), 1000.0, Rotation::Clockwise);
        assert_eq!(center, ArcCenter { i: i64::MAX, j: 0 });
    }

    #[test]
    fn test_zero_length_chord() {
        let center = arc_center(point(300, 300), point(300, 300), 500.0, Rotation::Clockwise);
        assert_eq!(center, ArcCenter { i: 0, j: 0 });
    }
}
