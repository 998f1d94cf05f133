// SPDX-License-Identifier: MIT OR Apache-2.0
//! Geometry of rendered edges.

use crate::layout::Direction;
use crate::port::PortKind;
use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Default length of the bezier handles leaving each anchor
pub const DEFAULT_ANCHORS_LENGTH: f32 = 50.0;

/// Shape of a rendered connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// Cubic bezier leaving each anchor horizontally
    #[default]
    Bezier,
    /// Straight segment
    Linear,
}

/// Control points of one edge, from the output anchor to the input anchor
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPath {
    /// Two points for a linear edge, four for a bezier
    pub points: Vec<Pos2>,
}

impl ConnectionPath {
    /// Path from an output anchor to an input anchor
    pub fn between(
        output: Pos2,
        input: Pos2,
        connection_type: ConnectionType,
        anchors_length: f32,
        direction: Direction,
    ) -> Self {
        let points = match connection_type {
            ConnectionType::Linear => vec![output, input],
            ConnectionType::Bezier => {
                let handle = Vec2::new(anchors_length * direction.flow_sign(), 0.0);
                vec![output, output + handle, input - handle, input]
            }
        };
        Self { points }
    }

    /// Preview path from a fixed anchor to a free pointer position.
    ///
    /// `origin_kind` is the kind of the port the gesture started on; the free
    /// point stands in for the missing opposite end.
    pub fn working(
        origin: Pos2,
        origin_kind: PortKind,
        free: Pos2,
        connection_type: ConnectionType,
        anchors_length: f32,
        direction: Direction,
    ) -> Self {
        match origin_kind {
            PortKind::Output => {
                Self::between(origin, free, connection_type, anchors_length, direction)
            }
            PortKind::Input => {
                Self::between(free, origin, connection_type, anchors_length, direction)
            }
        }
    }

    /// SVG path data, e.g. `M 0 0 C 50 0 50 100 100 100`
    pub fn svg(&self) -> String {
        let mut out = String::new();
        for (i, p) in self.points.iter().enumerate() {
            let command = match (i, self.points.len()) {
                (0, _) => "M",
                (1, 4) => "C",
                (_, 4) => "",
                _ => "L",
            };
            if !out.is_empty() {
                out.push(' ');
            }
            if !command.is_empty() {
                out.push_str(command);
                out.push(' ');
            }
            let _ = write!(out, "{} {}", p.x, p.y);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_path() {
        let path = ConnectionPath::between(
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 50.0),
            ConnectionType::Linear,
            DEFAULT_ANCHORS_LENGTH,
            Direction::WestEast,
        );
        assert_eq!(path.points.len(), 2);
        assert_eq!(path.svg(), "M 0 0 L 100 50");
    }

    #[test]
    fn test_bezier_handles_follow_direction() {
        let we = ConnectionPath::between(
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 100.0),
            ConnectionType::Bezier,
            30.0,
            Direction::WestEast,
        );
        assert_eq!(we.points[1], Pos2::new(30.0, 0.0));
        assert_eq!(we.points[2], Pos2::new(70.0, 100.0));
        assert_eq!(we.svg(), "M 0 0 C 30 0 70 100 100 100");

        let ew = ConnectionPath::between(
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 100.0),
            ConnectionType::Bezier,
            30.0,
            Direction::EastWest,
        );
        assert_eq!(ew.points[1], Pos2::new(-30.0, 0.0));
    }

    #[test]
    fn test_working_path_from_input() {
        let path = ConnectionPath::working(
            Pos2::new(10.0, 10.0),
            PortKind::Input,
            Pos2::new(-50.0, 0.0),
            ConnectionType::Linear,
            0.0,
            Direction::WestEast,
        );
        assert_eq!(path.points, vec![Pos2::new(-50.0, 0.0), Pos2::new(10.0, 10.0)]);
    }
}
