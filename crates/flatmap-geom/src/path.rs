//! Flattening of slide path commands into sampled rings.

use serde::{Deserialize, Serialize};

use crate::arc::arc_to_beziers;
use crate::bezier::{CubicBezier, Curve, QuadraticBezier};
use crate::geom::{Point, to_coord};
use crate::geometry::Geometry;
use crate::transform::Transform;

/// Parametric steps used when sampling a Bezier segment.
pub const DEFAULT_BEZIER_SAMPLES: usize = 100;

/// One drawing command of a shape path, in the shape's local coordinates.
///
/// Deserializes from `{"op": "LineTo", "pt": [x, y]}` style records; unrecognised `op` values
/// become [`PathCommand::Unsupported`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum PathCommand {
    MoveTo {
        pt: Point,
    },
    LineTo {
        pt: Point,
    },
    CubicBezierTo {
        ctrl1: Point,
        ctrl2: Point,
        end: Point,
    },
    QuadraticBezierTo {
        ctrl: Point,
        end: Point,
    },
    /// Angles are in radians; a positive sweep turns clockwise on screen.
    ArcTo {
        rx: f64,
        ry: f64,
        #[serde(rename = "startAngle")]
        start_angle: f64,
        #[serde(rename = "sweepAngle")]
        sweep_angle: f64,
    },
    Close,
    #[serde(other)]
    Unsupported,
}

/// Accumulates the coordinates of every path of one shape.
///
/// Coordinates from all paths land in a single ring; whether the result is a polygon is decided
/// by the last path added. Multi-ring shapes are not reconstructed here.
#[derive(Debug, Clone)]
pub struct PathFlattener {
    samples: usize,
    coordinates: Vec<geo::Coord<f64>>,
    closed: bool,
}

impl Default for PathFlattener {
    fn default() -> Self {
        Self::new(DEFAULT_BEZIER_SAMPLES)
    }
}

impl PathFlattener {
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(1),
            coordinates: Vec::new(),
            closed: false,
        }
    }

    pub fn add_path(&mut self, commands: &[PathCommand], transform: &Transform) {
        let mut moved = false;
        let mut first_point: Option<Point> = None;
        let mut current: Option<Point> = None;
        self.closed = false;

        for command in commands {
            match command {
                PathCommand::MoveTo { pt } => {
                    if first_point.is_none() {
                        first_point = Some(*pt);
                    }
                    current = Some(*pt);
                    moved = true;
                }
                PathCommand::LineTo { pt } => {
                    match current {
                        Some(from) if moved => {
                            self.coordinates.push(transform.apply_coord(to_coord(from)));
                            moved = false;
                        }
                        Some(_) => {}
                        None => {
                            tracing::warn!("path line before any move; starting subpath at its end");
                            first_point.get_or_insert(*pt);
                        }
                    }
                    self.coordinates.push(transform.apply_coord(to_coord(*pt)));
                    current = Some(*pt);
                }
                PathCommand::CubicBezierTo { ctrl1, ctrl2, end } => {
                    let Some(from) = current else {
                        tracing::warn!("path curve before any move; skipped");
                        continue;
                    };
                    let bz = CubicBezier::new(from, *ctrl1, *ctrl2, *end);
                    self.push_samples(&bz, transform);
                    current = Some(*end);
                    moved = false;
                }
                PathCommand::QuadraticBezierTo { ctrl, end } => {
                    let Some(from) = current else {
                        tracing::warn!("path curve before any move; skipped");
                        continue;
                    };
                    let bz = QuadraticBezier::new(from, *ctrl, *end);
                    self.push_samples(&bz, transform);
                    current = Some(*end);
                    moved = false;
                }
                PathCommand::ArcTo {
                    rx,
                    ry,
                    start_angle,
                    sweep_angle,
                } => {
                    let Some(from) = current else {
                        tracing::warn!("path arc before any move; skipped");
                        continue;
                    };
                    let (beziers, end) = arc_to_beziers(from, *rx, *ry, *start_angle, *sweep_angle);
                    if beziers.is_empty() {
                        tracing::warn!(rx = *rx, ry = *ry, sweep = *sweep_angle, "degenerate path arc");
                    }
                    for bz in &beziers {
                        self.push_samples(bz, transform);
                    }
                    current = Some(end);
                    moved = false;
                }
                PathCommand::Close => {
                    let Some(first) = first_point.take() else {
                        tracing::warn!("path close with no active subpath; ignored");
                        continue;
                    };
                    if current != Some(first) {
                        self.coordinates.push(transform.apply_coord(to_coord(first)));
                    }
                    self.closed = true;
                }
                PathCommand::Unsupported => {
                    tracing::warn!("unknown path command; skipped");
                }
            }
        }
    }

    fn push_samples(&mut self, curve: &impl Curve, transform: &Transform) {
        self.coordinates.extend(
            curve
                .sample(self.samples)
                .into_iter()
                .map(|p| transform.apply_coord(to_coord(p))),
        );
    }

    /// A polygon when the last path was closed and spans at least three points, otherwise a
    /// (possibly empty) line string.
    pub fn finish(self) -> Geometry {
        if self.closed && self.coordinates.len() >= 3 {
            Geometry::polygon(self.coordinates)
        } else {
            if self.closed {
                tracing::warn!(
                    points = self.coordinates.len(),
                    "closed path too short for a polygon"
                );
            }
            Geometry::line_string(self.coordinates)
        }
    }
}

/// Flattens a single path with the default sampling resolution.
pub fn flatten_path(commands: &[PathCommand], transform: &Transform) -> Geometry {
    let mut flattener = PathFlattener::default();
    flattener.add_path(commands, transform);
    flattener.finish()
}
