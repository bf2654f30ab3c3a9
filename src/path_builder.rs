//! Representation of path data for `<path>` elements.
//!
//! The path parser pushes commands into a [`PathBuilder`], which is mutable,
//! temporary storage.  Once parsing is done the builder becomes an immutable
//! [`PathData`] that gets stored in the shape.
//!
//! Drawing instructions only know about straight lines and cubic curves, so
//! elliptical arcs are kept as such in the path data and converted to cubic
//! segments when the path is flattened with [`PathData::flatten`].

use tinyvec::TinyVec;

use std::f64::consts::*;

use crate::path_parser::{ParseError, PathParser};
use crate::transform::Transform;

/// Whether an arc's sweep should be >= 180 degrees, or smaller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LargeArc(pub bool);

/// Angular direction in which an arc is drawn.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Sweep {
    Negative,
    Positive,
}

/// A cubic Bézier segment, starting at the current point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CubicBezierCurve {
    /// The (x, y) coordinates of the first control point.
    pub pt1: (f64, f64),
    /// The (x, y) coordinates of the second control point.
    pub pt2: (f64, f64),
    /// The (x, y) coordinates of the end point of this path segment.
    pub to: (f64, f64),
}

/// An elliptical arc in terms of its endpoints, as given by the `A` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalArc {
    pub r: (f64, f64),
    /// Rotation of the ellipse's x-axis, in degrees.
    pub x_axis_rotation: f64,
    pub large_arc: LargeArc,
    pub sweep: Sweep,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// What an [`EllipticalArc`] turns into when it is flattened.
#[derive(Debug, PartialEq)]
pub(crate) enum ArcApproximation {
    Curves(Vec<CubicBezierCurve>),
    /// One of the radii is zero, so the arc is a straight line to its end point.
    Line,
    /// The end point is the start point; nothing gets drawn.
    Omit,
}

impl EllipticalArc {
    /// Approximates the arc with cubic curves, one per quarter turn or less.
    ///
    /// The arc is solved in the coordinate space where the ellipse is a
    /// circle centered on the chord's perpendicular bisector.  Radii too small
    /// to span the end points get scaled up until they do, as SVG requires.
    pub(crate) fn approximate(&self) -> ArcApproximation {
        if self.from == self.to {
            return ArcApproximation::Omit;
        }

        let (rx, ry) = (self.r.0.abs(), self.r.1.abs());
        if rx < f64::EPSILON || ry < f64::EPSILON {
            return ArcApproximation::Line;
        }

        let to_ellipse =
            Transform::new_scale(rx, ry).post_transform(&Transform::new_rotate(self.x_axis_rotation));
        let to_circle = Transform::new_rotate(-self.x_axis_rotation)
            .post_transform(&Transform::new_scale(1.0 / rx, 1.0 / ry));

        let (x1, y1) = to_circle.transform_point(self.from.0, self.from.1);
        let (x2, y2) = to_circle.transform_point(self.to.0, self.to.1);

        let (dx, dy) = ((x2 - x1) / 2.0, (y2 - y1) / 2.0);
        let half_chord = dx.hypot(dy);
        let radius = half_chord.max(1.0);

        // Distance from the chord's midpoint to the center, towards the chord's left side.
        let mut h = (radius * radius - half_chord * half_chord).max(0.0).sqrt() / half_chord;
        if self.large_arc.0 == (self.sweep == Sweep::Positive) {
            h = -h;
        }

        let cx = x1 + dx - h * dy;
        let cy = y1 + dy + h * dx;

        let start = (y1 - cy).atan2(x1 - cx);
        let mut delta = (y2 - cy).atan2(x2 - cx) - start;

        match self.sweep {
            Sweep::Positive if delta < 0.0 => delta += PI * 2.0,
            Sweep::Negative if delta > 0.0 => delta -= PI * 2.0,
            _ => (),
        }

        let n_segs = (delta.abs() / (FRAC_PI_2 + 0.001)).ceil().max(1.0);
        let step = delta / n_segs;

        let on_circle = Transform::new_scale(radius, radius).post_transform(&Transform::new_translate(cx, cy));
        let to_user = on_circle.post_transform(&to_ellipse);

        let curves = (0..n_segs as u32)
            .map(|i| {
                let a = start + step * f64::from(i);
                unit_arc_segment(a, a + step).transform(&to_user)
            })
            .collect();

        ArcApproximation::Curves(curves)
    }

    /// Appends the flattened arc to `out`.
    fn flatten_into(&self, out: &mut Vec<PathCommand>) {
        match self.approximate() {
            ArcApproximation::Curves(curves) => out.extend(curves.into_iter().map(PathCommand::CurveTo)),
            ArcApproximation::Line => out.push(PathCommand::LineTo(self.to.0, self.to.1)),
            ArcApproximation::Omit => (),
        }
    }
}

impl CubicBezierCurve {
    /// Maps the curve's points through `t`.
    pub(crate) fn transform(&self, t: &Transform) -> CubicBezierCurve {
        CubicBezierCurve {
            pt1: t.transform_point(self.pt1.0, self.pt1.1),
            pt2: t.transform_point(self.pt2.0, self.pt2.1),
            to: t.transform_point(self.to.0, self.to.1),
        }
    }
}

/// Cubic approximation of the unit circle from angle `a` to angle `b`.
///
/// The error stays small only for spans up to a quarter turn.
pub(crate) fn unit_arc_segment(a: f64, b: f64) -> CubicBezierCurve {
    let k = 4.0 / 3.0 * ((b - a) / 4.0).tan();
    let (sin_a, cos_a) = a.sin_cos();
    let (sin_b, cos_b) = b.sin_cos();

    CubicBezierCurve {
        pt1: (cos_a - k * sin_a, sin_a + k * cos_a),
        pt2: (cos_b + k * sin_b, sin_b - k * cos_b),
        to: (cos_b, sin_b),
    }
}

/// A single path command with absolute coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(CubicBezierCurve),
    Arc(EllipticalArc),
    ClosePath,
}

// Required by TinyVec.  Path data has no such thing as a default command.
impl Default for PathCommand {
    fn default() -> PathCommand {
        PathCommand::ClosePath
    }
}

/// Constructs path data out of commands.
///
/// Create this with `PathBuilder::default`, then add commands to it or call the
/// `parse` method.  Turn it into a [`PathData`] with `into_path_data` when done.
#[derive(Default)]
pub struct PathBuilder {
    path_commands: TinyVec<[PathCommand; 32]>,
}

impl PathBuilder {
    /// Parses SVG path data and appends its commands.
    ///
    /// On error, the commands parsed up to the error are kept.
    pub fn parse(&mut self, path_str: &str) -> Result<(), ParseError> {
        let mut parser = PathParser::new(self, path_str);
        parser.parse()
    }

    pub fn into_path_data(self) -> PathData {
        PathData {
            commands: self.path_commands.into_iter().collect(),
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.path_commands.push(PathCommand::MoveTo(x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.path_commands.push(PathCommand::LineTo(x, y));
    }

    pub fn curve_to(&mut self, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) {
        self.path_commands.push(PathCommand::CurveTo(CubicBezierCurve {
            pt1: (x2, y2),
            pt2: (x3, y3),
            to: (x4, y4),
        }));
    }

    pub fn arc(&mut self, from: (f64, f64), arc: (f64, f64, f64), flags: (LargeArc, Sweep), to: (f64, f64)) {
        let (rx, ry, x_axis_rotation) = arc;
        let (large_arc, sweep) = flags;

        self.path_commands.push(PathCommand::Arc(EllipticalArc {
            r: (rx, ry),
            x_axis_rotation,
            large_arc,
            sweep,
            from,
            to,
        }));
    }

    pub fn close_path(&mut self) {
        self.path_commands.push(PathCommand::ClosePath);
    }
}

/// Immutable path data, as stored in a `<path>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    commands: Box<[PathCommand]>,
}

impl PathData {
    pub fn iter(&self) -> impl Iterator<Item = PathCommand> + '_ {
        self.commands.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the commands with every arc converted to cubic curves or lines.
    pub fn flatten(&self) -> Vec<PathCommand> {
        let mut out = Vec::with_capacity(self.commands.len());

        for cmd in self.iter() {
            match cmd {
                PathCommand::Arc(ref arc) => arc.flatten_into(&mut out),
                cmd => out.push(cmd),
            }
        }

        out
    }
}
