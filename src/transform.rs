//! Affine transforms and the `transform` attribute.
//!
//! A [`Transform`] maps a node's local coordinates into its parent's coordinates.
//! Composition follows the usual convention for row vectors: in
//! `Transform::multiply(t1, t2)`, `t1` gets applied first and then `t2`.
//!
//! The attribute syntax is the one from [SVG 1.1][svg11]: a list of
//! `matrix`, `translate`, `scale`, `rotate`, `skewX` and `skewY` functions.
//!
//! [svg11]:  https://www.w3.org/TR/SVG11/coords.html#TransformAttribute

use cssparser::{Parser, Token};
use float_cmp::approx_eq;
use tinyvec::TinyVec;

use crate::error::*;
use crate::parsers::{optional_comma, Parse, ParseValue};
use crate::session::Session;

/// A 2D affine transform.
///
/// A point `(x, y)` maps to `(xx * x + xy * y + x0, yx * x + yy * y + y0)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Transform {
    #[inline]
    pub fn new_unchecked(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self {
            xx,
            xy,
            x0,
            yx,
            yy,
            y0,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new_unchecked(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[inline]
    pub fn new_translate(tx: f64, ty: f64) -> Self {
        Self::new_unchecked(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    pub fn new_scale(sx: f64, sy: f64) -> Self {
        Self::new_unchecked(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `deg` degrees around the origin.
    pub fn new_rotate(deg: f64) -> Self {
        let (s, c) = deg.to_radians().sin_cos();
        Self::new_unchecked(c, s, -s, c, 0.0, 0.0)
    }

    /// Skew by `ax_deg` degrees along the x axis and `ay_deg` degrees along the y axis.
    pub fn new_skew(ax_deg: f64, ay_deg: f64) -> Self {
        Self::new_unchecked(1.0, ay_deg.to_radians().tan(), ax_deg.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    /// Composes two transforms; the result applies `t1` first, then `t2`.
    #[must_use]
    pub fn multiply(t1: &Transform, t2: &Transform) -> Self {
        Transform {
            xx: t1.xx * t2.xx + t1.yx * t2.xy,
            yx: t1.xx * t2.yx + t1.yx * t2.yy,
            xy: t1.xy * t2.xx + t1.yy * t2.xy,
            yy: t1.xy * t2.yx + t1.yy * t2.yy,
            x0: t1.x0 * t2.xx + t1.y0 * t2.xy + t2.x0,
            y0: t1.x0 * t2.yx + t1.y0 * t2.yy + t2.y0,
        }
    }

    /// Returns a transform that applies `t` before `self`.
    #[inline]
    pub fn pre_transform(&self, t: &Transform) -> Self {
        Self::multiply(t, self)
    }

    /// Returns a transform that applies `t` after `self`.
    #[inline]
    pub fn post_transform(&self, t: &Transform) -> Self {
        Self::multiply(self, t)
    }

    #[inline]
    pub fn pre_translate(&self, x: f64, y: f64) -> Self {
        self.pre_transform(&Transform::new_translate(x, y))
    }

    #[inline]
    fn determinant(&self) -> f64 {
        self.xx * self.yy - self.xy * self.yx
    }

    /// Whether the transform can be undone, that is, whether it does not
    /// collapse the plane into a line or a point.
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();

        det.is_finite() && !approx_eq!(f64, det, 0.0)
    }

    #[inline]
    pub fn transform_distance(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx * self.xx + dy * self.xy, dx * self.yx + dy * self.yy)
    }

    #[inline]
    pub fn transform_point(&self, px: f64, py: f64) -> (f64, f64) {
        let (x, y) = self.transform_distance(px, py);
        (x + self.x0, y + self.y0)
    }
}

impl Default for Transform {
    #[inline]
    fn default() -> Transform {
        Transform::identity()
    }
}

impl Transform {
    /// Parses the text of a `transform` attribute, like `"translate(10) scale(2)"`.
    ///
    /// Transforms that cannot be inverted are rejected.
    pub fn from_attribute(value: &str) -> Result<Transform, AttributeError> {
        "transform".parse_value(value)
    }
}

impl Parse for Transform {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Transform, ParseError<'i>> {
        let loc = parser.current_source_location();

        let t = parse_transform_list(parser)?;

        if !t.is_invertible() {
            return Err(loc.new_custom_error(ValueErrorKind::Value(
                "invalid transformation matrix".to_string(),
            )));
        }

        Ok(t)
    }
}

/// Parses the value of a `transform` attribute on `element`.
///
/// An invalid transform is not fatal.  It gets reported through the `session`
/// and the element gets the identity transform instead.
pub(crate) fn parse_transform_attribute(element: &str, value: &str, session: &Session) -> Transform {
    match Transform::from_attribute(value) {
        Ok(t) => t,
        Err(e) => {
            session.warn(format_args!("ignoring invalid transform on <{element}>: {e}"));
            Transform::identity()
        }
    }
}

fn parse_transform_list<'i>(parser: &mut Parser<'i, '_>) -> Result<Transform, ParseError<'i>> {
    let mut t = Transform::identity();

    while !parser.is_exhausted() {
        t = parse_transform_function(parser)?.post_transform(&t);
        optional_comma(parser);
    }

    Ok(t)
}

/// Parses one `name(args)` item, with optional whitespace before the parenthesis.
fn parse_transform_function<'i>(parser: &mut Parser<'i, '_>) -> Result<Transform, ParseError<'i>> {
    let loc = parser.current_source_location();

    let name = match *parser.next()? {
        Token::Function(ref name) => name.clone(),

        Token::Ident(ref name) => {
            let name = name.clone();
            parser.expect_parenthesis_block()?;
            name
        }

        ref tok => return Err(loc.new_unexpected_token_error(tok.clone())),
    };

    let args = parser.parse_nested_block(parse_arguments)?;

    transform_from_function(&name, &args).ok_or_else(|| {
        loc.new_custom_error(ValueErrorKind::Parse(format!(
            "invalid transform function {}() with {} arguments",
            &*name,
            args.len()
        )))
    })
}

/// Reads the numbers inside a function's parentheses.
///
/// Numbers are separated by whitespace, a comma, or both; a trailing comma is an error.
fn parse_arguments<'i>(parser: &mut Parser<'i, '_>) -> Result<TinyVec<[f64; 6]>, ParseError<'i>> {
    let mut args = TinyVec::new();

    while !parser.is_exhausted() {
        if !args.is_empty() {
            optional_comma(parser);
        }

        args.push(f64::parse(parser)?);
    }

    Ok(args)
}

fn transform_from_function(name: &str, args: &[f64]) -> Option<Transform> {
    let t = match (name, args) {
        ("matrix", &[xx, yx, xy, yy, x0, y0]) => Transform::new_unchecked(xx, yx, xy, yy, x0, y0),

        ("translate", &[tx]) => Transform::new_translate(tx, 0.0),
        ("translate", &[tx, ty]) => Transform::new_translate(tx, ty),

        ("scale", &[s]) => Transform::new_scale(s, s),
        ("scale", &[sx, sy]) => Transform::new_scale(sx, sy),

        ("rotate", &[deg]) => Transform::new_rotate(deg),
        ("rotate", &[deg, cx, cy]) => Transform::new_translate(cx, cy)
            .pre_transform(&Transform::new_rotate(deg))
            .pre_translate(-cx, -cy),

        ("skewX", &[deg]) => Transform::new_skew(deg, 0.0),
        ("skewY", &[deg]) => Transform::new_skew(0.0, deg),

        _ => return None,
    };

    Some(t)
}

#[cfg(test)]
pub(crate) fn assert_transform_eq(t1: &Transform, t2: &Transform) {
    use float_cmp::ApproxEq;

    let epsilon = 8.0 * f64::EPSILON; // kind of arbitrary, but allow for some sloppiness

    assert!(t1.xx.approx_eq(t2.xx, (epsilon, 1)), "{t1:?} != {t2:?}");
    assert!(t1.yx.approx_eq(t2.yx, (epsilon, 1)), "{t1:?} != {t2:?}");
    assert!(t1.xy.approx_eq(t2.xy, (epsilon, 1)), "{t1:?} != {t2:?}");
    assert!(t1.yy.approx_eq(t2.yy, (epsilon, 1)), "{t1:?} != {t2:?}");
    assert!(t1.x0.approx_eq(t2.x0, (epsilon, 1)), "{t1:?} != {t2:?}");
    assert!(t1.y0.approx_eq(t2.y0, (epsilon, 1)), "{t1:?} != {t2:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Transform, ParseError<'_>> {
        Transform::parse_str(s)
    }

    fn rotation_about(deg: f64, cx: f64, cy: f64) -> Transform {
        Transform::new_translate(-cx, -cy)
            .post_transform(&Transform::new_rotate(deg))
            .post_transform(&Transform::new_translate(cx, cy))
    }

    #[test]
    fn multiply_applies_first_argument_first() {
        let t = Transform::new_unchecked(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_transform_eq(&Transform::multiply(&Transform::identity(), &t), &t);
        assert_transform_eq(&Transform::multiply(&t, &Transform::identity()), &t);

        let scale = Transform::new_scale(2.0, 2.0);
        let translate = Transform::new_translate(10.0, 0.0);

        assert_eq!(Transform::multiply(&scale, &translate).transform_point(1.0, 1.0), (12.0, 2.0));
        assert_eq!(Transform::multiply(&translate, &scale).transform_point(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn pre_and_post_transform_are_mirrors() {
        let a = Transform::new_translate(5.0, 7.0);
        let b = Transform::new_scale(3.0, 0.5);

        assert_transform_eq(&a.pre_transform(&b), &b.post_transform(&a));
        assert_eq!(a.pre_translate(1.0, 1.0).transform_point(0.0, 0.0), (6.0, 8.0));
    }

    #[test]
    fn maps_points_and_distances() {
        let t = Transform::new_translate(10.0, 10.0).pre_transform(&Transform::new_scale(2.0, 1.0));
        assert_eq!(t.transform_distance(1.0, 1.0), (2.0, 1.0));
        assert_eq!(t.transform_point(1.0, 1.0), (12.0, 11.0));
    }

    #[test]
    fn rotation_maps_x_axis_onto_y_axis() {
        let (x, y) = Transform::new_rotate(90.0).transform_point(1.0, 0.0);
        assert!(approx_eq!(f64, x, 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, y, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn parses_each_function() {
        assert_transform_eq(&parse("").unwrap(), &Transform::identity());

        assert_transform_eq(
            &parse("matrix(1,2.25,-3.25e2,4 5 6)").unwrap(),
            &Transform::new_unchecked(1.0, 2.25, -325.0, 4.0, 5.0, 6.0),
        );
        assert_transform_eq(&parse("translate(-1)").unwrap(), &Transform::new_translate(-1.0, 0.0));
        assert_transform_eq(&parse("translate (3, -2)").unwrap(), &Transform::new_translate(3.0, -2.0));
        assert_transform_eq(&parse("scale(-1)").unwrap(), &Transform::new_scale(-1.0, -1.0));
        assert_transform_eq(&parse("scale(2 3)").unwrap(), &Transform::new_scale(2.0, 3.0));
        assert_transform_eq(&parse("rotate(30)").unwrap(), &Transform::new_rotate(30.0));
        assert_transform_eq(&parse("rotate(30, -1, -2)").unwrap(), &rotation_about(30.0, -1.0, -2.0));
        assert_transform_eq(&parse("skewX(30)").unwrap(), &Transform::new_skew(30.0, 0.0));
        assert_transform_eq(&parse("skewY(30)").unwrap(), &Transform::new_skew(0.0, 30.0));
    }

    #[test]
    fn list_is_applied_right_to_left() {
        // Like nested groups: the rightmost function is applied to points first.
        let t = parse("translate(20, 30), scale(10) rotate(90 1 1)").unwrap();

        let expected = rotation_about(90.0, 1.0, 1.0)
            .post_transform(&Transform::new_scale(10.0, 10.0))
            .post_transform(&Transform::new_translate(20.0, 30.0));

        assert_transform_eq(&t, &expected);
    }

    #[test]
    fn rejects_bad_syntax_and_arity() {
        for s in [
            "foo",
            "spin(90)",
            "matrix(1 2 3 4 5)",
            "translate(1 2 3)",
            "translate(1,)",
            "scale()",
            "rotate(1 2)",
            "skewX(1,2)",
            "skewY",
            "translate(1) 42",
        ] {
            assert!(parse(s).is_err(), "{s} should not parse");
        }
    }

    #[test]
    fn rejects_non_invertible_results() {
        assert!(parse("matrix(0 0 0 0 0 0)").is_err());
        assert!(parse("scale(0), translate(10, 10)").is_err());
        assert!(Transform::from_attribute("scale(1 0)").is_err());
        assert!(Transform::from_attribute("scale(1 -1)").is_ok());
    }

    #[test]
    fn invalid_attribute_falls_back_to_identity() {
        let session = Session::new_for_test_suite();

        let t = parse_transform_attribute("g", "translate(10, 20)", &session);
        assert_transform_eq(&t, &Transform::new_translate(10.0, 20.0));
        assert_eq!(session.warnings(), 0);

        let t = parse_transform_attribute("g", "spin(90)", &session);
        assert_transform_eq(&t, &Transform::identity());
        assert_eq!(session.warnings(), 1);
    }
}
