//! Basic SVG shapes: the `rect`, `circle` and `path` elements.

use std::f64::consts::FRAC_PI_2;
use std::iter;

use crate::error::AttributeError;
use crate::instructions::{DrawingInstruction, Paint};
use crate::parsers::{NonNegative, ParseValue, UserLength};
use crate::path_builder::{unit_arc_segment, PathBuilder, PathCommand, PathData};
use crate::session::Session;
use crate::transform::{parse_transform_attribute, Transform};
use crate::xml::Attributes;

/// Attributes that every shape element has.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeAttributes {
    pub id: Option<String>,
    pub transform: Transform,
    /// Paint set on the element itself; unset fields are inherited from the enclosing groups.
    pub paint: Paint,
}

/// Sets an attribute's value only if parsing was successful.
///
/// In case of an error the destination keeps its default value, and the
/// problem gets reported through the `session`.
fn set_attribute<T>(
    dest: &mut T,
    parse_result: Result<T, AttributeError>,
    element: &str,
    session: &Session,
) {
    match parse_result {
        Ok(v) => *dest = v,
        Err(e) => session.warn(format_args!(
            "ignoring attribute with invalid value on <{element}>: {e}"
        )),
    }
}

fn parse_user_length(attr: &str, value: &str) -> Result<f64, AttributeError> {
    let length: UserLength = attr.parse_value(value)?;
    Ok(length.0)
}

fn parse_non_negative(attr: &str, value: &str) -> Result<f64, AttributeError> {
    let length: NonNegative = attr.parse_value(value)?;
    Ok(length.0)
}

trait BasicShape: Default {
    const ELEMENT_NAME: &'static str;

    fn attributes_mut(&mut self) -> &mut ShapeAttributes;

    fn set_geometry_attribute(&mut self, attr: &str, value: &str, session: &Session);

    /// Outline in the element's own user space, without arcs.
    fn make_outline(&self) -> Vec<PathCommand>;

    fn from_attributes(attrs: &Attributes, session: &Session) -> Self {
        let mut shape = Self::default();
        let element = Self::ELEMENT_NAME;

        for (attr, value) in attrs.iter() {
            let common = shape.attributes_mut();

            match attr {
                "id" => common.id = Some(value.to_string()),

                "transform" => common.transform = parse_transform_attribute(element, value, session),

                "stroke" => common.paint.stroke = Some(value.to_string()),

                "stroke-width" => set_attribute(
                    &mut common.paint.stroke_width,
                    parse_non_negative(attr, value).map(Some),
                    element,
                    session,
                ),

                "fill" => common.paint.fill = Some(value.to_string()),

                "fill-rule" => common.paint.fill_rule = Some(value.to_string()),

                _ => shape.set_geometry_attribute(attr, value, session),
            }
        }

        shape
    }
}

/// The `<rect>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rect {
    pub attributes: ShapeAttributes,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BasicShape for Rect {
    const ELEMENT_NAME: &'static str = "rect";

    fn attributes_mut(&mut self) -> &mut ShapeAttributes {
        &mut self.attributes
    }

    fn set_geometry_attribute(&mut self, attr: &str, value: &str, session: &Session) {
        let (dest, result) = match attr {
            "x" => (&mut self.x, parse_user_length(attr, value)),
            "y" => (&mut self.y, parse_user_length(attr, value)),
            "width" => (&mut self.width, parse_non_negative(attr, value)),
            "height" => (&mut self.height, parse_non_negative(attr, value)),
            _ => return,
        };

        set_attribute(dest, result, Self::ELEMENT_NAME, session);
    }

    fn make_outline(&self) -> Vec<PathCommand> {
        let Rect {
            x, y, width, height, ..
        } = *self;

        vec![
            PathCommand::MoveTo(x, y),
            PathCommand::LineTo(x + width, y),
            PathCommand::LineTo(x + width, y + height),
            PathCommand::LineTo(x, y + height),
            PathCommand::ClosePath,
        ]
    }
}

/// The `<circle>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circle {
    pub attributes: ShapeAttributes,
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl BasicShape for Circle {
    const ELEMENT_NAME: &'static str = "circle";

    fn attributes_mut(&mut self) -> &mut ShapeAttributes {
        &mut self.attributes
    }

    fn set_geometry_attribute(&mut self, attr: &str, value: &str, session: &Session) {
        let (dest, result) = match attr {
            "cx" => (&mut self.cx, parse_user_length(attr, value)),
            "cy" => (&mut self.cy, parse_user_length(attr, value)),
            "r" => (&mut self.r, parse_non_negative(attr, value)),
            _ => return,
        };

        set_attribute(dest, result, Self::ELEMENT_NAME, session);
    }

    fn make_outline(&self) -> Vec<PathCommand> {
        make_ellipse(self.cx, self.cy, self.r, self.r)
    }
}

/// The `<path>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub attributes: ShapeAttributes,
    pub data: PathData,
}

impl BasicShape for Path {
    const ELEMENT_NAME: &'static str = "path";

    fn attributes_mut(&mut self) -> &mut ShapeAttributes {
        &mut self.attributes
    }

    fn set_geometry_attribute(&mut self, attr: &str, value: &str, session: &Session) {
        if attr == "d" {
            let mut builder = PathBuilder::default();
            if let Err(e) = builder.parse(value) {
                // A partial path is still drawn, so keep what was parsed before the error.
                session.warn(format_args!("could not parse path: {e}"));
            }
            self.data = builder.into_path_data();
        }
    }

    fn make_outline(&self) -> Vec<PathCommand> {
        self.data.flatten()
    }
}

/// Outline of an axis-aligned ellipse: four quarter-turn curves, clockwise on screen
/// from the rightmost point.
fn make_ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<PathCommand> {
    if rx <= 0.0 || ry <= 0.0 {
        return Vec::new();
    }

    let to_user = Transform::new_scale(rx, ry).post_transform(&Transform::new_translate(cx, cy));

    iter::once(PathCommand::MoveTo(cx + rx, cy))
        .chain((0..4).map(|quarter| {
            let a = FRAC_PI_2 * f64::from(quarter);
            PathCommand::CurveTo(unit_arc_segment(a, a + FRAC_PI_2).transform(&to_user))
        }))
        .chain(iter::once(PathCommand::ClosePath))
        .collect()
}

/// One of the shape elements, with its own attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Rect(Rect),
    Circle(Circle),
    Path(Path),
}

impl ShapeKind {
    /// Creates the shape for an element, or returns `None` if `name` is not a shape element.
    pub(crate) fn from_element(name: &str, attrs: &Attributes, session: &Session) -> Option<ShapeKind> {
        match name {
            "rect" => Some(ShapeKind::Rect(Rect::from_attributes(attrs, session))),
            "circle" => Some(ShapeKind::Circle(Circle::from_attributes(attrs, session))),
            "path" => Some(ShapeKind::Path(Path::from_attributes(attrs, session))),
            _ => None,
        }
    }

    pub fn element_name(&self) -> &'static str {
        match *self {
            ShapeKind::Rect(_) => Rect::ELEMENT_NAME,
            ShapeKind::Circle(_) => Circle::ELEMENT_NAME,
            ShapeKind::Path(_) => Path::ELEMENT_NAME,
        }
    }

    pub fn attributes(&self) -> &ShapeAttributes {
        match *self {
            ShapeKind::Rect(ref r) => &r.attributes,
            ShapeKind::Circle(ref c) => &c.attributes,
            ShapeKind::Path(ref p) => &p.attributes,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes().id.as_deref()
    }

    /// Outline in the element's own user space, with arcs converted to curves.
    pub fn outline(&self) -> Vec<PathCommand> {
        match *self {
            ShapeKind::Rect(ref r) => r.make_outline(),
            ShapeKind::Circle(ref c) => c.make_outline(),
            ShapeKind::Path(ref p) => p.make_outline(),
        }
    }

    /// Emits the outline mapped through `transform`, followed by `paint`.
    pub(crate) fn draw(&self, transform: &Transform, paint: Paint) -> Vec<DrawingInstruction> {
        self.outline()
            .iter()
            .filter_map(|cmd| DrawingInstruction::from_path_command(cmd, transform))
            .chain(iter::once(DrawingInstruction::Paint(paint)))
            .collect()
    }
}
