//! Decode SVG documents into a typed tree and flatten them into drawing instructions.
//!
//! This crate reads the structural subset of SVG that matters for geometry
//! consumers like plotters and toolpath generators: nested `<g>` groups and
//! the `<rect>`, `<circle>` and `<path>` shape primitives.  The result is a
//! [`Document`] whose nodes know their parent group and their owning document,
//! and which can be flattened into one ordered stream of
//! [`DrawingInstruction`]s in document coordinates.
//!
//! # Basic usage
//!
//! * Create a [`Loader`] and configure the document name and scale factor.
//! * Read the SVG data into a [`Document`].
//! * Ask the document for its [`Instructions`] and consume them in order.
//!
//! # Example
//!
//! ```
//! use svgdraw::{DrawingInstruction, InstructionProducer, Loader};
//!
//! let document = Loader::new()
//!     .with_name("example")
//!     .with_scale(2.0)
//!     .read_str(
//!         r#"<svg xmlns="http://www.w3.org/2000/svg">
//!              <g id="outline" stroke="black" stroke-width="1">
//!                <rect x="10" y="10" width="30" height="30"/>
//!              </g>
//!            </svg>"#,
//!     )
//!     .unwrap();
//!
//! let instructions: Vec<DrawingInstruction> = document.instructions().collect();
//!
//! assert_eq!(instructions[0], DrawingInstruction::MoveTo(20.0, 20.0));
//! ```
//!
//! # Two phases
//!
//! Loading happens in two steps.  The decoder produces an
//! [`UnlinkedDocument`], which is a plain tree of values without any
//! back-references.  [`UnlinkedDocument::link`] then builds the final
//! [`Document`], where every group points to its parent and to the document
//! that owns it.  The [`Loader`] does both steps for you; use
//! [`Loader::decode_str`] if you want to edit the tree before linking it.
//!
//! # Logging
//!
//! Non-fatal problems found while loading, like an unparsable `transform`
//! attribute, are counted in the [`Session`].  Set the `SVGDRAW_LOG`
//! environment variable to have them printed as well.

#![warn(nonstandard_style, rust_2018_idioms, unused)]
#![allow(clippy::module_inception)]

pub use crate::api::*;

pub use crate::document::{root_transform_for_scale, Document, UnlinkedDocument};

pub use crate::error::{AttributeError, ImplementationLimit, LoadingError, ValueErrorKind};

pub use crate::instructions::{
    DrawingInstruction, InstructionProducer, Instructions, Paint, DOCUMENT_BUFFER_SIZE,
};

pub use crate::limits::{MAX_LOADED_ELEMENTS, MAX_NESTING_DEPTH, MAX_PRODUCER_THREADS};

pub use crate::node::{Node, Shape, UnlinkedNode};

pub use crate::path_builder::{CubicBezierCurve, EllipticalArc, LargeArc, PathCommand, PathData, Sweep};

pub use crate::session::Session;

pub use crate::shapes::{Circle, Path, Rect, ShapeAttributes, ShapeKind};

pub use crate::structure::{Group, UnlinkedGroup};

pub use crate::transform::Transform;

#[macro_use]
mod log;

mod api;
mod document;
mod error;
mod instructions;
mod limits;
mod node;
mod parsers;
mod path_builder;
mod path_parser;
mod session;
mod shapes;
mod structure;
mod transform;
mod xml;

#[doc(hidden)]
pub mod bench_only {
    pub use crate::path_builder::PathBuilder;
    pub use crate::path_parser::Lexer;
}

#[doc(hidden)]
pub mod doctest_only {
    pub use crate::error::{AttributeResultExt, ParseError};
    pub use crate::parsers::{Parse, ParseValue};
}
