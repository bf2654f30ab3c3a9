//! Public Rust API for svgdraw.
//!
//! This gets re-exported from the toplevel `lib.rs`.

#![warn(missing_docs)]

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use crate::document::{Document, UnlinkedDocument};
use crate::error::LoadingError;
use crate::session::Session;
use crate::xml::DocumentDecoder;

/// What the decoder does with elements it does not know about.
///
/// The same policy applies at every nesting level, both directly under the
/// `<svg>` root and inside groups.  The descriptive elements `<title>`,
/// `<desc>` and `<metadata>` are never considered unknown.
///
/// Every variant except `Error` records a warning in the [`Session`] for each
/// unknown element.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum UnknownElements {
    /// Ignore the element's own tag but keep decoding what is inside it, as if
    /// its children had been written in the enclosing element.  Shapes inside
    /// wrappers like `<a>` or `<switch>` are kept this way.
    #[default]
    Unwrap,

    /// Skip the element and everything inside it.
    Skip,

    /// Fail with [`LoadingError::UnsupportedElement`].
    Error,
}

/// Builder for loading a [`Document`].
///
/// This is the starting point for using svgdraw.  This struct
/// implements a builder pattern for configuring a [`Document`]'s
/// options, and then loading the SVG data.  You can call the methods
/// of `Loader` in sequence to configure how SVG data should be
/// loaded, and finally use one of the loading functions to load a
/// [`Document`].
#[derive(Debug, Clone)]
pub struct Loader {
    name: String,
    scale: f64,
    unknown_elements: UnknownElements,
    session: Option<Session>,
}

impl Default for Loader {
    fn default() -> Self {
        Loader {
            name: String::new(),
            scale: 0.0,
            unknown_elements: UnknownElements::default(),
            session: None,
        }
    }
}

impl Loader {
    /// Creates a `Loader` with the default options.
    ///
    /// * the document name is empty;
    ///
    /// * the [scale factor](#method.with_scale) is 0, which means no scaling;
    ///
    /// * [unknown elements](#method.with_unknown_elements) are unwrapped, so
    /// their contents are decoded as if the element was not there;
    ///
    /// * a new [`Session`] is created for each document, with logging
    /// controlled by the `SVGDRAW_LOG` environment variable.
    ///
    /// # Example:
    ///
    /// ```no_run
    /// let document = svgdraw::Loader::new()
    ///     .read_path("example.svg")
    ///     .unwrap();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label that will be available as [`Document::name`].
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Sets the scale factor for the document's root transform.
    ///
    /// A positive value scales the whole drawing by that amount.  A negative
    /// value scales it by the reciprocal of its absolute value, so `-4.0` makes
    /// the drawing four times smaller.  Zero means no scaling.
    ///
    /// # Example:
    ///
    /// ```
    /// use svgdraw::Transform;
    ///
    /// let document = svgdraw::Loader::new()
    ///     .with_scale(-4.0)
    ///     .read_str("<svg/>")
    ///     .unwrap();
    ///
    /// assert_eq!(document.root_transform(), Transform::new_scale(0.25, 0.25));
    /// ```
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the policy for elements that the decoder does not know about.
    ///
    /// # Example:
    ///
    /// ```
    /// use svgdraw::{LoadingError, UnknownElements};
    ///
    /// let result = svgdraw::Loader::new()
    ///     .with_unknown_elements(UnknownElements::Error)
    ///     .read_str("<svg><g><ellipse rx='1' ry='2'/></g></svg>");
    ///
    /// assert!(matches!(
    ///     result.unwrap_err().innermost(),
    ///     LoadingError::UnsupportedElement(name) if name == "ellipse"
    /// ));
    /// ```
    pub fn with_unknown_elements(mut self, unknown_elements: UnknownElements) -> Self {
        self.unknown_elements = unknown_elements;
        self
    }

    /// Uses the given session for loading, instead of creating a new one.
    ///
    /// Keep a clone of the session to look at its
    /// [warnings](Session::warnings) after loading.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Reads an SVG document from a string.
    pub fn read_str(self, text: &str) -> Result<Arc<Document>, LoadingError> {
        self.read_bytes(text.as_bytes())
    }

    /// Reads an SVG document from a byte slice.
    pub fn read_bytes(self, bytes: &[u8]) -> Result<Arc<Document>, LoadingError> {
        self.read_stream(bytes)
    }

    /// Reads an SVG document from a stream.
    pub fn read_stream<R: Read>(self, reader: R) -> Result<Arc<Document>, LoadingError> {
        Ok(self.decode_stream(reader)?.link())
    }

    /// Reads an SVG document from `path`.
    ///
    /// # Example:
    ///
    /// ```no_run
    /// let document = svgdraw::Loader::new()
    ///     .with_name("example")
    ///     .read_path("example.svg")
    ///     .unwrap();
    /// ```
    pub fn read_path<P: AsRef<Path>>(self, path: P) -> Result<Arc<Document>, LoadingError> {
        let file = File::open(path)?;
        self.read_stream(BufReader::new(file))
    }

    /// Decodes an SVG document from a string, without linking it.
    pub fn decode_str(self, text: &str) -> Result<UnlinkedDocument, LoadingError> {
        self.decode_stream(text.as_bytes())
    }

    /// Decodes an SVG document from a stream, without linking it.
    ///
    /// The result can be modified before calling [`UnlinkedDocument::link`].
    ///
    /// # Example:
    ///
    /// ```
    /// let mut unlinked = svgdraw::Loader::new()
    ///     .decode_str("<svg><g id='a'/><g id='b'/></svg>")
    ///     .unwrap();
    ///
    /// unlinked.groups.reverse();
    ///
    /// let document = unlinked.link();
    /// assert_eq!(document.groups()[0].id(), Some("b"));
    /// ```
    pub fn decode_stream<R: Read>(self, reader: R) -> Result<UnlinkedDocument, LoadingError> {
        let session = self.session.unwrap_or_default();

        DocumentDecoder::new(reader, session, self.unknown_elements).decode(&self.name, self.scale)
    }
}

/// Loads a document from a string with the default options.
///
/// This is a shortcut for `Loader::new().with_name(name).with_scale(scale).read_str(text)`.
pub fn parse_svg(text: &str, name: &str, scale: f64) -> Result<Arc<Document>, LoadingError> {
    Loader::new().with_name(name).with_scale(scale).read_str(text)
}

/// Loads a document from a stream with the default options.
pub fn parse_svg_from_reader<R: Read>(
    reader: R,
    name: &str,
    scale: f64,
) -> Result<Arc<Document>, LoadingError> {
    Loader::new().with_name(name).with_scale(scale).read_stream(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_passes_options_through() {
        let session = Session::new_for_test_suite();

        let document = Loader::new()
            .with_name("drawing")
            .with_scale(3.0)
            .with_session(session.clone())
            .read_str("<svg><title>Hi</title><foo/></svg>")
            .unwrap();

        assert_eq!(document.name(), "drawing");
        assert_eq!(document.title(), "Hi");
        assert_eq!(document.scale(), 3.0);
        assert_eq!(session.warnings(), 1);
        assert_eq!(document.session().warnings(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let res = Loader::new().read_path("/nonexistent/svgdraw/missing.svg");
        assert!(matches!(res, Err(LoadingError::Io(_))));
    }
}
