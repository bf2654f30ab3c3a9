//! Error types.

use std::fmt;

use cssparser::{BasicParseError, BasicParseErrorKind, ParseErrorKind, ToCss};

use crate::limits;

/// A short-lived error.
///
/// The lifetime of the error is the same as the `cssparser::ParserInput` that
/// was used to create a `cssparser::Parser`.  That is, it is the lifetime of
/// the string data that is being parsed.
///
/// The code flow will sometimes require preserving this error as a long-lived struct;
/// see the `impl<'i, O> AttributeResultExt<O> for Result<O, ParseError<'i>>` for that
/// purpose.
pub type ParseError<'i> = cssparser::ParseError<'i, ValueErrorKind>;

/// A simple error which refers to an attribute's value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueErrorKind {
    /// The value could not be parsed
    Parse(String),

    // The value could be parsed, but is invalid
    Value(String),
}

impl ValueErrorKind {
    pub fn parse_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Parse(s.to_string())
    }

    pub fn value_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Value(s.to_string())
    }
}

impl fmt::Display for ValueErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueErrorKind::Parse(ref s) => write!(f, "parse error: {s}"),

            ValueErrorKind::Value(ref s) => write!(f, "invalid value: {s}"),
        }
    }
}

impl<'a> From<BasicParseError<'a>> for ValueErrorKind {
    fn from(e: BasicParseError<'_>) -> ValueErrorKind {
        let BasicParseError { kind, .. } = e;

        let msg = match kind {
            BasicParseErrorKind::UnexpectedToken(_) => "unexpected token",
            BasicParseErrorKind::EndOfInput => "unexpected end of input",
            BasicParseErrorKind::AtRuleInvalid(_) => "invalid @-rule",
            BasicParseErrorKind::AtRuleBodyInvalid => "invalid @-rule body",
            BasicParseErrorKind::QualifiedRuleInvalid => "invalid qualified rule",
        };

        ValueErrorKind::parse_error(msg)
    }
}

impl From<std::num::ParseIntError> for ValueErrorKind {
    fn from(e: std::num::ParseIntError) -> ValueErrorKind {
        ValueErrorKind::Parse(format!("expected integer: {e}"))
    }
}

/// A complete error for an attribute and its erroneous value
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeError {
    pub attr: String,
    pub err: ValueErrorKind,
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.attr, self.err)
    }
}

impl std::error::Error for AttributeError {}

/// Helper for converting `Result<O, E>` into `Result<O, AttributeError>`
///
/// An `AttributeError` requires the name of the attribute to which the error
/// refers, plus the actual `ValueErrorKind` that describes the error.  However,
/// parsing functions for attribute value types will want to return their own kind of
/// error, instead of `ValueErrorKind`.  If that particular error type has an `impl
/// From<FooError> for ValueErrorKind`, then this trait helps assign attribute values
/// as follows:
///
/// ```
/// # use svgdraw::doctest_only::AttributeResultExt;
/// # use svgdraw::ValueErrorKind;
/// let result = "thick".parse::<i32>().attribute("stroke-width");
/// assert!(matches!(result.unwrap_err().err, ValueErrorKind::Parse(_)));
/// ```
///
/// The call to `.attribute(attr)` converts the `Result` from `parse()` into a full
/// `AttributeError` with the provided `attr`.
pub trait AttributeResultExt<O> {
    fn attribute(self, attr: &str) -> Result<O, AttributeError>;
}

impl<O, E: Into<ValueErrorKind>> AttributeResultExt<O> for Result<O, E> {
    fn attribute(self, attr: &str) -> Result<O, AttributeError> {
        self.map_err(|e| e.into()).map_err(|err| AttributeError {
            attr: attr.to_string(),
            err,
        })
    }
}

/// Turns a short-lived `ParseError` into a long-lived `AttributeError`
impl<'i, O> AttributeResultExt<O> for Result<O, ParseError<'i>> {
    fn attribute(self, attr: &str) -> Result<O, AttributeError> {
        self.map_err(|e| {
            let ParseError {
                kind,
                location: _location,
            } = e;

            let err = match kind {
                ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(tok)) => {
                    let mut s = String::from("unexpected token '");
                    // writing into a String cannot fail
                    let _ = tok.to_css(&mut s);
                    s.push('\'');

                    ValueErrorKind::Parse(s)
                }

                ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
                    ValueErrorKind::parse_error("unexpected end of input")
                }

                ParseErrorKind::Basic(e) => {
                    ValueErrorKind::Parse(format!("{e:?}"))
                }

                ParseErrorKind::Custom(err) => err,
            };

            AttributeError {
                attr: attr.to_string(),
                err,
            }
        })
    }
}

/// Errors that can happen while loading an SVG document.
///
/// All of these are unrecoverable errors that keep a document from being
/// loaded; no partial [`Document`](crate::Document) is ever returned.  Problems
/// that only affect a single attribute, like an unparsable `transform`, do not
/// lead to a `LoadingError`.  To see those, look at
/// [`Session::warnings`](crate::Session::warnings) or set the `SVGDRAW_LOG=1`
/// environment variable.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadingError {
    /// XML syntax error, or input that ended before all elements were closed.
    #[error("XML parse error: {0}")]
    XmlParseError(String),

    /// There is no `<svg>` root element in the XML.
    #[error("XML does not have <svg> root")]
    NoSvgRoot,

    /// An element that the decoder does not know about, when unknown elements are
    /// configured to be an error.
    #[error("unsupported element <{0}>")]
    UnsupportedElement(String),

    /// A required attribute could not be parsed.
    #[error("invalid attribute {0}")]
    BadAttribute(#[from] AttributeError),

    /// A particular implementation-defined limit was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(ImplementationLimit),

    /// The input stream could not be read.
    #[error("I/O error: {0}")]
    Io(String),

    /// An error that happened while decoding the contents of an element.
    #[error("error decoding <{element}> element: {source}")]
    Element {
        element: String,
        #[source]
        source: Box<LoadingError>,
    },
}

impl LoadingError {
    pub(crate) fn in_element(self, element: &str) -> LoadingError {
        LoadingError::Element {
            element: element.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the error without any of the [`LoadingError::Element`] wrappers.
    pub fn innermost(&self) -> &LoadingError {
        let mut e = self;

        while let LoadingError::Element { ref source, .. } = *e {
            e = source;
        }

        e
    }
}

impl From<std::io::Error> for LoadingError {
    fn from(e: std::io::Error) -> LoadingError {
        LoadingError::Io(e.to_string())
    }
}

impl From<::xml::reader::Error> for LoadingError {
    fn from(e: ::xml::reader::Error) -> LoadingError {
        LoadingError::XmlParseError(e.to_string())
    }
}

/// Errors for implementation-defined limits, to mitigate malicious SVG documents.
#[non_exhaustive]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImplementationLimit {
    /// Document exceeded the maximum number of elements that can be loaded.
    ///
    /// This is a mitigation for SVG files which create millions of
    /// elements in an attempt to exhaust memory.
    TooManyLoadedElements,

    /// Document nests groups more deeply than the decoder allows.
    ///
    /// Decoding, linking and flattening all recurse once per nesting level, so this
    /// keeps a hostile document from exhausting the stack.
    MaximumNestingDepthExceeded,
}

impl fmt::Display for ImplementationLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ImplementationLimit::TooManyLoadedElements => write!(
                f,
                "cannot load more than {} XML elements",
                limits::MAX_LOADED_ELEMENTS
            ),

            ImplementationLimit::MaximumNestingDepthExceeded => write!(
                f,
                "maximum depth of {} nested groups has been exceeded",
                limits::MAX_NESTING_DEPTH,
            ),
        }
    }
}
