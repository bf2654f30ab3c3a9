//! The main XML parser.
//!
//! [`DocumentDecoder`] pulls events from an `xml-rs` reader and builds an
//! [`UnlinkedDocument`] by recursive descent, one call per nested `<g>` or
//! unwrapped unknown element.  The
//! decoded tree has no back-references; those are filled in by
//! [`UnlinkedDocument::link`].

use std::io::Read;

use ::xml::reader::{EventReader, ParserConfig, XmlEvent};

use crate::api::UnknownElements;
use crate::document::UnlinkedDocument;
use crate::error::{ImplementationLimit, LoadingError};
use crate::limits::{MAX_LOADED_ELEMENTS, MAX_NESTING_DEPTH};
use crate::node::UnlinkedNode;
use crate::session::Session;
use crate::shapes::ShapeKind;
use crate::structure::UnlinkedGroup;

mod attributes;

pub use attributes::Attributes;

/// Decodes a single SVG document from a byte stream.
pub(crate) struct DocumentDecoder<R: Read> {
    events: EventReader<R>,
    session: Session,
    unknown_elements: UnknownElements,
    num_loaded_elements: usize,
}

impl<R: Read> DocumentDecoder<R> {
    pub fn new(reader: R, session: Session, unknown_elements: UnknownElements) -> Self {
        let config = ParserConfig::new()
            .trim_whitespace(true)
            .ignore_comments(true)
            .cdata_to_characters(true);

        DocumentDecoder {
            events: EventReader::new_with_config(reader, config),
            session,
            unknown_elements,
            num_loaded_elements: 0,
        }
    }

    /// Reads the whole document.
    ///
    /// Only the first root element is looked at; anything after its closing
    /// tag is ignored.
    pub fn decode(mut self, name: &str, scale: f64) -> Result<UnlinkedDocument, LoadingError> {
        loop {
            match self.next_event()? {
                XmlEvent::StartElement { name: root, .. } => {
                    if root.local_name != "svg" {
                        return Err(LoadingError::NoSvgRoot);
                    }

                    let mut doc = UnlinkedDocument::new_with_session(name, scale, self.session.clone());
                    self.decode_root(&mut doc).map_err(|e| e.in_element("svg"))?;

                    svgdraw_log!(
                        self.session,
                        "(decoded {:?}: {} top-level shapes, {} top-level groups, {} elements)",
                        doc.name,
                        doc.shapes.len(),
                        doc.groups.len(),
                        self.num_loaded_elements
                    );

                    return Ok(doc);
                }

                XmlEvent::EndDocument => return Err(LoadingError::NoSvgRoot),

                _ => (),
            }
        }
    }

    fn decode_root(&mut self, doc: &mut UnlinkedDocument) -> Result<(), LoadingError> {
        let mut nodes = Vec::new();

        loop {
            match self.next_event()? {
                XmlEvent::StartElement { name, attributes, .. } => {
                    let name = name.local_name;

                    if name == "title" {
                        doc.title = self.read_text().map_err(|e| e.in_element(&name))?;
                        continue;
                    }

                    let attrs = Attributes::new_from_xml_attributes(attributes);
                    self.decode_child(&name, &attrs, 0, &mut nodes)?;
                }

                XmlEvent::EndElement { .. } => break,

                XmlEvent::EndDocument => return Err(unexpected_end_of_document()),

                _ => (),
            }
        }

        for node in nodes {
            match node {
                UnlinkedNode::Group(group) => doc.groups.push(group),
                UnlinkedNode::Shape(shape) => doc.shapes.push(shape),
            }
        }

        Ok(())
    }

    /// Reads the attributes and children of a `<g>` whose start tag was just read.
    fn decode_group(&mut self, attrs: &Attributes, depth: usize) -> Result<UnlinkedGroup, LoadingError> {
        check_nesting_depth(depth)?;

        let mut group = UnlinkedGroup::from_attributes(attrs, &self.session)?;
        self.decode_children(depth, &mut group.children)?;

        Ok(group)
    }

    /// Decodes elements into `out` until the end tag of the current element.
    fn decode_children(&mut self, depth: usize, out: &mut Vec<UnlinkedNode>) -> Result<(), LoadingError> {
        loop {
            match self.next_event()? {
                XmlEvent::StartElement { name, attributes, .. } => {
                    let attrs = Attributes::new_from_xml_attributes(attributes);
                    self.decode_child(&name.local_name, &attrs, depth, out)?;
                }

                XmlEvent::EndElement { .. } => return Ok(()),

                XmlEvent::EndDocument => return Err(unexpected_end_of_document()),

                _ => (),
            }
        }
    }

    /// Dispatches on the name of an element whose start tag was just read.
    ///
    /// `depth` is the number of groups and unwrapped elements that enclose the
    /// element.  Whatever the element turns into is appended to `out`; that is
    /// nothing for descriptive elements and skipped ones, and the decoded
    /// contents for unwrapped ones.
    fn decode_child(
        &mut self,
        name: &str,
        attrs: &Attributes,
        depth: usize,
        out: &mut Vec<UnlinkedNode>,
    ) -> Result<(), LoadingError> {
        if name == "g" {
            let group = self
                .decode_group(attrs, depth + 1)
                .map_err(|e| e.in_element(name))?;

            out.push(UnlinkedNode::Group(group));
            return Ok(());
        }

        if let Some(shape) = ShapeKind::from_element(name, attrs, &self.session) {
            self.skip_element().map_err(|e| e.in_element(name))?;
            out.push(UnlinkedNode::Shape(shape));
            return Ok(());
        }

        match name {
            // descriptive elements carry no geometry
            "title" | "desc" | "metadata" => (),

            _ => match self.unknown_elements {
                UnknownElements::Unwrap => {
                    self.session
                        .warn(format_args!("unwrapping unsupported element <{name}>"));

                    return check_nesting_depth(depth + 1)
                        .and_then(|_| self.decode_children(depth + 1, out))
                        .map_err(|e| e.in_element(name));
                }

                UnknownElements::Skip => {
                    self.session
                        .warn(format_args!("skipping unsupported element <{name}>"));
                }

                UnknownElements::Error => {
                    return Err(LoadingError::UnsupportedElement(name.to_string()));
                }
            },
        }

        self.skip_element().map_err(|e| e.in_element(name))
    }

    /// Consumes events up to the end tag that matches the last start tag.
    fn skip_element(&mut self) -> Result<(), LoadingError> {
        let mut depth = 0;

        loop {
            match self.next_event()? {
                XmlEvent::StartElement { .. } => depth += 1,

                XmlEvent::EndElement { .. } if depth == 0 => return Ok(()),

                XmlEvent::EndElement { .. } => depth -= 1,

                XmlEvent::EndDocument => return Err(unexpected_end_of_document()),

                _ => (),
            }
        }
    }

    /// Like `skip_element`, but collects the text directly inside the element.
    fn read_text(&mut self) -> Result<String, LoadingError> {
        let mut text = String::new();
        let mut depth = 0;

        loop {
            match self.next_event()? {
                XmlEvent::StartElement { .. } => depth += 1,

                XmlEvent::EndElement { .. } if depth == 0 => return Ok(text),

                XmlEvent::EndElement { .. } => depth -= 1,

                XmlEvent::Characters(ref s) if depth == 0 => text.push_str(s),

                XmlEvent::EndDocument => return Err(unexpected_end_of_document()),

                _ => (),
            }
        }
    }

    fn next_event(&mut self) -> Result<XmlEvent, LoadingError> {
        let event = self.events.next()?;

        if let XmlEvent::StartElement { .. } = event {
            self.num_loaded_elements += 1;

            if self.num_loaded_elements > MAX_LOADED_ELEMENTS {
                return Err(LoadingError::LimitExceeded(
                    ImplementationLimit::TooManyLoadedElements,
                ));
            }
        }

        Ok(event)
    }
}

fn check_nesting_depth(depth: usize) -> Result<(), LoadingError> {
    if depth > MAX_NESTING_DEPTH {
        Err(LoadingError::LimitExceeded(
            ImplementationLimit::MaximumNestingDepthExceeded,
        ))
    } else {
        Ok(())
    }
}

fn unexpected_end_of_document() -> LoadingError {
    LoadingError::XmlParseError(String::from("unexpected end of document"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;

    fn decode_with(input: &str, unknown_elements: UnknownElements) -> (Result<UnlinkedDocument, LoadingError>, Session) {
        let session = Session::new_for_test_suite();
        let res = DocumentDecoder::new(input.as_bytes(), session.clone(), unknown_elements).decode("test", 0.0);
        (res, session)
    }

    fn decode(input: &str) -> Result<UnlinkedDocument, LoadingError> {
        decode_with(input, UnknownElements::default()).0
    }

    #[test]
    fn decodes_top_level_shapes_and_groups() {
        let doc = decode(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                 <title>Drawing</title>
                 <rect id="r" width="1" height="1"/>
                 <g id="g1" transform="scale(2)">
                   <circle id="c" r="1"/>
                   <g id="g2"><path id="p" d="M 0 0 L 1 1"/></g>
                 </g>
                 <circle id="c2" r="3"/>
               </svg>"#,
        )
        .unwrap();

        assert_eq!(doc.title, "Drawing");
        assert_eq!(doc.name, "test");

        let shape_ids: Vec<_> = doc.shapes.iter().map(|s| s.id()).collect();
        assert_eq!(shape_ids, vec![Some("r"), Some("c2")]);

        assert_eq!(doc.groups.len(), 1);
        let g1 = &doc.groups[0];
        assert_eq!(g1.id.as_deref(), Some("g1"));
        assert_eq!(g1.transform, Some(Transform::new_scale(2.0, 2.0)));
        assert_eq!(g1.children.len(), 2);

        match g1.children[1] {
            UnlinkedNode::Group(ref g2) => {
                assert_eq!(g2.id.as_deref(), Some("g2"));
                assert_eq!(g2.transform, None);
                assert!(matches!(g2.children[0], UnlinkedNode::Shape(ShapeKind::Path(_))));
            }
            ref other => panic!("expected a group, got {other:?}"),
        }
    }

    #[test]
    fn root_must_be_svg() {
        assert!(matches!(decode("<html><g/></html>"), Err(LoadingError::NoSvgRoot)));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = decode("<svg><g></svg>").unwrap_err();
        assert!(matches!(err.innermost(), LoadingError::XmlParseError(_)));
    }

    #[test]
    fn truncated_input_is_a_parse_error() {
        let err = decode(r#"<svg><g><rect width="1" height="1"/>"#).unwrap_err();
        assert!(matches!(err.innermost(), LoadingError::XmlParseError(_)));
    }

    #[test]
    fn bad_stroke_width_names_the_element_path() {
        let err = decode(r#"<svg><g><g stroke-width="thick"/></g></svg>"#).unwrap_err();

        assert_eq!(
            err.to_string(),
            "error decoding <svg> element: error decoding <g> element: error decoding <g> element: \
             invalid attribute \"stroke-width\": parse error: expected integer: invalid digit found in string"
        );
        assert!(matches!(err.innermost(), LoadingError::BadAttribute(_)));
    }

    #[test]
    fn unknown_elements_are_skipped_with_a_warning() {
        let (res, session) = decode_with(
            r#"<svg>
                 <foo><rect width="1" height="1"/></foo>
                 <g><text>hello</text><rect width="2" height="2"/></g>
               </svg>"#,
            UnknownElements::Skip,
        );
        let doc = res.unwrap();

        assert!(doc.shapes.is_empty());
        assert_eq!(doc.groups[0].children.len(), 1);
        assert_eq!(session.warnings(), 2);
    }

    #[test]
    fn unknown_wrappers_keep_their_contents() {
        let (res, session) = decode_with(
            r#"<svg>
                 <a href="x"><rect id="r" width="1" height="1"/><g id="g"><circle r="1"/></g></a>
                 <g id="outer"><switch><path id="p" d="M 0 0 L 1 1"/></switch></g>
               </svg>"#,
            UnknownElements::Unwrap,
        );
        let doc = res.unwrap();

        let shape_ids: Vec<_> = doc.shapes.iter().map(|s| s.id()).collect();
        assert_eq!(shape_ids, vec![Some("r")]);

        let group_ids: Vec<_> = doc.groups.iter().map(|g| g.id.as_deref()).collect();
        assert_eq!(group_ids, vec![Some("g"), Some("outer")]);

        let outer = &doc.groups[1];
        assert_eq!(outer.children.len(), 1);
        assert!(matches!(outer.children[0], UnlinkedNode::Shape(ShapeKind::Path(_))));

        assert_eq!(session.warnings(), 2);
    }

    #[test]
    fn unwrapped_elements_count_towards_nesting_depth() {
        let nested = |n: usize| format!("<svg>{}{}</svg>", "<a>".repeat(n), "</a>".repeat(n));

        assert!(decode(&nested(MAX_NESTING_DEPTH)).is_ok());

        let err = decode(&nested(MAX_NESTING_DEPTH + 1)).unwrap_err();
        assert!(matches!(
            err.innermost(),
            LoadingError::LimitExceeded(ImplementationLimit::MaximumNestingDepthExceeded)
        ));
    }

    #[test]
    fn unknown_elements_can_be_an_error_at_any_level() {
        for input in ["<svg><foo/></svg>", "<svg><g><g><foo/></g></g></svg>"] {
            let (res, _) = decode_with(input, UnknownElements::Error);
            let err = res.unwrap_err();
            assert!(matches!(err.innermost(), LoadingError::UnsupportedElement(name) if name == "foo"));
        }
    }

    #[test]
    fn descriptive_elements_are_ignored_quietly() {
        let (res, session) = decode_with(
            "<svg><desc>x</desc><metadata><a/></metadata><g><title>t</title></g></svg>",
            UnknownElements::Error,
        );
        let doc = res.unwrap();

        assert_eq!(doc.title, "");
        assert!(doc.groups[0].children.is_empty());
        assert_eq!(session.warnings(), 0);
    }

    #[test]
    fn limits_nesting_depth() {
        let nested = |n: usize| format!("<svg>{}{}</svg>", "<g>".repeat(n), "</g>".repeat(n));

        assert!(decode(&nested(MAX_NESTING_DEPTH)).is_ok());

        let err = decode(&nested(MAX_NESTING_DEPTH + 1)).unwrap_err();
        assert!(matches!(
            err.innermost(),
            LoadingError::LimitExceeded(ImplementationLimit::MaximumNestingDepthExceeded)
        ));
    }
}
