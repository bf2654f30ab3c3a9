//! Main SVG document structure.

use std::sync::{Arc, Weak};

use crate::instructions::{self, InstructionProducer, Instructions, DOCUMENT_BUFFER_SIZE};
use crate::node::{Node, Shape};
use crate::session::Session;
use crate::shapes::ShapeKind;
use crate::structure::{Group, UnlinkedGroup};
use crate::transform::Transform;

/// Computes the root transform for a document's scale factor.
///
/// A positive factor scales uniformly by that amount.  A negative factor
/// scales by the reciprocal of its absolute value, so `-2.0` halves the
/// drawing.  Zero, or a value that is not a number, leaves the identity.
pub fn root_transform_for_scale(scale: f64) -> Transform {
    if scale > 0.0 {
        Transform::new_scale(scale, scale)
    } else if scale < 0.0 {
        let s = 1.0 / scale.abs();
        Transform::new_scale(s, s)
    } else {
        Transform::identity()
    }
}

/// A document as produced by the decoder, before the linking pass.
///
/// This is a plain tree of values with no back-references, so it can be
/// built or edited freely.  Call [`UnlinkedDocument::link`] to get a
/// [`Document`].
#[derive(Debug, Clone)]
pub struct UnlinkedDocument {
    pub title: String,
    pub name: String,
    pub scale: f64,
    /// Shapes directly under the root element, in declaration order.
    pub shapes: Vec<ShapeKind>,
    /// Groups directly under the root element, in declaration order.
    pub groups: Vec<UnlinkedGroup>,
    session: Session,
}

impl UnlinkedDocument {
    pub fn new(name: &str, scale: f64) -> UnlinkedDocument {
        UnlinkedDocument::new_with_session(name, scale, Session::default())
    }

    pub(crate) fn new_with_session(name: &str, scale: f64, session: Session) -> UnlinkedDocument {
        UnlinkedDocument {
            title: String::new(),
            name: name.to_string(),
            scale,
            shapes: Vec::new(),
            groups: Vec::new(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn root_transform(&self) -> Transform {
        root_transform_for_scale(self.scale)
    }

    /// Runs the linking pass and returns the final document.
    ///
    /// Every group gets a reference to the returned document as its owner and
    /// to its enclosing group as its parent; every shape gets a reference to
    /// its enclosing group.  Groups without a transform get the identity.
    pub fn link(self) -> Arc<Document> {
        let root_transform = self.root_transform();

        let UnlinkedDocument {
            title,
            name,
            scale,
            shapes,
            groups,
            session,
        } = self;

        Arc::new_cyclic(|owner: &Weak<Document>| Document {
            title,
            name,
            scale,
            root_transform,
            shapes: shapes
                .into_iter()
                .map(|kind| Shape::new(kind, Weak::new(), owner.clone()))
                .collect(),
            groups: groups
                .into_iter()
                .map(|g| g.link(&Weak::new(), owner))
                .collect(),
            session,
        })
    }
}

/// A linked SVG document.
///
/// Obtain one from a [`Loader`](crate::Loader) or with [`UnlinkedDocument::link`].
/// Documents are immutable and always live in an `Arc`; the nodes in the tree
/// refer back to it.
#[derive(Debug)]
pub struct Document {
    title: String,
    name: String,
    scale: f64,
    root_transform: Transform,
    shapes: Vec<Arc<Shape>>,
    groups: Vec<Arc<Group>>,
    session: Session,
}

impl Document {
    /// Text of the `<title>` element under the root, or an empty string.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn root_transform(&self) -> Transform {
        self.root_transform
    }

    pub fn shapes(&self) -> &[Arc<Shape>] {
        &self.shapes
    }

    pub fn groups(&self) -> &[Arc<Group>] {
        &self.groups
    }

    /// All the groups in the document, in depth-first declaration order.
    pub fn all_groups(&self) -> Vec<Arc<Group>> {
        fn walk(group: &Arc<Group>, out: &mut Vec<Arc<Group>>) {
            out.push(group.clone());
            for child in group.children() {
                if let Node::Group(ref g) = *child {
                    walk(g, out);
                }
            }
        }

        let mut out = Vec::new();
        for group in &self.groups {
            walk(group, &mut out);
        }
        out
    }

    /// The session used while loading the document.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Copies the document's content into an [`UnlinkedDocument`], without back-references.
    pub fn unlink(&self) -> UnlinkedDocument {
        UnlinkedDocument {
            title: self.title.clone(),
            name: self.name.clone(),
            scale: self.scale,
            shapes: self.shapes.iter().map(|s| s.kind().clone()).collect(),
            groups: self.groups.iter().map(|g| g.unlink()).collect(),
            session: self.session.clone(),
        }
    }

    /// Runs the linking pass again on a copy of this document.
    pub fn relink(&self) -> Arc<Document> {
        self.unlink().link()
    }
}

impl InstructionProducer for Arc<Document> {
    /// Starts a producer for the whole document.
    ///
    /// The stream has the top-level shapes first and then the top-level groups,
    /// each in declaration order.  The producer can get up to
    /// [`DOCUMENT_BUFFER_SIZE`] instructions ahead of the reader.
    fn instructions(&self) -> Instructions {
        let children = self
            .shapes
            .iter()
            .cloned()
            .map(Node::Shape)
            .chain(self.groups.iter().cloned().map(Node::Group))
            .collect();

        instructions::forward_children(
            "svgdraw-document",
            DOCUMENT_BUFFER_SIZE,
            children,
            Some(Arc::clone(self)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::UnlinkedNode;
    use crate::shapes::Rect;

    fn rect(x: f64) -> ShapeKind {
        ShapeKind::Rect(Rect {
            x,
            width: 1.0,
            height: 1.0,
            ..Rect::default()
        })
    }

    fn sample() -> UnlinkedDocument {
        let mut doc = UnlinkedDocument::new("sample", 0.0);
        doc.shapes.push(rect(0.0));
        doc.groups.push(UnlinkedGroup {
            id: Some("outer".to_string()),
            children: vec![
                UnlinkedNode::Shape(rect(1.0)),
                UnlinkedNode::Group(UnlinkedGroup {
                    id: Some("inner".to_string()),
                    children: vec![UnlinkedNode::Shape(rect(2.0))],
                    ..UnlinkedGroup::default()
                }),
            ],
            ..UnlinkedGroup::default()
        });
        doc
    }

    #[test]
    fn scale_factor_rules() {
        assert_eq!(root_transform_for_scale(0.0), Transform::identity());
        assert_eq!(root_transform_for_scale(f64::NAN), Transform::identity());
        assert_eq!(root_transform_for_scale(2.0), Transform::new_scale(2.0, 2.0));
        assert_eq!(root_transform_for_scale(-2.0), Transform::new_scale(0.5, 0.5));
        assert_eq!(root_transform_for_scale(-0.5), Transform::new_scale(2.0, 2.0));
    }

    #[test]
    fn link_sets_back_references() {
        let doc = sample().link();

        assert!(doc.shapes()[0].group().is_none());
        assert!(Arc::ptr_eq(&doc.shapes()[0].owner().unwrap(), &doc));

        let outer = &doc.groups()[0];
        assert!(outer.parent().is_none());
        assert!(Arc::ptr_eq(&outer.owner().unwrap(), &doc));

        let shape = outer.children()[0].as_shape().unwrap();
        assert!(Arc::ptr_eq(&shape.group().unwrap(), outer));

        let inner = outer.children()[1].as_group().unwrap();
        assert!(Arc::ptr_eq(&inner.parent().unwrap(), outer));
        assert!(Arc::ptr_eq(&inner.owner().unwrap(), &doc));

        let ids: Vec<_> = doc.all_groups().iter().map(|g| g.id().map(String::from)).collect();
        assert_eq!(ids, vec![Some("outer".to_string()), Some("inner".to_string())]);
    }

    #[test]
    fn unlink_preserves_content() {
        let unlinked = sample();
        let doc = unlinked.clone().link();
        let again = doc.unlink();

        assert_eq!(again.name, "sample");
        assert_eq!(again.shapes, unlinked.shapes);

        // Linking defaults the transforms; otherwise the groups are the same.
        assert_eq!(again.groups[0].id, unlinked.groups[0].id);
        assert_eq!(again.groups[0].transform, Some(Transform::identity()));
        assert_eq!(again.groups[0].children.len(), 2);
    }

    #[test]
    fn dropping_document_invalidates_owner() {
        let doc = sample().link();
        let group = doc.groups()[0].clone();

        drop(doc);

        assert!(group.owner().is_none());
        assert_eq!(group.effective_transform(), Transform::identity());
    }
}
