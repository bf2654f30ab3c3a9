//! Tree nodes.
//!
//! A group's children are [`Node`]s, a sum type over nested groups and shapes.
//! Both kinds of node are reference-counted so that they can point back to
//! their enclosing group and their document with weak references, and so that
//! producer threads can hold on to the parts of the tree they are working on.

use std::sync::{Arc, Weak};

use crate::document::Document;
use crate::instructions::{InstructionProducer, Instructions, Paint};
use crate::shapes::ShapeKind;
use crate::structure::{Group, UnlinkedGroup};
use crate::transform::Transform;

/// A child of a group, before linking.
#[derive(Debug, Clone, PartialEq)]
pub enum UnlinkedNode {
    Group(UnlinkedGroup),
    Shape(ShapeKind),
}

/// A child of a group in a linked [`Document`].
#[derive(Debug, Clone)]
pub enum Node {
    Group(Arc<Group>),
    Shape(Arc<Shape>),
}

impl Node {
    pub fn as_group(&self) -> Option<&Arc<Group>> {
        match *self {
            Node::Group(ref g) => Some(g),
            Node::Shape(_) => None,
        }
    }

    pub fn as_shape(&self) -> Option<&Arc<Shape>> {
        match *self {
            Node::Shape(ref s) => Some(s),
            Node::Group(_) => None,
        }
    }

    pub(crate) fn unlink(&self) -> UnlinkedNode {
        match *self {
            Node::Group(ref g) => UnlinkedNode::Group(g.unlink()),
            Node::Shape(ref s) => UnlinkedNode::Shape(s.kind().clone()),
        }
    }
}

impl InstructionProducer for Node {
    fn instructions(&self) -> Instructions {
        match *self {
            Node::Group(ref g) => g.instructions(),
            Node::Shape(ref s) => s.instructions(),
        }
    }
}

/// A shape element in a linked [`Document`].
#[derive(Debug)]
pub struct Shape {
    kind: ShapeKind,
    group: Weak<Group>,
    owner: Weak<Document>,
}

impl Shape {
    pub(crate) fn new(kind: ShapeKind, group: Weak<Group>, owner: Weak<Document>) -> Arc<Shape> {
        Arc::new(Shape { kind, group, owner })
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// The group that contains this shape, or `None` for shapes directly under the document.
    pub fn group(&self) -> Option<Arc<Group>> {
        self.group.upgrade()
    }

    pub fn owner(&self) -> Option<Arc<Document>> {
        self.owner.upgrade()
    }

    /// Transform from the shape's user space to document coordinates.
    ///
    /// This is the shape's own transform, then those of the enclosing groups
    /// from the innermost one outwards, then the document's root transform.
    pub fn effective_transform(&self) -> Transform {
        let base = match self.group() {
            Some(group) => group.effective_transform(),
            None => self
                .owner()
                .map(|doc| doc.root_transform())
                .unwrap_or_default(),
        };

        base.pre_transform(&self.kind.attributes().transform)
    }

    /// The shape's paint, with unset fields inherited from the enclosing groups.
    pub fn paint(&self) -> Paint {
        let mut paint = self.kind.attributes().paint.clone();

        if let Some(group) = self.group() {
            paint.inherit_from(&group.paint());
        }

        paint
    }
}

impl InstructionProducer for Shape {
    fn instructions(&self) -> Instructions {
        Instructions::ready(self.kind.draw(&self.effective_transform(), self.paint()))
    }
}
