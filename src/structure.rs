//! The `<g>` element.

use std::sync::{Arc, Weak};

use crate::document::Document;
use crate::error::{AttributeResultExt, LoadingError};
use crate::instructions::{self, InstructionProducer, Instructions, Paint};
use crate::node::{Node, Shape, UnlinkedNode};
use crate::session::Session;
use crate::transform::{parse_transform_attribute, Transform};
use crate::xml::Attributes;

/// A group as produced by the decoder, without any back-references.
///
/// `transform` is `None` when the element had no `transform` attribute, and the
/// identity when the attribute could not be parsed.  Linking turns `None` into
/// the identity as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnlinkedGroup {
    pub id: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<i32>,
    pub fill: Option<String>,
    pub fill_rule: Option<String>,
    /// Text of the `transform` attribute, as written.
    pub transform_attr: Option<String>,
    pub transform: Option<Transform>,
    pub children: Vec<UnlinkedNode>,
}

impl UnlinkedGroup {
    /// Reads the group's own attributes.
    ///
    /// An invalid `stroke-width` is an error; an invalid `transform` is only a warning.
    pub(crate) fn from_attributes(
        attrs: &Attributes,
        session: &Session,
    ) -> Result<UnlinkedGroup, LoadingError> {
        let mut group = UnlinkedGroup::default();

        for (attr, value) in attrs.iter() {
            match attr {
                "id" => group.id = Some(value.to_string()),
                "stroke" => group.stroke = Some(value.to_string()),
                "stroke-width" => group.stroke_width = Some(value.parse::<i32>().attribute(attr)?),
                "fill" => group.fill = Some(value.to_string()),
                "fill-rule" => group.fill_rule = Some(value.to_string()),
                "transform" => {
                    group.transform = Some(parse_transform_attribute("g", value, session));
                    group.transform_attr = Some(value.to_string());
                }
                _ => (),
            }
        }

        Ok(group)
    }

    /// Builds the linked group and its subtree, depth first.
    pub(crate) fn link(self, parent: &Weak<Group>, owner: &Weak<Document>) -> Arc<Group> {
        let UnlinkedGroup {
            id,
            stroke,
            stroke_width,
            fill,
            fill_rule,
            transform_attr,
            transform,
            children,
        } = self;

        Arc::new_cyclic(|me| Group {
            id,
            stroke,
            stroke_width,
            fill,
            fill_rule,
            transform_attr,
            transform: transform.unwrap_or_default(),
            children: children
                .into_iter()
                .map(|child| match child {
                    UnlinkedNode::Group(g) => Node::Group(g.link(me, owner)),
                    UnlinkedNode::Shape(kind) => Node::Shape(Shape::new(kind, me.clone(), owner.clone())),
                })
                .collect(),
            parent: parent.clone(),
            owner: owner.clone(),
        })
    }
}

/// A group in a linked [`Document`].
#[derive(Debug)]
pub struct Group {
    id: Option<String>,
    stroke: Option<String>,
    stroke_width: Option<i32>,
    fill: Option<String>,
    fill_rule: Option<String>,
    transform_attr: Option<String>,
    transform: Transform,
    children: Vec<Node>,
    parent: Weak<Group>,
    owner: Weak<Document>,
}

impl Group {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn stroke(&self) -> Option<&str> {
        self.stroke.as_deref()
    }

    pub fn stroke_width(&self) -> Option<i32> {
        self.stroke_width
    }

    pub fn fill(&self) -> Option<&str> {
        self.fill.as_deref()
    }

    pub fn fill_rule(&self) -> Option<&str> {
        self.fill_rule.as_deref()
    }

    pub fn transform_attr(&self) -> Option<&str> {
        self.transform_attr.as_deref()
    }

    /// The group's own transform; identity if it had none or it was invalid.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Children in declaration order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The enclosing group, or `None` for groups directly under the document.
    pub fn parent(&self) -> Option<Arc<Group>> {
        self.parent.upgrade()
    }

    /// The document this group belongs to.
    ///
    /// This is only `None` if the document has been dropped while something
    /// else still holds on to the group.
    pub fn owner(&self) -> Option<Arc<Document>> {
        self.owner.upgrade()
    }

    /// Transform from the group's user space to document coordinates.
    pub fn effective_transform(&self) -> Transform {
        let mut t = self.transform;
        let mut parent = self.parent();

        while let Some(group) = parent {
            t = t.post_transform(&group.transform);
            parent = group.parent();
        }

        let root = self
            .owner()
            .map(|doc| doc.root_transform())
            .unwrap_or_default();

        t.post_transform(&root)
    }

    /// The group's paint, with unset fields inherited from the enclosing groups.
    pub fn paint(&self) -> Paint {
        let mut paint = self.own_paint();
        let mut parent = self.parent();

        while let Some(group) = parent {
            paint.inherit_from(&group.own_paint());
            parent = group.parent();
        }

        paint
    }

    fn own_paint(&self) -> Paint {
        Paint {
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width.map(f64::from),
            fill: self.fill.clone(),
            fill_rule: self.fill_rule.clone(),
        }
    }

    /// Copies the group's content into an unlinked group, dropping the back-references.
    pub fn unlink(&self) -> UnlinkedGroup {
        UnlinkedGroup {
            id: self.id.clone(),
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
            fill: self.fill.clone(),
            fill_rule: self.fill_rule.clone(),
            transform_attr: self.transform_attr.clone(),
            transform: Some(self.transform),
            children: self.children.iter().map(Node::unlink).collect(),
        }
    }
}

impl InstructionProducer for Group {
    /// Starts a producer that forwards the children's instructions in declaration order.
    ///
    /// The stream is a rendezvous: the producer waits for each instruction to be
    /// read before making the next one available.
    fn instructions(&self) -> Instructions {
        instructions::forward_children("svgdraw-group", 0, self.children.clone(), self.owner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueErrorKind;

    fn attributes(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn reads_group_attributes() {
        let session = Session::new_for_test_suite();
        let group = UnlinkedGroup::from_attributes(
            &attributes(&[
                ("id", "layer1"),
                ("stroke", "black"),
                ("stroke-width", "3"),
                ("fill", "none"),
                ("fill-rule", "evenodd"),
                ("transform", "translate(5)"),
                ("opacity", "0.5"),
            ]),
            &session,
        )
        .unwrap();

        assert_eq!(group.id.as_deref(), Some("layer1"));
        assert_eq!(group.stroke.as_deref(), Some("black"));
        assert_eq!(group.stroke_width, Some(3));
        assert_eq!(group.fill.as_deref(), Some("none"));
        assert_eq!(group.fill_rule.as_deref(), Some("evenodd"));
        assert_eq!(group.transform_attr.as_deref(), Some("translate(5)"));
        assert_eq!(group.transform, Some(Transform::new_translate(5.0, 0.0)));
        assert!(group.children.is_empty());
        assert_eq!(session.warnings(), 0);
    }

    #[test]
    fn non_integer_stroke_width_is_an_error() {
        let session = Session::new_for_test_suite();

        for value in ["thick", "1.5", ""] {
            let res = UnlinkedGroup::from_attributes(&attributes(&[("stroke-width", value)]), &session);

            match res {
                Err(LoadingError::BadAttribute(e)) => {
                    assert_eq!(e.attr, "stroke-width");
                    assert!(matches!(e.err, ValueErrorKind::Parse(_)));
                }
                other => panic!("expected BadAttribute for {value:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_transform_is_identity_and_warns() {
        let session = Session::new_for_test_suite();
        let group =
            UnlinkedGroup::from_attributes(&attributes(&[("transform", "rotate(")]), &session).unwrap();

        assert_eq!(group.transform, Some(Transform::identity()));
        assert_eq!(group.transform_attr.as_deref(), Some("rotate("));
        assert_eq!(session.warnings(), 1);
    }

    #[test]
    fn missing_transform_stays_unset_until_linked() {
        let session = Session::new_for_test_suite();
        let group = UnlinkedGroup::from_attributes(&Attributes::default(), &session).unwrap();
        assert_eq!(group.transform, None);

        let linked = group.link(&Weak::new(), &Weak::new());
        assert_eq!(linked.transform(), Transform::identity());
        assert!(linked.parent().is_none());
        assert!(linked.owner().is_none());
    }

    #[test]
    fn paint_is_inherited_from_enclosing_groups() {
        let inner = UnlinkedGroup {
            fill: Some("red".to_string()),
            ..UnlinkedGroup::default()
        };
        let outer = UnlinkedGroup {
            stroke: Some("black".to_string()),
            stroke_width: Some(2),
            fill: Some("blue".to_string()),
            children: vec![UnlinkedNode::Group(inner)],
            ..UnlinkedGroup::default()
        };

        let outer = outer.link(&Weak::new(), &Weak::new());
        let inner = outer.children()[0].as_group().unwrap();

        assert!(Arc::ptr_eq(&inner.parent().unwrap(), &outer));
        assert_eq!(
            inner.paint(),
            Paint {
                stroke: Some("black".to_string()),
                stroke_width: Some(2.0),
                fill: Some("red".to_string()),
                fill_rule: None,
            }
        );
    }
}
