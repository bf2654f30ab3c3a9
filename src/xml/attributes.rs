//! Store XML element attributes and their values.

use std::slice;

use ::xml::attribute::OwnedAttribute;

/// Iterable list of the attributes of an element.
///
/// Only attributes without a namespace prefix are kept; the elements this
/// crate knows about have no prefixed attributes that matter for geometry.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    attrs: Box<[(String, String)]>,
}

/// Iterator from `Attributes.iter`.
pub struct AttributesIter<'a>(slice::Iter<'a, (String, String)>);

impl Attributes {
    pub fn new_from_xml_attributes(attributes: Vec<OwnedAttribute>) -> Attributes {
        attributes
            .into_iter()
            .filter(|a| a.name.prefix.is_none())
            .map(|a| (a.name.local_name, a.value))
            .collect()
    }

    /// Creates an iterator that yields `(&str, &str)` tuples of attribute names and values.
    pub fn iter(&self) -> AttributesIter<'_> {
        AttributesIter(self.attrs.iter())
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Attributes {
            attrs: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl<'a> Iterator for AttributesIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(a, v)| (a.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::xml::name::OwnedName;

    #[test]
    fn empty_attributes() {
        let map = Attributes::new_from_xml_attributes(Vec::new());
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn drops_prefixed_attributes() {
        let map = Attributes::new_from_xml_attributes(vec![
            OwnedAttribute::new(OwnedName::local("width"), "10"),
            OwnedAttribute::new(OwnedName::qualified("href", "http://www.w3.org/1999/xlink", Some("xlink")), "#a"),
            OwnedAttribute::new(OwnedName::local("height"), "20"),
        ]);

        assert!(map.iter().eq(vec![("width", "10"), ("height", "20")]));
    }
}
