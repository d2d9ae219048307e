//! Wire-level representation of a single annotated feature.
//!
//! The flat-file codec exchanges features in this generic form before the
//! typed kinds are built; qualifier order is preserved so output stays
//! deterministic.

use crate::error::Error;
use crate::location::FeatureLocation;

/// Qualifier-name to list-of-values mapping, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Qualifiers {
    entries: Vec<(String, Vec<String>)>,
}

impl Qualifiers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `name`, creating the entry on first use.
    pub fn push(&mut self, name: &str, value: &str) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            values.push(value.to_string());
        } else {
            self.entries
                .push((name.to_string(), vec![value.to_string()]));
        }
    }

    /// Extend the most recent value under `name` with a wrapped continuation
    /// segment. No-op if the entry is missing.
    pub(crate) fn append_to_last_value(&mut self, name: &str, text: &str) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            if let Some(last) = values.last_mut() {
                last.push(' ');
                last.push_str(text);
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// First value recorded under `name`, if any.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One feature-table entry: a span, a type tag, and its qualifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericFeature {
    pub location: FeatureLocation,
    pub feature_type: String,
    pub qualifiers: Qualifiers,
}

impl GenericFeature {
    #[must_use]
    pub fn new(location: FeatureLocation, feature_type: &str) -> Self {
        Self {
            location,
            feature_type: feature_type.to_string(),
            qualifiers: Qualifiers::new(),
        }
    }

    /// Copy of this feature shifted into record-local coordinates.
    pub fn translate(&self, offset: i32) -> Result<Self, Error> {
        Ok(Self {
            location: self.location.translate(offset)?,
            feature_type: self.feature_type.clone(),
            qualifiers: self.qualifiers.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand::Strand;

    #[test]
    fn qualifier_values_group_by_name() {
        let mut qualifiers = Qualifiers::new();
        qualifiers.push("product", "a");
        qualifiers.push("tool", "testing");
        qualifiers.push("product", "b");

        assert_eq!(
            qualifiers.get("product"),
            Some(["a".to_string(), "b".to_string()].as_slice())
        );
        assert_eq!(qualifiers.first("product"), Some("a"));
        assert_eq!(qualifiers.first("tool"), Some("testing"));
        assert_eq!(qualifiers.first("missing"), None);
    }

    #[test]
    fn insertion_order_preserved() {
        let mut qualifiers = Qualifiers::new();
        qualifiers.push("b", "1");
        qualifiers.push("a", "2");
        let names: Vec<&str> = qualifiers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn translate_moves_location_only() {
        let location = FeatureLocation::new(10, 20, Strand::Forward).unwrap();
        let mut feature = GenericFeature::new(location, "CDS");
        feature.qualifiers.push("locus_tag", "ctg1_1");

        let local = feature.translate(10).unwrap();
        assert_eq!(local.location.start(), 0);
        assert_eq!(local.location.end(), 10);
        assert_eq!(local.feature_type, "CDS");
        assert_eq!(local.qualifiers, feature.qualifiers);
    }
}
