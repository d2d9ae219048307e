//! Independent region candidates proposed without cluster structure.

use crate::error::Error;
use crate::location::FeatureLocation;
use crate::record::CdsId;

/// A standalone region candidate from one tool, optionally scored with a
/// probability. The probability is carried through unchanged: absent stays
/// absent, it is never defaulted to zero.
#[derive(Debug, Clone)]
pub struct SubRegion {
    location: FeatureLocation,
    tool: String,
    probability: Option<f64>,
    cds_children: Vec<CdsId>,
}

impl SubRegion {
    pub fn new(
        location: FeatureLocation,
        tool: &str,
        probability: Option<f64>,
    ) -> Result<Self, Error> {
        if let Some(p) = probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Validation(format!(
                    "subregion probability out of range: {p}"
                )));
            }
        }
        Ok(Self {
            location,
            tool: tool.to_string(),
            probability,
            cds_children: Vec::new(),
        })
    }

    #[must_use]
    pub fn location(&self) -> FeatureLocation {
        self.location
    }

    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    #[must_use]
    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    #[must_use]
    pub fn cds_children(&self) -> &[CdsId] {
        &self.cds_children
    }

    pub(crate) fn push_cds(&mut self, id: CdsId) {
        self.cds_children.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand::Strand;

    fn span(start: i32, end: i32) -> FeatureLocation {
        FeatureLocation::new(start, end, Strand::Unknown).unwrap()
    }

    #[test]
    fn probability_is_optional() {
        let subregion = SubRegion::new(span(0, 10), "testtool", None).unwrap();
        assert_eq!(subregion.probability(), None);

        let scored = SubRegion::new(span(0, 10), "testtool", Some(0.7)).unwrap();
        assert_eq!(scored.probability(), Some(0.7));
    }

    #[test]
    fn probability_out_of_range_rejected() {
        assert!(SubRegion::new(span(0, 10), "testtool", Some(1.5)).is_err());
        assert!(SubRegion::new(span(0, 10), "testtool", Some(-0.1)).is_err());
    }
}
