//! CDS features: the finest-grained annotated units in the hierarchy.

use crate::location::FeatureLocation;
use crate::record::RegionId;

/// A coding-sequence feature offered to a region for adoption.
///
/// `region` is a non-owning handle to the region that accepted this feature,
/// set once by successful propagation and used only for reverse lookup.
#[derive(Debug, Clone)]
pub struct CdsFeature {
    location: FeatureLocation,
    locus_tag: String,
    region: Option<RegionId>,
}

impl CdsFeature {
    #[must_use]
    pub fn new(location: FeatureLocation, locus_tag: &str) -> Self {
        Self {
            location,
            locus_tag: locus_tag.to_string(),
            region: None,
        }
    }

    #[must_use]
    pub fn location(&self) -> FeatureLocation {
        self.location
    }

    #[must_use]
    pub fn locus_tag(&self) -> &str {
        &self.locus_tag
    }

    /// The region this feature was accepted into, if any.
    #[must_use]
    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    /// Span containment against a container's derived location. Callers use
    /// this as a pre-check before offering the feature to a region.
    #[must_use]
    pub fn is_contained_by(&self, container: &FeatureLocation) -> bool {
        container.contains(&self.location)
    }

    pub(crate) fn set_region(&mut self, region: RegionId) {
        self.region = Some(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand::Strand;

    #[test]
    fn containment_pre_check() {
        let cds = CdsFeature::new(
            FeatureLocation::new(0, 10, Strand::Forward).unwrap(),
            "test_cds",
        );
        let envelope = FeatureLocation::new(0, 30, Strand::Unknown).unwrap();
        let elsewhere = FeatureLocation::new(50, 60, Strand::Unknown).unwrap();
        assert!(cds.is_contained_by(&envelope));
        assert!(!cds.is_contained_by(&elsewhere));
    }

    #[test]
    fn starts_without_a_region() {
        let cds = CdsFeature::new(
            FeatureLocation::new(0, 10, Strand::Forward).unwrap(),
            "test_cds",
        );
        assert!(cds.region().is_none());
    }
}
