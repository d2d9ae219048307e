//! Gene-finder collaborator interface.
//!
//! The prediction tool itself runs elsewhere; this core consumes its output as
//! a stream of coordinate tuples and turns the contained ones into CDS
//! features on a region.

use crate::cds::CdsFeature;
use crate::error::Error;
use crate::location::FeatureLocation;
use crate::record::{CdsId, Record, RegionId};
use crate::strand::Strand;

/// One predicted gene in the tool's 1-based, inclusive coordinate convention.
#[derive(Debug, Clone, PartialEq)]
pub struct GenePrediction {
    name: String,
    start: i32,
    end: i32,
    strand: Strand,
}

impl GenePrediction {
    /// A start greater than its end marks a reverse-strand gene reported
    /// back-to-front; the pair is swapped and the strand forced to reverse.
    #[must_use]
    pub fn new(name: &str, start: i32, end: i32, strand: Strand) -> Self {
        let (start, end, strand) = if start > end {
            (end, start, Strand::Reverse)
        } else {
            (start, end, strand)
        };
        Self {
            name: name.to_string(),
            start,
            end,
            strand,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Convert to a CDS feature in 0-based half-open coordinates, tagged
    /// `ctg{record_index}_{name}`.
    pub fn to_cds(&self, record_index: usize) -> Result<CdsFeature, Error> {
        let location = FeatureLocation::new(self.start - 1, self.end, self.strand)?;
        Ok(CdsFeature::new(
            location,
            &format!("ctg{}_{}", record_index, self.name),
        ))
    }
}

impl Record {
    /// Attach every prediction contained in the region's envelope, skipping
    /// the rest. Returns the adopted handles in input order.
    pub fn adopt_predictions<I>(
        &mut self,
        region: RegionId,
        record_index: usize,
        predictions: I,
    ) -> Result<Vec<CdsId>, Error>
    where
        I: IntoIterator<Item = GenePrediction>,
    {
        let envelope = self.region_location(region);
        let mut adopted = Vec::new();
        for prediction in predictions {
            let cds = prediction.to_cds(record_index)?;
            if !cds.is_contained_by(&envelope) {
                continue;
            }
            adopted.push(self.add_cds(region, cds)?);
        }
        Ok(adopted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Cluster, SuperClusterKind};

    fn span(start: i32, end: i32) -> FeatureLocation {
        FeatureLocation::new(start, end, Strand::Unknown).unwrap()
    }

    #[test]
    fn reversed_pair_swapped_onto_reverse_strand() {
        let prediction = GenePrediction::new("2", 300, 100, Strand::Forward);
        let cds = prediction.to_cds(1).unwrap();
        assert_eq!(cds.location().start(), 99);
        assert_eq!(cds.location().end(), 300);
        assert_eq!(cds.location().strand(), Strand::Reverse);
    }

    #[test]
    fn one_based_coordinates_converted() {
        let prediction = GenePrediction::new("1", 1, 90, Strand::Forward);
        let cds = prediction.to_cds(3).unwrap();
        assert_eq!(cds.location().start(), 0);
        assert_eq!(cds.location().end(), 90);
        assert_eq!(cds.locus_tag(), "ctg3_1");
    }

    #[test]
    fn adoption_filters_by_envelope() {
        let mut record = Record::new("r", Vec::new());
        let location = span(0, 100);
        let cluster = record.add_cluster(
            Cluster::new(location, location, "testing", "a", 1.0, 0, "rule").unwrap(),
        );
        let supercluster = record
            .add_supercluster(SuperClusterKind::Single, vec![cluster])
            .unwrap();
        let region = record.add_region(vec![supercluster], Vec::new()).unwrap();

        let predictions = vec![
            GenePrediction::new("1", 1, 60, Strand::Forward),
            GenePrediction::new("2", 150, 240, Strand::Forward), // outside
            GenePrediction::new("3", 90, 20, Strand::Forward),   // reversed pair
        ];
        let adopted = record.adopt_predictions(region, 1, predictions).unwrap();

        assert_eq!(adopted.len(), 2);
        assert_eq!(record.region(region).cds_children().len(), 2);
        assert_eq!(record.cds(adopted[0]).locus_tag(), "ctg1_1");
        assert_eq!(record.cds(adopted[1]).locus_tag(), "ctg1_3");
        assert_eq!(
            record.cds(adopted[1]).location().strand(),
            Strand::Reverse
        );
    }
}
