//! Leaf region candidates and their typed aggregations.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::location::FeatureLocation;
use crate::record::{CdsId, ClusterId};

/// A region candidate detected by a single tool, with its detection metadata.
///
/// `cds_children` grows only through region-level propagation and entries are
/// never removed.
#[derive(Debug, Clone)]
pub struct Cluster {
    location: FeatureLocation,
    neighbourhood_location: FeatureLocation,
    tool: String,
    product: String,
    cutoff: f64,
    neighbourhood_range: i32,
    detection_rule: String,
    cds_children: Vec<CdsId>,
}

impl Cluster {
    /// Create a leaf candidate. `neighbourhood_location` is the detected span
    /// possibly extended by the neighbourhood range and must contain it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        location: FeatureLocation,
        neighbourhood_location: FeatureLocation,
        tool: &str,
        product: &str,
        cutoff: f64,
        neighbourhood_range: i32,
        detection_rule: &str,
    ) -> Result<Self, Error> {
        if !neighbourhood_location.contains(&location) {
            return Err(Error::Validation(format!(
                "cluster neighbourhood {}..{} does not contain core {}..{}",
                neighbourhood_location.start(),
                neighbourhood_location.end(),
                location.start(),
                location.end()
            )));
        }
        Ok(Self {
            location,
            neighbourhood_location,
            tool: tool.to_string(),
            product: product.to_string(),
            cutoff,
            neighbourhood_range,
            detection_rule: detection_rule.to_string(),
            cds_children: Vec::new(),
        })
    }

    #[must_use]
    pub fn location(&self) -> FeatureLocation {
        self.location
    }

    #[must_use]
    pub fn neighbourhood_location(&self) -> FeatureLocation {
        self.neighbourhood_location
    }

    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    #[must_use]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    #[must_use]
    pub fn neighbourhood_range(&self) -> i32 {
        self.neighbourhood_range
    }

    #[must_use]
    pub fn detection_rule(&self) -> &str {
        &self.detection_rule
    }

    #[must_use]
    pub fn cds_children(&self) -> &[CdsId] {
        &self.cds_children
    }

    pub(crate) fn push_cds(&mut self, id: CdsId) {
        self.cds_children.push(id);
    }
}

/// How a supercluster groups its member candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperClusterKind {
    /// Exactly one candidate.
    Single,
    /// Two or more candidates with overlapping cores.
    Interleaved,
    /// Two or more candidates merged across a neighbourhood gap.
    Neighbouring,
}

impl SuperClusterKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Interleaved => "interleaved",
            Self::Neighbouring => "neighbouring",
        }
    }
}

impl fmt::Display for SuperClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuperClusterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "interleaved" => Ok(Self::Interleaved),
            "neighbouring" => Ok(Self::Neighbouring),
            other => Err(Error::Parse(format!("invalid supercluster kind: '{other}'"))),
        }
    }
}

/// A typed grouping of one or more leaf candidates.
///
/// Location and CDS children are union views over the current member state,
/// recomputed on demand. Members are fixed after construction.
#[derive(Debug, Clone)]
pub struct SuperCluster {
    kind: SuperClusterKind,
    members: Vec<ClusterId>,
}

impl SuperCluster {
    /// Validates that members exist and their count matches the kind:
    /// `Single` takes exactly one member, grouped kinds take two or more.
    pub fn new(
        kind: SuperClusterKind,
        members: Vec<ClusterId>,
        clusters: &[Cluster],
    ) -> Result<Self, Error> {
        if members.is_empty() {
            return Err(Error::Validation(
                "a supercluster requires at least one member cluster".to_string(),
            ));
        }
        for member in &members {
            if member.0 >= clusters.len() {
                return Err(Error::Validation(format!(
                    "supercluster member #{} is not registered on this record",
                    member.0
                )));
            }
        }
        match kind {
            SuperClusterKind::Single if members.len() != 1 => {
                return Err(Error::Validation(format!(
                    "a single-kind supercluster takes exactly one member, got {}",
                    members.len()
                )));
            }
            SuperClusterKind::Interleaved | SuperClusterKind::Neighbouring
                if members.len() < 2 =>
            {
                return Err(Error::Validation(format!(
                    "a {kind} supercluster takes at least two members, got {}",
                    members.len()
                )));
            }
            _ => {}
        }
        Ok(Self { kind, members })
    }

    #[must_use]
    pub fn kind(&self) -> SuperClusterKind {
        self.kind
    }

    #[must_use]
    pub fn members(&self) -> &[ClusterId] {
        &self.members
    }

    /// Union envelope of the member locations.
    #[must_use]
    pub fn location(&self, clusters: &[Cluster]) -> FeatureLocation {
        let mut members = self.members.iter();
        // members is non-empty by construction
        let first = clusters[members.next().unwrap().0].location();
        members.fold(first, |envelope, member| {
            envelope.union(&clusters[member.0].location())
        })
    }

    /// Union of the member CDS children, first occurrence order, de-duplicated.
    #[must_use]
    pub fn cds_children(&self, clusters: &[Cluster]) -> Vec<CdsId> {
        let mut children: Vec<CdsId> = Vec::new();
        for member in &self.members {
            for &cds in clusters[member.0].cds_children() {
                if !children.contains(&cds) {
                    children.push(cds);
                }
            }
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand::Strand;

    fn make_cluster(start: i32, end: i32, product: &str) -> Cluster {
        let location = FeatureLocation::new(start, end, Strand::Unknown).unwrap();
        Cluster::new(location, location, "testing", product, 1.0, 0, "some rule text").unwrap()
    }

    #[test]
    fn neighbourhood_must_contain_core() {
        let core = FeatureLocation::new(10, 20, Strand::Unknown).unwrap();
        let neighbourhood = FeatureLocation::new(12, 30, Strand::Unknown).unwrap();
        assert!(Cluster::new(core, neighbourhood, "t", "p", 1.0, 0, "r").is_err());

        let wider = FeatureLocation::new(0, 40, Strand::Unknown).unwrap();
        assert!(Cluster::new(core, wider, "t", "p", 1.0, 20, "r").is_ok());
    }

    #[test]
    fn single_kind_cardinality() {
        let clusters = vec![make_cluster(0, 10, "a"), make_cluster(20, 30, "b")];
        assert!(SuperCluster::new(SuperClusterKind::Single, vec![ClusterId(0)], &clusters).is_ok());
        assert!(
            SuperCluster::new(
                SuperClusterKind::Single,
                vec![ClusterId(0), ClusterId(1)],
                &clusters
            )
            .is_err()
        );
    }

    #[test]
    fn grouped_kind_cardinality() {
        let clusters = vec![make_cluster(0, 10, "a"), make_cluster(20, 30, "b")];
        assert!(
            SuperCluster::new(SuperClusterKind::Neighbouring, vec![ClusterId(0)], &clusters)
                .is_err()
        );
        assert!(
            SuperCluster::new(
                SuperClusterKind::Neighbouring,
                vec![ClusterId(0), ClusterId(1)],
                &clusters
            )
            .is_ok()
        );
    }

    #[test]
    fn empty_members_rejected() {
        let clusters: Vec<Cluster> = Vec::new();
        assert!(SuperCluster::new(SuperClusterKind::Single, Vec::new(), &clusters).is_err());
    }

    #[test]
    fn unregistered_member_rejected() {
        let clusters = vec![make_cluster(0, 10, "a")];
        assert!(
            SuperCluster::new(SuperClusterKind::Single, vec![ClusterId(5)], &clusters).is_err()
        );
    }

    #[test]
    fn union_envelope_over_members() {
        let clusters = vec![make_cluster(3, 20, "a"), make_cluster(25, 41, "b")];
        let supercluster = SuperCluster::new(
            SuperClusterKind::Neighbouring,
            vec![ClusterId(0), ClusterId(1)],
            &clusters,
        )
        .unwrap();
        let envelope = supercluster.location(&clusters);
        assert_eq!(envelope.start(), 3);
        assert_eq!(envelope.end(), 41);
    }

    #[test]
    fn kind_string_round_trip() {
        for kind in [
            SuperClusterKind::Single,
            SuperClusterKind::Interleaved,
            SuperClusterKind::Neighbouring,
        ] {
            assert_eq!(kind.as_str().parse::<SuperClusterKind>().unwrap(), kind);
        }
        assert!("chained".parse::<SuperClusterKind>().is_err());
    }
}
