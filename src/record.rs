//! Parent record owning the annotated-feature hierarchy.
//!
//! All features live in per-kind arenas on the record; hierarchy edges are
//! index handles, so a handle can never keep its target alive and cross-arena
//! mutation stays behind `&mut Record`.

use crate::cds::CdsFeature;
use crate::cluster::{Cluster, SuperCluster, SuperClusterKind};
use crate::error::Error;
use crate::location::FeatureLocation;
use crate::region::Region;
use crate::subregion::SubRegion;

/// Handle to a [`Cluster`] registered on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(pub(crate) usize);

/// Handle to a [`SuperCluster`] registered on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuperClusterId(pub(crate) usize);

/// Handle to a [`SubRegion`] registered on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubRegionId(pub(crate) usize);

/// Handle to a [`Region`] registered on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub(crate) usize);

/// Handle to a [`CdsFeature`] registered on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CdsId(pub(crate) usize);

impl RegionId {
    /// 1-based number used in file output.
    #[must_use]
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

/// A sequence record and every feature annotated on it.
#[derive(Debug, Default)]
pub struct Record {
    id: String,
    sequence: Vec<u8>,
    clusters: Vec<Cluster>,
    superclusters: Vec<SuperCluster>,
    subregions: Vec<SubRegion>,
    regions: Vec<Region>,
    cds_features: Vec<CdsFeature>,
}

impl Record {
    #[must_use]
    pub fn new(id: &str, sequence: Vec<u8>) -> Self {
        Self {
            id: id.to_string(),
            sequence,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    // ── Registration ─────────────────────────────────────

    pub fn add_cluster(&mut self, cluster: Cluster) -> ClusterId {
        self.clusters.push(cluster);
        ClusterId(self.clusters.len() - 1)
    }

    /// Group registered clusters into a supercluster. Fails on empty or
    /// unregistered members and on kind/cardinality mismatch.
    pub fn add_supercluster(
        &mut self,
        kind: SuperClusterKind,
        members: Vec<ClusterId>,
    ) -> Result<SuperClusterId, Error> {
        let supercluster = SuperCluster::new(kind, members, &self.clusters)?;
        self.superclusters.push(supercluster);
        Ok(SuperClusterId(self.superclusters.len() - 1))
    }

    pub fn add_subregion(&mut self, subregion: SubRegion) -> SubRegionId {
        self.subregions.push(subregion);
        SubRegionId(self.subregions.len() - 1)
    }

    /// Build a region over previously registered children. The child lists are
    /// fixed for the region's lifetime; at least one entry is required across
    /// the two, and every handle must belong to this record.
    pub fn add_region(
        &mut self,
        superclusters: Vec<SuperClusterId>,
        subregions: Vec<SubRegionId>,
    ) -> Result<RegionId, Error> {
        for id in &superclusters {
            if id.0 >= self.superclusters.len() {
                return Err(Error::Validation(format!(
                    "supercluster #{} is not registered on this record",
                    id.0
                )));
            }
        }
        for id in &subregions {
            if id.0 >= self.subregions.len() {
                return Err(Error::Validation(format!(
                    "subregion #{} is not registered on this record",
                    id.0
                )));
            }
        }
        let region = Region::new(superclusters, subregions)?;
        self.regions.push(region);
        Ok(RegionId(self.regions.len() - 1))
    }

    // ── Access ───────────────────────────────────────────

    #[must_use]
    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0]
    }

    #[must_use]
    pub fn supercluster(&self, id: SuperClusterId) -> &SuperCluster {
        &self.superclusters[id.0]
    }

    #[must_use]
    pub fn subregion(&self, id: SubRegionId) -> &SubRegion {
        &self.subregions[id.0]
    }

    #[must_use]
    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }

    #[must_use]
    pub fn cds(&self, id: CdsId) -> &CdsFeature {
        &self.cds_features[id.0]
    }

    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        (0..self.regions.len()).map(RegionId)
    }

    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    // ── Derived views ────────────────────────────────────

    /// Union envelope of a supercluster's member locations.
    #[must_use]
    pub fn supercluster_location(&self, id: SuperClusterId) -> FeatureLocation {
        self.superclusters[id.0].location(&self.clusters)
    }

    /// Ordered, de-duplicated union of a supercluster's member CDS children.
    #[must_use]
    pub fn supercluster_cds_children(&self, id: SuperClusterId) -> Vec<CdsId> {
        self.superclusters[id.0].cds_children(&self.clusters)
    }

    /// Union envelope of all the region's supercluster and subregion locations.
    #[must_use]
    pub fn region_location(&self, id: RegionId) -> FeatureLocation {
        let region = &self.regions[id.0];
        let mut envelope: Option<FeatureLocation> = None;
        for supercluster in region.superclusters() {
            let location = self.supercluster_location(*supercluster);
            envelope = Some(match envelope {
                Some(e) => e.union(&location),
                None => location,
            });
        }
        for subregion in region.subregions() {
            let location = self.subregions[subregion.0].location();
            envelope = Some(match envelope {
                Some(e) => e.union(&location),
                None => location,
            });
        }
        // a region has at least one child by construction
        envelope.unwrap()
    }

    /// Sorted, de-duplicated product labels of every cluster reachable through
    /// the region's superclusters. Subregions contribute no product.
    #[must_use]
    pub fn region_products(&self, id: RegionId) -> Vec<String> {
        let mut products: Vec<String> = Vec::new();
        for supercluster in self.regions[id.0].superclusters() {
            for member in self.superclusters[supercluster.0].members() {
                products.push(self.clusters[member.0].product().to_string());
            }
        }
        products.sort();
        products.dedup();
        products
    }

    /// Product labels joined with `-` for display and file headers.
    #[must_use]
    pub fn region_product_string(&self, id: RegionId) -> String {
        self.region_products(id).join("-")
    }

    /// Subregion probabilities in subregion order; unset probabilities are
    /// excluded entirely, never coerced to a default.
    #[must_use]
    pub fn region_probabilities(&self, id: RegionId) -> Vec<f64> {
        self.regions[id.0]
            .subregions()
            .iter()
            .filter_map(|subregion| self.subregions[subregion.0].probability())
            .collect()
    }

    // ── Propagation ──────────────────────────────────────

    /// Offer a CDS feature to a region, threading it into every containing
    /// child and recording the back-reference.
    ///
    /// The feature must lie within the region's envelope; that check failing is
    /// a caller error and leaves the record untouched. Past it, attachment
    /// cannot partially fail: child containment is an if-check, never an error.
    /// Calling twice with the same feature duplicates it in every matching
    /// collection.
    pub fn add_cds(&mut self, region: RegionId, cds: CdsFeature) -> Result<CdsId, Error> {
        let envelope = self.region_location(region);
        if !cds.is_contained_by(&envelope) {
            return Err(Error::Validation(format!(
                "CDS '{}' at {}..{} is not contained by region {} ({}..{})",
                cds.locus_tag(),
                cds.location().start(),
                cds.location().end(),
                region.number(),
                envelope.start(),
                envelope.end()
            )));
        }

        let location = cds.location();
        let id = CdsId(self.cds_features.len());
        self.cds_features.push(cds);

        // Containment is decided leaf by leaf: a feature can sit inside a
        // supercluster envelope yet in the gap between its members, in which
        // case no leaf receives it.
        let superclusters = self.regions[region.0].superclusters().to_vec();
        for supercluster in superclusters {
            if !self.supercluster_location(supercluster).contains(&location) {
                continue;
            }
            let members = self.superclusters[supercluster.0].members().to_vec();
            for member in members {
                if self.clusters[member.0].location().contains(&location) {
                    self.clusters[member.0].push_cds(id);
                }
            }
        }

        let subregions = self.regions[region.0].subregions().to_vec();
        for subregion in subregions {
            if self.subregions[subregion.0].location().contains(&location) {
                self.subregions[subregion.0].push_cds(id);
            }
        }

        self.regions[region.0].push_cds(id);
        self.cds_features[id.0].set_region(region);
        Ok(id)
    }
}
