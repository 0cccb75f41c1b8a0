#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Greedy proximity clustering of incidents into hotspots.
//!
//! Clusters are formed in a single pass: each coordinate-bearing incident
//! joins the first existing cluster whose anchor lies strictly within the
//! radius, or else anchors a new cluster. Anchors are never re-centered, so
//! a cluster's position is always that of the incident that seeded it.
//!
//! Distances are plain Euclidean distances in degree space, not geodesic.
//! At the default radius of `0.01°` this is roughly 1.1 km at the equator.

pub mod render;

use crime_spotter_incident_models::Incident;
use geo::{Distance as _, Euclidean, Point};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default clustering radius in degrees.
pub const DEFAULT_CLUSTER_RADIUS: f64 = 0.01;

/// Hotspot severity derived from the number of incidents in a cluster.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SeverityTier {
    /// Fewer than 5 incidents.
    Low,
    /// 5 to 9 incidents.
    Medium,
    /// 10 or more incidents.
    High,
}

impl SeverityTier {
    /// Classifies a cluster size. Lower bounds are inclusive.
    #[must_use]
    pub const fn from_count(count: u64) -> Self {
        if count >= 10 {
            Self::High
        } else if count >= 5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Radius of the hotspot circle drawn on the map, in meters.
    #[must_use]
    pub const fn radius_meters(self) -> u32 {
        match self {
            Self::High => 1000,
            Self::Medium => 700,
            Self::Low => 300,
        }
    }

    /// Color name of the hotspot circle.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => "red",
            Self::Medium => "yellow",
            Self::Low => "green",
        }
    }
}

/// A group of spatially proximate incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Latitude of the anchor (the incident that seeded the cluster).
    pub centroid_latitude: f64,
    /// Longitude of the anchor.
    pub centroid_longitude: f64,
    /// Number of incidents absorbed, including the anchor.
    pub count: u64,
    /// Severity tier for `count`.
    pub severity_tier: SeverityTier,
    /// Map circle radius for the tier, in meters.
    pub radius_meters: u32,
    /// Map circle color for the tier.
    pub color: String,
}

impl Cluster {
    fn seeded_at(anchor: Point<f64>) -> Self {
        let tier = SeverityTier::from_count(1);
        Self {
            centroid_latitude: anchor.y(),
            centroid_longitude: anchor.x(),
            count: 1,
            severity_tier: tier,
            radius_meters: tier.radius_meters(),
            color: tier.color().to_string(),
        }
    }

    /// The anchor as a `geo` point (`x` = longitude, `y` = latitude).
    #[must_use]
    pub fn anchor(&self) -> Point<f64> {
        Point::new(self.centroid_longitude, self.centroid_latitude)
    }

    fn absorb(&mut self) {
        self.count += 1;
        let tier = SeverityTier::from_count(self.count);
        if tier != self.severity_tier {
            self.severity_tier = tier;
            self.radius_meters = tier.radius_meters();
            self.color = tier.color().to_string();
        }
    }
}

/// Groups incidents into hotspots with the greedy single-pass rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialClusterer {
    radius: f64,
}

impl Default for SpatialClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_RADIUS)
    }
}

impl SpatialClusterer {
    /// Creates a clusterer with the given radius in degrees.
    #[must_use]
    pub const fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// The clustering radius in degrees.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Clusters the coordinate-bearing incidents, in iteration order.
    ///
    /// Incidents without coordinates are skipped.
    pub fn cluster<'a>(&self, incidents: impl IntoIterator<Item = &'a Incident>) -> Vec<Cluster> {
        self.cluster_points(incidents.into_iter().filter_map(Incident::coordinates))
    }

    /// Clusters raw `(latitude, longitude)` pairs, in iteration order.
    ///
    /// Each point joins the first cluster (in creation order) whose anchor
    /// is strictly closer than the radius, even if a later cluster would be
    /// nearer. Feeding the same points in a different order can therefore
    /// produce different clusters.
    pub fn cluster_points(&self, points: impl IntoIterator<Item = (f64, f64)>) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = Vec::new();

        for (lat, lng) in points {
            let point = Point::new(lng, lat);
            let target = clusters
                .iter_mut()
                .find(|cluster| Euclidean.distance(cluster.anchor(), point) < self.radius);

            match target {
                Some(cluster) => cluster.absorb(),
                None => clusters.push(Cluster::seeded_at(point)),
            }
        }

        log::debug!(
            "Formed {} clusters at radius {}",
            clusters.len(),
            self.radius
        );

        clusters
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crime_spotter_incident_models::{IncidentId, TimestampSource};

    use super::*;

    fn incident(location: &str, coords: Option<(f64, f64)>) -> Incident {
        Incident {
            id: IncidentId::new(location),
            crime_type: "Theft".to_string(),
            location: location.to_string(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            timestamp: Utc::now(),
            timestamp_source: TimestampSource::Date,
            description: None,
        }
    }

    #[test]
    fn tier_thresholds_are_inclusive() {
        assert_eq!(SeverityTier::from_count(1), SeverityTier::Low);
        assert_eq!(SeverityTier::from_count(4), SeverityTier::Low);
        assert_eq!(SeverityTier::from_count(5), SeverityTier::Medium);
        assert_eq!(SeverityTier::from_count(9), SeverityTier::Medium);
        assert_eq!(SeverityTier::from_count(10), SeverityTier::High);
        assert_eq!(SeverityTier::High.radius_meters(), 1000);
        assert_eq!(SeverityTier::Medium.color(), "yellow");
        assert_eq!(SeverityTier::Low.to_string(), "low");
    }

    #[test]
    fn no_spatial_incidents_yields_no_clusters() {
        let incidents = [incident("a", None), incident("b", None)];
        assert!(SpatialClusterer::default().cluster(&incidents).is_empty());
    }

    #[test]
    fn single_incident_is_one_low_cluster() {
        let incidents = [incident("Guindy", Some((13.0, 80.22)))];
        let clusters = SpatialClusterer::default().cluster(&incidents);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 1);
        assert_eq!(clusters[0].severity_tier, SeverityTier::Low);
        assert_eq!(clusters[0].radius_meters, 300);
    }

    #[test]
    fn groups_nearby_incidents_around_first_anchor() {
        let incidents = [
            incident("Guindy", Some((13.00, 80.22))),
            incident("Guindy Signal", Some((13.001, 80.221))),
            incident("Anna Nagar", Some((13.08, 80.21))),
        ];
        let clusters = SpatialClusterer::new(0.01).cluster(&incidents);
        assert_eq!(clusters.len(), 2);

        assert!((clusters[0].centroid_latitude - 13.00).abs() < f64::EPSILON);
        assert!((clusters[0].centroid_longitude - 80.22).abs() < f64::EPSILON);
        assert_eq!(clusters[0].count, 2);
        assert_eq!(clusters[0].severity_tier, SeverityTier::Low);

        assert!((clusters[1].centroid_latitude - 13.08).abs() < f64::EPSILON);
        assert_eq!(clusters[1].count, 1);
        assert_eq!(clusters[1].severity_tier, SeverityTier::Low);
    }

    #[test]
    fn first_match_wins_over_chained_neighbors() {
        // A-B and B-C are within the radius, A-C is not.
        let a = (0.0, 0.0);
        let b = (0.0, 0.008);
        let c = (0.0, 0.016);

        let clusters = SpatialClusterer::new(0.01).cluster_points([a, b, c]);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count, 2, "B joins A's cluster");
        assert!((clusters[1].centroid_longitude - 0.016).abs() < f64::EPSILON);
        assert_eq!(clusters[1].count, 1, "C seeds its own cluster");

        let reversed = SpatialClusterer::new(0.01).cluster_points([c, b, a]);
        assert_eq!(reversed.len(), 2);
        assert!((reversed[0].centroid_longitude - 0.016).abs() < f64::EPSILON);
        assert_eq!(reversed[0].count, 2, "B joins C's cluster when C comes first");
    }

    #[test]
    fn earlier_cluster_wins_even_when_later_is_nearer() {
        let clusters = SpatialClusterer::new(0.01).cluster_points([
            (0.0, 0.0),
            (0.0, 0.012),
            (0.0, 0.007),
        ]);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count, 2);
        assert_eq!(clusters[1].count, 1);
    }

    #[test]
    fn distance_equal_to_radius_starts_new_cluster() {
        let clusters = SpatialClusterer::new(0.5).cluster_points([(0.0, 0.0), (0.0, 0.5)]);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn anchor_never_moves_and_tier_grows() {
        let points = (0..10).map(|i| (1.0, 1.0 + f64::from(i) * 0.0001));
        let clusters = SpatialClusterer::default().cluster_points(points);
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].centroid_longitude - 1.0).abs() < f64::EPSILON);
        assert_eq!(clusters[0].severity_tier, SeverityTier::High);
        assert_eq!(clusters[0].color, "red");
    }

    #[test]
    fn cluster_counts_sum_to_spatial_incidents() {
        let incidents: Vec<Incident> = (0..40)
            .map(|i| {
                let coords = (i % 3 != 0).then(|| {
                    (
                        13.0 + f64::from(i % 7) * 0.004,
                        80.2 + f64::from(i % 5) * 0.006,
                    )
                });
                incident(&format!("loc-{i}"), coords)
            })
            .collect();

        let spatial = incidents.iter().filter(|i| i.is_spatial()).count() as u64;
        let clusters = SpatialClusterer::default().cluster(&incidents);
        let total: u64 = clusters.iter().map(|c| c.count).sum();
        assert_eq!(total, spatial);
    }
}
