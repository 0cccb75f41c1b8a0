//! GeoJSON export of clusters for map layers.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::Value;

use crate::Cluster;

/// Converts one cluster into a point feature carrying its tier properties.
#[must_use]
pub fn cluster_feature(cluster: &Cluster) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("count".to_string(), Value::from(cluster.count));
    properties.insert(
        "severityTier".to_string(),
        Value::from(cluster.severity_tier.as_ref()),
    );
    properties.insert(
        "radiusMeters".to_string(),
        Value::from(cluster.radius_meters),
    );
    properties.insert("color".to_string(), Value::from(cluster.color.as_str()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![
            cluster.centroid_longitude,
            cluster.centroid_latitude,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Converts clusters into a `FeatureCollection`, preserving order.
#[must_use]
pub fn clusters_to_geojson(clusters: &[Cluster]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: clusters.iter().map(cluster_feature).collect(),
        foreign_members: None,
    }
}
