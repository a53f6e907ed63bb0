use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Free-form feature properties
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum CollectionTag {
    #[default]
    FeatureCollection,
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type")]
    tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl GeoJsonFeature {
    pub fn new(geometry: GeoJsonGeometry) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    /// Point feature from a GeoJSON `[lng, lat]` position
    pub fn point(coordinates: [f64; 2]) -> Self {
        Self::new(GeoJsonGeometry::Point { coordinates })
    }

    pub fn with_id(mut self, id: impl Into<serde_json::Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.as_ref()?.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    tag: CollectionTag,
    pub features: Vec<GeoJsonFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<GeoJsonFeature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeoJson {
    FeatureCollection(FeatureCollection),
    Feature(GeoJsonFeature),
    Geometry(GeoJsonGeometry),
}

impl GeoJson {
    pub fn collection(features: Vec<GeoJsonFeature>) -> Self {
        GeoJson::FeatureCollection(FeatureCollection::new(features))
    }

    /// Every feature in the object; a bare geometry becomes one feature
    pub fn features(&self) -> Vec<GeoJsonFeature> {
        match self {
            GeoJson::FeatureCollection(collection) => collection.features.clone(),
            GeoJson::Feature(feature) => vec![feature.clone()],
            GeoJson::Geometry(geometry) => vec![GeoJsonFeature::new(geometry.clone())],
        }
    }

    /// Gets the bounding box of all features
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let mut bounds: Option<LatLngBounds> = None;

        for feature in self.features() {
            for point in feature
                .geometry
                .iter()
                .flat_map(GeoJsonGeometry::to_lat_lng_points)
            {
                match bounds.as_mut() {
                    Some(b) => b.extend(&point),
                    None => bounds = Some(LatLngBounds::new(point, point)),
                }
            }
        }

        bounds
    }
}

impl FromStr for GeoJson {
    type Err = crate::Error;

    fn from_str(geojson_str: &str) -> crate::Result<Self> {
        serde_json::from_str(geojson_str)
            .map_err(|e| crate::Error::ParseError(format!("Invalid GeoJSON: {}", e)))
    }
}

impl From<GeoJsonFeature> for GeoJson {
    fn from(feature: GeoJsonFeature) -> Self {
        GeoJson::Feature(feature)
    }
}

impl From<GeoJsonGeometry> for GeoJson {
    fn from(geometry: GeoJsonGeometry) -> Self {
        GeoJson::Geometry(geometry)
    }
}

impl GeoJsonGeometry {
    /// Converts coordinates to LatLng points
    pub fn to_lat_lng_points(&self) -> Vec<LatLng> {
        fn convert(coords: &[[f64; 2]]) -> Vec<LatLng> {
            coords.iter().map(|c| LatLng::from_geojson(*c)).collect()
        }

        match self {
            GeoJsonGeometry::Point { coordinates } => vec![LatLng::from_geojson(*coordinates)],
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => convert(coordinates),
            GeoJsonGeometry::Polygon { coordinates }
            | GeoJsonGeometry::MultiLineString { coordinates } => {
                coordinates.iter().flat_map(|ring| convert(ring)).collect()
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flat_map(|polygon| polygon.iter().flat_map(|ring| convert(ring)))
                .collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .flat_map(GeoJsonGeometry::to_lat_lng_points)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"
    {
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "Test Point"},
                "geometry": {
                    "type": "Point",
                    "coordinates": [-0.09, 51.505]
                }
            }
        ]
    }
    "#;

    #[test]
    fn test_geojson_parsing() {
        let data: GeoJson = COLLECTION.parse().unwrap();
        let features = data.features();

        assert!(matches!(data, GeoJson::FeatureCollection(_)));
        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0].property("name"),
            Some(&serde_json::json!("Test Point"))
        );
    }

    #[test]
    fn test_parse_feature_and_bare_geometry() {
        let feature: GeoJson =
            r#"{"type": "Feature", "geometry": null, "properties": null}"#.parse().unwrap();
        assert!(matches!(feature, GeoJson::Feature(_)));

        let geometry: GeoJson = r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#
            .parse()
            .unwrap();
        assert!(matches!(geometry, GeoJson::Geometry(_)));
        assert_eq!(geometry.features().len(), 1);

        assert!(matches!(
            "{\"type\": \"Circle\"}".parse::<GeoJson>(),
            Err(crate::Error::ParseError(_))
        ));
    }

    #[test]
    fn test_serializes_type_tags() {
        let data = GeoJson::collection(vec![GeoJsonFeature::point([-0.09, 51.505])]);
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
    }

    #[test]
    fn test_point_geometry() {
        let geometry = GeoJsonGeometry::Point {
            coordinates: [-74.0060, 40.7128],
        };

        let points = geometry.to_lat_lng_points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0], LatLng::new(40.7128, -74.0060));
    }

    #[test]
    fn test_bounds_calculation() {
        let geojson = GeoJson::collection(vec![
            GeoJsonFeature::point([-74.0060, 40.7128]),
            GeoJsonFeature::point([-73.9857, 40.7489]),
        ]);

        let bounds = geojson.bounds().unwrap();

        assert_eq!(bounds.south_west.lat, 40.7128);
        assert_eq!(bounds.north_east.lat, 40.7489);
    }
}
