//! County boundary parsing.
//!
//! Boundaries arrive as `GeoJSON` geometry strings. They are carried through
//! to the results untouched; only the centroid is derived here.

use geo::{Centroid, MultiPolygon};
use geojson::GeoJson;

/// Parses a `GeoJSON` string into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn parse_boundary(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    let geom = match geojson {
        GeoJson::Geometry(geom) => geom,
        GeoJson::Feature(feature) => feature.geometry?,
        GeoJson::FeatureCollection(_) => return None,
    };

    let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Centroid `(x, y)` of a `GeoJSON` boundary in its own coordinate system.
#[must_use]
pub fn boundary_centroid(geojson_str: &str) -> Option<(f64, f64)> {
    let boundary = parse_boundary(geojson_str)?;
    let centroid = boundary.centroid()?;
    Some((centroid.x(), centroid.y()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[2.0,0.0],[2.0,2.0],[0.0,2.0],[0.0,0.0]]]}"#;

    #[test]
    fn centroid_of_square() {
        let (x, y) = boundary_centroid(SQUARE).unwrap();
        assert!((x - 1.0).abs() < 1e-12);
        assert!((y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn accepts_multipolygon() {
        let geojson = r#"{"type":"MultiPolygon","coordinates":[[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]],[[[4.0,0.0],[5.0,0.0],[5.0,1.0],[4.0,1.0],[4.0,0.0]]]]}"#;
        let boundary = parse_boundary(geojson).unwrap();
        assert_eq!(boundary.0.len(), 2);

        let (x, _) = boundary_centroid(geojson).unwrap();
        assert!((x - 2.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_points_and_garbage() {
        assert!(parse_boundary(r#"{"type":"Point","coordinates":[1.0,2.0]}"#).is_none());
        assert!(parse_boundary("POLYGON((0 0, 1 0, 1 1, 0 0))").is_none());
    }
}
