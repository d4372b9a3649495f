//! Rectangle to polygon conversion for intersection predicates

use geo::{LineString, Polygon};
use gpq_core::models::BoundingBox;
use wkt::ToWkt;

/// Closed polygon over the rectangle's four corners
pub fn bbox_polygon(bbox: &BoundingBox) -> Polygon<f64> {
    Polygon::new(LineString::from(bbox.ring().to_vec()), vec![])
}

/// WKT text of [`bbox_polygon`], starting and ending at (xmin, ymin)
pub fn bbox_wkt(bbox: &BoundingBox) -> String {
    bbox_polygon(bbox).wkt_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains, Point};

    #[test]
    fn test_polygon_covers_rectangle() {
        let bbox = BoundingBox::new(-122.5, 37.7, -122.4, 37.8).unwrap();
        let polygon = bbox_polygon(&bbox);

        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.exterior().is_closed());
        assert!(polygon.contains(&Point::new(-122.45, 37.75)));
        assert!((polygon.unsigned_area() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_wkt_text() {
        let bbox = BoundingBox::new(-122.5, 37.7, -122.4, 37.8).unwrap();
        let wkt = bbox_wkt(&bbox);
        assert!(wkt.starts_with("POLYGON(("), "got {}", wkt);
        assert!(wkt.contains("-122.5 37.7"), "got {}", wkt);
        assert!(wkt.contains("-122.4 37.8"), "got {}", wkt);
    }
}
