//! Coordinate reference systems and the rectangles used as areas of interest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GpqError, Result};

/// EPSG code of the canonical geographic CRS all predicates are evaluated in
pub const CANONICAL_EPSG: u32 = 4326;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(CANONICAL_EPSG, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }

    /// Build from a bare EPSG code, naming the common ones
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => Self::wgs84(),
            3857 => Self::web_mercator(),
            other => Self::new(other, format!("EPSG:{}", other)),
        }
    }

    /// True for the canonical geographic CRS
    pub fn is_canonical(&self) -> bool {
        self.epsg == CANONICAL_EPSG
    }

    /// Authority string understood by PROJ and GDAL, e.g. `EPSG:4326`
    pub fn authority(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Create a rectangle, rejecting inverted or non-finite bounds
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self> {
        let bbox = Self { xmin, ymin, xmax, ymax };
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> Result<()> {
        if ![self.xmin, self.ymin, self.xmax, self.ymax].iter().all(|v| v.is_finite()) {
            return Err(GpqError::InvalidBoundingBox {
                reason: "coordinates must be finite".to_string(),
            });
        }
        if self.xmin > self.xmax || self.ymin > self.ymax {
            return Err(GpqError::InvalidBoundingBox {
                reason: format!(
                    "min must not exceed max (x: {}..{}, y: {}..{})",
                    self.xmin, self.xmax, self.ymin, self.ymax
                ),
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Closed ring of the four corners, counter-clockwise from (xmin, ymin)
    pub fn ring(&self) -> [(f64, f64); 5] {
        [
            (self.xmin, self.ymin),
            (self.xmax, self.ymin),
            (self.xmax, self.ymax),
            (self.xmin, self.ymax),
            (self.xmin, self.ymin),
        ]
    }

    /// Inclusive overlap test
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
    }

    /// Inclusive point containment
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }
}

impl FromStr for BoundingBox {
    type Err = GpqError;

    /// Parse `xmin,ymin,xmax,ymax`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GpqError::InvalidBoundingBox {
                reason: format!("expected xmin,ymin,xmax,ymax but got '{}'", s),
            });
        }
        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| GpqError::InvalidBoundingBox {
                reason: format!("'{}' is not a number", part),
            })?;
        }
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// Rectangle tagged with the CRS its coordinates are expressed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterest {
    pub bbox: BoundingBox,
    pub crs: Crs,
}

impl AreaOfInterest {
    pub fn new(bbox: BoundingBox, crs: Crs) -> Self {
        Self { bbox, crs }
    }

    /// Area of interest already in the canonical CRS
    pub fn canonical(bbox: BoundingBox) -> Self {
        Self::new(bbox, Crs::wgs84())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox: BoundingBox = "-122.5, 37.7, -122.4, 37.8".parse().unwrap();
        assert_eq!(bbox.xmin, -122.5);
        assert_eq!(bbox.ymax, 37.8);
        assert!("1,2,3".parse::<BoundingBox>().is_err());
        assert!("a,2,3,4".parse::<BoundingBox>().is_err());
        assert!("3,2,1,4".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn test_ring_is_closed() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 1.0).unwrap();
        let ring = bbox.ring();
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[2], (2.0, 1.0));
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let b = BoundingBox::new(1.0, 1.0, 2.0, 2.0).unwrap();
        let c = BoundingBox::new(1.5, 1.5, 2.0, 2.0).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_crs_from_epsg() {
        assert!(Crs::from_epsg(4326).is_canonical());
        assert_eq!(Crs::from_epsg(3857), Crs::web_mercator());
        assert_eq!(Crs::from_epsg(32633).authority(), "EPSG:32633");
    }
}
