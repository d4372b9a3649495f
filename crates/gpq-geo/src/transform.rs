//! Bounding-box reprojection into the canonical geographic CRS

use gpq_core::error::{GpqError, Result};
use gpq_core::models::{AreaOfInterest, BoundingBox, Crs};

/// Points sampled per rectangle edge, so curved edges keep their extent
const EDGE_SAMPLES: usize = 21;

/// Reproject a rectangle into the canonical CRS.
///
/// Absent input yields absent output. A rectangle already in the canonical
/// CRS is returned untouched.
pub fn reproject_bbox(bbox: Option<&BoundingBox>, from_crs: Option<&Crs>) -> Result<Option<BoundingBox>> {
    let (Some(bbox), Some(from_crs)) = (bbox, from_crs) else {
        return Ok(None);
    };

    if from_crs.is_canonical() {
        return Ok(Some(*bbox));
    }

    bbox.validate()?;
    let transformer = Transformer::new(from_crs)?;

    let mut xmin = f64::INFINITY;
    let mut ymin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymax = f64::NEG_INFINITY;

    for (x, y) in densified_edges(bbox) {
        let (lon, lat) = transformer.convert(x, y)?;
        xmin = xmin.min(lon);
        ymin = ymin.min(lat);
        xmax = xmax.max(lon);
        ymax = ymax.max(lat);
    }

    let reprojected = BoundingBox::new(xmin, ymin, xmax, ymax).map_err(|e| GpqError::Projection {
        from: from_crs.epsg,
        to: gpq_core::models::CANONICAL_EPSG,
        reason: e.to_string(),
    })?;

    tracing::debug!("Reprojected bbox {} from {} to {}", bbox, from_crs, reprojected);
    Ok(Some(reprojected))
}

/// Reproject an area of interest, keeping it tagged with the canonical CRS
pub fn reproject_aoi(aoi: Option<&AreaOfInterest>) -> Result<Option<AreaOfInterest>> {
    let Some(aoi) = aoi else {
        return Ok(None);
    };
    Ok(reproject_bbox(Some(&aoi.bbox), Some(&aoi.crs))?.map(AreaOfInterest::canonical))
}

fn densified_edges(bbox: &BoundingBox) -> Vec<(f64, f64)> {
    let ring = bbox.ring();
    let mut points = Vec::with_capacity(4 * EDGE_SAMPLES);
    for edge in ring.windows(2) {
        let (x0, y0) = edge[0];
        let (x1, y1) = edge[1];
        for i in 0..EDGE_SAMPLES {
            let t = i as f64 / EDGE_SAMPLES as f64;
            points.push((x0 + (x1 - x0) * t, y0 + (y1 - y0) * t));
        }
    }
    points
}

#[cfg(feature = "proj")]
struct Transformer {
    proj: proj::Proj,
    from: u32,
}

#[cfg(feature = "proj")]
impl Transformer {
    fn new(from_crs: &Crs) -> Result<Self> {
        let target = Crs::wgs84().authority();
        let proj = proj::Proj::new_known_crs(&from_crs.authority(), &target, None).map_err(|e| {
            GpqError::Projection {
                from: from_crs.epsg,
                to: gpq_core::models::CANONICAL_EPSG,
                reason: format!("Failed to create projection: {}", e),
            }
        })?;
        Ok(Self { proj, from: from_crs.epsg })
    }

    fn convert(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let (lon, lat) = self.proj.convert((x, y)).map_err(|e| GpqError::Projection {
            from: self.from,
            to: gpq_core::models::CANONICAL_EPSG,
            reason: e.to_string(),
        })?;
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GpqError::Projection {
                from: self.from,
                to: gpq_core::models::CANONICAL_EPSG,
                reason: format!("({}, {}) has no finite geographic position", x, y),
            });
        }
        Ok((lon, lat))
    }
}

#[cfg(not(feature = "proj"))]
struct Transformer;

#[cfg(not(feature = "proj"))]
impl Transformer {
    /// WGS 84 semi-major axis used by spherical Web Mercator
    const EARTH_RADIUS: f64 = 6_378_137.0;

    fn new(from_crs: &Crs) -> Result<Self> {
        match from_crs.epsg {
            3857 | 900913 => Ok(Self),
            epsg => Err(GpqError::UnsupportedCrs { epsg }),
        }
    }

    fn convert(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let lon = (x / Self::EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / Self::EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        Ok((lon, lat))
    }
}
