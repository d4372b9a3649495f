//! gpq geo - CRS handling for areas of interest
//!
//! Reprojects area-of-interest rectangles into the canonical geographic CRS
//! and renders them as polygons for spatial predicates.

pub mod polygon;
pub mod transform;

pub use polygon::{bbox_polygon, bbox_wkt};
pub use transform::{reproject_aoi, reproject_bbox};
