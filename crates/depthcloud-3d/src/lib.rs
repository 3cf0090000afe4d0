#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Calibrated camera models and ray computation.
pub mod camera;

/// Conversion of decoded rasters into canonical metric depth.
pub mod normalize;

/// Point cloud container and bounds helpers.
pub mod pointcloud;

/// Depth raster to point cloud projection.
pub mod project;

pub use crate::camera::{CameraModel, CameraParams, Convention};
pub use crate::normalize::{normalize, NormalizeError};
pub use crate::pointcloud::PointCloudResult;
pub use crate::project::project;
