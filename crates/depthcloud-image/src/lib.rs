#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Depth raster representation.
pub mod image;

/// Metadata describing how raster samples map to metric depth.
pub mod meta;

/// Error types for the image module.
pub mod error;

pub use crate::error::DepthImageError;
pub use crate::image::DepthImage;
pub use crate::meta::{
    ArrayInfo, DepthClamp, DepthKind, DepthMetadata, DepthUnit, DisparityParams, SourceMeta,
};
