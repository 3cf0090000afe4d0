#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for depth raster decoding.
pub mod error;

/// Reader trait and the ordered dispatch registry.
pub mod registry;

/// Portable Float Map (PFM) decoding.
pub mod pfm;

/// NumPy NPY array decoding.
pub mod npy;

/// NumPy NPZ archive decoding (minimal ZIP local-header scanner).
pub mod npz;

/// PNG depth map decoding.
pub mod png;

/// TIFF depth map decoding.
pub mod tiff;

/// OpenEXR depth map decoding.
pub mod exr;

pub use crate::error::IoError;
pub use crate::registry::{DepthReader, ReaderRegistry};
