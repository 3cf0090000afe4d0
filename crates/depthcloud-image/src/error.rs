/// An error type for the depth image module.
#[derive(thiserror::Error, Debug)]
pub enum DepthImageError {
    /// Error when the data length does not match the raster dimensions.
    #[error("Data length ({0}) does not match the raster size ({1})")]
    InvalidLength(usize, usize),

    /// Error when a raster dimension is zero.
    #[error("Raster dimensions must be non-zero, got {0}x{1}")]
    ZeroDimension(usize, usize),
}
