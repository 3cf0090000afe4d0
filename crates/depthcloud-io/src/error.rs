/// An error type for the depth io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// No registered reader claims the file.
    #[error("No depth reader found for file: {0}")]
    NoReaderFound(String),

    /// Malformed PFM header or payload.
    #[error("Invalid PFM file: {0}")]
    InvalidPfm(String),

    /// Malformed NPY magic, version, header or dtype.
    #[error("Invalid NPY file: {0}")]
    InvalidNpy(String),

    /// The NPY payload is shorter than the declared shape and dtype require.
    #[error("NPY data too short: shape {shape:?} with dtype {dtype} requires {expected} bytes, got {actual}")]
    NpyTooShort {
        /// Declared array shape.
        shape: Vec<usize>,
        /// Declared dtype descriptor.
        dtype: String,
        /// Bytes required by the declared shape.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Malformed NPZ container.
    #[error("Invalid NPZ file: {0}")]
    InvalidNpz(String),

    /// The NPZ archive holds no array usable as a depth raster.
    #[error("NPZ file contains no suitable 2D arrays. Available arrays: {0}")]
    NpzNoSuitableArray(String),

    /// Error to decode the PNG image.
    #[error("Failed to decode the png image. {0}")]
    PngDecodeError(String),

    /// Error to decode the TIFF image.
    #[error("Failed to decode the tiff image. {0}")]
    TiffDecodingError(#[from] tiff::TiffError),

    /// The decoded TIFF layout cannot be turned into a depth raster.
    #[error("Unsupported TIFF layout: {0}")]
    UnsupportedTiffLayout(String),

    /// Error to decode the image via the generic container decoder.
    #[error("Failed to decode the image. {0}")]
    ImageDecodeError(#[from] image::ImageError),

    /// Error to create the depth raster.
    #[error("Failed to create depth raster. {0}")]
    ImageCreationError(#[from] depthcloud_image::DepthImageError),
}
