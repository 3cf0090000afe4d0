use crate::error::DepthImageError;

/// A single-channel depth raster.
///
/// Samples are stored row-major with the origin at the top-left pixel.
/// The interpretation of the samples (Euclidean depth, orthogonal depth,
/// disparity, inverse depth) is carried separately in
/// [`DepthMetadata`](crate::meta::DepthMetadata).
///
/// # Examples
///
/// ```
/// use depthcloud_image::DepthImage;
///
/// let image = DepthImage::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
///
/// assert_eq!(image.width, 2);
/// assert_eq!(image.height, 2);
/// assert_eq!(image.get(1, 0), Some(2.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    /// Width of the raster in pixels.
    pub width: usize,
    /// Height of the raster in pixels.
    pub height: usize,
    /// Row-major samples, length `width * height`.
    pub data: Vec<f32>,
}

impl DepthImage {
    /// Create a new depth raster from row-major samples.
    ///
    /// # Errors
    ///
    /// Returns an error when the data length does not match `width * height`
    /// or when either dimension is zero.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self, DepthImageError> {
        if width == 0 || height == 0 {
            return Err(DepthImageError::ZeroDimension(width, height));
        }
        if data.len() != width * height {
            return Err(DepthImageError::InvalidLength(data.len(), width * height));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a raster filled with a constant value.
    pub fn from_val(width: usize, height: usize, val: f32) -> Result<Self, DepthImageError> {
        Self::new(width, height, vec![val; width * height])
    }

    /// Number of pixels in the raster.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    /// Get the sample at pixel `(x, y)`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Get the samples as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checks_length() {
        assert!(DepthImage::new(2, 2, vec![0.0; 4]).is_ok());
        assert!(matches!(
            DepthImage::new(2, 2, vec![0.0; 3]),
            Err(DepthImageError::InvalidLength(3, 4))
        ));
    }

    #[test]
    fn new_rejects_zero_dims() {
        assert!(matches!(
            DepthImage::new(0, 2, vec![]),
            Err(DepthImageError::ZeroDimension(0, 2))
        ));
    }

    #[test]
    fn get_is_row_major() {
        let image = DepthImage::new(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(image.get(0, 0), Some(1.0));
        assert_eq!(image.get(2, 0), Some(3.0));
        assert_eq!(image.get(0, 1), Some(4.0));
        assert_eq!(image.get(2, 1), Some(6.0));
        assert_eq!(image.get(3, 0), None);
        assert_eq!(image.get(0, 2), None);
    }
}
