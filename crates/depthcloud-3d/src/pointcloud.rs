use glam::Vec3;

/// A projected point cloud with interleaved vertices and optional colors.
#[derive(Debug, Clone, Default)]
pub struct PointCloudResult {
    /// Interleaved X, Y, Z coordinates, length `3 * point_count`.
    pub vertices: Vec<f32>,
    /// Interleaved R, G, B grayscale triples in `[0, 1]`, length
    /// `3 * point_count`; absent when no points were emitted.
    pub colors: Option<Vec<f32>>,
    /// Number of points.
    pub point_count: usize,
    /// Width of the source raster in pixels.
    pub width: usize,
    /// Height of the source raster in pixels.
    pub height: usize,
}

impl PointCloudResult {
    /// Whether the cloud holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// The point at `index` as a vector.
    #[inline]
    pub fn point(&self, index: usize) -> Vec3 {
        let off = index * 3;
        Vec3::new(
            self.vertices[off],
            self.vertices[off + 1],
            self.vertices[off + 2],
        )
    }

    /// Component-wise minimum over all points, or zero when empty.
    pub fn min_bound(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (0..self.point_count)
            .map(|i| self.point(i))
            .fold(self.point(0), |a, b| a.min(b))
    }

    /// Component-wise maximum over all points, or zero when empty.
    pub fn max_bound(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (0..self.point_count)
            .map(|i| self.point(i))
            .fold(self.point(0), |a, b| a.max(b))
    }
}
