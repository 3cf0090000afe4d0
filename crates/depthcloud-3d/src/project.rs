use depthcloud_image::{DepthImage, DepthKind};
use glam::DVec3;

use crate::camera::{CameraParams, Convention};
use crate::pointcloud::PointCloudResult;

/// Gamma applied to the log-normalized color scalar. Pass-through today,
/// kept as a parameter for visual tuning.
const COLOR_GAMMA: f64 = 1.0;
/// Color floor so the nearest and farthest points are never pure black.
const COLOR_FLOOR: f64 = 0.2;

/// Project a canonical depth raster into a 3D point cloud.
///
/// Every pixel with finite, positive depth becomes one point; everything
/// else is skipped entirely, never emitted as a degenerate point. `Z` kind
/// back-projects orthogonal depth through the pinhole equations for every
/// camera model; any other kind is treated as Euclidean ray length and scales
/// the per-model unit ray. Colors are a log-normalized grayscale of depth,
/// absent when the cloud is empty.
///
/// Per-pixel numeric trouble never raises; structurally bad parameters
/// (`fx <= 0`) are the caller's responsibility and yield NaN rays.
pub fn project(image: &DepthImage, kind: DepthKind, params: &CameraParams) -> PointCloudResult {
    let mut vertices: Vec<f32> = Vec::new();
    let mut log_depths: Vec<f64> = Vec::new();

    let fy = params.fy();
    for v in 0..image.height {
        for u in 0..image.width {
            let depth = image.data[v * image.width + u] as f64;
            if !depth.is_finite() || depth <= 0.0 {
                continue;
            }

            let (uf, vf) = (u as f64, v as f64);
            let point = if kind == DepthKind::Z {
                DVec3::new(
                    (uf - params.cx) / params.fx * depth,
                    (vf - params.cy) / fy * depth,
                    depth,
                )
            } else {
                params.ray_direction(uf, vf) * depth
            };

            let point = match params.convention {
                Convention::Opencv => point,
                Convention::Opengl => DVec3::new(point.x, -point.y, -point.z),
            };

            vertices.push(point.x as f32);
            vertices.push(point.y as f32);
            vertices.push(point.z as f32);
            log_depths.push(depth.ln());
        }
    }

    let point_count = log_depths.len();
    let colors = (point_count > 0).then(|| synthesize_colors(&log_depths));

    PointCloudResult {
        vertices,
        colors,
        point_count,
        width: image.width,
        height: image.height,
    }
}

/// Map log depths linearly onto `[COLOR_FLOOR, 1]` as equal R=G=B triples.
fn synthesize_colors(log_depths: &[f64]) -> Vec<f32> {
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &ld in log_depths {
        min = min.min(ld);
        max = max.max(ld);
    }
    let range = max - min;

    let mut colors = Vec::with_capacity(log_depths.len() * 3);
    for &ld in log_depths {
        let t = if range > f64::EPSILON {
            (ld - min) / range
        } else {
            1.0
        };
        let gray = (COLOR_FLOOR + (1.0 - COLOR_FLOOR) * t.powf(COLOR_GAMMA)) as f32;
        colors.push(gray);
        colors.push(gray);
        colors.push(gray);
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraModel;
    use approx::assert_relative_eq;

    fn pinhole() -> CameraParams {
        CameraParams::pinhole(100.0, 100.0, 1.0, 1.0)
    }

    #[test]
    fn principal_point_projects_on_axis() {
        let image = DepthImage::from_val(3, 3, 2.5).unwrap();
        let cloud = project(&image, DepthKind::Depth, &pinhole());
        // Pixel (1,1) is the principal point: point index 4 in row-major order.
        let p = cloud.point(4);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, 2.5);
    }

    #[test]
    fn z_kind_back_projects_orthogonally() {
        let image = DepthImage::new(2, 1, vec![4.0, 4.0]).unwrap();
        let params = CameraParams::pinhole(2.0, 2.0, 0.0, 0.0);
        let cloud = project(&image, DepthKind::Z, &params);
        // Pixel (1,0): X = (1-0)/2 * 4 = 2, Z stays 4.
        let p = cloud.point(1);
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, 4.0);
    }

    #[test]
    fn z_kind_ignores_camera_model() {
        let image = DepthImage::new(2, 1, vec![4.0, 4.0]).unwrap();
        let base = CameraParams::pinhole(2.0, 2.0, 0.0, 0.0);
        let fisheye = CameraParams {
            model: CameraModel::FisheyeEquidistant,
            ..base.clone()
        };
        let a = project(&image, DepthKind::Z, &base);
        let b = project(&image, DepthKind::Z, &fisheye);
        assert_eq!(a.vertices, b.vertices);
    }

    #[test]
    fn depth_kind_scales_unit_rays() {
        let image = DepthImage::from_val(3, 3, 5.0).unwrap();
        let cloud = project(&image, DepthKind::Depth, &pinhole());
        for i in 0..cloud.point_count {
            assert_relative_eq!(cloud.point(i).length(), 5.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn invalid_pixels_are_excluded() {
        let image =
            DepthImage::new(2, 2, vec![1.0, f32::NAN, -3.0, 0.0]).unwrap();
        let cloud = project(&image, DepthKind::Depth, &pinhole());
        assert_eq!(cloud.point_count, 1);
        assert_eq!(cloud.vertices.len(), 3);
    }

    #[test]
    fn empty_cloud_has_no_colors() {
        let image = DepthImage::from_val(2, 2, f32::NAN).unwrap();
        let cloud = project(&image, DepthKind::Depth, &pinhole());
        assert_eq!(cloud.point_count, 0);
        assert!(cloud.colors.is_none());
    }

    #[test]
    fn opengl_convention_negates_y_and_z() {
        let image = DepthImage::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let cv = pinhole();
        let gl = CameraParams {
            convention: Convention::Opengl,
            ..cv.clone()
        };
        let a = project(&image, DepthKind::Depth, &cv);
        let b = project(&image, DepthKind::Depth, &gl);
        assert_eq!(a.point_count, b.point_count);
        for i in 0..a.point_count {
            let (pa, pb) = (a.point(i), b.point(i));
            assert_eq!(pa.x, pb.x);
            assert_eq!(pa.y, -pb.y);
            assert_eq!(pa.z, -pb.z);
        }
    }

    #[test]
    fn colors_span_floor_to_one() {
        let image = DepthImage::new(2, 1, vec![1.0, 10.0]).unwrap();
        let cloud = project(&image, DepthKind::Depth, &pinhole());
        let colors = cloud.colors.unwrap();
        assert_eq!(colors.len(), 6);
        // Nearest point sits at the floor, farthest at full white.
        assert_relative_eq!(colors[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(colors[3], 1.0, epsilon = 1e-6);
        assert_eq!(colors[0], colors[1]);
        assert_eq!(colors[1], colors[2]);
    }

    #[test]
    fn uniform_depth_is_full_white() {
        let image = DepthImage::from_val(2, 2, 3.0).unwrap();
        let cloud = project(&image, DepthKind::Depth, &pinhole());
        let colors = cloud.colors.unwrap();
        assert!(colors.iter().all(|&c| (c - 1.0).abs() < 1e-6));
    }

    #[test]
    fn vertex_count_matches_point_count() {
        let image = DepthImage::from_val(4, 3, 1.0).unwrap();
        let cloud = project(&image, DepthKind::Depth, &pinhole());
        assert_eq!(cloud.point_count, 12);
        assert_eq!(cloud.vertices.len(), 36);
        assert_eq!(cloud.width, 4);
        assert_eq!(cloud.height, 3);
    }
}
