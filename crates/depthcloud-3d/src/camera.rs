use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Maximum Newton-Raphson iterations for the Kannala-Brandt inversion.
const KB_MAX_ITERATIONS: usize = 10;
/// Residual and derivative magnitude at which the inversion stops.
const KB_TOLERANCE: f64 = 1e-12;

/// The projection model a camera was calibrated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraModel {
    /// Distortion-free pinhole.
    #[default]
    PinholeIdeal,
    /// Pinhole with Brown-Conrady radial and tangential distortion.
    PinholeOpencv,
    /// Classic equidistant fisheye.
    FisheyeEquidistant,
    /// Equidistant fisheye with an OpenCV radial correction polynomial.
    FisheyeOpencv,
    /// Generalized polynomial fisheye (Kannala-Brandt).
    FisheyeKannalaBrandt,
}

/// Axis orientation of the output coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// +Y down, +Z forward.
    #[default]
    Opencv,
    /// +Y up, +Z backward; projected vertices get Y and Z negated.
    Opengl,
}

fn default_zero() -> f64 {
    0.0
}

/// A fully-specified calibrated camera.
///
/// `fy` defaults to `fx` when absent; distortion coefficients default to
/// zero. Callers are responsible for `fx > 0` (a non-positive focal length
/// produces NaN rays, not an error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    /// Projection model.
    #[serde(default)]
    pub model: CameraModel,
    /// Focal length along x, in pixels.
    pub fx: f64,
    /// Focal length along y; falls back to `fx` when `None`.
    #[serde(default)]
    pub fy: Option<f64>,
    /// Principal point x, in pixels.
    pub cx: f64,
    /// Principal point y, in pixels.
    pub cy: f64,
    /// Output coordinate convention.
    #[serde(default)]
    pub convention: Convention,
    /// Radial distortion coefficients.
    #[serde(default = "default_zero")]
    pub k1: f64,
    /// Radial distortion coefficient 2.
    #[serde(default = "default_zero")]
    pub k2: f64,
    /// Radial distortion coefficient 3.
    #[serde(default = "default_zero")]
    pub k3: f64,
    /// Radial distortion coefficient 4.
    #[serde(default = "default_zero")]
    pub k4: f64,
    /// Radial distortion coefficient 5 (Kannala-Brandt only).
    #[serde(default = "default_zero")]
    pub k5: f64,
    /// Tangential distortion coefficient 1.
    #[serde(default = "default_zero")]
    pub p1: f64,
    /// Tangential distortion coefficient 2.
    #[serde(default = "default_zero")]
    pub p2: f64,
}

impl CameraParams {
    /// Ideal pinhole camera with no distortion.
    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            model: CameraModel::PinholeIdeal,
            fx,
            fy: Some(fy),
            cx,
            cy,
            convention: Convention::Opencv,
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            k4: 0.0,
            k5: 0.0,
            p1: 0.0,
            p2: 0.0,
        }
    }

    /// Effective vertical focal length.
    #[inline]
    pub fn fy(&self) -> f64 {
        self.fy.unwrap_or(self.fx)
    }

    /// Unit ray through pixel `(u, v)` under the camera's projection model.
    pub fn ray_direction(&self, u: f64, v: f64) -> DVec3 {
        let du = u - self.cx;
        let dv = v - self.cy;

        match self.model {
            CameraModel::PinholeIdeal => {
                DVec3::new(du / self.fx, dv / self.fy(), 1.0).normalize()
            }
            CameraModel::PinholeOpencv => {
                let xn = du / self.fx;
                let yn = dv / self.fy();
                // Forward Brown-Conrady applied to already-normalized
                // coordinates; kept bit-compatible with the source system
                // even though undistortion would solve the inverse problem.
                let r2 = xn * xn + yn * yn;
                let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
                let xc = xn * radial + 2.0 * self.p1 * xn * yn + self.p2 * (r2 + 2.0 * xn * xn);
                let yc = yn * radial + self.p1 * (r2 + 2.0 * yn * yn) + 2.0 * self.p2 * xn * yn;
                DVec3::new(xc, yc, 1.0).normalize()
            }
            CameraModel::FisheyeEquidistant => {
                let r = du.hypot(dv);
                if r == 0.0 {
                    return DVec3::Z;
                }
                let theta = r / self.fx;
                DVec3::new(
                    theta.sin() * du / r,
                    theta.sin() * dv / r,
                    theta.cos(),
                )
            }
            CameraModel::FisheyeOpencv => {
                let r = du.hypot(dv);
                if r == 0.0 {
                    return DVec3::Z;
                }
                let rn = r / self.fx;
                let rn2 = rn * rn;
                let correction = 1.0
                    + self.k1 * rn2
                    + self.k2 * rn2 * rn2
                    + self.k3 * rn2 * rn2 * rn2
                    + self.k4 * rn2 * rn2 * rn2 * rn2;
                let theta = rn * correction;
                DVec3::new(
                    theta.sin() * du / r,
                    theta.sin() * dv / r,
                    theta.cos(),
                )
            }
            CameraModel::FisheyeKannalaBrandt => {
                let r = du.hypot(dv);
                if r == 0.0 {
                    return DVec3::Z;
                }
                let rn = r / self.fx;
                let theta = kannala_brandt_theta(&self.kb_coefficients(), rn, rn);
                DVec3::new(
                    theta.sin() * du / r,
                    theta.sin() * dv / r,
                    theta.cos(),
                )
            }
        }
    }

    /// The five odd-power polynomial coefficients of the Kannala-Brandt model.
    #[inline]
    pub fn kb_coefficients(&self) -> [f64; 5] {
        [self.k1, self.k2, self.k3, self.k4, self.k5]
    }
}

/// Forward Kannala-Brandt model: normalized radius as a function of the
/// incidence angle, `r(theta) = k1*theta + k2*theta^3 + ... + k5*theta^9`.
pub fn kannala_brandt_radius(k: &[f64; 5], theta: f64) -> f64 {
    let t2 = theta * theta;
    theta * (k[0] + t2 * (k[1] + t2 * (k[2] + t2 * (k[3] + t2 * k[4]))))
}

fn kannala_brandt_slope(k: &[f64; 5], theta: f64) -> f64 {
    let t2 = theta * theta;
    k[0] + t2 * (3.0 * k[1] + t2 * (5.0 * k[2] + t2 * (7.0 * k[3] + t2 * 9.0 * k[4])))
}

/// Recover the incidence angle for a measured normalized radius by
/// Newton-Raphson on the forward polynomial.
///
/// Stops after at most 10 iterations, when the residual drops below 1e-12,
/// or when the slope degenerates (a near-zero derivative would blow the
/// update up).
pub fn kannala_brandt_theta(k: &[f64; 5], r_target: f64, theta_init: f64) -> f64 {
    let mut theta = theta_init;
    for _ in 0..KB_MAX_ITERATIONS {
        let residual = kannala_brandt_radius(k, theta) - r_target;
        if residual.abs() < KB_TOLERANCE {
            break;
        }
        let slope = kannala_brandt_slope(k, theta);
        if slope.abs() < KB_TOLERANCE {
            break;
        }
        theta -= residual / slope;
    }
    theta
}
