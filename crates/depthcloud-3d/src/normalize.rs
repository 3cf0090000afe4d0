use depthcloud_image::{DepthImage, DepthKind, DepthMetadata, DisparityParams};

/// Disparity denominators at or below this are treated as no-data.
const DISPARITY_EPS: f64 = 1e-8;

/// An error type for depth normalization.
#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    /// Disparity input without the stereo parameters needed for conversion.
    #[error("Disparity input requires fx and baseline parameters")]
    MissingDisparityParams,

    /// Stereo parameters that cannot produce a positive depth.
    #[error("Disparity conversion requires fx > 0 and baseline > 0, got fx={fx}, baseline={baseline}")]
    InvalidDisparityParams {
        /// Focal length in pixels.
        fx: f64,
        /// Baseline in millimeters.
        baseline: f64,
    },
}

/// Convert a raw decoded raster into canonical metric depth in meters.
///
/// Applies, in order and per pixel: unit/scale for depth-like samples, the
/// optional `depth_scale`/`depth_bias` affine correction for every kind, the
/// kind-specific conversion to depth, and the clamp range. Non-finite samples
/// pass through as NaN; degenerate conversions (near-zero disparity
/// denominator, non-positive inverse depth) become NaN rather than errors.
///
/// Returns a fresh raster plus the resolved kind: `Z` stays orthogonal depth
/// and is interpreted at projection time, everything else resolves to
/// Euclidean `Depth`.
pub fn normalize(
    image: &DepthImage,
    meta: &DepthMetadata,
) -> Result<(DepthImage, DepthKind), NormalizeError> {
    let stereo: Option<DisparityParams> = match meta.kind {
        DepthKind::Disparity => {
            let p = meta
                .disparity
                .ok_or(NormalizeError::MissingDisparityParams)?;
            if p.fx <= 0.0 || p.baseline <= 0.0 {
                return Err(NormalizeError::InvalidDisparityParams {
                    fx: p.fx,
                    baseline: p.baseline,
                });
            }
            Some(p)
        }
        _ => None,
    };

    let unit_scale = meta.unit.to_meters() * meta.scale.unwrap_or(1.0);
    let depth_scale = meta.depth_scale.unwrap_or(1.0);
    let depth_bias = meta.depth_bias.unwrap_or(0.0);
    let has_affine = meta.depth_scale.is_some() || meta.depth_bias.is_some();

    let mut data = Vec::with_capacity(image.data.len());
    for &sample in &image.data {
        let mut v = sample as f64;
        if v.is_finite() {
            if matches!(meta.kind, DepthKind::Depth | DepthKind::Z) {
                v *= unit_scale;
            }
            // Affine correction targets raw network output, so it runs before
            // the kind conversion, not after.
            if has_affine {
                v = v * depth_scale + depth_bias;
            }
            v = match meta.kind {
                DepthKind::Depth | DepthKind::Z => v,
                // The stereo check above guarantees the parameters exist.
                DepthKind::Disparity => match stereo {
                    Some(p) => {
                        let denom = v + p.offset;
                        if denom > DISPARITY_EPS {
                            p.fx * (p.baseline / 1000.0) / denom
                        } else {
                            f64::NAN
                        }
                    }
                    None => f64::NAN,
                },
                DepthKind::InverseDepth => {
                    let w = v * unit_scale;
                    if w > 0.0 {
                        1.0 / w
                    } else {
                        f64::NAN
                    }
                }
            };
            if let Some(clamp) = meta.clamp {
                if v.is_finite() && !clamp.contains(v) {
                    v = f64::NAN;
                }
            }
        }
        data.push(v as f32);
    }

    let kind = match meta.kind {
        DepthKind::Z => DepthKind::Z,
        _ => DepthKind::Depth,
    };

    // Dimensions are carried over unchanged, so the constructor cannot fail.
    let image = DepthImage {
        width: image.width,
        height: image.height,
        data,
    };
    Ok((image, kind))
}
