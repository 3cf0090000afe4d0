use serde::{Deserialize, Serialize};

/// How the raw samples of a [`DepthImage`](crate::image::DepthImage) are to be
/// interpreted before projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthKind {
    /// Euclidean distance along the viewing ray.
    #[default]
    Depth,
    /// Orthogonal (plane-parallel) depth along the optical axis.
    Z,
    /// Stereo disparity, convertible to depth via `fx * baseline / disparity`.
    Disparity,
    /// Reciprocal of Euclidean depth.
    InverseDepth,
}

/// Physical unit of the raw samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthUnit {
    /// Meters.
    #[default]
    Meter,
    /// Millimeters, divided by 1000 during normalization.
    Millimeter,
}

impl DepthUnit {
    /// Multiplicative factor converting a sample in this unit to meters.
    #[inline]
    pub fn to_meters(&self) -> f64 {
        match self {
            DepthUnit::Meter => 1.0,
            DepthUnit::Millimeter => 1.0 / 1000.0,
        }
    }
}

/// Stereo parameters required to convert disparity samples to metric depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisparityParams {
    /// Focal length in pixels.
    pub fx: f64,
    /// Stereo baseline in millimeters.
    pub baseline: f64,
    /// Additive offset applied to the raw disparity before inversion.
    pub offset: f64,
}

/// Valid metric depth range; samples outside become NaN during normalization.
///
/// A side left as `None` imposes no bound.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DepthClamp {
    /// Lower bound in meters, inclusive.
    pub min: Option<f64>,
    /// Upper bound in meters, inclusive.
    pub max: Option<f64>,
}

impl DepthClamp {
    /// Clamp range with both bounds set.
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether a value lies inside the clamp range.
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        if let Some(min) = self.min {
            if v < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if v > max {
                return false;
            }
        }
        true
    }
}

/// Name, shape and dtype of one array discovered inside a multi-array file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayInfo {
    /// Entry name inside the archive, without the `.npy` suffix.
    pub name: String,
    /// Array shape as stored.
    pub shape: Vec<usize>,
    /// NumPy dtype descriptor, e.g. `<f4`.
    pub dtype: String,
}

impl std::fmt::Display for ArrayInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?} {}", self.name, self.shape, self.dtype)
    }
}

/// Reader-specific facts about where a raster came from.
///
/// Each reader family reports its own variant rather than stuffing optional
/// fields into [`DepthMetadata`]; the normalizer only consumes the common
/// fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SourceMeta {
    /// A generic container (TIFF, EXR) with no extra structure.
    #[default]
    Container,
    /// PFM file; `scale` is the magnitude of the header scale line.
    Pfm {
        /// Number of channels in the file (1 for `Pf`, 3 for `PF`).
        channels: usize,
    },
    /// Single NPY array, possibly multi-channel.
    Npy {
        /// Number of channels in the stored array.
        channels: usize,
        /// Channel extracted into the raster.
        selected_channel: usize,
        /// Set when the file held more than one channel and the default
        /// selection may not be what the caller wants.
        requires_configuration: bool,
    },
    /// NPZ archive holding one or more candidate arrays.
    Npz {
        /// All 2D arrays discovered in the archive.
        available_arrays: Vec<ArrayInfo>,
        /// Name of the array that was decoded.
        selected_array: String,
    },
    /// PNG file.
    Png {
        /// True when native 16-bit grayscale samples were decoded as such;
        /// false when the raster was reconstructed from 8-bit samples.
        native_16bit: bool,
    },
}

/// Describes how to interpret the samples of a decoded raster.
///
/// Produced by the format readers and consumed by the normalizer; the
/// projector only sees the resolved [`DepthKind`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DepthMetadata {
    /// Interpretation of the raw samples.
    pub kind: DepthKind,
    /// Physical unit of `Depth`/`Z` samples.
    pub unit: DepthUnit,
    /// Optional multiplicative factor applied together with the unit.
    pub scale: Option<f64>,
    /// Optional affine scale applied to raw samples of any kind, before the
    /// kind-specific conversion (depth-network output correction).
    pub depth_scale: Option<f64>,
    /// Optional affine bias, applied together with `depth_scale`.
    pub depth_bias: Option<f64>,
    /// Stereo parameters, required when `kind` is `Disparity`.
    pub disparity: Option<DisparityParams>,
    /// Valid range; samples outside become NaN.
    pub clamp: Option<DepthClamp>,
    /// Reader-specific provenance.
    pub source: SourceMeta,
}

impl DepthMetadata {
    /// Metadata for a raster already holding Euclidean depth in meters.
    pub fn depth_meters() -> Self {
        Self::default()
    }

    /// Metadata for a raster holding depth in millimeters.
    pub fn depth_millimeters() -> Self {
        Self {
            unit: DepthUnit::Millimeter,
            ..Self::default()
        }
    }

    /// Metadata for a disparity raster with the given stereo parameters.
    pub fn disparity(fx: f64, baseline: f64, offset: f64) -> Self {
        Self {
            kind: DepthKind::Disparity,
            disparity: Some(DisparityParams {
                fx,
                baseline,
                offset,
            }),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_factors() {
        assert_eq!(DepthUnit::Meter.to_meters(), 1.0);
        assert_eq!(DepthUnit::Millimeter.to_meters(), 0.001);
    }

    #[test]
    fn clamp_bounds_are_optional() {
        let clamp = DepthClamp {
            min: Some(0.5),
            max: None,
        };
        assert!(!clamp.contains(0.4));
        assert!(clamp.contains(0.5));
        assert!(clamp.contains(1e9));

        let clamp = DepthClamp::range(1.0, 2.0);
        assert!(clamp.contains(1.0));
        assert!(clamp.contains(2.0));
        assert!(!clamp.contains(2.1));
    }

    #[test]
    fn default_metadata_is_metric_depth() {
        let meta = DepthMetadata::default();
        assert_eq!(meta.kind, DepthKind::Depth);
        assert_eq!(meta.unit, DepthUnit::Meter);
        assert!(meta.scale.is_none());
        assert!(meta.disparity.is_none());
    }
}
