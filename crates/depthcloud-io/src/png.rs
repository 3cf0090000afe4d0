use depthcloud_image::{DepthImage, DepthMetadata, DepthUnit, SourceMeta};
use png::{BitDepth, ColorType, Decoder};

use crate::error::IoError;
use crate::registry::{extension_matches, DepthReader};

/// Reader for PNG depth maps, typically 16-bit grayscale in millimeters.
///
/// Native 16-bit samples are decoded exactly; other layouts fall back to the
/// first channel of the 8-bit reconstruction, and the metadata flags the
/// precision loss rather than hiding it.
pub struct PngReader;

impl DepthReader for PngReader {
    fn name(&self) -> &'static str {
        "png"
    }

    fn can_read(&self, filename: &str, mime: Option<&str>) -> bool {
        extension_matches(filename, &["png"]) || mime == Some("image/png")
    }

    fn read(&self, buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
        read_png_depth(buf)
    }
}

/// Decode a PNG byte buffer, extracting one channel as a float raster.
pub fn read_png_depth(buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
    let mut reader = Decoder::new(buf)
        .read_info()
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let mut raw = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut raw)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let width = info.width as usize;
    let height = info.height as usize;
    let samples = info.color_type.samples();
    if info.color_type == ColorType::Indexed {
        return Err(IoError::PngDecodeError(
            "indexed color PNG cannot be a depth map".to_string(),
        ));
    }

    let (data, native_16bit) = match info.bit_depth {
        BitDepth::Sixteen => {
            // Sample pairs are big-endian per the PNG spec.
            let mut data = vec![0f32; width * height];
            for (i, out) in data.iter_mut().enumerate() {
                let off = i * samples * 2;
                *out = u16::from_be_bytes([raw[off], raw[off + 1]]) as f32;
            }
            (data, true)
        }
        BitDepth::Eight => {
            let mut data = vec![0f32; width * height];
            for (i, out) in data.iter_mut().enumerate() {
                *out = raw[i * samples] as f32;
            }
            (data, false)
        }
        other => {
            return Err(IoError::PngDecodeError(format!(
                "unsupported bit depth {other:?}, expected 8 or 16"
            )))
        }
    };

    let meta = DepthMetadata {
        unit: DepthUnit::Millimeter,
        source: SourceMeta::Png { native_16bit },
        ..DepthMetadata::depth_meters()
    };
    Ok((DepthImage::new(width, height, data)?, meta))
}
