use std::io::Cursor;

use depthcloud_image::{DepthImage, DepthMetadata, DepthUnit, SourceMeta};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;

use crate::error::IoError;
use crate::registry::{extension_matches, DepthReader};

/// Reader for TIFF depth maps.
///
/// Decoding is delegated to the `tiff` crate; the sample format decides the
/// unit interpretation: float samples are meters, 16-bit integer samples are
/// millimeters (the common range-sensor export).
pub struct TiffReader;

impl DepthReader for TiffReader {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn can_read(&self, filename: &str, mime: Option<&str>) -> bool {
        extension_matches(filename, &["tif", "tiff"]) || mime == Some("image/tiff")
    }

    fn read(&self, buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
        read_tiff_depth(buf)
    }
}

fn channels_for_colortype(colortype: &ColorType) -> Option<usize> {
    match colortype {
        ColorType::Gray(_) => Some(1),
        ColorType::GrayA(_) => Some(2),
        ColorType::RGB(_) => Some(3),
        ColorType::RGBA(_) => Some(4),
        _ => None,
    }
}

/// Select channel 0 out of an interleaved sample buffer, converting to f32.
fn take_first_channel<T: Copy, F: Fn(T) -> f32>(
    samples: &[T],
    pixels: usize,
    channels: usize,
    to_f32: F,
) -> Vec<f32> {
    (0..pixels).map(|i| to_f32(samples[i * channels])).collect()
}

/// Decode a TIFF byte buffer into a depth raster.
pub fn read_tiff_depth(buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
    let mut decoder = Decoder::new(Cursor::new(buf))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    let colortype = decoder.colortype()?;
    let channels = channels_for_colortype(&colortype).ok_or_else(|| {
        IoError::UnsupportedTiffLayout(format!("color type {colortype:?}"))
    })?;
    let pixels = width * height;

    let result = decoder.read_image()?;
    let (data, unit) = match result {
        DecodingResult::F32(v) => (
            take_first_channel(&v, pixels, channels, |s| s),
            DepthUnit::Meter,
        ),
        DecodingResult::F64(v) => (
            take_first_channel(&v, pixels, channels, |s| s as f32),
            DepthUnit::Meter,
        ),
        DecodingResult::U8(v) => (
            take_first_channel(&v, pixels, channels, |s| s as f32),
            DepthUnit::Millimeter,
        ),
        DecodingResult::U16(v) => (
            take_first_channel(&v, pixels, channels, |s| s as f32),
            DepthUnit::Millimeter,
        ),
        DecodingResult::U32(v) => (
            take_first_channel(&v, pixels, channels, |s| s as f32),
            DepthUnit::Millimeter,
        ),
        DecodingResult::I8(v) => (
            take_first_channel(&v, pixels, channels, |s| s as f32),
            DepthUnit::Millimeter,
        ),
        DecodingResult::I16(v) => (
            take_first_channel(&v, pixels, channels, |s| s as f32),
            DepthUnit::Millimeter,
        ),
        DecodingResult::I32(v) => (
            take_first_channel(&v, pixels, channels, |s| s as f32),
            DepthUnit::Millimeter,
        ),
        _ => {
            return Err(IoError::UnsupportedTiffLayout(
                "64-bit integer samples".to_string(),
            ))
        }
    };

    let meta = DepthMetadata {
        unit,
        source: SourceMeta::Container,
        ..DepthMetadata::depth_meters()
    };
    Ok((DepthImage::new(width, height, data)?, meta))
}
