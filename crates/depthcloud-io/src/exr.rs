use depthcloud_image::{DepthImage, DepthMetadata, SourceMeta};
use image::{DynamicImage, ImageFormat};

use crate::error::IoError;
use crate::registry::{extension_matches, DepthReader};

/// Reader for OpenEXR depth maps.
///
/// Decoding is delegated to the `image` crate; EXR stores float samples, so
/// values pass through as meters with channel 0 selected.
pub struct ExrReader;

impl DepthReader for ExrReader {
    fn name(&self) -> &'static str {
        "exr"
    }

    fn can_read(&self, filename: &str, mime: Option<&str>) -> bool {
        extension_matches(filename, &["exr"]) || mime == Some("image/x-exr")
    }

    fn read(&self, buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
        read_exr_depth(buf)
    }
}

/// Decode an OpenEXR byte buffer into a depth raster.
pub fn read_exr_depth(buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
    let dynimg = image::load_from_memory_with_format(buf, ImageFormat::OpenExr)?;
    let width = dynimg.width() as usize;
    let height = dynimg.height() as usize;

    let data: Vec<f32> = match dynimg {
        DynamicImage::ImageRgb32F(img) => img.pixels().map(|p| p.0[0]).collect(),
        DynamicImage::ImageRgba32F(img) => img.pixels().map(|p| p.0[0]).collect(),
        other => other.to_rgb32f().pixels().map(|p| p.0[0]).collect(),
    };

    let meta = DepthMetadata {
        source: SourceMeta::Container,
        ..DepthMetadata::depth_meters()
    };
    Ok((DepthImage::new(width, height, data)?, meta))
}
