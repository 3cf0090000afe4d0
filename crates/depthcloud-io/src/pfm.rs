use depthcloud_image::{DepthImage, DepthMetadata, SourceMeta};

use crate::error::IoError;
use crate::registry::{extension_matches, DepthReader};

/// Reader for Portable Float Map (PFM) depth images.
///
/// PFM stores an ASCII header (`Pf` for one channel, `PF` for three), the
/// raster dimensions, a scale line whose sign encodes endianness (negative is
/// little-endian), then raw IEEE-754 float32 samples bottom-row-first.
pub struct PfmReader;

impl DepthReader for PfmReader {
    fn name(&self) -> &'static str {
        "pfm"
    }

    fn can_read(&self, filename: &str, mime: Option<&str>) -> bool {
        extension_matches(filename, &["pfm"]) || mime == Some("image/x-portable-floatmap")
    }

    fn read(&self, buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
        read_pfm(buf)
    }
}

/// Consume one whitespace-delimited ASCII token starting at `*pos`.
fn next_token<'a>(buf: &'a [u8], pos: &mut usize) -> Result<&'a str, IoError> {
    while *pos < buf.len() && buf[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    let start = *pos;
    while *pos < buf.len() && !buf[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        return Err(IoError::InvalidPfm("truncated header".to_string()));
    }
    std::str::from_utf8(&buf[start..*pos])
        .map_err(|_| IoError::InvalidPfm("header is not ASCII".to_string()))
}

/// Decode a PFM byte buffer into a top-left-origin depth raster.
pub fn read_pfm(buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
    let mut pos = 0usize;

    let magic = next_token(buf, &mut pos)?;
    let channels = match magic {
        "Pf" => 1usize,
        "PF" => 3usize,
        other => {
            return Err(IoError::InvalidPfm(format!(
                "bad magic {other:?}, expected \"Pf\" or \"PF\""
            )))
        }
    };

    let width: usize = next_token(buf, &mut pos)?
        .parse()
        .map_err(|_| IoError::InvalidPfm("width is not an integer".to_string()))?;
    let height: usize = next_token(buf, &mut pos)?
        .parse()
        .map_err(|_| IoError::InvalidPfm("height is not an integer".to_string()))?;
    if width == 0 || height == 0 {
        return Err(IoError::InvalidPfm(format!(
            "dimensions must be non-zero, got {width}x{height}"
        )));
    }

    let scale: f32 = next_token(buf, &mut pos)?
        .parse()
        .map_err(|_| IoError::InvalidPfm("scale is not a number".to_string()))?;
    let little_endian = scale < 0.0;

    // Exactly one whitespace byte separates the scale line from the payload.
    if pos < buf.len() && buf[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let needed = width * height * channels * 4;
    let payload = &buf[pos..];
    if payload.len() < needed {
        return Err(IoError::InvalidPfm(format!(
            "payload holds {} bytes, {needed} required for {width}x{height}x{channels}",
            payload.len()
        )));
    }

    // Rows are stored bottom-first; flip them while selecting channel 0.
    let mut data = vec![0f32; width * height];
    for y in 0..height {
        let src_row = height - 1 - y;
        for x in 0..width {
            let off = (src_row * width + x) * channels * 4;
            let bytes = [
                payload[off],
                payload[off + 1],
                payload[off + 2],
                payload[off + 3],
            ];
            data[y * width + x] = if little_endian {
                f32::from_le_bytes(bytes)
            } else {
                f32::from_be_bytes(bytes)
            };
        }
    }

    let meta = DepthMetadata {
        scale: (scale.abs() != 1.0 && scale != 0.0).then_some(scale.abs() as f64),
        source: SourceMeta::Pfm { channels },
        ..DepthMetadata::depth_meters()
    };

    Ok((DepthImage::new(width, height, data)?, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthcloud_image::{DepthKind, DepthUnit};

    fn build_pfm(magic: &str, width: usize, height: usize, scale: f32, samples: &[f32]) -> Vec<u8> {
        let mut buf = format!("{magic}\n{width} {height}\n{scale}\n").into_bytes();
        for s in samples {
            if scale < 0.0 {
                buf.extend_from_slice(&s.to_le_bytes());
            } else {
                buf.extend_from_slice(&s.to_be_bytes());
            }
        }
        buf
    }

    #[test]
    fn decodes_le_with_row_flip() {
        // Bottom-row-first storage: file rows are [1,2] then [3,4], so the
        // top-left pixel of the raster is 3.
        let buf = build_pfm("Pf", 2, 2, -1.0, &[1.0, 2.0, 3.0, 4.0]);
        let (image, meta) = read_pfm(&buf).unwrap();
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(image.data, vec![3.0, 4.0, 1.0, 2.0]);
        assert_eq!(meta.kind, DepthKind::Depth);
        assert_eq!(meta.unit, DepthUnit::Meter);
        assert_eq!(meta.source, SourceMeta::Pfm { channels: 1 });
    }

    #[test]
    fn decodes_big_endian_when_scale_positive() {
        let buf = build_pfm("Pf", 2, 1, 1.0, &[5.0, 6.0]);
        let (image, _) = read_pfm(&buf).unwrap();
        assert_eq!(image.data, vec![5.0, 6.0]);
    }

    #[test]
    fn three_channel_selects_first() {
        let samples = [1.0, 10.0, 20.0, 2.0, 10.0, 20.0];
        let buf = build_pfm("PF", 2, 1, -1.0, &samples);
        let (image, meta) = read_pfm(&buf).unwrap();
        assert_eq!(image.data, vec![1.0, 2.0]);
        assert_eq!(meta.source, SourceMeta::Pfm { channels: 3 });
    }

    #[test]
    fn carries_scale_magnitude() {
        let buf = build_pfm("Pf", 1, 1, -0.5, &[1.0]);
        let (_, meta) = read_pfm(&buf).unwrap();
        assert_eq!(meta.scale, Some(0.5));
    }

    #[test]
    fn rejects_bad_magic() {
        let buf = build_pfm("P6", 1, 1, -1.0, &[1.0]);
        let err = read_pfm(&buf).unwrap_err();
        assert!(err.to_string().contains("Invalid PFM file"));
    }

    #[test]
    fn rejects_short_payload() {
        let mut buf = build_pfm("Pf", 2, 2, -1.0, &[1.0, 2.0, 3.0, 4.0]);
        buf.truncate(buf.len() - 4);
        assert!(matches!(read_pfm(&buf), Err(IoError::InvalidPfm(_))));
    }
}
