use depthcloud_image::{DepthImage, DepthMetadata, SourceMeta};

use crate::error::IoError;
use crate::npz::read_npz;
use crate::registry::{extension_matches, DepthReader};

/// The six magic bytes opening every NPY stream.
pub(crate) const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

const SUPPORTED_DTYPES: &str = "f4, f8, i1, u1, i2, u2, i4, u4, i8, u8";

/// Reader for NumPy arrays, both bare `.npy` files and `.npz` archives.
pub struct NpyReader;

impl DepthReader for NpyReader {
    fn name(&self) -> &'static str {
        "npy"
    }

    fn can_read(&self, filename: &str, mime: Option<&str>) -> bool {
        extension_matches(filename, &["npy", "npz"]) || mime == Some("application/x-npy")
    }

    fn read(&self, buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
        // An NPZ archive is a ZIP stream; dispatch on the leading signature.
        if buf.starts_with(b"PK") {
            return read_npz(buf);
        }
        read_npy(buf, None)
    }
}

/// A parsed NumPy dtype descriptor such as `<f4` or `|u1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NpyDtype {
    /// Type class: `f`, `i` or `u`.
    pub kind: char,
    /// Element size in bytes.
    pub size: usize,
    /// True for `>` byte order.
    pub big_endian: bool,
    /// The descriptor string as stored, for diagnostics.
    pub descr: String,
}

impl NpyDtype {
    fn parse(descr: &str) -> Result<Self, IoError> {
        let mut chars = descr.chars();
        let order = chars
            .next()
            .ok_or_else(|| IoError::InvalidNpy("empty dtype descriptor".to_string()))?;
        let big_endian = match order {
            '>' => true,
            // '=' is native order; this parser targets little-endian hosts.
            '<' | '|' | '=' => false,
            _ => {
                return Err(IoError::InvalidNpy(format!(
                    "unknown byte order in dtype {descr:?}"
                )))
            }
        };
        let kind = chars
            .next()
            .ok_or_else(|| IoError::InvalidNpy(format!("truncated dtype {descr:?}")))?;
        let size: usize = chars
            .as_str()
            .parse()
            .map_err(|_| IoError::InvalidNpy(format!("bad element size in dtype {descr:?}")))?;

        let supported = match kind {
            'f' => matches!(size, 4 | 8),
            'i' | 'u' => matches!(size, 1 | 2 | 4 | 8),
            _ => false,
        };
        if !supported {
            return Err(IoError::InvalidNpy(format!(
                "unsupported dtype {descr:?}, supported: {SUPPORTED_DTYPES}"
            )));
        }

        Ok(Self {
            kind,
            size,
            big_endian,
            descr: descr.to_string(),
        })
    }
}

/// Parsed NPY header: dtype, layout and where the payload starts.
#[derive(Debug, Clone)]
pub(crate) struct NpyHeader {
    pub dtype: NpyDtype,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
    pub data_offset: usize,
}

/// Extract the quoted string value of `key` from the textual header dict.
fn header_str_value(header: &str, key: &str) -> Option<String> {
    let pat = format!("'{key}':");
    let start = header.find(&pat)? + pat.len();
    let rest = header[start..].trim_start();
    let quote = rest.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// Extract the boolean value of `key` from the textual header dict.
fn header_bool_value(header: &str, key: &str) -> Option<bool> {
    let pat = format!("'{key}':");
    let start = header.find(&pat)? + pat.len();
    let rest = header[start..].trim_start();
    if rest.starts_with("True") {
        Some(true)
    } else if rest.starts_with("False") {
        Some(false)
    } else {
        None
    }
}

/// Extract the shape tuple from the textual header dict.
fn header_shape_value(header: &str) -> Option<Vec<usize>> {
    let pat = "'shape':";
    let start = header.find(pat)? + pat.len();
    let rest = header[start..].trim_start();
    let rest = rest.strip_prefix('(')?;
    let end = rest.find(')')?;
    let mut shape = Vec::new();
    for part in rest[..end].split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        shape.push(part.parse().ok()?);
    }
    Some(shape)
}

/// Parse the magic, version and header dict of an NPY stream.
///
/// Structured text extraction only; this is not a Python literal evaluator.
pub(crate) fn parse_npy_header(buf: &[u8]) -> Result<NpyHeader, IoError> {
    if buf.len() < NPY_MAGIC.len() || &buf[..NPY_MAGIC.len()] != NPY_MAGIC {
        return Err(IoError::InvalidNpy("missing magic number".to_string()));
    }
    if buf.len() < 10 {
        return Err(IoError::InvalidNpy("truncated version field".to_string()));
    }
    let major = buf[6];
    let minor = buf[7];

    // Version 1 stores the header length as u16, version 2 as u32.
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([buf[8], buf[9]]) as usize, 10usize),
        2 => {
            if buf.len() < 12 {
                return Err(IoError::InvalidNpy("truncated version 2 header length".to_string()));
            }
            (
                u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize,
                12usize,
            )
        }
        _ => {
            return Err(IoError::InvalidNpy(format!(
                "unsupported version {major}.{minor}"
            )))
        }
    };

    let data_offset = header_start + header_len;
    if buf.len() < data_offset {
        return Err(IoError::InvalidNpy("header extends past end of file".to_string()));
    }
    let header = std::str::from_utf8(&buf[header_start..data_offset])
        .map_err(|_| IoError::InvalidNpy("header dict is not ASCII".to_string()))?;

    let descr = header_str_value(header, "descr")
        .ok_or_else(|| IoError::InvalidNpy("header dict has no 'descr' entry".to_string()))?;
    let dtype = NpyDtype::parse(&descr)?;
    let fortran_order = header_bool_value(header, "fortran_order")
        .ok_or_else(|| IoError::InvalidNpy("header dict has no 'fortran_order' entry".to_string()))?;
    let shape = header_shape_value(header)
        .ok_or_else(|| IoError::InvalidNpy("header dict has no parseable 'shape' entry".to_string()))?;

    Ok(NpyHeader {
        dtype,
        fortran_order,
        shape,
        data_offset,
    })
}

/// Read one element at flat index `i` as f32.
#[inline]
fn element_to_f32(payload: &[u8], dtype: &NpyDtype, i: usize) -> f32 {
    let off = i * dtype.size;
    macro_rules! load {
        ($ty:ty) => {{
            let mut bytes = [0u8; std::mem::size_of::<$ty>()];
            bytes.copy_from_slice(&payload[off..off + dtype.size]);
            if dtype.big_endian {
                <$ty>::from_be_bytes(bytes) as f32
            } else {
                <$ty>::from_le_bytes(bytes) as f32
            }
        }};
    }
    match (dtype.kind, dtype.size) {
        ('f', 4) => load!(f32),
        ('f', 8) => load!(f64),
        ('i', 1) => payload[off] as i8 as f32,
        ('i', 2) => load!(i16),
        ('i', 4) => load!(i32),
        ('i', 8) => load!(i64),
        ('u', 1) => payload[off] as f32,
        ('u', 2) => load!(u16),
        ('u', 4) => load!(u32),
        ('u', 8) => load!(u64),
        // NpyDtype::parse admits no other combination.
        _ => f32::NAN,
    }
}

/// Decode the array body described by `header`, selecting `channel` for 3D input.
pub(crate) fn decode_npy_array(
    buf: &[u8],
    header: &NpyHeader,
    channel: usize,
) -> Result<(DepthImage, usize), IoError> {
    if header.fortran_order {
        return Err(IoError::InvalidNpy(
            "fortran_order arrays are not supported".to_string(),
        ));
    }

    let (height, width, channels) = match header.shape.as_slice() {
        [h, w] => (*h, *w, 1usize),
        [h, w, c] if *c >= 1 && *c <= 4 => (*h, *w, *c),
        other => {
            return Err(IoError::InvalidNpy(format!(
                "unsupported shape {other:?}, expected (h, w) or (h, w, c) with c <= 4"
            )))
        }
    };
    if channel >= channels {
        return Err(IoError::InvalidNpy(format!(
            "channel {channel} out of range for {channels}-channel array"
        )));
    }

    let count = height * width * channels;
    let expected = count * header.dtype.size;
    let payload = &buf[header.data_offset..];
    if payload.len() < expected {
        return Err(IoError::NpyTooShort {
            shape: header.shape.clone(),
            dtype: header.dtype.descr.clone(),
            expected,
            actual: payload.len(),
        });
    }

    let mut data = vec![0f32; height * width];
    for (i, out) in data.iter_mut().enumerate() {
        *out = element_to_f32(payload, &header.dtype, i * channels + channel);
    }

    Ok((DepthImage::new(width, height, data)?, channels))
}

/// Decode a bare NPY buffer into a depth raster.
///
/// 3D arrays select `channel` (default 0) and flag the metadata as requiring
/// caller configuration.
pub fn read_npy(buf: &[u8], channel: Option<usize>) -> Result<(DepthImage, DepthMetadata), IoError> {
    let header = parse_npy_header(buf)?;
    let selected = channel.unwrap_or(0);
    let (image, channels) = decode_npy_array(buf, &header, selected)?;

    let meta = DepthMetadata {
        source: SourceMeta::Npy {
            channels,
            selected_channel: selected,
            requires_configuration: channels > 1,
        },
        ..DepthMetadata::depth_meters()
    };
    Ok((image, meta))
}

/// Serialize an f32 array as a version 1 NPY buffer. Test helper shared with
/// the NPZ tests.
#[cfg(test)]
pub(crate) fn build_npy_f32(shape: &[usize], values: &[f32]) -> Vec<u8> {
    let shape_str = match shape {
        [a] => format!("({a},)"),
        other => {
            let dims: Vec<String> = other.iter().map(|d| d.to_string()).collect();
            format!("({})", dims.join(", "))
        }
    };
    let mut header = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': {shape_str}, }}");
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut buf = Vec::new();
    buf.extend_from_slice(NPY_MAGIC);
    buf.push(1);
    buf.push(0);
    buf.extend_from_slice(&(header.len() as u16).to_le_bytes());
    buf.extend_from_slice(header.as_bytes());
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}
