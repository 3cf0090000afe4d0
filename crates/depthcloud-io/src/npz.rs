use depthcloud_image::{ArrayInfo, DepthImage, DepthKind, DepthMetadata, SourceMeta};

use crate::error::IoError;
use crate::npy::{decode_npy_array, parse_npy_header, NpyHeader};

/// ZIP local file header signature, little-endian `0x04034B50`.
const LOCAL_FILE_HEADER: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const LOCAL_FILE_HEADER_LEN: usize = 30;

/// Array names preferred when an archive holds several candidates, in order.
const PREFERRED_NAMES: [&str; 5] = ["depth", "disparity", "distance", "z", "range"];

#[inline]
fn read_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

#[inline]
fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// One `.npy` member whose header parsed successfully.
struct NpzEntry {
    name: String,
    header: NpyHeader,
    /// Entry payload (a complete NPY stream) within the archive.
    start: usize,
    end: usize,
}

/// Walk the archive's local file headers and collect stored `.npy` members.
///
/// This is a forward scan over local headers, not a central-directory parse;
/// it is enough for the archives NumPy itself writes. Compressed members are
/// skipped with a warning since decompression is not implemented.
fn scan_entries(buf: &[u8]) -> Result<Vec<NpzEntry>, IoError> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while pos + LOCAL_FILE_HEADER_LEN <= buf.len() {
        if buf[pos..pos + 4] != LOCAL_FILE_HEADER {
            // First record of the central directory (or garbage): done.
            break;
        }
        let flags = read_u16(buf, pos + 6);
        let method = read_u16(buf, pos + 8);
        let comp_size = read_u32(buf, pos + 18) as usize;
        let name_len = read_u16(buf, pos + 26) as usize;
        let extra_len = read_u16(buf, pos + 28) as usize;

        let name_start = pos + LOCAL_FILE_HEADER_LEN;
        let data_start = name_start + name_len + extra_len;
        let data_end = data_start + comp_size;
        if data_end > buf.len() {
            return Err(IoError::InvalidNpz(
                "entry extends past end of archive".to_string(),
            ));
        }
        let name = String::from_utf8_lossy(&buf[name_start..name_start + name_len]).to_string();

        // Sizes live in a trailing data descriptor we do not chase.
        if flags & 0x08 != 0 && comp_size == 0 {
            return Err(IoError::InvalidNpz(format!(
                "entry {name:?} uses a data descriptor, sizes unavailable"
            )));
        }

        if method != 0 {
            log::warn!("skipping compressed NPZ entry {name:?} (method {method}), decompression is not implemented");
            pos = data_end;
            continue;
        }

        if name.ends_with(".npy") {
            let payload = &buf[data_start..data_end];
            match parse_npy_header(payload) {
                Ok(header) => entries.push(NpzEntry {
                    name: name.trim_end_matches(".npy").to_string(),
                    header,
                    start: data_start,
                    end: data_end,
                }),
                Err(err) => {
                    log::warn!("skipping NPZ entry {name:?}: {err}");
                }
            }
        }

        pos = data_end;
    }

    Ok(entries)
}

/// Pick the entry to decode: preferred names first, else the first 2D array.
fn select_entry(entries: &[NpzEntry]) -> Option<usize> {
    let is_2d = |e: &NpzEntry| e.header.shape.len() == 2;
    for preferred in PREFERRED_NAMES {
        if let Some(i) = entries
            .iter()
            .position(|e| is_2d(e) && e.name.eq_ignore_ascii_case(preferred))
        {
            return Some(i);
        }
    }
    entries.iter().position(is_2d)
}

/// The depth kind implied by an array's name inside the archive.
///
/// Disparity selections leave the stereo parameters unset; the caller has to
/// supply them before normalization.
fn kind_for_name(name: &str) -> DepthKind {
    if name.eq_ignore_ascii_case("disparity") {
        DepthKind::Disparity
    } else if name.eq_ignore_ascii_case("z") {
        DepthKind::Z
    } else {
        DepthKind::Depth
    }
}

/// Decode an NPZ archive, selecting the most depth-like 2D array.
pub fn read_npz(buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError> {
    let entries = scan_entries(buf)?;

    let available: Vec<ArrayInfo> = entries
        .iter()
        .map(|e| ArrayInfo {
            name: e.name.clone(),
            shape: e.header.shape.clone(),
            dtype: e.header.dtype.descr.clone(),
        })
        .collect();

    let Some(index) = select_entry(&entries) else {
        let listing = if available.is_empty() {
            "none".to_string()
        } else {
            available
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        return Err(IoError::NpzNoSuitableArray(listing));
    };

    let entry = &entries[index];
    let (image, _) = decode_npy_array(&buf[entry.start..entry.end], &entry.header, 0)?;

    let meta = DepthMetadata {
        kind: kind_for_name(&entry.name),
        source: SourceMeta::Npz {
            available_arrays: available,
            selected_array: entry.name.clone(),
        },
        ..DepthMetadata::depth_meters()
    };
    Ok((image, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npy::build_npy_f32;

    fn zip_entry(name: &str, payload: &[u8], method: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&LOCAL_FILE_HEADER);
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&method.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
        buf.extend_from_slice(&0u32.to_le_bytes()); // crc32, unchecked
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra len
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn selects_preferred_name_over_first() {
        let other = build_npy_f32(&[1, 2], &[9.0, 9.0]);
        let depth = build_npy_f32(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        let mut archive = zip_entry("other.npy", &other, 0);
        archive.extend(zip_entry("depth.npy", &depth, 0));

        let (image, meta) = read_npz(&archive).unwrap();
        assert_eq!(image.data, vec![1.0, 2.0, 3.0, 4.0]);
        match meta.source {
            SourceMeta::Npz {
                available_arrays,
                selected_array,
            } => {
                assert_eq!(selected_array, "depth");
                assert_eq!(available_arrays.len(), 2);
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_first_2d_array() {
        let a = build_npy_f32(&[1, 2], &[5.0, 6.0]);
        let b = build_npy_f32(&[1, 2], &[7.0, 8.0]);
        let mut archive = zip_entry("foo.npy", &a, 0);
        archive.extend(zip_entry("bar.npy", &b, 0));

        let (image, meta) = read_npz(&archive).unwrap();
        assert_eq!(image.data, vec![5.0, 6.0]);
        assert!(matches!(
            meta.source,
            SourceMeta::Npz { ref selected_array, .. } if selected_array == "foo"
        ));
    }

    #[test]
    fn disparity_name_sets_kind() {
        let disp = build_npy_f32(&[1, 2], &[10.0, 20.0]);
        let archive = zip_entry("disparity.npy", &disp, 0);
        let (_, meta) = read_npz(&archive).unwrap();
        assert_eq!(meta.kind, DepthKind::Disparity);
        assert!(meta.disparity.is_none());
    }

    #[test]
    fn compressed_entries_are_skipped_not_fatal() {
        let depth = build_npy_f32(&[1, 2], &[1.0, 2.0]);
        let mut archive = zip_entry("packed.npy", b"\x01\x02\x03", 8);
        archive.extend(zip_entry("depth.npy", &depth, 0));

        let (image, _) = read_npz(&archive).unwrap();
        assert_eq!(image.data, vec![1.0, 2.0]);
    }

    #[test]
    fn archive_without_2d_arrays_lists_available() {
        let cube = build_npy_f32(&[1, 1, 2, 1], &[0.0, 0.0]);
        let archive = zip_entry("cube.npy", &cube, 0);
        let err = read_npz(&archive).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no suitable 2D arrays"));
        assert!(msg.contains("cube"));
    }

    #[test]
    fn empty_archive_is_fatal() {
        let err = read_npz(&[]).unwrap_err();
        assert!(matches!(err, IoError::NpzNoSuitableArray(_)));
    }
}
