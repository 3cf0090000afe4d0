use depthcloud_image::{DepthImage, DepthMetadata};

use crate::error::IoError;
use crate::exr::ExrReader;
use crate::npy::NpyReader;
use crate::pfm::PfmReader;
use crate::png::PngReader;
use crate::tiff::TiffReader;

/// A decoder for one family of depth raster containers.
///
/// Readers operate on byte buffers already loaded by the caller; no file I/O
/// happens in this crate.
pub trait DepthReader {
    /// Short format name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this reader claims the file, judged from the filename
    /// extension (case-insensitive) and an optional MIME hint.
    fn can_read(&self, filename: &str, mime: Option<&str>) -> bool;

    /// Decode the byte buffer into a raster plus interpretation metadata.
    fn read(&self, buf: &[u8]) -> Result<(DepthImage, DepthMetadata), IoError>;
}

/// Matches a filename extension against a list of candidates, case-insensitively.
pub(crate) fn extension_matches(filename: &str, extensions: &[&str]) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// An ordered dispatch table of [`DepthReader`]s.
///
/// The first registered reader whose `can_read` matches wins. The registry is
/// a plain value: build one at startup and pass it to wherever decoding
/// happens. It holds no per-file state.
pub struct ReaderRegistry {
    readers: Vec<Box<dyn DepthReader + Send + Sync>>,
}

impl ReaderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Append a reader; earlier registrations are tried first.
    pub fn register(&mut self, reader: Box<dyn DepthReader + Send + Sync>) {
        self.readers.push(reader);
    }

    /// Find the first reader claiming the file, if any.
    pub fn find(&self, filename: &str, mime: Option<&str>) -> Option<&(dyn DepthReader + Send + Sync)> {
        self.readers
            .iter()
            .find(|r| r.can_read(filename, mime))
            .map(|r| r.as_ref())
    }

    /// Decode a byte buffer using the first reader that claims the filename.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NoReaderFound`] when no reader matches; otherwise
    /// the reader's own parse error is propagated verbatim.
    pub fn decode(
        &self,
        filename: &str,
        buf: &[u8],
    ) -> Result<(DepthImage, DepthMetadata), IoError> {
        let reader = self
            .find(filename, None)
            .ok_or_else(|| IoError::NoReaderFound(filename.to_string()))?;
        reader.read(buf)
    }
}

impl Default for ReaderRegistry {
    /// Registry with the full reader set: TIFF, PNG, PFM, EXR, NPY/NPZ.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TiffReader));
        registry.register(Box::new(PngReader));
        registry.register(Box::new(PfmReader));
        registry.register(Box::new(ExrReader));
        registry.register(Box::new(NpyReader));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_matches_extension_case_insensitively() {
        let registry = ReaderRegistry::default();
        assert_eq!(registry.find("scan.PFM", None).map(|r| r.name()), Some("pfm"));
        assert_eq!(registry.find("depth.npz", None).map(|r| r.name()), Some("npy"));
        assert_eq!(registry.find("frame.TIF", None).map(|r| r.name()), Some("tiff"));
        assert_eq!(registry.find("frame.exr", None).map(|r| r.name()), Some("exr"));
        assert!(registry.find("notes.txt", None).is_none());
    }

    #[test]
    fn find_honors_mime_hint() {
        let registry = ReaderRegistry::default();
        assert_eq!(
            registry.find("blob", Some("image/png")).map(|r| r.name()),
            Some("png")
        );
    }

    #[test]
    fn decode_without_reader_names_the_file() {
        let registry = ReaderRegistry::default();
        let err = registry.decode("depth.xyz", &[]).unwrap_err();
        assert!(matches!(err, IoError::NoReaderFound(ref f) if f == "depth.xyz"));
    }

    #[test]
    fn registration_order_is_first_match_wins() {
        let mut registry = ReaderRegistry::new();
        registry.register(Box::new(PfmReader));
        registry.register(Box::new(NpyReader));
        assert_eq!(registry.find("a.pfm", None).map(|r| r.name()), Some("pfm"));
        assert_eq!(registry.find("a.npy", None).map(|r| r.name()), Some("npy"));
    }
}
