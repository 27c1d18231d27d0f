#[cfg(feature = "deflate")]
use compression_codecs::deflate::DeflateEncoder;
use compression_codecs::{EncodeV2, gzip::GzipEncoder};
use compression_core::Level;

/// Supported compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// Gzip compression.
    #[default]
    Gzip,
    /// Deflate compression.
    #[cfg(feature = "deflate")]
    Deflate,
}

impl Codec {
    /// Returns the Content-Encoding header value for this codec.
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            #[cfg(feature = "deflate")]
            Codec::Deflate => "deflate",
        }
    }

    /// Returns whether the given Accept-Encoding value asks for this codec.
    ///
    /// This is a plain, case-sensitive substring test. Quality values and
    /// list syntax are not interpreted, so `gzip;q=0` still matches.
    pub fn accepted_by(&self, accept_encoding: &str) -> bool {
        accept_encoding.contains(self.content_encoding())
    }

    /// Creates a new encoder for this codec.
    pub(crate) fn encoder(&self, level: Level) -> Box<dyn EncodeV2 + Send> {
        match self {
            Codec::Gzip => Box::new(GzipEncoder::new(level.into())),
            #[cfg(feature = "deflate")]
            Codec::Deflate => Box::new(DeflateEncoder::new(level.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_encoding() {
        assert_eq!(Codec::Gzip.content_encoding(), "gzip");
        #[cfg(feature = "deflate")]
        assert_eq!(Codec::Deflate.content_encoding(), "deflate");
    }

    #[test]
    fn test_accepted_by_simple() {
        assert!(Codec::Gzip.accepted_by("gzip"));
        assert!(Codec::Gzip.accepted_by("deflate, gzip"));
        assert!(Codec::Gzip.accepted_by("gzip, deflate, br"));
    }

    #[test]
    fn test_accepted_by_is_substring_match() {
        assert!(Codec::Gzip.accepted_by("x-gzip"));
        assert!(Codec::Gzip.accepted_by("gzip;q=0"));
        assert!(Codec::Gzip.accepted_by("nogzipplease"));
    }

    #[test]
    fn test_accepted_by_is_case_sensitive() {
        assert!(!Codec::Gzip.accepted_by("GZIP"));
        assert!(!Codec::Gzip.accepted_by("Gzip"));
    }

    #[test]
    fn test_not_accepted() {
        assert!(!Codec::Gzip.accepted_by(""));
        assert!(!Codec::Gzip.accepted_by("identity"));
        assert!(!Codec::Gzip.accepted_by("br, zstd"));
        assert!(!Codec::Gzip.accepted_by("g zip"));
    }
}
