use crate::adapter::CompressionHandler;
use crate::codec::Codec;
use compression_core::Level;
use tower::Layer;

/// A Tower layer that compresses the responses of [`Handler`]s.
///
/// [`Handler`]: crate::Handler
#[derive(Debug, Clone)]
pub struct CompressionLayer {
    codec: Codec,
    level: Level,
}

impl CompressionLayer {
    /// Creates a new compression layer with default settings.
    ///
    /// Defaults to gzip at the codec's default level.
    pub fn new() -> Self {
        Self {
            codec: Codec::default(),
            level: Level::Default,
        }
    }

    /// Sets the codec used when the client accepts it.
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Sets the compression level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Default for CompressionLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Layer<H> for CompressionLayer {
    type Service = CompressionHandler<H>;

    fn layer(&self, inner: H) -> Self::Service {
        CompressionHandler::new(inner, self.codec, self.level)
    }
}
