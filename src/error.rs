use std::collections::TryReserveError;
use std::io;

/// Boxed error type returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the compression adapter itself.
///
/// Errors returned by the wrapped handler are passed through untouched and
/// never wrapped in this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The compressor's output buffer could not be allocated.
    ///
    /// Only that buffer is reserved fallibly; the codec's own state is
    /// allocated by the codec and aborts on exhaustion like any other
    /// allocation.
    #[error("failed to initialize compressor: {0}")]
    CompressorInit(#[from] TryReserveError),

    /// Finishing the compressed stream failed after the handler returned.
    #[error("failed to close compressed stream: {0}")]
    Close(#[source] io::Error),
}
