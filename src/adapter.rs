use crate::codec::Codec;
use crate::error::BoxError;
use crate::handler::Handler;
use crate::proxy::CompressingSink;
use crate::sink::ResponseSink;
use compression_core::Level;
use http::{HeaderMap, HeaderValue, Request, header};
use tracing::{trace, warn};

/// A [`Handler`] that compresses the responses of an inner handler.
///
/// Compression is used when the request's `Accept-Encoding` contains the
/// codec's token. Otherwise the inner handler runs against the original sink
/// and the response is left untouched.
#[derive(Debug, Clone)]
pub struct CompressionHandler<H> {
    inner: H,
    codec: Codec,
    level: Level,
}

impl<H> CompressionHandler<H> {
    /// Creates a new compression handler wrapping the given inner handler.
    pub fn new(inner: H, codec: Codec, level: Level) -> Self {
        Self {
            inner,
            codec,
            level,
        }
    }

    /// Returns a reference to the inner handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Returns a mutable reference to the inner handler.
    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    /// Consumes this handler, returning the inner handler.
    pub fn into_inner(self) -> H {
        self.inner
    }

    fn accepts(&self, req: &Request<()>) -> bool {
        req.headers()
            .get(header::ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| self.codec.accepted_by(v))
    }
}

impl<H: Handler> Handler for CompressionHandler<H> {
    fn serve(&self, req: &Request<()>, sink: &mut dyn ResponseSink) -> Result<(), BoxError> {
        if !self.accepts(req) {
            trace!(uri = %req.uri(), "client does not accept compression");
            return self.inner.serve(req, sink);
        }

        let mut sink = CompressingSink::new(sink, self.codec, self.level)?;

        let headers = sink.headers_mut();
        add_vary_accept_encoding(headers);
        headers.insert(
            header::CONTENT_ENCODING,
            HeaderValue::from_static(self.codec.content_encoding()),
        );
        trace!(
            uri = %req.uri(),
            encoding = self.codec.content_encoding(),
            "compressing response"
        );

        let served = self.inner.serve(req, &mut sink);
        let closed = sink.finish();

        match (served, closed) {
            (Ok(()), closed) => closed.map_err(Into::into),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_error)) => {
                warn!(error = %close_error, "handler failed and compressed stream could not be closed");
                Err(e)
            }
        }
    }
}

/// Adds Accept-Encoding to the Vary header if not already present.
fn add_vary_accept_encoding(headers: &mut HeaderMap) {
    // Check all Vary headers to see if Accept-Encoding is already present
    for vary in headers.get_all(header::VARY) {
        if let Ok(vary_str) = vary.to_str() {
            let covered = vary_str.split(',').any(|v| {
                let v = v.trim();
                v == "*" || v.eq_ignore_ascii_case("accept-encoding")
            });
            if covered {
                return;
            }
        }
    }

    headers.append(
        header::VARY,
        HeaderValue::from_static("Accept-Encoding"),
    );
}
