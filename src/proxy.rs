use crate::codec::Codec;
use crate::encoder::StreamEncoder;
use crate::error::Error;
use crate::sink::{Flush, ResponseSink};
use crate::sniff::detect_content_type;
use compression_core::Level;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use std::io;
use tracing::{debug, warn};

/// A response sink that compresses the body on its way to the real sink.
///
/// Header access passes straight through to the wrapped sink. Body writes go
/// through the encoder, after a `Content-Type` has been sniffed from the
/// first chunk if the handler did not set one. The encoder is closed by
/// [`finish`](Self::finish), or on drop if `finish` was never reached.
pub struct CompressingSink<'a> {
    inner: &'a mut dyn ResponseSink,
    encoder: StreamEncoder,
    headers_finalized: bool,
}

impl<'a> CompressingSink<'a> {
    /// Wraps `inner`, compressing everything written with `codec`.
    ///
    /// Nothing is written to `inner` until the first body byte or header
    /// finalization.
    pub fn new(inner: &'a mut dyn ResponseSink, codec: Codec, level: Level) -> Result<Self, Error> {
        let encoder = StreamEncoder::new(codec, level)?;
        Ok(Self {
            inner,
            encoder,
            headers_finalized: false,
        })
    }

    /// Returns whether the response headers have been finalized.
    pub fn headers_finalized(&self) -> bool {
        self.headers_finalized
    }

    /// Closes the compressed stream, writing any buffered output.
    pub fn finish(mut self) -> Result<(), Error> {
        self.close().map_err(Error::Close)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.encoder.is_finished() {
            return Ok(());
        }
        if !self.headers_finalized {
            // Even an empty body gets framing bytes; label it before the real
            // sink sniffs those instead.
            self.set_content_type(&[]);
            self.finalize();
        }
        self.encoder.finish(&mut *self.inner)
    }

    fn set_content_type(&mut self, data: &[u8]) {
        let headers = self.inner.headers_mut();
        if headers.contains_key(header::CONTENT_TYPE) {
            return;
        }
        let content_type = detect_content_type(data);
        debug!(content_type, "sniffed content type of compressed response");
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        );
    }

    fn finalize(&mut self) {
        if !self.headers_finalized {
            self.headers_finalized = true;
            // The handler's length describes the uncompressed body.
            self.inner.headers_mut().remove(header::CONTENT_LENGTH);
        }
    }
}

impl ResponseSink for CompressingSink<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.finalize();
        self.inner.write_header(status);
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.headers_finalized {
            self.set_content_type(data);
            self.finalize();
        }
        self.encoder.write(data, &mut *self.inner)
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        if self.inner.as_flush().is_some() {
            Some(self as &mut dyn Flush)
        } else {
            None
        }
    }
}

impl Flush for CompressingSink<'_> {
    fn flush(&mut self) -> io::Result<()> {
        if self.inner.as_flush().is_none() {
            return Ok(());
        }
        if !self.headers_finalized {
            // Flushing sends the headers as-is, like an uncompressed flush
            // would. The real sink must not sniff the framing bytes.
            self.write_header(StatusCode::OK);
        }
        self.encoder.flush(&mut *self.inner)?;
        match self.inner.as_flush() {
            Some(flush) => flush.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for CompressingSink<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(%error, "failed to close compressed stream on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::ResponseRecorder;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    /// A sink whose body writes always fail.
    struct BrokenSink {
        headers: HeaderMap,
    }

    impl ResponseSink for BrokenSink {
        fn headers(&self) -> &HeaderMap {
            &self.headers
        }

        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, _status: StatusCode) {}

        fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_sniffs_content_type_from_first_write() {
        let mut rec = ResponseRecorder::new();
        let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();

        sink.write_all(b"<!DOCTYPE html><html></html>").unwrap();
        sink.write_all(b"\x00\x01 binary tail").unwrap();
        assert!(sink.headers_finalized());
        sink.finish().unwrap();

        assert_eq!(
            rec.sent_headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_keeps_explicit_content_type() {
        let mut rec = ResponseRecorder::new();
        let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();

        sink.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        sink.write_all(b"{\"a\": 1}").unwrap();
        sink.finish().unwrap();

        assert_eq!(
            rec.sent_headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(gunzip(rec.body()), b"{\"a\": 1}");
    }

    #[test]
    fn test_no_sniffing_after_write_header() {
        let mut rec = ResponseRecorder::new();
        let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();

        sink.write_header(StatusCode::ACCEPTED);
        assert!(sink.headers_finalized());
        sink.write_all(b"hello").unwrap();
        sink.finish().unwrap();

        assert_eq!(rec.status(), StatusCode::ACCEPTED);
        assert!(rec.sent_headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(gunzip(rec.body()), b"hello");
    }

    #[test]
    fn test_content_length_removed() {
        let mut rec = ResponseRecorder::new();
        let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();

        sink.headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from_static("5"));
        sink.write_all(b"hello").unwrap();
        sink.finish().unwrap();

        assert!(rec.sent_headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_empty_body_labelled_as_text() {
        let mut rec = ResponseRecorder::new();
        let sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();
        sink.finish().unwrap();

        assert_eq!(
            rec.sent_headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert!(gunzip(rec.body()).is_empty());
    }

    #[test]
    fn test_flush_pushes_compressed_bytes() {
        let mut rec = ResponseRecorder::new();
        let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();

        sink.write_all(b"tick").unwrap();
        sink.as_flush().expect("recorder supports flush").flush().unwrap();
        sink.finish().unwrap();

        assert_eq!(rec.flushes(), 1);
        assert_eq!(gunzip(rec.body()), b"tick");
    }

    #[test]
    fn test_flush_before_write_does_not_expose_framing_to_sniffing() {
        let mut rec = ResponseRecorder::new();
        let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();

        sink.as_flush().expect("recorder supports flush").flush().unwrap();
        assert!(sink.headers_finalized());
        sink.write_all(b"data: hello\n\n").unwrap();
        sink.finish().unwrap();

        assert_eq!(rec.status(), StatusCode::OK);
        assert!(rec.sent_headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(gunzip(rec.body()), b"data: hello\n\n");
    }

    #[test]
    fn test_flush_unsupported_is_noop() {
        let mut rec = ResponseRecorder::without_flush();
        let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();

        sink.write_all(b"tick").unwrap();
        assert!(sink.as_flush().is_none());
        Flush::flush(&mut sink).unwrap();
        sink.finish().unwrap();

        assert_eq!(rec.flushes(), 0);
        assert_eq!(gunzip(rec.body()), b"tick");
    }

    #[test]
    fn test_drop_closes_stream() {
        let mut rec = ResponseRecorder::new();
        {
            let mut sink = CompressingSink::new(&mut rec, Codec::Gzip, Level::Default).unwrap();
            sink.write_all(b"dropped without finish").unwrap();
        }

        assert_eq!(gunzip(rec.body()), b"dropped without finish");
    }

    #[test]
    fn test_close_failure_surfaces() {
        let mut broken = BrokenSink {
            headers: HeaderMap::new(),
        };
        let sink = CompressingSink::new(&mut broken, Codec::Gzip, Level::Default).unwrap();

        match sink.finish() {
            Err(Error::Close(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("Expected close error, got {other:?}"),
        }
    }
}
