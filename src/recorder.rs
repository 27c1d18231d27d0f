use crate::sink::{Flush, ResponseSink};
use crate::sniff::detect_content_type;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderValue, Response, StatusCode, header};
use std::io;
use tracing::warn;

/// An in-memory [`ResponseSink`].
///
/// Behaves like a plain server response writer: the first body write
/// implicitly sends `200 OK`, and if no `Content-Type` was set by then one is
/// sniffed from the written bytes. Headers are snapshotted when the status is
/// sent, so later mutations do not reach the recorded response.
#[derive(Debug, Clone)]
pub struct ResponseRecorder {
    headers: HeaderMap,
    sent: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
    flushes: usize,
    flushable: bool,
}

impl ResponseRecorder {
    /// Creates a recorder that supports flushing.
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            sent: None,
            body: BytesMut::new(),
            flushes: 0,
            flushable: true,
        }
    }

    /// Creates a recorder without the flush capability.
    pub fn without_flush() -> Self {
        Self {
            flushable: false,
            ..Self::new()
        }
    }

    /// Returns the status sent, or `200 OK` if nothing was sent yet.
    pub fn status(&self) -> StatusCode {
        self.sent
            .as_ref()
            .map_or(StatusCode::OK, |(status, _)| *status)
    }

    /// Returns the headers as sent, or the pending headers if not sent yet.
    pub fn sent_headers(&self) -> &HeaderMap {
        self.sent
            .as_ref()
            .map_or(&self.headers, |(_, headers)| headers)
    }

    /// Returns whether the status line and headers have been sent.
    pub fn headers_sent(&self) -> bool {
        self.sent.is_some()
    }

    /// Returns the recorded body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns how many times the recorder was flushed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Converts the recording into an [`http::Response`].
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status();
        let headers = match self.sent {
            Some((_, headers)) => headers,
            None => self.headers,
        };

        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl Default for ResponseRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if let Some((sent, _)) = &self.sent {
            warn!(%sent, ignored = %status, "superfluous write_header call");
            return;
        }
        self.sent = Some((status, self.headers.clone()));
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.sent.is_none() {
            if !self.headers.contains_key(header::CONTENT_TYPE) {
                self.headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(detect_content_type(data)),
                );
            }
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        if self.flushable {
            Some(self as &mut dyn Flush)
        } else {
            None
        }
    }
}

impl Flush for ResponseRecorder {
    fn flush(&mut self) -> io::Result<()> {
        if self.sent.is_none() {
            self.write_header(StatusCode::OK);
        }
        self.flushes += 1;
        Ok(())
    }
}
