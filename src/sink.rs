use http::{HeaderMap, StatusCode};
use std::io;

/// The write side of an HTTP response.
///
/// Headers may be mutated until they are finalized, either explicitly with
/// [`write_header`](ResponseSink::write_header) or implicitly by the first
/// body write. Mutations after that point are not sent.
pub trait ResponseSink {
    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for mutation.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Finalizes the headers and sends the status line.
    fn write_header(&mut self, status: StatusCode);

    /// Writes a chunk of the body, returning how many bytes were accepted.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Returns the flush capability if this sink supports it.
    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        None
    }

    /// Writes the whole buffer, retrying on short writes.
    fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match self.write(data) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Optional capability of sinks that can push buffered output to the client.
pub trait Flush {
    /// Sends any buffered data to the client.
    fn flush(&mut self) -> io::Result<()>;
}
