use crate::error::BoxError;
use crate::handler::Handler;
use crate::recorder::ResponseRecorder;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::{Ready, ready};
use std::task::{Context, Poll};
use tower::Service;

/// A Tower service that runs a [`Handler`] to completion.
///
/// The handler writes into a [`ResponseRecorder`]; the recording is returned
/// as a buffered response. The request body is not read and is dropped.
#[derive(Debug, Clone)]
pub struct HandlerService<H> {
    handler: H,
}

impl<H> HandlerService<H> {
    /// Creates a new service running the given handler.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Returns a reference to the handler.
    pub fn get_ref(&self) -> &H {
        &self.handler
    }

    /// Consumes this service, returning the handler.
    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H, ReqBody> Service<Request<ReqBody>> for HandlerService<H>
where
    H: Handler,
{
    type Response = Response<Full<Bytes>>;
    type Error = BoxError;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (parts, _body) = req.into_parts();
        let req = Request::from_parts(parts, ());

        let mut recorder = ResponseRecorder::new();
        if let Err(e) = self.handler.serve(&req, &mut recorder) {
            return ready(Err(e));
        }

        ready(Ok(recorder.into_response().map(Full::new)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::layer::CompressionLayer;
    use crate::sink::ResponseSink;
    use compression_core::Level;
    use flate2::read::GzDecoder;
    use http::{StatusCode, header};
    use http_body::Body;
    use std::future::Future;
    use std::io::Read;
    use std::pin::pin;
    use tower::{ServiceBuilder, ServiceExt};

    fn block_on_ready<F: Future>(future: F) -> F::Output {
        let waker = std::task::Waker::noop();
        let mut cx = Context::from_waker(waker);
        match pin!(future).poll(&mut cx) {
            Poll::Ready(output) => output,
            Poll::Pending => panic!("Expected ready future"),
        }
    }

    fn collect_body<B>(body: B) -> Vec<u8>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Debug,
    {
        let waker = std::task::Waker::noop();
        let mut cx = Context::from_waker(waker);
        let mut body = pin!(body);
        let mut out = Vec::new();
        loop {
            match body.as_mut().poll_frame(&mut cx) {
                Poll::Ready(Some(frame)) => {
                    if let Ok(data) = frame.unwrap().into_data() {
                        out.extend_from_slice(&data);
                    }
                }
                Poll::Ready(None) => return out,
                Poll::Pending => panic!("Expected ready body"),
            }
        }
    }

    fn greet(req: &Request<()>, sink: &mut dyn ResponseSink) -> Result<(), BoxError> {
        sink.write_header(StatusCode::OK);
        let body = format!("hello from {}\n", req.uri().path()).repeat(50);
        sink.write_all(body.as_bytes())?;
        Ok(())
    }

    #[test]
    fn test_service_without_compression() {
        let service = HandlerService::new(handler_fn(greet));
        let req = Request::builder().uri("/plain").body(()).unwrap();

        let response = block_on_ready(service.oneshot(req)).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());

        let body = collect_body(response.into_body());
        assert_eq!(body, "hello from /plain\n".repeat(50).as_bytes());
    }

    #[test]
    fn test_service_behind_compression_layer() {
        let handler = ServiceBuilder::new()
            .layer(CompressionLayer::new().level(Level::Best))
            .service(handler_fn(greet));
        let service = HandlerService::new(handler);
        let req = Request::builder()
            .uri("/gz")
            .header(header::ACCEPT_ENCODING, "gzip, deflate")
            .body(String::from("ignored request body"))
            .unwrap();

        let response = block_on_ready(service.oneshot(req)).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::VARY).unwrap(), "Accept-Encoding");
        assert_eq!(response.headers().get(header::CONTENT_ENCODING).unwrap(), "gzip");

        let body = collect_body(response.into_body());
        let mut decoded = String::new();
        GzDecoder::new(&body[..]).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, "hello from /gz\n".repeat(50));
        assert!(body.len() < decoded.len());
    }

    #[test]
    fn test_service_handler_error() {
        let service = HandlerService::new(handler_fn(|_req, _sink| Err("boom".into())));
        let req = Request::builder().body(()).unwrap();

        let err = block_on_ready(service.oneshot(req)).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
