use crate::error::BoxError;
use crate::sink::ResponseSink;
use http::Request;
use std::fmt;
use std::sync::Arc;

/// A synchronous request handler that writes its response into a sink.
pub trait Handler {
    /// Handles `req`, writing the response into `sink`.
    fn serve(&self, req: &Request<()>, sink: &mut dyn ResponseSink) -> Result<(), BoxError>;
}

impl<H: Handler + ?Sized> Handler for &H {
    fn serve(&self, req: &Request<()>, sink: &mut dyn ResponseSink) -> Result<(), BoxError> {
        (**self).serve(req, sink)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve(&self, req: &Request<()>, sink: &mut dyn ResponseSink) -> Result<(), BoxError> {
        (**self).serve(req, sink)
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, req: &Request<()>, sink: &mut dyn ResponseSink) -> Result<(), BoxError> {
        (**self).serve(req, sink)
    }
}

/// Returns a [`Handler`] that calls the given closure.
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request<()>, &mut dyn ResponseSink) -> Result<(), BoxError>,
{
    HandlerFn { f }
}

/// A [`Handler`] implemented by a closure. See [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("f", &format_args!("{}", std::any::type_name::<F>()))
            .finish()
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Request<()>, &mut dyn ResponseSink) -> Result<(), BoxError>,
{
    fn serve(&self, req: &Request<()>, sink: &mut dyn ResponseSink) -> Result<(), BoxError> {
        (self.f)(req, sink)
    }
}
