//! Transparent gzip compression for HTTP handlers.
//!
//! This crate provides a decorator around synchronous request handlers that
//! write their response into a [`ResponseSink`]. When the request's
//! `Accept-Encoding` header contains `gzip`, the handler is given a proxy sink
//! that streams the body through a gzip encoder before it reaches the real
//! sink. Otherwise the handler runs unmodified.
//!
//! # Example
//!
//! ```ignore
//! use http_response_gzip::{CompressionLayer, HandlerService, handler_fn};
//! use tower::ServiceBuilder;
//!
//! let handler = ServiceBuilder::new()
//!     .layer(CompressionLayer::new())
//!     .service(handler_fn(my_handler));
//! let service = HandlerService::new(handler);
//! ```
//!
//! # Activation
//!
//! Compression is active when the `Accept-Encoding` value contains the codec
//! token as a plain, case-sensitive substring. Quality values and list syntax
//! are not interpreted.
//!
//! # Response Modifications
//!
//! When compression is applied:
//! - `Content-Encoding` header is set to the codec used
//! - `Vary` header includes `Accept-Encoding`
//! - `Content-Type` is sniffed from the first body bytes if the handler did
//!   not set one before writing
//! - `Content-Length` header is removed (compressed size is unknown)
//!
//! The compressed stream is always closed when the handler returns, whether
//! it succeeded or not.

#![deny(missing_docs)]

mod adapter;
mod codec;
mod encoder;
mod error;
mod handler;
mod layer;
mod proxy;
mod recorder;
mod service;
mod sink;
pub mod sniff;

pub use adapter::CompressionHandler;
pub use codec::Codec;
pub use compression_core::Level;
pub use error::{BoxError, Error};
pub use handler::{Handler, HandlerFn, handler_fn};
pub use layer::CompressionLayer;
pub use proxy::CompressingSink;
pub use recorder::ResponseRecorder;
pub use service::HandlerService;
pub use sink::{Flush, ResponseSink};
