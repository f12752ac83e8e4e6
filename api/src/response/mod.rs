//! Typed response decoding.
//!
//! [`Endpoint::fetch`](crate::Endpoint::fetch) takes a [`ResponseFormat`]
//! that turns the response body into a typed value. Plain
//! [`Endpoint::call`](crate::Endpoint::call) returns the raw body.

mod format;

pub use format::{BinaryFormat, JsonFormat, PlainTextFormat, ResponseFormat, XmlFormat, YamlFormat};
