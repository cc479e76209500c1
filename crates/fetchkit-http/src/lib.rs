//! Request construction and response helpers on top of reqwest.
//!
//! [`resolve`] turns a method, URL and [`RequestOptions`] into a
//! [`ResolvedRequest`]; [`HttpClient`] sends it and buffers the reply into a
//! [`ResponseEnvelope`].

pub mod client;
pub mod error;
pub mod request;
pub mod response;

pub use client::{
    build_client, get, post_form, post_json, ClientHook, HttpClient, HttpConfig, RequestHook,
};
pub use error::{HttpError, Result};
pub use request::{
    headers, merge_query, resolve, FormEncoding, Method, RequestBody, RequestOptions,
    ResolvedRequest,
};
pub use response::ResponseEnvelope;
