//! Request options and the resolver that turns them into a transport-ready request.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::{form_urlencoded, Url};

use crate::error::{HttpError, Result};

/// Content types set by the resolver.
pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
    pub const CONTENT_TYPE_MULTIPART: &str = "multipart/form-data";
}

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = HttpError;

    /// Case-insensitive; anything other than GET or POST is rejected.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(HttpError::UnsupportedMethod(upper)),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// How a form body is put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormEncoding {
    #[default]
    UrlEncoded,
    Multipart,
}

/// Per-call request options.
///
/// Maps are ordered so the encoded query string and form body are
/// deterministic. When both a JSON body and a form are set, the JSON body
/// wins.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Merged into the URL's query string; overwrites existing keys.
    pub query: BTreeMap<String, String>,
    /// Applied after the body's content type, so they override it.
    pub headers: BTreeMap<String, String>,
    /// Raw JSON payload, sent as-is.
    pub json_body: Option<Bytes>,
    pub form: Option<BTreeMap<String, String>>,
    pub form_encoding: FormEncoding,
    /// Proxy for this call only.
    pub proxy: Option<String>,
    /// Deadline for this call only. Zero means "use the client's default".
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a pre-encoded JSON body.
    pub fn json_body(mut self, body: impl Into<Bytes>) -> Self {
        self.json_body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| HttpError::invalid_request(format!("failed to encode JSON body: {e}")))?;
        Ok(self.json_body(bytes))
    }

    /// Add a form field, turning the body into a form if it was not one.
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the whole form.
    pub fn form(mut self, form: BTreeMap<String, String>) -> Self {
        self.form = Some(form);
        self
    }

    /// Send the form as `multipart/form-data` instead of url-encoded.
    pub fn multipart(mut self) -> Self {
        self.form_encoding = FormEncoding::Multipart;
        self
    }

    /// Route this call through `proxy`.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Bound this call by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn has_body(&self) -> bool {
        self.json_body.is_some() || self.form.is_some()
    }
}

/// Body chosen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Json(Bytes),
    UrlEncoded(String),
    /// Text fields; the transport encodes them and picks the boundary.
    Multipart(Vec<(String, String)>),
}

impl RequestBody {
    /// Content type implied by the body, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some(headers::CONTENT_TYPE_JSON),
            Self::UrlEncoded(_) => Some(headers::CONTENT_TYPE_FORM),
            Self::Multipart(_) => Some(headers::CONTENT_TYPE_MULTIPART),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A request ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: Url,
    pub body: RequestBody,
    /// Caller headers, validated.
    pub headers: HeaderMap,
}

impl ResolvedRequest {
    pub fn content_type(&self) -> Option<&'static str> {
        self.body.content_type()
    }
}

/// Merge `params` into the query string of `url`.
///
/// Existing segments whose decoded key appears in `params` are dropped; the
/// others are kept byte for byte and `params` follow in key order.
pub fn merge_query(url: &str, params: &BTreeMap<String, String>) -> Result<Url> {
    let mut parsed = Url::parse(url)
        .map_err(|e| HttpError::invalid_request(format!("invalid URL {url:?}: {e}")))?;

    if params.is_empty() {
        return Ok(parsed);
    }

    let encoded = serde_urlencoded::to_string(params)
        .map_err(|e| HttpError::invalid_request(format!("failed to encode query: {e}")))?;

    let mut segments: Vec<&str> = parsed
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .next()
                .map_or(true, |(key, _)| !params.contains_key(key.as_ref()))
        })
        .collect();
    segments.push(&encoded);

    let query = segments.join("&");
    parsed.set_query(Some(&query));
    Ok(parsed)
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpError::invalid_request(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HttpError::invalid_request(format!("invalid value for header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn resolve_body(method: Method, options: &RequestOptions) -> Result<RequestBody> {
    if method == Method::Get {
        if options.has_body() {
            tracing::debug!("ignoring body options on GET request");
        }
        return Ok(RequestBody::Empty);
    }

    if let Some(json) = &options.json_body {
        if options.form.is_some() {
            tracing::debug!("both JSON and form bodies given; sending JSON");
        }
        return Ok(RequestBody::Json(json.clone()));
    }

    match (&options.form, options.form_encoding) {
        (Some(form), FormEncoding::UrlEncoded) => serde_urlencoded::to_string(form)
            .map(RequestBody::UrlEncoded)
            .map_err(|e| HttpError::invalid_request(format!("failed to encode form: {e}"))),
        (Some(form), FormEncoding::Multipart) => Ok(RequestBody::Multipart(
            form.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        (None, _) => Err(HttpError::invalid_request(
            "POST requires a JSON or form body",
        )),
    }
}

/// Resolve `method`, `url` and `options` into a [`ResolvedRequest`].
///
/// Fails with [`HttpError::UnsupportedMethod`] for anything but GET/POST and
/// with [`HttpError::InvalidRequest`] for a POST without a body, an
/// unparsable URL or an invalid header.
pub fn resolve(method: &str, url: &str, options: &RequestOptions) -> Result<ResolvedRequest> {
    let method: Method = method.parse()?;
    let url = merge_query(url, &options.query)?;
    let body = resolve_body(method, options)?;
    let headers = header_map(&options.headers)?;

    Ok(ResolvedRequest {
        method,
        url,
        body,
        headers,
    })
}
