//! Fully buffered HTTP response.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{HttpError, Result};

/// Status, headers and the complete body of a response.
///
/// The connection has already been released when an envelope exists; the
/// accessors only look at the buffered bytes.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
}

impl ResponseEnvelope {
    pub fn new(status: StatusCode, headers: HeaderMap, url: Url, body: Bytes) -> Self {
        Self {
            status,
            headers,
            url,
            body,
        }
    }

    /// Read a reqwest response to completion.
    ///
    /// `bytes()` consumes the response, so the connection is handed back
    /// whether or not the read succeeds.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(HttpError::ResponseRead)?;
        Ok(Self::new(status, headers, url, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text. Invalid UTF-8 sequences are replaced, no charset
    /// negotiation takes place.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as a JSON object.
    pub fn json(&self) -> Result<Map<String, Value>> {
        serde_json::from_slice(&self.body).map_err(HttpError::Decode)
    }

    /// Body deserialized into `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(HttpError::Decode)
    }

    /// Compact re-encoding of [`json`](Self::json).
    ///
    /// This is a re-serialization of the parsed object, not the wire bytes:
    /// whitespace and number spelling can differ from what the server sent.
    pub fn json_string(&self) -> Result<String> {
        let object = self.json()?;
        serde_json::to_string(&object).map_err(HttpError::Decode)
    }

    /// Body re-indented with two spaces per level.
    ///
    /// Only whitespace between tokens changes: numbers, escapes and
    /// duplicate keys come out exactly as the server sent them. Accepts any
    /// JSON value, not only objects.
    pub fn pretty_json_string(&self) -> Result<String> {
        serde_json::from_slice::<IgnoredAny>(&self.body).map_err(HttpError::Format)?;
        let indented = indent_json(&self.body, b"  ");
        Ok(String::from_utf8_lossy(&indented).into_owned())
    }
}

/// Re-indent syntactically valid JSON text token by token.
fn indent_json(src: &[u8], indent: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    // a container was just opened; its first member goes on a new line
    let mut opened = false;

    let newline = |out: &mut Vec<u8>, depth: usize| {
        out.push(b'\n');
        for _ in 0..depth {
            out.extend_from_slice(indent);
        }
    };

    for &c in src {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == b'\\' {
                escaped = true;
            } else if c == b'"' {
                in_string = false;
            }
            continue;
        }

        if matches!(c, b' ' | b'\t' | b'\n' | b'\r') {
            continue;
        }

        let was_opened = std::mem::replace(&mut opened, false);
        if was_opened && c != b'}' && c != b']' {
            newline(&mut out, depth);
        }

        match c {
            b'{' | b'[' => {
                out.push(c);
                depth += 1;
                opened = true;
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if !was_opened {
                    newline(&mut out, depth);
                }
                out.push(c);
            }
            b',' => {
                out.push(c);
                newline(&mut out, depth);
            }
            b':' => out.extend_from_slice(b": "),
            b'"' => {
                out.push(c);
                in_string = true;
            }
            _ => out.push(c),
        }
    }

    out
}
