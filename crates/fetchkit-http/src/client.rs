//! HTTP client configuration and the transport adapter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{multipart, Client, ClientBuilder, Proxy};
use serde::Serialize;
use url::Url;

use crate::error::{HttpError, Result};
use crate::request::{headers, resolve, RequestBody, RequestOptions, ResolvedRequest};
use crate::response::ResponseEnvelope;

/// Callback run on every request right before it is executed.
pub type RequestHook = Arc<dyn Fn(&mut reqwest::Request) + Send + Sync>;

/// Callback that adjusts the reqwest builder after proxy and timeouts are
/// applied, for every client the handle builds.
pub type ClientHook = Arc<dyn Fn(ClientBuilder) -> ClientBuilder + Send + Sync>;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Whole-request timeout. `None` or zero means no deadline.
    pub timeout: Option<Duration>,
    /// Proxy URL applied to every request.
    pub proxy: Option<String>,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            timeout: None,
            proxy: None,
            user_agent: format!("fetchkit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Parse and validate a proxy URL without touching the network.
pub(crate) fn parse_proxy(proxy: &str) -> Result<Proxy> {
    let url = Url::parse(proxy).map_err(|e| HttpError::invalid_proxy(proxy, e))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(HttpError::invalid_proxy(proxy, "missing host"));
    }
    Proxy::all(url).map_err(|e| HttpError::invalid_proxy(proxy, e))
}

/// Build a configured reqwest client.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    build_client_with(config, None)
}

fn build_client_with(config: &HttpConfig, hook: Option<&ClientHook>) -> Result<Client> {
    let mut builder = ClientBuilder::new().user_agent(&config.user_agent);

    if let Some(timeout) = config.connect_timeout.filter(|t| !t.is_zero()) {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = config.timeout.filter(|t| !t.is_zero()) {
        builder = builder.timeout(timeout);
    }
    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(parse_proxy(proxy)?);
    }
    if let Some(hook) = hook {
        builder = hook(builder);
    }

    builder.build().map_err(HttpError::ClientBuild)
}

/// Reusable client handle.
///
/// Configuration is fixed once the handle exists. `with_*` methods return a
/// new handle; per-call proxy and timeout options never leak into later
/// calls.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    config: HttpConfig,
    hook: Option<RequestHook>,
    client_hook: Option<ClientHook>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("hook", &self.hook.is_some())
            .field("client_hook", &self.client_hook.is_some())
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default config.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HTTP client with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let inner = build_client(&config)?;
        Ok(Self {
            inner,
            config,
            hook: None,
            client_hook: None,
        })
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// A new handle that routes every request through `proxy`.
    pub fn with_proxy(&self, proxy: impl Into<String>) -> Result<Self> {
        let config = HttpConfig {
            proxy: Some(proxy.into()),
            ..self.config.clone()
        };
        self.rebuild(config)
    }

    /// A new handle whose requests time out after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self> {
        let config = HttpConfig {
            timeout: Some(timeout),
            ..self.config.clone()
        };
        self.rebuild(config)
    }

    /// A new handle that runs `hook` on every outgoing request.
    pub fn with_request_hook<F>(&self, hook: F) -> Self
    where
        F: Fn(&mut reqwest::Request) + Send + Sync + 'static,
    {
        Self {
            hook: Some(Arc::new(hook)),
            ..self.clone()
        }
    }

    /// A new handle whose reqwest clients pass through `hook` before they
    /// are built, including the one-off clients of per-call proxies.
    pub fn with_client_hook<F>(&self, hook: F) -> Result<Self>
    where
        F: Fn(ClientBuilder) -> ClientBuilder + Send + Sync + 'static,
    {
        let client_hook: ClientHook = Arc::new(hook);
        let inner = build_client_with(&self.config, Some(&client_hook))?;
        Ok(Self {
            inner,
            client_hook: Some(client_hook),
            ..self.clone()
        })
    }

    fn rebuild(&self, config: HttpConfig) -> Result<Self> {
        let inner = build_client_with(&config, self.client_hook.as_ref())?;
        Ok(Self {
            inner,
            config,
            hook: self.hook.clone(),
            client_hook: self.client_hook.clone(),
        })
    }

    /// Client for one call: the shared one, or a one-off when the call has
    /// its own proxy.
    fn transport_for(&self, options: &RequestOptions) -> Result<Client> {
        match options.proxy.as_deref().filter(|p| !p.is_empty()) {
            Some(proxy) => {
                let config = HttpConfig {
                    proxy: Some(proxy.to_string()),
                    ..self.config.clone()
                };
                build_client_with(&config, self.client_hook.as_ref())
            }
            None => Ok(self.inner.clone()),
        }
    }

    fn build_request(
        &self,
        transport: &Client,
        resolved: ResolvedRequest,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Request> {
        let content_type = resolved.content_type();
        let mut builder = transport.request(resolved.method.into(), resolved.url);

        builder = match resolved.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes),
            RequestBody::UrlEncoded(encoded) => builder.body(encoded),
            RequestBody::Multipart(fields) => {
                let form = fields
                    .into_iter()
                    .fold(multipart::Form::new(), |form, (k, v)| form.text(k, v));
                builder.multipart(form)
            }
        };

        // multipart() already set the content type together with its boundary
        if let Some(content_type) =
            content_type.filter(|ct| *ct != headers::CONTENT_TYPE_MULTIPART)
        {
            builder = builder.header(CONTENT_TYPE, content_type);
        }

        if !resolved.headers.is_empty() {
            builder = builder.headers(resolved.headers);
        }

        if let Some(timeout) = timeout.filter(|t| !t.is_zero()) {
            builder = builder.timeout(timeout);
        }

        let mut request = builder
            .build()
            .map_err(|e| HttpError::invalid_request(e.to_string()))?;

        if let Some(hook) = &self.hook {
            hook(&mut request);
        }

        Ok(request)
    }

    /// Send one request and buffer its response.
    #[tracing::instrument(level = "debug", skip(self, options), fields(status = tracing::field::Empty))]
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        options: &RequestOptions,
    ) -> Result<ResponseEnvelope> {
        let resolved = resolve(method, url, options)?;
        let transport = self.transport_for(options)?;
        let request = self.build_request(&transport, resolved, options.timeout)?;

        tracing::debug!("Making {} request to: {}", request.method(), request.url());
        let response = transport.execute(request).await.map_err(|e| {
            tracing::warn!(error = %e, "request failed");
            HttpError::Transport(e)
        })?;

        let envelope = ResponseEnvelope::read(response).await?;
        tracing::Span::current().record("status", envelope.status().as_u16());
        tracing::debug!(
            "{} response: {} ({} bytes)",
            method.to_ascii_uppercase(),
            envelope.status(),
            envelope.body().len()
        );
        Ok(envelope)
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str, options: &RequestOptions) -> Result<ResponseEnvelope> {
        self.send("GET", url, options).await
    }

    /// Make a POST request; the body comes from `options`.
    pub async fn post(&self, url: &str, options: &RequestOptions) -> Result<ResponseEnvelope> {
        self.send("POST", url, options).await
    }
}

fn with_headers(headers: BTreeMap<String, String>) -> RequestOptions {
    RequestOptions {
        headers,
        ..RequestOptions::default()
    }
}

/// GET `url` with a default client.
pub async fn get(url: &str, headers: BTreeMap<String, String>) -> Result<ResponseEnvelope> {
    HttpClient::new()?.get(url, &with_headers(headers)).await
}

/// POST `data` as JSON to `url` with a default client.
pub async fn post_json<T: Serialize + ?Sized>(
    url: &str,
    headers: BTreeMap<String, String>,
    data: &T,
) -> Result<ResponseEnvelope> {
    let options = with_headers(headers).json(data)?;
    HttpClient::new()?.post(url, &options).await
}

/// POST `form` url-encoded to `url` with a default client.
pub async fn post_form(
    url: &str,
    headers: BTreeMap<String, String>,
    form: BTreeMap<String, String>,
) -> Result<ResponseEnvelope> {
    let options = with_headers(headers).form(form);
    HttpClient::new()?.post(url, &options).await
}
