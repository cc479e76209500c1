//! Command execution.

use std::collections::BTreeMap;
use std::io;

use fetchkit_http::{HttpClient, HttpConfig, RequestOptions};

use crate::cli::{BodyArgs, Cli, Command, RequestArgs};
use crate::error::CliError;
use crate::output;

impl RequestArgs {
    /// Client-level configuration from flags and environment.
    pub fn http_config(&self) -> HttpConfig {
        let mut config = HttpConfig {
            proxy: self.proxy.clone().filter(|p| !p.is_empty()),
            timeout: self.timeout,
            ..HttpConfig::default()
        };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    /// Per-call options, without a body.
    pub fn options(&self) -> RequestOptions {
        RequestOptions {
            query: self.params.iter().cloned().collect(),
            headers: self.headers.iter().cloned().collect(),
            ..RequestOptions::default()
        }
    }
}

impl BodyArgs {
    /// Add the body to `options`.
    pub fn apply(&self, mut options: RequestOptions) -> RequestOptions {
        if let Some(json) = &self.json {
            options = options.json_body(json.clone());
        }
        if !self.form.is_empty() {
            options = options.form(self.form.iter().cloned().collect::<BTreeMap<_, _>>());
        }
        if self.multipart {
            options = options.multipart();
        }
        options
    }
}

/// Execute the selected command, printing the response body to stdout.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let (method, request, options) = match &cli.command {
        Command::Get(cmd) => ("GET", &cmd.request, cmd.request.options()),
        Command::Post(cmd) => ("POST", &cmd.request, cmd.body.apply(cmd.request.options())),
        Command::Request(cmd) => (
            cmd.method.as_str(),
            &cmd.request,
            cmd.body.apply(cmd.request.options()),
        ),
    };

    let client = HttpClient::with_config(request.http_config())
        .map_err(|e| CliError::from_http(e, &request.url))?;

    let response = client
        .send(method, &request.url, &options)
        .await
        .map_err(|e| CliError::from_http(e, &request.url))?;

    tracing::info!("{} {}", response.status(), response.url());

    let rendered = output::render(&response, request.output).map_err(CliError::Output)?;
    output::print(&mut io::stdout().lock(), &rendered)?;
    Ok(())
}
