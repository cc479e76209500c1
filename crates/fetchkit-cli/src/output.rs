//! Response rendering.

use std::io::Write;

use anyhow::Context;
use fetchkit_http::{HttpError, ResponseEnvelope};

use crate::cli::OutputMode;

/// Render `response` according to `mode`.
pub fn render(response: &ResponseEnvelope, mode: OutputMode) -> Result<String, HttpError> {
    match mode {
        OutputMode::Text => Ok(response.text()),
        OutputMode::Json => response.json_string(),
        OutputMode::Pretty => response.pretty_json_string(),
        OutputMode::Status => Ok(response.status().as_u16().to_string()),
    }
}

/// Write rendered output followed by a newline.
pub fn print(out: &mut impl Write, rendered: &str) -> anyhow::Result<()> {
    let written = if rendered.ends_with('\n') {
        write!(out, "{rendered}")
    } else {
        writeln!(out, "{rendered}")
    };
    written.context("failed to write response")?;
    out.flush().context("failed to flush output")
}
