//! CLI argument definitions using clap derive macros.

use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

/// fetchkit - send GET and POST requests and print the response
#[derive(Debug, Parser)]
#[command(
    name = "fetchkit",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a GET request
    Get(GetCommand),

    /// Send a POST request with a JSON or form body
    Post(PostCommand),

    /// Send a request with an explicit method (GET or POST)
    Request(RequestCommand),
}

#[derive(Debug, Parser)]
pub struct GetCommand {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Debug, Parser)]
pub struct PostCommand {
    #[command(flatten)]
    pub request: RequestArgs,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Debug, Parser)]
pub struct RequestCommand {
    /// HTTP method
    pub method: String,

    #[command(flatten)]
    pub request: RequestArgs,

    #[command(flatten)]
    pub body: BodyArgs,
}

/// Arguments shared by every request.
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Target URL
    #[arg(value_hint = ValueHint::Url)]
    pub url: String,

    /// Query parameter, merged into the URL (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Request header (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Proxy URL for this invocation
    #[arg(short = 'x', long, env = "FETCHKIT_PROXY", value_hint = ValueHint::Url)]
    pub proxy: Option<String>,

    /// Request timeout in seconds (fractions allowed, 0 disables)
    #[arg(short, long, env = "FETCHKIT_TIMEOUT", value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// User agent sent with every request
    #[arg(long, env = "FETCHKIT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// How to print the response body
    #[arg(short, long, value_enum, default_value_t = OutputMode::Text)]
    pub output: OutputMode,
}

/// Request body arguments.
#[derive(Debug, Args)]
pub struct BodyArgs {
    /// JSON body, sent as-is
    #[arg(short, long, value_name = "JSON", conflicts_with = "form")]
    pub json: Option<String>,

    /// Form field (repeatable)
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub form: Vec<(String, String)>,

    /// Encode the form as multipart/form-data
    #[arg(short, long, requires = "form")]
    pub multipart: bool,
}

/// Response rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Body as text
    #[default]
    Text,
    /// Body re-encoded as compact JSON
    Json,
    /// Body re-indented as JSON
    Pretty,
    /// Status code only
    Status,
}

/// Parse `KEY=VALUE`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse `NAME:VALUE` (or `NAME=VALUE`), trimming whitespace around both.
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .or_else(|| s.split_once('='))
        .ok_or_else(|| format!("expected NAME:VALUE, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{s}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse a timeout given in seconds.
pub fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds: `{s}`"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("timeout must be a non-negative number, got `{s}`"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("timeout `{s}` out of range: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("page=1"),
            Ok(("page".to_string(), "1".to_string()))
        );
        assert_eq!(
            parse_key_value("q=a=b"),
            Ok(("q".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_key_value("flag="), Ok(("flag".to_string(), String::new())));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("User-Agent: fetchkit"),
            Ok(("User-Agent".to_string(), "fetchkit".to_string()))
        );
        assert_eq!(
            parse_header("X-Token=abc"),
            Ok(("X-Token".to_string(), "abc".to_string()))
        );
        assert!(parse_header("nothing").is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("3"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_timeout("0.5"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_timeout("0"), Ok(Duration::ZERO));
        assert!(parse_timeout("-1").is_err());
        assert!(parse_timeout("soon").is_err());
        assert!(parse_timeout("inf").is_err());
        assert!(parse_timeout("1e30").is_err());
    }

    #[test]
    fn test_parse_post() {
        let cli = Cli::try_parse_from([
            "fetchkit",
            "-vv",
            "post",
            "https://httpbin.org/post",
            "-f",
            "name=form",
            "--multipart",
            "-H",
            "User-Agent: fetchkit",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Post(cmd) = cli.command else {
            panic!("expected post");
        };
        assert_eq!(cmd.request.url, "https://httpbin.org/post");
        assert_eq!(cmd.body.form, vec![("name".to_string(), "form".to_string())]);
        assert!(cmd.body.multipart);
        assert_eq!(cmd.request.output, OutputMode::Text);
    }

    #[test]
    fn test_json_conflicts_with_form() {
        let result = Cli::try_parse_from([
            "fetchkit", "post", "https://x/", "--json", "{}", "--form", "a=b",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_timeout_is_a_usage_error() {
        let result = Cli::try_parse_from(["fetchkit", "get", "https://x/", "--timeout", "1e30"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_multipart_requires_form() {
        let result = Cli::try_parse_from(["fetchkit", "post", "https://x/", "--multipart"]);
        assert!(result.is_err());
    }
}
