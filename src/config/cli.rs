use clap::Parser;
use std::ffi::OsString;

#[derive(Debug, Clone, Parser)]
#[command(name = "api-caller")]
#[command(about = "Calls an API resource, sending CSV input as JSON and saving the JSON response as CSV")]
pub struct CliArgs {
    /// Path to config file
    #[arg(long, default_value = "config.yml")]
    pub conf: String,

    /// API resource URL to fetch data from, appended to base_url
    #[arg(long)]
    pub url: Option<String>,

    /// HTTP method (GET, POST, etc.)
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Working directory for both input and output files
    #[arg(long)]
    pub path: Option<String>,

    /// File name to be sent as a multipart form part (POST only)
    #[arg(long)]
    pub boundary: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    pub debug: bool,

    /// Stop following pages after this many requests
    #[arg(long = "max-pages")]
    pub max_pages: Option<usize>,
}

impl CliArgs {
    /// Parses process arguments, accepting `-flag` as well as `--flag`.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_flags(std::env::args_os()))
    }
}

/// Rewrites single-dash long flags (`-url`, `-conf=x`) to clap's `--url` form.
pub fn normalize_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();

    for arg in args {
        match arg.to_str() {
            Some(s) if s.len() > 2 && s.starts_with('-') && !s.starts_with("--") => {
                normalized.push(OsString::from(format!("-{}", s)));
            }
            _ => normalized.push(arg),
        }
    }

    normalized
}
