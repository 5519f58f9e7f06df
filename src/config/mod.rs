#[cfg(feature = "cli")]
pub mod cli;
pub mod file_config;

pub use file_config::FileConfig;

use crate::domain::model::ApiContext;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use url::Url;

/// Command-line values that take part in building the run context.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub resource: String,
    pub work_path: Option<String>,
    pub debug: bool,
    pub max_pages: Option<usize>,
}

#[cfg(feature = "cli")]
impl From<&cli::CliArgs> for Overrides {
    fn from(args: &cli::CliArgs) -> Self {
        Self {
            resource: args.url.clone().unwrap_or_default(),
            work_path: args.path.clone(),
            debug: args.debug,
            max_pages: args.max_pages,
        }
    }
}

impl ApiContext {
    /// Merges the file config with command-line overrides.
    pub fn build(config: &FileConfig, overrides: &Overrides) -> Result<Self> {
        validation::validate_non_empty_string("url", &overrides.resource)?;
        config.validate()?;

        let url = Url::parse(&format!("{}{}", config.base_url, overrides.resource))?;

        let (input_path, output_path) = match overrides.work_path.as_deref() {
            Some(path) if !path.is_empty() => (path.to_string(), path.to_string()),
            _ => (config.input_path.clone(), config.output_path.clone()),
        };

        let max_pages = overrides.max_pages.or(config.max_pages);
        if let Some(max_pages) = max_pages {
            validation::validate_positive_number("max_pages", max_pages, 1)?;
        }

        let token = Some(config.bearer_token.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            url,
            input_path,
            output_path,
            token,
            debug: overrides.debug,
            max_pages,
            timeout_seconds: config.timeout_seconds,
        })
    }
}
