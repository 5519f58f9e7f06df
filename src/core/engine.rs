use crate::core::body::BodyComposer;
use crate::core::caller::{ApiCaller, CallSummary};
use crate::domain::ports::Storage;
use crate::utils::error::{ErrorSeverity, Result};
use reqwest::{Method, StatusCode};

const OUTPUT_PREFIX: &str = "output";
const OUTPUT_EXTENSION: &str = ".csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Uploaded(StatusCode),
    Fetched(CallSummary),
}

/// Drives one run: clears old output, then uploads or calls and saves pages.
pub struct CallEngine<S: Storage> {
    caller: ApiCaller,
    input: S,
    output: S,
    method: Method,
    boundary: Option<String>,
    composer: BodyComposer<S>,
}

impl<S: Storage> CallEngine<S> {
    pub fn new(caller: ApiCaller, input: S, output: S, method: Method) -> Self {
        Self {
            caller,
            input,
            output,
            method,
            boundary: None,
            composer: BodyComposer::default(),
        }
    }

    /// File to send as a multipart part instead of a JSON body (POST only).
    pub fn with_boundary(mut self, boundary: Option<String>) -> Self {
        self.boundary = boundary.filter(|b| !b.is_empty());
        self
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let result = self.execute().await;
        if let Err(e) = &result {
            match e.severity() {
                ErrorSeverity::Warning => tracing::warn!("{}", e),
                ErrorSeverity::Error => tracing::error!("{}", e),
            }
        }
        result
    }

    async fn execute(&self) -> Result<RunOutcome> {
        self.remove_old_outputs().await;

        if let Some(boundary) = &self.boundary {
            if self.method == Method::POST {
                let status = self.caller.upload_file(&self.input, boundary).await?;
                return Ok(RunOutcome::Uploaded(status));
            }
            tracing::warn!("Ignoring boundary file {}: only used with POST", boundary);
        }

        let body = if self.method == Method::GET {
            None
        } else {
            Some(self.composer.compose(&self.input).await?)
        };

        let summary = self.caller.run(self.method.clone(), body, &self.output).await?;
        Ok(RunOutcome::Fetched(summary))
    }

    async fn remove_old_outputs(&self) {
        let files = match self.output.list_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("reading output directory: {}", e);
                return;
            }
        };

        for file in files
            .iter()
            .filter(|f| f.starts_with(OUTPUT_PREFIX) && f.ends_with(OUTPUT_EXTENSION))
        {
            if let Err(e) = self.output.remove_file(file).await {
                tracing::warn!("deleting file {}: {}", file, e);
            }
        }
    }
}
