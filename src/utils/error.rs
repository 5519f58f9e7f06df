use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallerError {
    #[error("API request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("parse error on line {line}: {reason}")]
    InputParse { line: u64, reason: String },

    #[error("Empty object data file: {file}")]
    EmptyInput { file: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Parsing JSON response: {source}")]
    ResponseParse {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("{}", remote_text(.message))]
    Remote { message: String },

    #[error("Converting to utf-8 failed, kept '{lossy}'")]
    Encoding { lossy: String },

    #[error("No data to write: {file}")]
    EmptyData { file: String },
}

fn remote_text(message: &str) -> &str {
    if message.is_empty() {
        "call was not successful"
    } else {
        message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Logged, processing continues.
    Warning,
    /// Stops the current run.
    Error,
}

impl CallerError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CallerError::EmptyData { .. } | CallerError::Encoding { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Error
    }

    /// True when the error means a file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            CallerError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            CallerError::FileNotFound { .. } => true,
            _ => false,
        }
    }

    /// One-line text for the console, used before the log file is open.
    pub fn user_friendly_message(&self) -> String {
        match self {
            CallerError::MissingConfig { field } if field == "base_url" => {
                "Please provide a base URL in the configuration file.".to_string()
            }
            CallerError::MissingConfig { field } if field == "url" => {
                "Please provide an API URL.".to_string()
            }
            CallerError::Config { message } => format!("reading config file: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CallerError>;
