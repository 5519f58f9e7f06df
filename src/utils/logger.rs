use crate::utils::error::Result;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

pub const LOG_FILE: &str = "errors.log";

/// The run's log file. Lines go to it for as long as this value lives.
pub struct RunLog {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl RunLog {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `RUST_LOG` (when set) is the base filter; `debug` raises this crate to
/// debug on top of it.
fn run_filter(env: Option<EnvFilter>, debug: bool) -> EnvFilter {
    let filter = env.unwrap_or_else(|| EnvFilter::new("api_caller=info"));
    if !debug {
        return filter;
    }
    match "api_caller=debug".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Truncates `<output_path>/errors.log` and routes this thread's tracing
/// output into it until the returned `RunLog` is dropped.
pub fn init_run_logger(output_path: &str, debug: bool) -> Result<RunLog> {
    let path = Path::new(output_path).join(LOG_FILE);
    let file = File::create(&path)?;

    let filter = run_filter(EnvFilter::try_from_default_env().ok(), debug);
    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact(),
    );

    let guard = tracing::subscriber::set_default(subscriber);
    Ok(RunLog {
        path,
        _guard: guard,
    })
}
