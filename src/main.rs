use api_caller::utils::logger;
use api_caller::{
    ApiCaller, ApiContext, CallEngine, CliArgs, FileConfig, LocalStorage, Overrides, RunOutcome,
};
use reqwest::Method;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("Starting Api Caller v{}", env!("CARGO_PKG_VERSION"));

    let args = CliArgs::parse_args();

    if args.url.as_deref().map_or(true, str::is_empty) {
        println!("Please provide an API URL.");
        return Ok(());
    }

    let config = match FileConfig::from_file(&args.conf) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", e.user_friendly_message());
            return Ok(());
        }
    };

    let context = match ApiContext::build(&config, &Overrides::from(&args)) {
        Ok(context) => context,
        Err(e) => {
            println!("{}", e.user_friendly_message());
            return Ok(());
        }
    };

    let method = match Method::from_bytes(args.method.to_uppercase().as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            println!("Unsupported HTTP method: {}", args.method);
            return Ok(());
        }
    };

    // Everything from here on goes to <output_path>/errors.log.
    let log = match logger::init_run_logger(&context.output_path, context.debug) {
        Ok(log) => log,
        Err(e) => {
            println!("opening or creating log file: {}", e);
            return Ok(());
        }
    };
    tracing::info!("Starting Api Caller v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Log file: {}", log.path().display());

    let input = LocalStorage::new(context.input_path.clone());
    let output = LocalStorage::new(context.output_path.clone());

    let caller = match ApiCaller::new(context) {
        Ok(caller) => caller,
        Err(e) => {
            tracing::error!("creating HTTP client: {}", e);
            return Ok(());
        }
    };

    let engine = CallEngine::new(caller, input, output, method).with_boundary(args.boundary.clone());

    // Failures are already in the log; the process exits normally either way.
    match engine.run().await {
        Ok(RunOutcome::Fetched(summary)) => tracing::info!(
            "Done: {} request(s), {} record(s) in {} file(s)",
            summary.requests,
            summary.records_written,
            summary.files_written.len()
        ),
        Ok(RunOutcome::Uploaded(status)) => tracing::info!("Done: upload answered {}", status),
        Err(_) => {}
    }

    Ok(())
}
