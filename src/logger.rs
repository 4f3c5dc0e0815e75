use std::env;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins, then `LOG_LEVEL`, then the `--debug` flag.
pub fn init_logging(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let level = env::var("LOG_LEVEL")
        .unwrap_or_else(|_| fallback.to_string())
        .to_lowercase();

    let filter = match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::new(rust_log),
        Err(_) => EnvFilter::new(level),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
