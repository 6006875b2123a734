//! Tracing setup for `MedCamp` binaries.
//!
//! Logs always go to stderr so that reports printed on stdout can be piped
//! into other tools untouched.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

const DEBUG_DIRECTIVE: &str = "medcamp_core=debug,medcamp_cli=debug";
const TRACE_DIRECTIVE: &str = "medcamp_core=trace,medcamp_cli=trace";

/// Pick the filter directive. `RUST_LOG` wins, then `-v` flags, then the
/// configured level.
pub fn filter_directive(
    logging: &LoggingConfig,
    verbose: u8,
    rust_log: Option<String>,
) -> String {
    if let Some(directive) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directive;
    }
    match verbose {
        0 => logging.level.clone(),
        1 => DEBUG_DIRECTIVE.to_string(),
        _ => TRACE_DIRECTIVE.to_string(),
    }
}

/// Initialise the global tracing subscriber from resolved settings.
///
/// * `verbose` -- number of `-v` flags given on the command line.
/// * `force_json` -- `--log-json`; JSON is also used when `logging.json` is set.
pub fn init_tracing(logging: &LoggingConfig, verbose: u8, force_json: bool) {
    let directive = filter_directive(logging, verbose, std::env::var("RUST_LOG").ok());
    let env_filter = EnvFilter::new(directive);
    if force_json || logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
