//! CLI verbose/debug logging
//!
//! - Verbosity levels (Quiet, Normal, Verbose, Debug, Trace) from flags or
//!   the `CB_CLI_VERBOSE`, `CB_CLI_DEBUG`, `CB_CLI_TRACE` variables
//! - `RUST_LOG` overrides the level-derived filter
//! - Redaction of secrets before bodies are traced

pub mod level;
pub mod redaction;

pub use level::LogLevel;
pub use redaction::{Redactor, REDACTED};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber writing to stderr.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(level.is_trace());

    // A second init (tests, embedding) keeps the first subscriber.
    let result = if level.is_verbose() {
        builder.try_init()
    } else {
        builder.without_time().try_init()
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
