//! Structured logging bootstrap using `tracing`.
//!
//! Logs go to stderr so that stdout only ever carries command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global tracing subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .without_time()
        .with_filter(env_filter);

    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    tracing::debug!(default_level, "tracing initialised");
    Ok(())
}
