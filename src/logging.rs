//! Diagnostic logging to stderr.
//!
//! Page output owns stdout, so every log line goes to stderr. `RUST_LOG`
//! overrides the default level (e.g. `RUST_LOG=dummy_users=debug`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub fn init(verbose: bool) {
    let default = if verbose {
        "dummy_users=debug,warn"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact()
                .with_filter(env_filter),
        )
        .try_init();
}
