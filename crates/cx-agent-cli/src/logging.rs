use tracing_subscriber::EnvFilter;

/// Log to stderr so replies on stdout stay clean. `RUST_LOG` overrides the
/// default `warn` level.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
