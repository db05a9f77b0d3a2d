use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize service diagnostics: an env-filtered fmt subscriber writing to
/// stderr. `RUST_LOG` overrides `log_level`. Call once at startup.
pub fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}
