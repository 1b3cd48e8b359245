use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(verbose: bool) {
    let default = if verbose {
        "gonka_light_core=debug,gonka_light_api=debug,gonka_light=debug"
    } else {
        "warn,gonka_light_core=info,gonka_light=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
