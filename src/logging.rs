use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global tracing subscriber. Later calls are no-ops.
///
/// Output goes to stderr so tables on stdout stay clean. `RUST_LOG` wins
/// over the `verbose` flag when set.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    INIT.call_once(|| {
        let default_level = if verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        );

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("tracing subscriber already installed");
        }
        tracing::debug!("logging initialized");
    });
}
