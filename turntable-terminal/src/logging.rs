/// Logger setup for the terminal front-end
///
/// stdout is the render surface, so records go to stderr and the default
/// level is conservative. Redirect stderr to a file to read them while the
/// app is running.
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
///
/// `filter` follows the `env_logger` filter syntax (e.g. "info",
/// "turntable_core=debug"). Without it, `RUST_LOG` is used, then `warn`.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        builder.target(env_logger::Target::Stderr);
        builder.init();

        log::debug!("logging initialized");
    });
}
