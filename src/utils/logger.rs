use std::time::Instant;

use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, SeaCellsError};

/// Setup logging for the library
///
/// Installs a global `tracing` subscriber writing to stdout, filtered by the
/// given level (any `EnvFilter` directive works, e.g. `"info"` or
/// `"seacells=debug"`). Timestamps are the elapsed time since setup.
///
/// ### Params
///
/// * `level` - The filter directive
///
/// ### Returns
///
/// An error if a global subscriber has already been installed.
pub fn setup_log(level: &str) -> Result<()> {
    let env_filter = EnvFilter::new(level);

    let timestamper = CompactTimestamp {
        start: Instant::now(),
    };

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_timer(timestamper);

    Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| SeaCellsError::Logging(e.to_string()))
}

#[derive(Clone)]
struct CompactTimestamp {
    start: Instant,
}

impl FormatTime for CompactTimestamp {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> std::result::Result<(), std::fmt::Error> {
        let elapsed = self.start.elapsed();
        let hours = elapsed.as_secs() / 3600;
        let minutes = (elapsed.as_secs() % 3600) / 60;
        let seconds = elapsed.as_secs() % 60;

        write!(w, "{:02}h {:02}m {:02}s", hours, minutes, seconds)
    }
}
