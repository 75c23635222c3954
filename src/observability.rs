//! This module provides logging setup and structured metric hooks for the decoders.
//!
//! All library code logs through the `log` facade. `init_logging` is a convenience
//! for binaries and notebooks that do not install their own logger, and the
//! `log_metric!` macro emits one machine-greppable line per event in debug builds.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::TaqError;

/// Logs a structured key-value metric line at debug level, only in debug builds.
///
/// # Example
/// ```
/// use taq_stream::log_metric;
/// let rows = 42;
/// log_metric!("event" = "batch_decoded", "rows" = &rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("TAQ_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend once per process.
///
/// Later calls are no-ops, as is the first call when another logger is already
/// installed. With `log_file` set, output is appended to that file instead of stderr.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), TaqError> {
    // Open the file before entering `call_once` so errors can be returned.
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
