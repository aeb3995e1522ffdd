//! Logging initialization using the `tracing` ecosystem.
//!
//! Console output is always human-readable. When a log directory is given,
//! a daily-rotating file is added next to it, written either as plain text or
//! as one JSON object per line (for log shippers). `RUST_LOG` always wins over
//! the configured level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogOptions<'a> {
    /// Default filter if `RUST_LOG` is unset (e.g. `"info"` or `"fr_relay=debug"`).
    pub level: &'a str,
    /// Directory for daily-rotating log files. Console only when `None`.
    pub dir: Option<&'a str>,
    /// File name prefix inside `dir`.
    pub file_prefix: &'a str,
    /// Write the file layer as JSON lines.
    pub json: bool,
}

/// Initialize the global tracing subscriber. Call once at program start.
pub fn init_logging(opts: &LogOptions<'_>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(opts.level.to_lowercase()));

    let console_layer = fmt::layer().with_target(true).with_ansi(true);
    let registry = tracing_subscriber::registry().with(env_filter).with(console_layer);

    let Some(dir) = opts.dir else {
        registry.init();
        return;
    };

    let file_appender = tracing_appender::rolling::daily(dir, opts.file_prefix);
    if opts.json {
        registry
            .with(fmt::layer().json().with_writer(file_appender).with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(file_appender).with_ansi(false).with_target(true))
            .init();
    }
}
