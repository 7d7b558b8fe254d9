//! Logging setup.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging options taken from the command line.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Force debug level.
    pub debug: bool,
    /// Level used when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rolling log files, if any.
    pub log_dir: Option<PathBuf>,
}

impl LogOptions {
    fn env_filter(&self) -> EnvFilter {
        let level = if self.debug { "debug" } else { self.level.as_str() };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "clashforge={level},clashforge_core={level},clashforge_app={level},warn"
            ))
        })
    }
}

/// Initializes logging to stderr, plus a daily rolling file when requested.
///
/// The returned guard must be held until exit so buffered file output is flushed.
pub fn init_logging(options: &LogOptions) -> Option<WorkerGuard> {
    let env_filter = options.env_filter();

    if let Some(log_dir) = &options.log_dir {
        if std::fs::create_dir_all(log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("clashforge")
                .filename_suffix("log")
                .build(log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::debug!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if options.log_dir.is_some() {
        tracing::warn!("File logging unavailable, using console only");
    }
    None
}
