use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Keeps the file writer's worker alive until [`flush`].
static GUARD: OnceCell<Mutex<Option<WorkerGuard>>> = OnceCell::new();

/// `LogKind` represents where diagnostics go.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogKind {
    /// Standard error, the default. Standard output belongs to the operator
    /// console.
    Console,

    /// A file in the temp directory, `hmonitor-<timestamp>.log`.
    File,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. `RUST_LOG` selects the level, `info`
/// when unset. Returns the log file path for [`LogKind::File`].
///
/// A second call leaves the first subscriber in place.
///
/// # Errors
///
/// [`InitError`] when the log file cannot be created.
pub fn init_logger(kind: LogKind) -> Result<Option<PathBuf>, InitError> {
    match kind {
        LogKind::Console => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_writer(io::stderr)
                .try_init()
                .ok();
            Ok(None)
        }
        LogKind::File => {
            let directory = std::env::temp_dir();
            let prefix = format!("hmonitor-{}", Utc::now().timestamp());
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(&prefix)
                .filename_suffix("log")
                .build(&directory)?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            if tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .is_ok()
            {
                if let Ok(mut slot) = GUARD.get_or_init(|| Mutex::new(None)).lock() {
                    *slot = Some(guard);
                }
            }

            Ok(Some(directory.join(format!("{prefix}.log"))))
        }
    }
}

/// Writes out buffered file logs. Events logged to the file afterwards
/// are dropped, so call this on the way out.
pub fn flush() {
    if let Some(Ok(mut slot)) = GUARD.get().map(Mutex::lock) {
        drop(slot.take());
    }
}
