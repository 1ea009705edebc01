#[allow(clippy::missing_errors_doc)]
pub mod command;
pub mod config;
#[allow(clippy::missing_errors_doc)]
pub mod demo;
mod error;
#[allow(clippy::missing_errors_doc)]
pub mod inspect;
pub mod line_reader;

#[allow(clippy::missing_errors_doc)]
pub mod monitor;
pub mod target;
#[allow(clippy::missing_errors_doc)]
pub mod upload;

pub use config::{ConfigError, MonitorConfig};
pub use error::CommandError;
pub use monitor::Monitor;
pub use target::{DetachedTarget, ExecutionTarget};
