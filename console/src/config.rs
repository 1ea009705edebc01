//! # Monitor Configuration
//!
//! Every field is optional in the YAML file; missing sections fall back
//! to the reference board:
//!
//! ```yaml
//! memory:
//!   start: 0x0400
//!   end: 0x7DFF
//! loader:
//!   program_size: 0x5756
//!   stack_size: 962
//! console:
//!   dump_rows: 16
//! demo:
//!   potentiometer: 150
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use hc11::AddressWindow;
use hc11::memory::{MAX_ADDRESS, MIN_ADDRESS};
use hc11::srecord::{PROGRAM_MARGIN, PROGRAM_SIZE, STACK_MARGIN, STACK_SIZE};
use serde::Deserialize;
use thiserror::Error;

pub const MAX_INPUT_SIZE: usize = 255;
pub const MAX_DUMP_ROWS: usize = 4096;
pub const MAX_DUMP_COLUMNS: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("memory window {0} is empty")]
    EmptyWindow(AddressWindow),
    #[error("load window {loader} is not inside the memory window {memory}")]
    LoaderOutsideMemory {
        loader: AddressWindow,
        memory: AddressWindow,
    },
    #[error("loader {0} leaves no room for a load window")]
    NoLoadRoom(&'static str),
    #[error("console.{field} must be between 1 and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub memory: MemoryConfig,
    pub loader: LoaderConfig,
    pub console: ConsoleConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub start: u16,
    pub end: u16,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            start: MIN_ADDRESS,
            end: MAX_ADDRESS,
        }
    }
}

/// Sizes the load window is derived from. `start`/`end` replace the
/// derived bounds when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub program_size: u16,
    pub stack_size: u16,
    pub program_margin: u16,
    pub stack_margin: u16,
    pub start: Option<u16>,
    pub end: Option<u16>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            program_size: PROGRAM_SIZE,
            stack_size: STACK_SIZE,
            program_margin: PROGRAM_MARGIN,
            stack_margin: STACK_MARGIN,
            start: None,
            end: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Longest command line accepted, in characters.
    pub input_size: usize,
    pub dump_rows: usize,
    pub dump_columns: usize,
    /// Echo typed characters back. Off when the terminal already echoes.
    pub echo: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            input_size: 32,
            dump_rows: 16,
            dump_columns: 10,
            echo: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Fixed converter reading used by the host stepper ports.
    pub potentiometer: u8,
    pub steps: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            potentiometer: 150,
            steps: 64,
        }
    }
}

impl MonitorConfig {
    /// Parses and validates a YAML document. Missing keys keep defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed documents, or any error from
    /// [`Self::validate`].
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`Self::from_yaml`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    #[must_use]
    pub const fn memory_window(&self) -> AddressWindow {
        AddressWindow::new(self.memory.start, self.memory.end)
    }

    /// Explicit loader bounds, or the memory window minus the program and
    /// stack reservations.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoLoadRoom`] when a reservation overflows.
    pub fn loader_window(&self) -> Result<AddressWindow, ConfigError> {
        let loader = &self.loader;

        let start = match loader.start {
            Some(start) => start,
            None => loader
                .program_size
                .checked_add(loader.program_margin)
                .ok_or(ConfigError::NoLoadRoom("program_size"))?,
        };
        let end = match loader.end {
            Some(end) => end,
            None => self
                .memory
                .end
                .checked_sub(loader.stack_size)
                .and_then(|end| end.checked_sub(loader.stack_margin))
                .ok_or(ConfigError::NoLoadRoom("stack_size"))?,
        };

        Ok(AddressWindow::new(start, end))
    }

    /// # Errors
    ///
    /// The first inconsistency found: empty windows, a loader window
    /// outside memory, or console sizes out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let memory = self.memory_window();
        if memory.is_empty() {
            return Err(ConfigError::EmptyWindow(memory));
        }

        let loader = self.loader_window()?;
        if loader.is_empty() || !memory.encloses(&loader) {
            return Err(ConfigError::LoaderOutsideMemory { loader, memory });
        }

        let console = &self.console;
        for (field, value, max) in [
            ("input_size", console.input_size, MAX_INPUT_SIZE),
            ("dump_rows", console.dump_rows, MAX_DUMP_ROWS),
            ("dump_columns", console.dump_columns, MAX_DUMP_COLUMNS),
        ] {
            if !(1..=max).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value, max });
            }
        }

        Ok(())
    }
}
