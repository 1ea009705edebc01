use std::io;

use hc11::cpu::DisassemblyError;
use hc11::{AddressWindow, LoadError, MemoryError, StreamEnd};
use thiserror::Error;

/// Why a command did not complete. Everything except [`Self::Stream`] and
/// [`Self::Io`] is reported to the operator and the prompt comes back.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("Incorrect usage. Please use {usage}")]
    Usage { usage: &'static str },
    #[error("Address must be in hex i.e 0-9 A-F")]
    NotHex,
    #[error("The address range is {:X} -> {:X}", .window.start, .window.end)]
    OutOfRange { window: AddressWindow },
    #[error(transparent)]
    Disassembly(#[from] DisassemblyError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("input stream ended")]
    Stream(#[from] StreamEnd),
    #[error("console write failed: {0}")]
    Io(#[from] io::Error),
}

impl CommandError {
    /// The console itself is gone; the monitor cannot continue.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Stream(_) | Self::Io(_))
    }
}
