//! # Motorola S-Record Loading
//!
//! A program is transmitted to the monitor as text lines of the form
//!
//! ```text
//! S 1 13 0000 285F245F2212226A000424290008237C 2A
//! │ │ │  │    │                                └ checksum
//! │ │ │  │    └ data, byte count - 3 bytes
//! │ │ │  └ load address
//! │ │ └ byte count (address + data + checksum)
//! │ └ record type, 1 = data, 9 = end of file
//! └ start of record
//! ```
//!
//! Every field is uppercase hex. Characters in front of the `S` are
//! skipped, which also swallows the line endings between records.

mod hex;
mod loader;

pub use hex::{hex_byte, hex_digit, hex_field};
pub use loader::{LoadError, LoadSummary, Record, RecordKind, RecordLoader};

use crate::memory::{AddressWindow, MAX_ADDRESS};

/// Space reserved below the load window for the monitor program itself.
pub const PROGRAM_SIZE: u16 = 0x5756;

/// Space reserved at the top of RAM for the stack.
pub const STACK_SIZE: u16 = 962;

pub const PROGRAM_MARGIN: u16 = 500;
pub const STACK_MARGIN: u16 = 200;

/// First address a record may load to.
pub const LOAD_START: u16 = PROGRAM_SIZE + PROGRAM_MARGIN;

/// Last address a record may load to.
pub const LOAD_END: u16 = MAX_ADDRESS - STACK_SIZE - STACK_MARGIN;

/// `0x594A -> 0x7975` on the reference board.
pub const LOAD_WINDOW: AddressWindow = AddressWindow::new(LOAD_START, LOAD_END);
