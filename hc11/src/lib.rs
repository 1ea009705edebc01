#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::unreadable_literal)]
pub mod cpu;

#[allow(clippy::large_stack_arrays)]
pub mod memory;
pub mod serial;

#[allow(clippy::missing_errors_doc)]
pub mod srecord;

pub use cpu::{DecodedInstruction, Listing, decode, disassemble};
pub use memory::{AddressWindow, MemoryError, MemoryImage};
pub use serial::{CharSource, ReaderSource, SliceSource, StreamEnd};
pub use srecord::{LoadError, LoadSummary, RecordLoader};
