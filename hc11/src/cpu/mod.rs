//! # 68HC11 Instruction Set Support
//!
//! Decoding is limited to the load, store, add and subtract families the
//! opcode masks recognise, which covers the accumulator and 16-bit
//! register moves a monitor user most often inspects.

pub mod cursor;
pub mod decoder;
pub mod disassembler;
pub mod opcode;

pub use decoder::{DecodedInstruction, decode};
pub use disassembler::{DisassemblyError, Instructions, Listing, ListingLine, disassemble};
pub use opcode::{AddressingMode, Family, IndexRegister, Suffix};
