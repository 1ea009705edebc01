//! # Disassembly Listing
//!
//! Walks the decoder over an inclusive address range and produces a
//! numbered listing bracketed by `ORG` and `END` lines:
//!
//! ```text
//!  6000                   1    ORG  $6000
//!  6000  86 2A            2    ldaa #$2A
//!  6002  B7 60 10         3    staa $6010
//!  6005                   4   END
//! ```
//!
//! The next address is always the previous one plus the bytes the decoder
//! reported, invalid instructions included, so the walk terminates and no
//! operand byte is decoded twice.

use std::fmt::{self, Write as _};

use thiserror::Error;
use tracing::debug;

use super::decoder::{DecodedInstruction, decode};
use crate::memory::{AddressWindow, MemoryImage};

/// Width of the raw byte column: up to four `"XX "` groups plus a gap.
const BYTES_COLUMN: usize = 15;

/// Invalid instructions sit further right than mnemonics.
const INVALID_INDENT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisassemblyError {
    #[error("Please ensure the End value is greater than the Start value.")]
    InvertedRange { start: u16, end: u16 },
    #[error("The address {address:04X} is outside the range {window}")]
    OutOfWindow { address: u16, window: AddressWindow },
}

/// Lazily decodes every instruction starting inside `start..=end`.
pub struct Instructions<'a> {
    memory: &'a MemoryImage,
    next: u32,
    end: u16,
}

impl<'a> Instructions<'a> {
    #[must_use]
    pub const fn new(memory: &'a MemoryImage, start: u16, end: u16) -> Self {
        Self {
            memory,
            next: start as u32,
            end,
        }
    }

    /// First address not covered by the instructions yielded so far.
    #[must_use]
    pub const fn next_address(&self) -> u32 {
        self.next
    }
}

impl Iterator for Instructions<'_> {
    type Item = DecodedInstruction;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > u32::from(self.end) {
            return None;
        }

        #[allow(clippy::cast_possible_truncation)] // next <= end <= u16::MAX
        let instruction = decode(self.memory, self.next as u16);
        self.next += u32::try_from(instruction.consumed()).unwrap_or(1);
        Some(instruction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine {
    Origin {
        number: usize,
        address: u16,
    },
    Instruction {
        number: usize,
        instruction: DecodedInstruction,
    },
    End {
        number: usize,
        address: u32,
    },
}

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin { number, address } => write!(
                f,
                " {address:04X}                 {number:>3}    ORG  ${address:04X}"
            ),
            Self::Instruction {
                number,
                instruction,
            } => {
                let mut bytes = String::with_capacity(BYTES_COLUMN);
                for byte in &instruction.bytes {
                    write!(bytes, "{byte:02X} ")?;
                }
                let indent = if instruction.valid { 0 } else { INVALID_INDENT };
                write!(
                    f,
                    " {:04X}  {bytes:<width$}{number:>3}    {:indent$}{instruction}",
                    instruction.address,
                    "",
                    width = BYTES_COLUMN
                )
            }
            Self::End { number, address } => {
                write!(f, " {address:04X}                 {number:>3}   END")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    pub lines: Vec<ListingLine>,
}

impl Listing {
    /// Decoded instructions, without the `ORG`/`END` bookends.
    pub fn instructions(&self) -> impl Iterator<Item = &DecodedInstruction> {
        self.lines.iter().filter_map(|line| match line {
            ListingLine::Instruction { instruction, .. } => Some(instruction),
            _ => None,
        })
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Disassembles `start..=end`. The range must be ordered and inside the
/// memory window; nothing is decoded otherwise.
pub fn disassemble(
    memory: &MemoryImage,
    start: u16,
    end: u16,
) -> Result<Listing, DisassemblyError> {
    if start > end {
        return Err(DisassemblyError::InvertedRange { start, end });
    }

    let window = memory.window();
    for address in [start, end] {
        if !window.contains(address) {
            return Err(DisassemblyError::OutOfWindow { address, window });
        }
    }

    let mut lines = vec![ListingLine::Origin {
        number: 1,
        address: start,
    }];

    let mut instructions = Instructions::new(memory, start, end);
    for instruction in instructions.by_ref() {
        if !instruction.valid {
            debug!("invalid instruction at {:04X}", instruction.address);
        }
        lines.push(ListingLine::Instruction {
            number: lines.len() + 1,
            instruction,
        });
    }

    lines.push(ListingLine::End {
        number: lines.len() + 1,
        address: instructions.next_address(),
    });

    Ok(Listing { lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn memory_with(bytes: &[u8]) -> MemoryImage {
        MemoryImage::with_contents(AddressWindow::default(), 0x6000, bytes)
    }

    #[test]
    fn listing_renders_bookends_and_columns() {
        let memory = memory_with(&[0x86, 0x2A, 0xB7, 0x60, 0x10]);
        let listing = disassemble(&memory, 0x6000, 0x6004).unwrap();

        assert_eq!(
            listing.to_string(),
            concat!(
                " 6000                   1    ORG  $6000\n",
                " 6000  86 2A            2    ldaa #$2A\n",
                " 6002  B7 60 10         3    staa $6010\n",
                " 6005                   4   END\n",
            )
        );
    }

    #[test]
    fn operand_bytes_are_never_decoded_again() {
        // The 0x86 inside the extended operand must not start an instruction.
        let memory = memory_with(&[0xB6, 0x86, 0x2A, 0x39]);
        let listing = disassemble(&memory, 0x6000, 0x6003).unwrap();

        let addresses: Vec<u16> = listing.instructions().map(|i| i.address).collect();
        assert_eq!(addresses, vec![0x6000, 0x6003]);
    }

    #[test]
    fn invalid_instructions_still_advance() {
        let memory = memory_with(&[0x39, 0x39, 0x86, 0x01]);
        let listing = disassemble(&memory, 0x6000, 0x6003).unwrap();

        let rendered: Vec<String> = listing.instructions().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["NULL", "NULL", "ldaa #$01"]);
        assert!(
            listing
                .to_string()
                .contains(" 6001  39               3            NULL\n 6002  86 01")
        );
        assert_eq!(
            listing.lines.last(),
            Some(&ListingLine::End {
                number: 5,
                address: 0x6004
            })
        );
    }

    #[test]
    fn last_instruction_may_run_past_end() {
        let memory = memory_with(&[0xB6, 0x12, 0x34]);
        let listing = disassemble(&memory, 0x6000, 0x6000).unwrap();

        assert_eq!(listing.instructions().count(), 1);
        assert_eq!(
            listing.lines.last(),
            Some(&ListingLine::End {
                number: 3,
                address: 0x6003
            })
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let memory = memory_with(&[]);

        assert_eq!(
            disassemble(&memory, 0x6001, 0x6000),
            Err(DisassemblyError::InvertedRange {
                start: 0x6001,
                end: 0x6000
            })
        );
    }

    #[test]
    fn range_outside_window_is_rejected() {
        let memory = memory_with(&[]);

        assert_eq!(
            disassemble(&memory, 0x0100, 0x6000),
            Err(DisassemblyError::OutOfWindow {
                address: 0x0100,
                window: AddressWindow::default()
            })
        );
    }

    #[test]
    fn iterator_stops_at_end() {
        let memory = memory_with(&[0x86, 0x01, 0x86, 0x02, 0x86, 0x03]);
        let decoded: Vec<DecodedInstruction> = Instructions::new(&memory, 0x6000, 0x6003).collect();

        assert_eq!(decoded.len(), 2);
    }
}
