//! # Instruction Decoding
//!
//! Turns the bytes at an address into a [`DecodedInstruction`]. Decoding
//! runs in three stages over the same cursor:
//!
//! ```text
//!  18        A6         05
//!  ───────   ───────    ──────────────
//!  escape    family +   operand bytes
//!  (0..3)    suffix +   (1 or 2, plus an elided
//!            mode       leading zero for 16-bit #)
//! ```
//!
//! 1. **Prefix**: bytes are classified until one matches a family. Escape
//!    bytes are remembered (the last one selects the index register) and
//!    skipped. An unknown byte ends the instruction as invalid.
//! 2. **Suffix**: the family byte selects the register suffix.
//! 3. **Operand**: the family byte selects the addressing mode, which
//!    decides how many of the following bytes are operand bytes.
//!
//! Decoding never fails: an invalid instruction still reports at least one
//! consumed byte so a disassembly loop always makes progress.

use std::fmt::{self, Write as _};

use tracing::debug;

use super::cursor::Cursor;
use super::opcode::{AddressingMode, Family, Opcode, Suffix, classify};
use crate::memory::MemoryImage;

/// Mnemonic reported for bytes that do not decode.
pub const INVALID_MNEMONIC: &str = "NULL";

/// Number of bytes the prefix stage may walk before giving up.
pub const PREFIX_BUDGET: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Address of the first byte (escape bytes included).
    pub address: u16,
    /// Every byte the instruction consumed, in memory order.
    pub bytes: Vec<u8>,
    pub mnemonic: String,
    /// Rendered operand, e.g. `#$2A`, `$05,X`, `$6010`.
    pub operand: String,
    pub family: Option<Family>,
    pub mode: Option<AddressingMode>,
    pub valid: bool,
}

impl DecodedInstruction {
    fn invalid(memory: &MemoryImage, cursor: Cursor) -> Self {
        Self {
            address: cursor.start(),
            bytes: consumed_bytes(memory, cursor),
            mnemonic: INVALID_MNEMONIC.to_string(),
            operand: String::new(),
            family: None,
            mode: None,
            valid: false,
        }
    }

    #[must_use]
    pub fn consumed(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "{:<4} {}", self.mnemonic, self.operand)
        } else {
            f.write_str(&self.mnemonic)
        }
    }
}

/// Decodes the instruction starting at `address`.
///
/// The address is not checked against the memory window: bounds are the
/// caller's concern, decoding just reads whatever is there.
#[must_use]
pub fn decode(memory: &MemoryImage, address: u16) -> DecodedInstruction {
    let mut cursor = Cursor::new(address);
    let mut preceding = 0;

    let family = loop {
        if cursor.consumed() == PREFIX_BUDGET {
            debug!("no opcode family after {PREFIX_BUDGET} escape bytes at {address:04X}");
            return DecodedInstruction::invalid(memory, cursor);
        }

        let byte = memory.read(cursor.position());
        match classify(byte) {
            Opcode::Family(family) => break family,
            Opcode::Escape => {
                preceding = byte;
                cursor.advance(1);
            }
            Opcode::Unknown => {
                cursor.advance(1);
                debug!(
                    "unknown opcode {byte:02X} at {:04X}",
                    cursor.position().wrapping_sub(1)
                );
                return DecodedInstruction::invalid(memory, cursor);
            }
        }
    };

    let opcode = memory.read(cursor.position());
    cursor.advance(1);

    let suffix = Suffix::of(opcode, preceding);
    let mode = AddressingMode::of(opcode, preceding);
    let wide = suffix.is_some_and(Suffix::is_wide);
    let mut operand = String::new();
    // Writing into a String cannot fail.
    let _ = render_operand(&mut operand, memory, &mut cursor, mode, wide);

    let mut mnemonic = family.mnemonic().to_string();
    if let Some(suffix) = suffix {
        mnemonic.push_str(suffix.text());
    }

    DecodedInstruction {
        address,
        bytes: consumed_bytes(memory, cursor),
        mnemonic,
        operand,
        family: Some(family),
        mode: Some(mode),
        valid: true,
    }
}

/// Renders the operand following the opcode and advances the cursor past
/// the operand bytes.
///
/// A 16-bit immediate whose high byte is zero is shown as its low byte
/// only (`#$0010` renders as `#$10`); the zero byte is still consumed.
fn render_operand(
    text: &mut String,
    memory: &MemoryImage,
    cursor: &mut Cursor,
    mode: AddressingMode,
    mut wide: bool,
) -> fmt::Result {
    if mode == AddressingMode::Immediate {
        text.push('#');
        if wide && memory.read(cursor.position()) == 0 {
            cursor.advance(1);
            wide = false;
        }
    }

    write!(text, "${:02X}", memory.read(cursor.position()))?;
    cursor.advance(1);

    match mode {
        AddressingMode::Indexed(Some(register)) => write!(text, ",{register}")?,
        AddressingMode::Extended => {
            write!(text, "{:02X}", memory.read(cursor.position()))?;
            cursor.advance(1);
        }
        AddressingMode::Immediate if wide => {
            write!(text, "{:02X}", memory.read(cursor.position()))?;
            cursor.advance(1);
        }
        AddressingMode::Immediate | AddressingMode::Direct | AddressingMode::Indexed(None) => {}
    }

    Ok(())
}

fn consumed_bytes(memory: &MemoryImage, cursor: Cursor) -> Vec<u8> {
    (0..u16::from(cursor.consumed()))
        .map(|offset| memory.read(cursor.start().wrapping_add(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::opcode::IndexRegister;
    use crate::memory::AddressWindow;
    use pretty_assertions::assert_eq;
    use rand::Rng;

    const ORIGIN: u16 = 0x6000;

    fn decode_bytes(bytes: &[u8]) -> DecodedInstruction {
        let memory = MemoryImage::with_contents(AddressWindow::default(), ORIGIN, bytes);
        decode(&memory, ORIGIN)
    }

    fn assert_decodes(bytes: &[u8], text: &str, consumed: usize) {
        let instruction = decode_bytes(bytes);
        assert!(instruction.valid, "{bytes:02X?} should be valid");
        assert_eq!(instruction.to_string(), text);
        assert_eq!(instruction.consumed(), consumed);
        assert_eq!(instruction.bytes, bytes[..consumed].to_vec());
    }

    #[test]
    fn decode_immediate_8bit() {
        let output = decode_bytes(&[0x86, 0x2A]);

        assert_eq!(output.mnemonic, "ldaa");
        assert_eq!(output.operand, "#$2A");
        assert_eq!(output.consumed(), 2);
        assert_eq!(output.family, Some(Family::Load));
        assert_eq!(output.mode, Some(AddressingMode::Immediate));
        assert!(output.valid);
    }

    #[test]
    fn decode_immediate_16bit() {
        assert_decodes(&[0xCC, 0x12, 0x34], "ldd  #$1234", 3);
        assert_decodes(&[0x8E, 0x7D, 0xFF], "lds  #$7DFF", 3);
        assert_decodes(&[0xC3, 0x12, 0x34], "addd #$1234", 3);
    }

    #[test]
    fn decode_immediate_16bit_leading_zero_is_elided() {
        assert_decodes(&[0xCC, 0x00, 0x10], "ldd  #$10", 3);
        assert_decodes(&[0xCE, 0x00, 0xFF], "ldx  #$FF", 3);
    }

    #[test]
    fn decode_direct_and_extended() {
        assert_decodes(&[0x97, 0x40], "staa $40", 2);
        assert_decodes(&[0xDC, 0x40], "ldd  $40", 2);
        assert_decodes(&[0xB7, 0x60, 0x10], "staa $6010", 3);
        assert_decodes(&[0xFD, 0x60, 0x10], "std  $6010", 3);
        assert_decodes(&[0xF6, 0x12, 0x00], "ldab $1200", 3);
    }

    #[test]
    fn decode_arithmetic_families() {
        assert_decodes(&[0x8B, 0x05], "adda #$05", 2);
        assert_decodes(&[0xCB, 0x05], "addb #$05", 2);
        assert_decodes(&[0x89, 0x01], "adca #$01", 2);
        assert_decodes(&[0xC9, 0x01], "adcb #$01", 2);
        assert_decodes(&[0x80, 0x10], "suba #$10", 2);
        assert_decodes(&[0xC0, 0x10], "subb #$10", 2);
        assert_decodes(&[0x83, 0x00, 0x01], "subd #$01", 3);
    }

    #[test]
    fn decode_indexed() {
        assert_decodes(&[0xA6, 0x05], "ldaa $05,X", 2);
        assert_decodes(&[0x18, 0xA6, 0x05], "ldaa $05,Y", 3);
        assert_decodes(&[0x1A, 0xA3, 0x05], "subd $05,X", 3);
        assert_decodes(&[0xE7, 0x00], "stab $00,X", 2);
    }

    #[test]
    fn decode_indexed_mode_without_known_register() {
        let output = decode_bytes(&[0x02, 0xA6, 0x05]);

        assert_eq!(output.to_string(), "ldaa $05");
        assert_eq!(output.mode, Some(AddressingMode::Indexed(None)));
        assert_eq!(output.consumed(), 3);
    }

    #[test]
    fn decode_y_escape() {
        assert_decodes(&[0x18, 0xCE, 0x12, 0x34], "ldy  #$1234", 4);
        assert_decodes(&[0x18, 0xCE, 0x00, 0x34], "ldy  #$34", 4);
        assert_decodes(&[0x1A, 0x83, 0x12, 0x34], "subd #$1234", 4);
    }

    #[test]
    fn decode_cd_escape_keeps_x_suffix_with_y_index() {
        let output = decode_bytes(&[0xCD, 0xEE, 0x05]);

        assert_eq!(output.to_string(), "ldx  $05,Y");
        assert_eq!(
            output.mode,
            Some(AddressingMode::Indexed(Some(IndexRegister::Y)))
        );
        assert_eq!(output.consumed(), 3);
    }

    #[test]
    fn decode_unknown_opcode() {
        let output = decode_bytes(&[0x39, 0x86, 0x01]);

        assert!(!output.valid);
        assert_eq!(output.mnemonic, "NULL");
        assert_eq!(output.to_string(), "NULL");
        assert_eq!(output.consumed(), 1);
        assert_eq!(output.bytes, vec![0x39]);
    }

    #[test]
    fn decode_unknown_after_escape_consumes_escape() {
        let output = decode_bytes(&[0x18, 0x39]);

        assert!(!output.valid);
        assert_eq!(output.consumed(), 2);
    }

    #[test]
    fn decode_escape_budget() {
        let output = decode_bytes(&[0x18, 0x18, 0x18, 0x18, 0x86, 0x01]);

        assert!(!output.valid);
        assert_eq!(output.consumed(), usize::from(PREFIX_BUDGET));

        // Three escapes still leave room for the opcode.
        assert_decodes(&[0x18, 0x18, 0x18, 0x86, 0x01], "ldaa #$01", 5);
    }

    #[test]
    fn decode_does_not_check_window() {
        let memory = MemoryImage::with_contents(AddressWindow::default(), 0xFFFE, &[0x86, 0x2A]);
        let output = decode(&memory, 0xFFFE);

        assert_eq!(output.to_string(), "ldaa #$2A");
    }

    #[test]
    fn encoded_family_and_mode_round_trip() {
        // Opcode column for each family and addressing mode on accumulator A.
        let families = [
            (0x86, Family::Load),
            (0x87, Family::Store),
            (0x80, Family::Subtract),
            (0x8B, Family::Add),
        ];
        let modes = [
            (0x00, AddressingMode::Immediate),
            (0x10, AddressingMode::Direct),
            (0x20, AddressingMode::Indexed(Some(IndexRegister::X))),
            (0x30, AddressingMode::Extended),
        ];

        for (base, family) in families {
            for (bits, mode) in modes {
                let output = decode_bytes(&[base | bits, 0x12, 0x34]);
                assert_eq!(output.family, Some(family), "opcode {:02X}", base | bits);
                assert_eq!(output.mode, Some(mode), "opcode {:02X}", base | bits);
            }
        }
    }

    #[test]
    fn random_bytes_always_make_progress() {
        let mut rng = rand::thread_rng();
        let mut memory = MemoryImage::default();
        for address in 0x0400..=0x04FF_u16 {
            memory.write(address, rng.r#gen::<u8>()).unwrap();
        }

        let mut address = 0x0400_u16;
        while address < 0x04F0 {
            let output = decode(&memory, address);
            assert!((1..=6).contains(&output.consumed()));
            if !output.valid {
                assert!(output.consumed() <= usize::from(PREFIX_BUDGET));
            }
            address += u16::try_from(output.consumed()).unwrap();
        }
    }
}
