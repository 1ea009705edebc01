//! # Opcode Classification
//!
//! The decoder does not use an opcode table. Each stage applies a mask to
//! the opcode byte and matches the result:
//!
//! ```text
//! ┌────────┬──────┬────────────────────────────────────────────────┐
//! │ Stage  │ Mask │ Selects                                        │
//! ├────────┼──────┼────────────────────────────────────────────────┤
//! │ family │ 0x85 │ ld / st / sub / ad, or a zero width escape     │
//! │ suffix │ 0xCF │ register or operand size (a, b, d, x, s, ...)  │
//! │ mode   │ 0x30 │ immediate, direct, indexed, extended           │
//! └────────┴──────┴────────────────────────────────────────────────┘
//! ```
//!
//! Only the families these masks recognise are decoded; everything else
//! is reported as unknown.

use std::fmt;

/// Prefix byte for the Y indexed forms of the `cpd`/`ldx`/`stx` group.
pub const ESCAPE_CD: u8 = 0xCD;

/// Prefix byte selecting the Y index register.
pub const ESCAPE_Y: u8 = 0x18;

/// Prefix byte for the alternate X/Y forms (`cpd`, `cpy` ...).
pub const ESCAPE_ALT: u8 = 0x1A;

const FAMILY_MASK: u8 = 0x85;
const SUFFIX_MASK: u8 = 0xCF;
const MODE_MASK: u8 = 0x30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Load,
    Store,
    Subtract,
    Add,
}

impl Family {
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Load => "ld",
            Self::Store => "st",
            Self::Subtract => "sub",
            Self::Add => "ad",
        }
    }
}

/// Result of the family stage for a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Family(Family),
    /// Zero width prefix; the next byte carries the operation.
    Escape,
    Unknown,
}

#[must_use]
pub const fn classify(byte: u8) -> Opcode {
    match byte & FAMILY_MASK {
        0x84 => Opcode::Family(Family::Load),
        0x85 if byte == ESCAPE_CD => Opcode::Escape,
        0x85 => Opcode::Family(Family::Store),
        0x80 => Opcode::Family(Family::Subtract),
        0x81 if byte & SUFFIX_MASK == 0x83 => Opcode::Family(Family::Subtract),
        0x81 => Opcode::Family(Family::Add),
        0x00 => Opcode::Escape,
        _ => Opcode::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRegister {
    X,
    Y,
}

impl fmt::Display for IndexRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    Dd,
    Db,
    Ca,
    Cb,
    Da,
    B,
    A,
    Aa,
    Ab,
    D,
    S,
    Index(IndexRegister),
}

impl Suffix {
    /// Register or operand size suffix of `opcode`. `preceding` is the
    /// escape byte in front of the opcode, `0` when there was none.
    ///
    /// The index register is `x` for no escape or `0xCD` and `y` for any
    /// other escape, even though the mode stage maps `0xCD` to `Y`.
    #[must_use]
    pub const fn of(opcode: u8, preceding: u8) -> Option<Self> {
        let suffix = match opcode & SUFFIX_MASK {
            0xC3 => Self::Dd,
            0xCB => Self::Db,
            0x89 => Self::Ca,
            0xC9 => Self::Cb,
            0x8B => Self::Da,
            0xC0 => Self::B,
            0x80 => Self::A,
            0x86 | 0x87 => Self::Aa,
            0xC6 | 0xC7 => Self::Ab,
            0x83 | 0xCC | 0xCD => Self::D,
            0x8E | 0x8F => Self::S,
            0xCE | 0xCF => {
                if preceding == 0 || preceding == ESCAPE_CD {
                    Self::Index(IndexRegister::X)
                } else {
                    Self::Index(IndexRegister::Y)
                }
            }
            _ => return None,
        };
        Some(suffix)
    }

    /// Suffixes that name a 16-bit register.
    #[must_use]
    pub const fn is_wide(self) -> bool {
        matches!(self, Self::Dd | Self::D | Self::S | Self::Index(_))
    }

    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Dd => "dd",
            Self::Db => "db",
            Self::Ca => "ca",
            Self::Cb => "cb",
            Self::Da => "da",
            Self::B => "b",
            Self::A => "a",
            Self::Aa => "aa",
            Self::Ab => "ab",
            Self::D => "d",
            Self::S => "s",
            Self::Index(IndexRegister::X) => "x",
            Self::Index(IndexRegister::Y) => "y",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Immediate,
    Direct,
    /// `None` when the escape byte names neither register.
    Indexed(Option<IndexRegister>),
    Extended,
}

impl AddressingMode {
    #[must_use]
    pub const fn of(opcode: u8, preceding: u8) -> Self {
        match opcode & MODE_MASK {
            0x00 => Self::Immediate,
            0x10 => Self::Direct,
            0x20 => Self::Indexed(index_register(preceding)),
            _ => Self::Extended,
        }
    }
}

/// Index register selected by the escape byte in front of an indexed opcode.
#[must_use]
pub const fn index_register(preceding: u8) -> Option<IndexRegister> {
    match preceding {
        0 | ESCAPE_ALT => Some(IndexRegister::X),
        ESCAPE_Y | ESCAPE_CD => Some(IndexRegister::Y),
        _ => None,
    }
}
