//! Hex digit decoding for the record loader.
//!
//! Only digits and uppercase `A`-`F` are accepted, matching what the
//! record format transmits. Every caller has to handle `None`.

#[must_use]
pub const fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Folds one to four hex digits, most significant first.
#[must_use]
pub fn hex_field(chars: &[u8]) -> Option<u16> {
    if chars.is_empty() || chars.len() > 4 {
        return None;
    }

    chars.iter().try_fold(0_u16, |total, &c| {
        hex_digit(c).map(|value| (total << 4) | u16::from(value))
    })
}

/// Decodes a two digit pair into a byte.
#[must_use]
pub fn hex_byte(pair: [u8; 2]) -> Option<u8> {
    Some((hex_digit(pair[0])? << 4) | hex_digit(pair[1])?)
}
