//! Memory modify (`mm`) and display (`dm`).

use std::io::Write;

use hc11::{CharSource, MemoryImage};
use tracing::debug;

use crate::CommandError;
use crate::config::MAX_DUMP_COLUMNS;
use crate::line_reader::LineReader;

const MODIFY_HINT: &str = "Please enter in <.> to terminate, <cr> to skip, <Hex data> to input";

/// Leading hex digits of `text`, at most two.
fn parse_byte(text: &str) -> Option<u8> {
    let digits: String = text
        .trim_start()
        .chars()
        .take(2)
        .take_while(char::is_ascii_hexdigit)
        .collect();

    u8::from_str_radix(&digits, 16).ok()
}

/// Edits memory one byte at a time from `start` until `.` is typed or the
/// window end is passed.
pub fn modify<S, W>(
    source: &mut S,
    out: &mut W,
    memory: &mut MemoryImage,
    start: u16,
    echo: bool,
) -> Result<(), CommandError>
where
    S: CharSource + ?Sized,
    W: Write + ?Sized,
{
    let reader = LineReader::instant(2).with_echo(echo);
    let end = memory.window().end;
    let mut address = start;

    writeln!(out, "Address     Hex Data")?;
    loop {
        write!(out, "{address:04X}      {:02X}    : ", memory.read(address))?;
        out.flush()?;

        if let Some(text) = reader.read(source, out)? {
            if text.contains('.') {
                break;
            }
            let Some(value) = parse_byte(&text) else {
                write!(out, "\n{MODIFY_HINT}\n")?;
                continue;
            };
            memory.write(address, value)?;
            debug!("mm {address:04X} <- {value:02X}");
        }

        if address >= end {
            write!(out, "\nCannot surpass maximum address ({end:04X})")?;
            break;
        }
        address += 1;
    }

    Ok(())
}

/// Hex and ASCII dump of `rows` lines of `columns` bytes, cut short at the
/// window end. `columns` is capped at [`MAX_DUMP_COLUMNS`].
pub fn display<W>(
    out: &mut W,
    memory: &MemoryImage,
    start: u16,
    rows: usize,
    columns: usize,
) -> Result<(), CommandError>
where
    W: Write + ?Sized,
{
    let columns = columns.clamp(1, MAX_DUMP_COLUMNS);
    let end = usize::from(memory.window().end);
    let mut address = usize::from(start);

    write!(out, "\nAddress             Hexdata               ASCII")?;
    for _ in 0..rows {
        if address > end {
            break;
        }
        let row_end = address.saturating_add(columns - 1).min(end);
        let row = memory.slice(start_of(address)..=start_of(row_end));

        write!(out, "\n {address:04X}    ")?;
        for byte in row {
            write!(out, "{byte:02X} ")?;
        }
        write!(out, "{:width$}    ", "", width = (columns - row.len()) * 3)?;

        let text: String = row
            .iter()
            .map(|&byte| {
                if (32..=127).contains(&byte) {
                    char::from(byte)
                } else {
                    '.'
                }
            })
            .collect();
        write!(out, "{text}")?;

        address = row_end + 1;
    }
    writeln!(out)?;

    Ok(())
}

/// `address` came from a `u16` window bound.
#[allow(clippy::cast_possible_truncation)]
const fn start_of(address: usize) -> u16 {
    address as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc11::{AddressWindow, SliceSource};
    use pretty_assertions::assert_eq;

    fn run_modify(memory: &mut MemoryImage, start: u16, input: &[u8]) -> String {
        let mut out = Vec::new();
        modify(&mut SliceSource::new(input), &mut out, memory, start, true).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn modify_writes_skips_and_stops() {
        let mut memory = MemoryImage::with_contents(AddressWindow::default(), 0x6002, &[0x55]);
        let output = run_modify(&mut memory, 0x6000, b"AB12\n.\n");

        assert_eq!(memory.slice(0x6000..=0x6003), &[0xAB, 0x12, 0x55, 0x00]);
        assert_eq!(
            output,
            concat!(
                "Address     Hex Data\n",
                "6000      00    : AB\n",
                "6001      00    : 12\n",
                "6002      55    : \n",
                "6003      00    : .\n",
            )
        );
    }

    #[test]
    fn single_digit_needs_line_feed() {
        let mut memory = MemoryImage::default();
        run_modify(&mut memory, 0x6000, b"7\n.\n");

        assert_eq!(memory.read(0x6000), 0x07);
    }

    #[test]
    fn invalid_input_repeats_address() {
        let mut memory = MemoryImage::default();
        let output = run_modify(&mut memory, 0x6000, b"ZZ4F.\n");

        assert_eq!(memory.read(0x6000), 0x4F);
        assert!(output.contains(MODIFY_HINT));
        assert_eq!(output.matches("6000      00    : ").count(), 2);
    }

    #[test]
    fn modify_stops_at_window_end() {
        let mut memory = MemoryImage::default();
        let output = run_modify(&mut memory, 0x7DFF, b"EE");

        assert_eq!(memory.read(0x7DFF), 0xEE);
        assert!(output.ends_with("\nCannot surpass maximum address (7DFF)"));
    }

    #[test]
    fn modify_needs_input() {
        let mut memory = MemoryImage::default();
        let result = modify(
            &mut SliceSource::new(b"1"),
            &mut Vec::new(),
            &mut memory,
            0x6000,
            true,
        );

        assert!(matches!(result, Err(CommandError::Stream(_))));
    }

    #[test]
    fn display_renders_hex_and_ascii() {
        let memory = MemoryImage::with_contents(AddressWindow::default(), 0x6000, b"Hello\x01\xFF~ ok");
        let mut out = Vec::new();
        display(&mut out, &memory, 0x6000, 2, 10).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                "\nAddress             Hexdata               ASCII",
                "\n 6000    48 65 6C 6C 6F 01 FF 7E 20 6F     Hello..~ o",
                "\n 600A    6B 00 00 00 00 00 00 00 00 00     k.........",
                "\n",
            )
        );
    }

    #[test]
    fn display_stops_at_window_end() {
        let memory = MemoryImage::default();
        let mut out = Vec::new();
        display(&mut out, &memory, 0x7DFC, 16, 10).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 3);
        let row = format!("\n 7DFC    {}{}    ....", "00 ".repeat(4), " ".repeat(18));
        assert!(text.contains(&row));
    }

    #[test]
    fn display_caps_oversized_columns() {
        let memory = MemoryImage::default();
        let mut out = Vec::new();
        display(&mut out, &memory, 0x7D00, usize::MAX, usize::MAX).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(&format!("\n 7D00    {}    ", "00 ".repeat(64))));
        assert!(text.contains("\n 7D40    "));
        assert!(text.contains("\n 7DC0    "));
        assert!(!text.contains(" 7E00"));
    }
}
