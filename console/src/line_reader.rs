use std::io::Write;

use hc11::CharSource;

use crate::CommandError;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// Reads one operator line with echo and backspace editing.
///
/// Characters past `max` are dropped. In instant mode the line ends as
/// soon as `max` characters are typed, without waiting for a line feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineReader {
    max: usize,
    instant: bool,
    echo: bool,
}

impl LineReader {
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self {
            max,
            instant: false,
            echo: true,
        }
    }

    #[must_use]
    pub const fn instant(max: usize) -> Self {
        Self {
            max,
            instant: true,
            echo: true,
        }
    }

    /// Turns echo off for terminals that echo on their own.
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// `Ok(None)` for an empty line.
    ///
    /// # Errors
    ///
    /// [`CommandError::Stream`] when the source ends before a line feed,
    /// [`CommandError::Io`] when the echo cannot be written.
    pub fn read<S, W>(&self, source: &mut S, out: &mut W) -> Result<Option<String>, CommandError>
    where
        S: CharSource + ?Sized,
        W: Write + ?Sized,
    {
        let mut line = Vec::new();
        let mut echo = |bytes: &[u8]| {
            if self.echo {
                out.write_all(bytes)
            } else {
                Ok(())
            }
        };

        loop {
            match source.next_char()? {
                b'\n' => {
                    echo(b"\n")?;
                    break;
                }
                BACKSPACE | DELETE => {
                    if line.pop().is_some() {
                        echo(b"\x08 \x08")?;
                    }
                }
                c if line.len() < self.max => {
                    line.push(c);
                    echo(&[c])?;
                    if self.instant && line.len() >= self.max {
                        echo(b"\n")?;
                        break;
                    }
                }
                _ => {}
            }
        }
        out.flush()?;

        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&line).into_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc11::SliceSource;
    use pretty_assertions::assert_eq;

    fn read(reader: LineReader, input: &[u8]) -> (Result<Option<String>, CommandError>, Vec<u8>) {
        let mut echo = Vec::new();
        let result = reader.read(&mut SliceSource::new(input), &mut echo);
        (result, echo)
    }

    #[test]
    fn reads_until_line_feed() {
        let (line, echo) = read(LineReader::new(32), b"dm 6000\rrest");

        assert_eq!(line.unwrap(), Some("dm 6000".to_string()));
        assert_eq!(echo, b"dm 6000\n");
    }

    #[test]
    fn empty_line_is_none() {
        let (line, _) = read(LineReader::new(32), b"\n");

        assert_eq!(line.unwrap(), None);
    }

    #[test]
    fn backspace_erases() {
        let (line, echo) = read(LineReader::new(32), b"hx\x08elp\x7F\x7Fp\n");

        assert_eq!(line.unwrap(), Some("hep".to_string()));
        assert_eq!(echo, b"hx\x08 \x08elp\x08 \x08\x08 \x08p\n");
    }

    #[test]
    fn backspace_on_empty_line_is_ignored() {
        let (line, echo) = read(LineReader::new(32), b"\x08\x08a\n");

        assert_eq!(line.unwrap(), Some("a".to_string()));
        assert_eq!(echo, b"a\n");
    }

    #[test]
    fn characters_past_limit_are_dropped() {
        let (line, _) = read(LineReader::new(3), b"abcdef\n");

        assert_eq!(line.unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn instant_mode_returns_at_limit() {
        let mut source = SliceSource::new(b"AB\n");
        let mut echo = Vec::new();
        let line = LineReader::instant(2).read(&mut source, &mut echo).unwrap();

        assert_eq!(line, Some("AB".to_string()));
        assert_eq!(echo, b"AB\n");
        assert_eq!(source.remaining(), b"\n");
    }

    #[test]
    fn echo_can_be_switched_off() {
        let (line, echo) = read(LineReader::new(32).with_echo(false), b"dm\x086\n");

        assert_eq!(line.unwrap(), Some("d6".to_string()));
        assert!(echo.is_empty());
    }

    #[test]
    fn huge_limit_does_not_preallocate() {
        let (line, _) = read(LineReader::new(usize::MAX), b"help\n");

        assert_eq!(line.unwrap(), Some("help".to_string()));
    }

    #[test]
    fn stream_end() {
        let (line, _) = read(LineReader::new(32), b"hel");

        assert!(matches!(line, Err(CommandError::Stream(_))));
    }
}
