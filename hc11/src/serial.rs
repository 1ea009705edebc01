//! # Serial Character Input
//!
//! Every interactive command and the S-record loader pull their input one
//! character at a time from a [`CharSource`]. Reads block until a
//! character arrives; there is no timeout. Carriage returns are
//! normalised to line feeds so that terminals sending `\r`, `\n` or
//! `\r\n` all end a line.

use std::io::{ErrorKind, Read};

use thiserror::Error;
use tracing::debug;

/// The source has no more characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("input stream ended")]
pub struct StreamEnd;

pub trait CharSource {
    fn next_char(&mut self) -> Result<u8, StreamEnd>;
}

impl<T: CharSource + ?Sized> CharSource for &mut T {
    fn next_char(&mut self) -> Result<u8, StreamEnd> {
        (**self).next_char()
    }
}

const fn normalise(byte: u8) -> u8 {
    if byte == b'\r' { b'\n' } else { byte }
}

/// Adapts any [`Read`] (stdin, a file, a socket) into a character source.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> CharSource for ReaderSource<R> {
    fn next_char(&mut self) -> Result<u8, StreamEnd> {
        let mut byte = [0_u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Err(StreamEnd),
                Ok(_) => return Ok(normalise(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("serial read failed: {e}");
                    return Err(StreamEnd);
                }
            }
        }
    }
}

/// Characters from an in-memory buffer.
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Characters not read yet.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.position..]
    }
}

impl CharSource for SliceSource<'_> {
    fn next_char(&mut self) -> Result<u8, StreamEnd> {
        let byte = *self.data.get(self.position).ok_or(StreamEnd)?;
        self.position += 1;
        Ok(normalise(byte))
    }
}
