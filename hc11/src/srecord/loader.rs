use thiserror::Error;
use tracing::{debug, info, warn};

use super::LOAD_WINDOW;
use super::hex::{hex_byte, hex_field};
use crate::memory::{AddressWindow, MemoryError, MemoryImage};
use crate::serial::CharSource;

/// Header characters: `S`, type, two count digits, four address digits.
const HEADER_LEN: usize = 8;

/// Bytes the count covers besides the data: two address, one checksum.
const OVERHEAD: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Invalid start of line - Line: {line}")]
    RecordType { line: usize, found: u8 },
    #[error("Invalid hex digits in 'length' or 'start address' - Line: {line}")]
    Header { line: usize },
    #[error(
        "Invalid hex digits in the 'data' - Line: {line} - ({}{})",
        char::from(.chars[0]),
        char::from(.chars[1])
    )]
    Data { line: usize, chars: [u8; 2] },
    #[error("The line start address ({address:X}) is out of bounds ({window}) - Line: {line}")]
    OutOfBounds {
        line: usize,
        address: u16,
        window: AddressWindow,
    },
    #[error("Checksum failed Expected: {expected:02X}, Actual: {actual:02X} - Line: {line}")]
    Checksum {
        line: usize,
        expected: u8,
        actual: u8,
    },
    #[error("Input stream ended - Line: {line}")]
    StreamEnd { line: usize },
    #[error("{source} - Line: {line}")]
    Memory { line: usize, source: MemoryError },
}

impl LoadError {
    /// One based number of the record that failed.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::RecordType { line, .. }
            | Self::Header { line }
            | Self::Data { line, .. }
            | Self::OutOfBounds { line, .. }
            | Self::Checksum { line, .. }
            | Self::StreamEnd { line }
            | Self::Memory { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `S1`: data at a 16-bit address.
    Data,
    /// `S9`: end of file, the address is the program entry.
    Terminator,
}

/// One validated record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub byte_count: u8,
    pub address: u16,
    pub data: Vec<u8>,
    pub checksum: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    /// Address of the first data record, `None` if the file had none.
    pub start_address: Option<u16>,
    /// Address just past the last data byte.
    pub end_address: u16,
    /// Address carried by the terminator record.
    pub entry_address: u16,
    pub bytes_written: usize,
    /// Records accepted, terminator included.
    pub lines: usize,
}

/// Loads records into a [`MemoryImage`] until the terminator.
///
/// Each record is fully read and checked before any of its bytes reach
/// memory. The first bad record ends the load; records accepted before it
/// stay in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLoader {
    window: AddressWindow,
}

impl Default for RecordLoader {
    fn default() -> Self {
        Self::new(LOAD_WINDOW)
    }
}

impl RecordLoader {
    #[must_use]
    pub const fn new(window: AddressWindow) -> Self {
        Self { window }
    }

    #[must_use]
    pub const fn window(&self) -> AddressWindow {
        self.window
    }

    /// Runs a load. `on_line` is called after each accepted record.
    pub fn load<S, F>(
        &self,
        source: &mut S,
        memory: &mut MemoryImage,
        mut on_line: F,
    ) -> Result<LoadSummary, LoadError>
    where
        S: CharSource + ?Sized,
        F: FnMut(&Record),
    {
        let mut summary = LoadSummary::default();
        let mut line = 1;

        loop {
            let record = match self.read_record(source, line) {
                Ok(record) => record,
                Err(e) => {
                    warn!("load stopped after {} bytes: {e}", summary.bytes_written);
                    return Err(e);
                }
            };

            match record.kind {
                RecordKind::Data => {
                    commit(&record, memory, line)?;
                    let length = u16::try_from(record.data.len()).unwrap_or(u16::MAX);

                    summary.start_address.get_or_insert(record.address);
                    summary.end_address = record.address.wrapping_add(length);
                    summary.bytes_written += record.data.len();
                    summary.lines += 1;
                    debug!(
                        "record {line}: {} bytes at {:04X}",
                        record.data.len(),
                        record.address
                    );

                    on_line(&record);
                    line += 1;
                }
                RecordKind::Terminator => {
                    summary.entry_address = record.address;
                    summary.lines += 1;
                    info!(
                        "loaded {} bytes in {} records, entry {:04X}",
                        summary.bytes_written, summary.lines, summary.entry_address
                    );

                    on_line(&record);
                    return Ok(summary);
                }
            }
        }
    }

    /// Reads and validates one record without touching memory.
    pub fn read_record<S>(&self, source: &mut S, line: usize) -> Result<Record, LoadError>
    where
        S: CharSource + ?Sized,
    {
        let header = read_header(source, line)?;

        let kind = match header[1] {
            b'1' => RecordKind::Data,
            b'9' => RecordKind::Terminator,
            found => return Err(LoadError::RecordType { line, found }),
        };

        let byte_count = hex_field(&header[2..4]).and_then(|count| u8::try_from(count).ok());
        let address = hex_field(&header[4..8]);
        let (Some(byte_count), Some(address)) = (byte_count, address) else {
            return Err(LoadError::Header { line });
        };

        if !self.window.contains(address) {
            return Err(LoadError::OutOfBounds {
                line,
                address,
                window: self.window,
            });
        }

        let [high, low] = address.to_be_bytes();
        let mut sum = u32::from(high) + u32::from(low) + u32::from(byte_count);
        let mut data = Vec::with_capacity(usize::from(byte_count.saturating_sub(OVERHEAD)));
        let mut checksum = 0;

        // Counts below three leave no room for a checksum, which stays zero.
        if byte_count >= OVERHEAD {
            for _ in OVERHEAD..byte_count {
                let value = read_byte(source, line)?;
                sum += u32::from(value);
                data.push(value);
            }
            checksum = read_byte(source, line)?;
        }

        #[allow(clippy::cast_possible_truncation)]
        let computed = !(sum as u8);
        if checksum == 0 || checksum != computed {
            return Err(LoadError::Checksum {
                line,
                expected: checksum,
                actual: computed,
            });
        }

        Ok(Record {
            kind,
            byte_count,
            address,
            data,
            checksum,
        })
    }
}

/// Collects eight characters starting at an `S`, skipping anything before it.
fn read_header<S>(source: &mut S, line: usize) -> Result<[u8; HEADER_LEN], LoadError>
where
    S: CharSource + ?Sized,
{
    let mut header = [0_u8; HEADER_LEN];
    let mut count = 0;

    while count < HEADER_LEN {
        header[count] = next(source, line)?;
        count += 1;
        if header[0] != b'S' {
            count = 0;
        }
    }

    Ok(header)
}

fn read_byte<S>(source: &mut S, line: usize) -> Result<u8, LoadError>
where
    S: CharSource + ?Sized,
{
    let chars = [next(source, line)?, next(source, line)?];
    hex_byte(chars).ok_or(LoadError::Data { line, chars })
}

fn next<S>(source: &mut S, line: usize) -> Result<u8, LoadError>
where
    S: CharSource + ?Sized,
{
    source
        .next_char()
        .map_err(|_| LoadError::StreamEnd { line })
}

/// Writes a validated record. Every target address is checked first so a
/// record is either written whole or not at all.
fn commit(record: &Record, memory: &mut MemoryImage, line: usize) -> Result<(), LoadError> {
    let addresses = (0_u16..)
        .map(|offset| record.address.wrapping_add(offset))
        .take(record.data.len());

    if let Some(address) = addresses.clone().find(|&address| !memory.contains(address)) {
        return Err(LoadError::Memory {
            line,
            source: MemoryError::OutOfRange {
                address,
                window: memory.window(),
            },
        });
    }

    for (address, &value) in addresses.zip(&record.data) {
        memory
            .write(address, value)
            .map_err(|source| LoadError::Memory { line, source })?;
    }

    Ok(())
}
