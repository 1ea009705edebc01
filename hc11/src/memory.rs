//! # Memory Image
//!
//! The monitor sees the target as one flat, byte addressable store.
//! The backing array spans the whole 16-bit address space so that any
//! read is defined, but writes are only accepted inside the
//! [`AddressWindow`] the image was built with.
//!
//! ```text
//! 0x0000 ┌──────────────────────┐
//!        │  registers / RAM     │  read only from the monitor's view
//! 0x0400 ├──────────────────────┤ ◄── window.start
//!        │                      │
//!        │  writable window     │  mm, lf
//!        │                      │
//! 0x7DFF ├──────────────────────┤ ◄── window.end
//!        │  ROM / vectors       │
//! 0xFFFF └──────────────────────┘
//! ```

use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

/// First writable address on the reference board.
pub const MIN_ADDRESS: u16 = 0x0400;

/// Last writable address on the reference board.
pub const MAX_ADDRESS: u16 = 0x7DFF;

const ADDRESS_SPACE: usize = 0x1_0000;

/// An inclusive range of addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWindow {
    pub start: u16,
    pub end: u16,
}

impl AddressWindow {
    #[must_use]
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, address: u16) -> bool {
        address >= self.start && address <= self.end
    }

    /// `true` when every address of `other` is also inside `self`.
    #[must_use]
    pub const fn encloses(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl Default for AddressWindow {
    fn default() -> Self {
        Self::new(MIN_ADDRESS, MAX_ADDRESS)
    }
}

impl fmt::Display for AddressWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X} -> {:04X}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("address {address:04X} is outside the writable window ({window})")]
    OutOfRange { address: u16, window: AddressWindow },
}

pub struct MemoryImage {
    bytes: Box<[u8; ADDRESS_SPACE]>,
    window: AddressWindow,
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new(AddressWindow::default())
    }
}

impl MemoryImage {
    #[must_use]
    pub fn new(window: AddressWindow) -> Self {
        Self {
            bytes: Box::new([0; ADDRESS_SPACE]),
            window,
        }
    }

    /// Builds an image with `data` placed at `address`, bypassing the
    /// window. Bytes past the end of the address space are dropped.
    #[must_use]
    pub fn with_contents(window: AddressWindow, address: u16, data: &[u8]) -> Self {
        let mut image = Self::new(window);
        let start = usize::from(address);
        let end = (start + data.len()).min(ADDRESS_SPACE);
        image.bytes[start..end].copy_from_slice(&data[..end - start]);
        image
    }

    #[must_use]
    pub const fn window(&self) -> AddressWindow {
        self.window
    }

    #[must_use]
    pub const fn contains(&self, address: u16) -> bool {
        self.window.contains(address)
    }

    /// Unchecked read. Like the memory mapped bus it models, any address
    /// answers; callers walking a range check the window themselves.
    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        self.bytes[usize::from(address)]
    }

    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] when `address` is outside the window.
    pub fn write(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        if !self.window.contains(address) {
            return Err(MemoryError::OutOfRange {
                address,
                window: self.window,
            });
        }

        self.bytes[usize::from(address)] = value;
        Ok(())
    }

    /// Raw view of an address range, without window checks.
    #[must_use]
    pub fn slice(&self, range: RangeInclusive<u16>) -> &[u8] {
        let (start, end) = range.into_inner();
        if start > end {
            return &[];
        }
        &self.bytes[usize::from(start)..=usize::from(end)]
    }
}
