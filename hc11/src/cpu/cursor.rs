/// Read position inside one instruction.
///
/// The cursor only moves forward by explicit counts, so the number of
/// bytes an instruction consumed is always `consumed`, never a difference
/// of addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    start: u16,
    consumed: u8,
}

impl Cursor {
    #[must_use]
    pub const fn new(start: u16) -> Self {
        Self { start, consumed: 0 }
    }

    #[must_use]
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Address of the next unread byte. Wraps at the top of memory.
    #[must_use]
    pub const fn position(&self) -> u16 {
        self.start.wrapping_add(self.consumed as u16)
    }

    #[must_use]
    pub const fn consumed(&self) -> u8 {
        self.consumed
    }

    pub const fn advance(&mut self, count: u8) {
        self.consumed += count;
    }
}
