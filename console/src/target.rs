use std::io::{self, Write};

use hc11::MemoryImage;
use tracing::info;

/// Whatever runs code once `go` hands over an address.
pub trait ExecutionTarget {
    fn go(&mut self, entry: u16, memory: &MemoryImage, out: &mut dyn Write) -> io::Result<()>;
}

/// Host stand-in: target code cannot run here, so the jump is only
/// reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedTarget;

impl ExecutionTarget for DetachedTarget {
    fn go(&mut self, entry: u16, memory: &MemoryImage, out: &mut dyn Write) -> io::Result<()> {
        info!("go {entry:04X} (first byte {:02X})", memory.read(entry));
        write!(out, "\nExecution left the monitor at {entry:04X}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detached_target_reports_jump() {
        let mut out = Vec::new();
        DetachedTarget
            .go(0x6000, &MemoryImage::default(), &mut out)
            .unwrap();

        assert_eq!(out, b"\nExecution left the monitor at 6000\n");
    }
}
