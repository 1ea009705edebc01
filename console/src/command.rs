//! # Command Table
//!
//! Every operator command is one row of [`COMMANDS`]. Adding a command
//! means adding a row and a match arm in the monitor's dispatch.

use std::io::Write;

use hc11::AddressWindow;

use crate::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    Go,
    MemoryModify,
    DisplayMemory,
    Disassemble,
    LoadFile,
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub kind: CommandKind,
    pub key: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    /// Hex address arguments the command requires.
    pub params: usize,
}

pub const COMMANDS: [CommandSpec; 7] = [
    CommandSpec {
        kind: CommandKind::Help,
        key: "help",
        usage: "<help>",
        description: "Monitor help",
        params: 0,
    },
    CommandSpec {
        kind: CommandKind::Go,
        key: "go",
        usage: "<go 'start addr'>",
        description: "Execute program",
        params: 1,
    },
    CommandSpec {
        kind: CommandKind::MemoryModify,
        key: "mm",
        usage: "<mm 'start addr'>",
        description: "Memory modify",
        params: 1,
    },
    CommandSpec {
        kind: CommandKind::DisplayMemory,
        key: "dm",
        usage: "<dm 'start addr'>",
        description: "Display memory",
        params: 1,
    },
    CommandSpec {
        kind: CommandKind::Disassemble,
        key: "dis",
        usage: "<dis 'start addr' 'stop addr'>",
        description: "Disassemble into assembly",
        params: 2,
    },
    CommandSpec {
        kind: CommandKind::LoadFile,
        key: "lf",
        usage: "<lf>",
        description: "Load S19 file",
        params: 0,
    },
    CommandSpec {
        kind: CommandKind::Demo,
        key: "demo",
        usage: "<demo>",
        description: "Stepper motor program",
        params: 0,
    },
];

/// Case-insensitive lookup of a command word.
#[must_use]
pub fn lookup(key: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|command| command.key.eq_ignore_ascii_case(key))
}

/// A parsed command line whose arguments passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: &'static CommandSpec,
    pub args: Vec<u16>,
    /// More words were given than the command takes; they were ignored.
    pub extra_arguments: bool,
}

impl Invocation {
    pub fn arg(&self, index: usize) -> Result<u16, CommandError> {
        self.args.get(index).copied().ok_or(CommandError::Usage {
            usage: self.command.usage,
        })
    }
}

/// Parses an operator line. Blank lines give `Ok(None)`.
pub fn parse(line: &str, window: AddressWindow) -> Result<Option<Invocation>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(key) = words.next() else {
        return Ok(None);
    };

    let command = lookup(key).ok_or_else(|| CommandError::Unknown(key.to_ascii_lowercase()))?;
    let words: Vec<&str> = words.collect();

    if words.len() < command.params {
        return Err(CommandError::Usage {
            usage: command.usage,
        });
    }

    let args = words[..command.params]
        .iter()
        .map(|word| parse_address(word, window))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Invocation {
        command,
        args,
        extra_arguments: words.len() > command.params,
    }))
}

/// Hex address with an optional `0x` prefix, inside `window`.
pub fn parse_address(word: &str, window: AddressWindow) -> Result<u16, CommandError> {
    let digits = word
        .strip_prefix("0x")
        .or_else(|| word.strip_prefix("0X"))
        .unwrap_or(word);

    let value = u32::from_str_radix(digits, 16).map_err(|_| CommandError::NotHex)?;

    u16::try_from(value)
        .ok()
        .filter(|&address| window.contains(address))
        .ok_or(CommandError::OutOfRange { window })
}

pub fn write_help<W: Write + ?Sized>(out: &mut W) -> Result<(), CommandError> {
    writeln!(out)?;
    for command in &COMMANDS {
        writeln!(out, "{:<34}** {:<34} **", command.usage, command.description)?;
    }
    Ok(())
}
