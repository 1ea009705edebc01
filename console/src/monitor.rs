//! # Monitor Loop
//!
//! ```text
//!  ┌────────────┐   line   ┌─────────┐  Invocation  ┌──────────┐
//!  │ LineReader │ ───────► │  parse  │ ───────────► │ dispatch │
//!  └────────────┘          └─────────┘              └────┬─────┘
//!        ▲                                               │
//!        └──────────── "Command :> " ◄───────────────────┘
//! ```
//!
//! A failed command prints its reason and `Failed to execute command`,
//! then the prompt comes back. Only the end of the input stream or a
//! broken output stream leave the loop.

use std::io::Write;

use hc11::{CharSource, LoadSummary, MemoryImage, RecordLoader, disassemble};
use tracing::{info, warn};

use crate::command::{self, CommandKind, Invocation};
use crate::config::{ConfigError, MonitorConfig};
use crate::demo::{self, SimulatedPorts, StepperPorts};
use crate::line_reader::LineReader;
use crate::target::{DetachedTarget, ExecutionTarget};
use crate::{CommandError, inspect, upload};

pub const BANNER_RULE: &str =
    "##########################################################################";

pub struct Monitor<S, W> {
    source: S,
    out: W,
    memory: MemoryImage,
    loader: RecordLoader,
    config: MonitorConfig,
    target: Box<dyn ExecutionTarget>,
    ports: Box<dyn StepperPorts>,
}

impl<S: CharSource, W: Write> Monitor<S, W> {
    pub fn new(source: S, out: W, config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            source,
            out,
            memory: MemoryImage::new(config.memory_window()),
            loader: RecordLoader::new(config.loader_window()?),
            target: Box::new(DetachedTarget),
            ports: Box::new(SimulatedPorts::new(config.demo.potentiometer)),
            config,
        })
    }

    #[must_use]
    pub fn with_target(mut self, target: Box<dyn ExecutionTarget>) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_ports(mut self, ports: Box<dyn StepperPorts>) -> Self {
        self.ports = ports;
        self
    }

    pub const fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    /// Loads records from `source` before the operator takes over.
    pub fn preload<P: CharSource + ?Sized>(
        &mut self,
        source: &mut P,
    ) -> Result<LoadSummary, CommandError> {
        Ok(self.loader.load(source, &mut self.memory, |_| {})?)
    }

    /// Runs until the input stream ends.
    pub fn run(&mut self) -> Result<(), CommandError> {
        self.banner()?;
        let reader =
            LineReader::new(self.config.console.input_size).with_echo(self.config.console.echo);

        loop {
            write!(self.out, "\nCommand :> ")?;
            self.out.flush()?;

            let result = reader
                .read(&mut self.source, &mut self.out)
                .and_then(|line| match line {
                    Some(line) => self.execute(&line),
                    None => Ok(()),
                });

            match result {
                Ok(()) => {}
                Err(CommandError::Stream(_)) => {
                    info!("input stream ended, leaving monitor");
                    return Ok(());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("command failed: {e}");
                    write!(self.out, "\n{e}\n\nFailed to execute command")?;
                }
            }
        }
    }

    fn banner(&mut self) -> Result<(), CommandError> {
        write!(
            self.out,
            "{BANNER_RULE}\n\n68HC11 HMonitor {}\n\nType help for commands\n",
            env!("CARGO_PKG_VERSION")
        )?;
        command::write_help(&mut self.out)
    }

    /// Parses and runs one command line.
    pub fn execute(&mut self, line: &str) -> Result<(), CommandError> {
        let Some(invocation) = command::parse(line, self.memory.window())? else {
            return Ok(());
        };

        if invocation.extra_arguments {
            write!(
                self.out,
                "\nToo many arguments specified, Usage: {}\n\nContinuing command execution\n",
                invocation.command.usage
            )?;
        }

        info!(command = invocation.command.key, args = ?invocation.args, "dispatch");
        self.dispatch(&invocation)
    }

    fn dispatch(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
        match invocation.command.kind {
            CommandKind::Help => command::write_help(&mut self.out),
            CommandKind::Go => {
                let entry = invocation.arg(0)?;
                self.target.go(entry, &self.memory, &mut self.out)?;
                Ok(())
            }
            CommandKind::MemoryModify => inspect::modify(
                &mut self.source,
                &mut self.out,
                &mut self.memory,
                invocation.arg(0)?,
                self.config.console.echo,
            ),
            CommandKind::DisplayMemory => inspect::display(
                &mut self.out,
                &self.memory,
                invocation.arg(0)?,
                self.config.console.dump_rows,
                self.config.console.dump_columns,
            ),
            CommandKind::Disassemble => {
                let listing = disassemble(&self.memory, invocation.arg(0)?, invocation.arg(1)?)?;
                write!(self.out, "\n{listing}")?;
                Ok(())
            }
            CommandKind::LoadFile => {
                upload::load_file(&mut self.source, &mut self.out, &mut self.memory, self.loader)?;
                Ok(())
            }
            CommandKind::Demo => demo::run(&mut self.out, self.ports.as_mut(), self.config.demo.steps),
        }
    }
}
