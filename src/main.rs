use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use console::{Monitor, MonitorConfig};
use hc11::{ReaderSource, SliceSource};
use logger::LogKind;

/// 68HC11 resident debug monitor, hosted on a terminal.
#[derive(Parser, Debug)]
#[command(name = "hmonitor", version)]
struct Args {
    /// YAML configuration (memory window, loader sizes, console layout).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write diagnostics to a file in the temp directory instead of stderr.
    #[arg(long, default_value_t = false)]
    log_file: bool,

    /// Keep echo on when stdin is a terminal set to raw mode.
    #[arg(long, default_value_t = false)]
    raw_tty: bool,

    /// S-record file loaded into memory before the prompt.
    #[arg(long, value_name = "S19")]
    preload: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let kind = if args.log_file {
        LogKind::File
    } else {
        LogKind::Console
    };
    match logger::init_logger(kind) {
        Ok(Some(path)) => eprintln!("Logging to file: {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("cannot create log file: {e}");
            process::exit(1);
        }
    }

    let mut config = match args.config.as_deref().map(MonitorConfig::load) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            eprintln!("{e}");
            process::exit(2);
        }
        None => MonitorConfig::default(),
    };
    // A cooked terminal already echoes each line.
    if io::stdin().is_terminal() && !args.raw_tty {
        config.console.echo = false;
    }

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let mut monitor = match Monitor::new(ReaderSource::new(stdin), stdout, config) {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    if let Some(path) = &args.preload {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("cannot read {}: {e}", path.display());
                process::exit(3);
            }
        };
        match monitor.preload(&mut SliceSource::new(&data)) {
            Ok(summary) => tracing::info!(
                "preloaded {} bytes from {}, entry {:04X}",
                summary.bytes_written,
                path.display(),
                summary.entry_address
            ),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                process::exit(3);
            }
        }
    }

    let status = match monitor.run() {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("monitor stopped: {e}");
            4
        }
    };
    drop(monitor);

    logger::flush();
    process::exit(status);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_flags() {
        let args = Args::parse_from([
            "hmonitor",
            "--config",
            "board.yaml",
            "--log-file",
            "--raw-tty",
            "--preload",
            "blink.s19",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("board.yaml")));
        assert!(args.log_file);
        assert!(args.raw_tty);
        assert_eq!(args.preload, Some(PathBuf::from("blink.s19")));
    }

    #[test]
    fn flags_are_optional() {
        let args = Args::parse_from(["hmonitor"]);

        assert_eq!(args.config, None);
        assert!(!args.log_file);
        assert!(!args.raw_tty);
    }
}
