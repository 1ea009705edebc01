use std::io::{self, Write};

use hc11::{CharSource, LoadSummary, MemoryImage, RecordLoader};
use tracing::info;

use crate::CommandError;

const TITLE: &str = "Motorola S decoder program";

/// Runs the `lf` upload: banner, one `>` per accepted record, summary.
pub fn load_file<S, W>(
    source: &mut S,
    out: &mut W,
    memory: &mut MemoryImage,
    loader: RecordLoader,
) -> Result<LoadSummary, CommandError>
where
    S: CharSource + ?Sized,
    W: Write + ?Sized,
{
    let window = loader.window();

    write!(out, "\n{:10}{TITLE}\n{:10}{}\n\n", "", "", "_".repeat(TITLE.len()))?;
    write!(
        out,
        "Start the download for the file (Min Address: {:04X}, Max Address: {:04X})\n\n",
        window.start, window.end
    )?;
    out.flush()?;

    let mut echo_error: Option<io::Error> = None;
    let result = loader.load(source, memory, |_| {
        if echo_error.is_none() {
            echo_error = out.write_all(b">").and_then(|()| out.flush()).err();
        }
    });
    if let Some(e) = echo_error {
        return Err(e.into());
    }

    let summary = result?;
    write!(
        out,
        "\n\nFile successfully uploaded. Start address: {:X}, End address: {:X}",
        summary.entry_address, summary.end_address
    )?;
    info!(
        "upload complete: {} bytes, {:04X} -> {:04X}",
        summary.bytes_written,
        summary.start_address.unwrap_or(summary.entry_address),
        summary.end_address
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc11::{LoadError, SliceSource};
    use pretty_assertions::assert_eq;

    #[test]
    fn upload_reports_progress_and_summary() {
        let mut memory = MemoryImage::default();
        let mut out = Vec::new();
        let input = b"S1086000862AB76010C0\r\nS1046005395D\r\nS90360009C\r\n";

        let summary = load_file(
            &mut SliceSource::new(input),
            &mut out,
            &mut memory,
            RecordLoader::default(),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary.bytes_written, 6);
        assert!(text.contains("(Min Address: 594A, Max Address: 7975)"));
        assert!(text.ends_with(">>>\n\nFile successfully uploaded. Start address: 6000, End address: 6006"));
    }

    #[test]
    fn failed_record_keeps_progress_markers() {
        let mut memory = MemoryImage::default();
        let mut out = Vec::new();

        let error = load_file(
            &mut SliceSource::new(b"S1046005395D\nS10460009B00\n"),
            &mut out,
            &mut memory,
            RecordLoader::default(),
        )
        .unwrap_err();

        assert!(matches!(
            error,
            CommandError::Load(LoadError::Checksum { line: 2, .. })
        ));
        assert!(String::from_utf8(out).unwrap().ends_with("\n\n>"));
        assert_eq!(memory.read(0x6005), 0x39);
    }
}
