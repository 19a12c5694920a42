//! Log command - decode a playback log

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ioport_core::replay::HEADER_SIZE;
use ioport_core::{LogHeader, LogReader};
use serde::Serialize;

/// Arguments for the log command
#[derive(Args)]
pub struct LogArgs {
    /// Playback log file
    pub file: PathBuf,

    /// The log starts with a 32-byte host header
    #[arg(long)]
    pub header: bool,

    /// Values per frame (one per group read)
    #[arg(short, long, default_value_t = 1)]
    pub groups: usize,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct HeaderDump {
    system: String,
    base_time: i64,
    started: Option<String>,
}

#[derive(Serialize)]
struct LogDump {
    header: Option<HeaderDump>,
    values: usize,
    trailing_bytes: usize,
    frames: Vec<Vec<u32>>,
}

/// Execute the log command
pub fn execute(args: LogArgs) -> Result<()> {
    if args.groups == 0 {
        anyhow::bail!("--groups must be at least 1");
    }
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read log: {}", args.file.display()))?;
    let dump = decode(bytes, args.header, args.groups)
        .with_context(|| format!("Failed to decode log: {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    println!("Log: {}", args.file.display());
    if let Some(header) = &dump.header {
        println!("  System: {}", header.system);
        match &header.started {
            Some(started) => println!("  Started: {started}"),
            None => println!("  Started: invalid time {}", header.base_time),
        }
    }
    println!("  {} value(s), {} frame(s)", dump.values, dump.frames.len());
    if dump.trailing_bytes > 0 {
        println!("  warning: {} trailing byte(s) ignored", dump.trailing_bytes);
    }
    for (frame, values) in dump.frames.iter().enumerate() {
        let row: Vec<String> = values.iter().map(|v| format!("{v:08x}")).collect();
        println!("{frame:>6}: {}", row.join(" "));
    }
    Ok(())
}

fn decode(bytes: Vec<u8>, has_header: bool, groups: usize) -> Result<LogDump> {
    let total = bytes.len();
    let mut reader = LogReader::new(Cursor::new(bytes));

    let header = if has_header {
        let header: LogHeader = reader.read_header().context("Invalid log header")?;
        Some(HeaderDump {
            started: header.base_time().map(|t| t.to_rfc3339()),
            system: header.system,
            base_time: header.base_time,
        })
    } else {
        None
    };

    let values = reader.read_all()?;
    let body = total - if has_header { HEADER_SIZE } else { 0 };

    Ok(LogDump {
        header,
        values: values.len(),
        trailing_bytes: body - values.len() * 4,
        frames: values.chunks(groups).map(<[u32]>::to_vec).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ioport_core::LogWriter;

    fn log_bytes(header: bool, values: &[u32]) -> Vec<u8> {
        let mut writer = LogWriter::new(Vec::new());
        if header {
            writer
                .write_header(&LogHeader {
                    base_time: 0,
                    system: "pacman".to_string(),
                })
                .unwrap();
        }
        for value in values {
            writer.write_value(*value).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_decode_with_header() {
        let dump = decode(log_bytes(true, &[1, 2, 3, 4, 5]), true, 2).unwrap();
        let header = dump.header.unwrap();
        assert_eq!(header.system, "pacman");
        assert_eq!(header.started.as_deref(), Some("1970-01-01T00:00:00+00:00"));
        assert_eq!(dump.frames, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_trailing_bytes_counted() {
        let mut bytes = log_bytes(false, &[7]);
        bytes.extend_from_slice(&[1, 2]);
        let dump = decode(bytes, false, 1).unwrap();
        assert_eq!(dump.values, 1);
        assert_eq!(dump.trailing_bytes, 2);
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(decode(log_bytes(false, &[1, 2, 3, 4, 5, 6, 7, 8]), true, 1).is_err());
    }

    #[test]
    fn test_json_output() {
        let dump = decode(log_bytes(false, &[0xff]), false, 1).unwrap();
        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["frames"][0][0], 0xff);
        assert!(json["header"].is_null());
    }
}
