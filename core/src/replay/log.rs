//! Binary playback log format
//!
//! The stream is a flat sequence of u32 little-endian values, one per
//! group read. Hosts may put a 32-byte header in front of it:
//!
//! | Offset | Size | Field                      |
//! |--------|------|----------------------------|
//! | 0      | 8    | magic `IOPTLOG\0`          |
//! | 8      | 8    | base time, unix seconds    |
//! | 16     | 16   | system name, NUL padded    |

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};

/// Magic bytes at the start of a host header
pub const LOG_MAGIC: [u8; 8] = *b"IOPTLOG\0";

/// Size of the host header in bytes
pub const HEADER_SIZE: usize = 32;

const SYSTEM_NAME_SIZE: usize = 16;

/// Optional host-attached header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    /// Unix seconds the session started at
    pub base_time: i64,
    /// Short system identifier, at most 16 bytes
    pub system: String,
}

impl LogHeader {
    pub fn new(system: impl Into<String>, base_time: DateTime<Utc>) -> Self {
        Self {
            base_time: base_time.timestamp(),
            system: system.into(),
        }
    }

    /// Header stamped with the current time
    pub fn now(system: impl Into<String>) -> Self {
        Self::new(system, Utc::now())
    }

    pub fn base_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.base_time, 0)
    }
}

/// Writer for the value stream
pub struct LogWriter<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> LogWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Write the 32-byte host header; call before any value
    pub fn write_header(&mut self, header: &LogHeader) -> io::Result<()> {
        let mut name = [0u8; SYSTEM_NAME_SIZE];
        let bytes = header.system.as_bytes();
        let len = bytes.len().min(SYSTEM_NAME_SIZE);
        name[..len].copy_from_slice(&bytes[..len]);

        self.writer.write_all(&LOG_MAGIC)?;
        self.writer.write_i64::<LittleEndian>(header.base_time)?;
        self.writer.write_all(&name)?;
        Ok(())
    }

    pub fn write_value(&mut self, value: u32) -> io::Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.written += 1;
        Ok(())
    }

    /// Number of values written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reader for the value stream
pub struct LogReader<R: Read> {
    reader: R,
    read: u64,
}

impl<R: Read> LogReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, read: 0 }
    }

    /// Read and check the 32-byte host header
    pub fn read_header(&mut self) -> io::Result<LogHeader> {
        let mut magic = [0u8; 8];
        self.reader.read_exact(&mut magic)?;
        if magic != LOG_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "not a playback log (bad magic)",
            ));
        }
        let base_time = self.reader.read_i64::<LittleEndian>()?;
        let mut name = [0u8; SYSTEM_NAME_SIZE];
        self.reader.read_exact(&mut name)?;
        let end = name.iter().position(|&b| b == 0).unwrap_or(SYSTEM_NAME_SIZE);

        Ok(LogHeader {
            base_time,
            system: String::from_utf8_lossy(&name[..end]).into_owned(),
        })
    }

    /// Next value; a short read is an `UnexpectedEof` error
    pub fn read_value(&mut self) -> io::Result<u32> {
        let value = self.reader.read_u32::<LittleEndian>()?;
        self.read += 1;
        Ok(value)
    }

    /// Number of values read so far
    pub fn read_count(&self) -> u64 {
        self.read
    }

    /// Every remaining value, stopping at the first short read
    pub fn read_all(&mut self) -> io::Result<Vec<u32>> {
        let mut values = Vec::new();
        loop {
            match self.read_value() {
                Ok(value) => values.push(value),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(values),
                Err(e) => return Err(e),
            }
        }
    }
}
