//! Deterministic playback and recording of group reads

mod log;
mod recorder;

use std::io;

pub use log::{HEADER_SIZE, LOG_MAGIC, LogHeader, LogReader, LogWriter};
pub use recorder::{PlaybackRecorder, RecorderMode};

/// A log failure; both end the log, neither ends the session
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("playback log ended after {read} value(s): {source}")]
    PlaybackTruncated { read: u64, source: io::Error },

    #[error("recording failed after {written} value(s): {source}")]
    RecordWriteFailure { written: u64, source: io::Error },
}

/// Recording and playback never mix within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot start {requested}: this session already used {used}")]
pub struct LogModeConflict {
    pub used: RecorderMode,
    pub requested: RecorderMode,
}
