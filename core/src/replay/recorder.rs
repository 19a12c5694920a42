//! Playback and recording around group reads
//!
//! Every read passes its live value through [`PlaybackRecorder::process`].
//! While recording the value is appended to the log. While playing back the
//! live value is computed anyway (analog accumulators and custom callbacks
//! keep their side effects) and then replaced by the logged one.

use std::io::{Read, Write};

use super::log::{LogReader, LogWriter};
use super::{LogError, LogModeConflict};

/// Which direction the log is flowing, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderMode {
    Idle,
    Recording,
    Playing,
}

impl std::fmt::Display for RecorderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RecorderMode::Idle => "idle",
            RecorderMode::Recording => "recording",
            RecorderMode::Playing => "playback",
        })
    }
}

enum State {
    Idle,
    Recording(LogWriter<Box<dyn Write>>),
    Playing(LogReader<Box<dyn Read>>),
}

/// Wraps one read of a group with the playback log.
///
/// The first log mode started fixes the recorder to it: a recorder that
/// has recorded never plays back, and the other way round.
pub struct PlaybackRecorder {
    state: State,
    used: Option<RecorderMode>,
}

impl Default for PlaybackRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaybackRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackRecorder")
            .field("mode", &self.mode())
            .field("used", &self.used)
            .finish()
    }
}

impl PlaybackRecorder {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            used: None,
        }
    }

    pub fn mode(&self) -> RecorderMode {
        match self.state {
            State::Idle => RecorderMode::Idle,
            State::Recording(_) => RecorderMode::Recording,
            State::Playing(_) => RecorderMode::Playing,
        }
    }

    /// The log mode this recorder is fixed to, once one has been started
    pub fn used(&self) -> Option<RecorderMode> {
        self.used
    }

    /// Start recording, replacing an earlier recording
    pub fn record(&mut self, writer: LogWriter<Box<dyn Write>>) -> Result<(), LogModeConflict> {
        self.claim(RecorderMode::Recording)?;
        self.stop();
        self.state = State::Recording(writer);
        Ok(())
    }

    /// Start playback, replacing an earlier playback
    pub fn play(&mut self, reader: LogReader<Box<dyn Read>>) -> Result<(), LogModeConflict> {
        self.claim(RecorderMode::Playing)?;
        self.state = State::Playing(reader);
        Ok(())
    }

    fn claim(&mut self, requested: RecorderMode) -> Result<(), LogModeConflict> {
        match self.used {
            Some(used) if used != requested => {
                tracing::warn!("Refusing {}: this session already used {}", requested, used);
                Err(LogModeConflict { used, requested })
            }
            _ => {
                self.used = Some(requested);
                Ok(())
            }
        }
    }

    /// Stop whatever is running and flush a recording
    pub fn stop(&mut self) {
        if let State::Recording(writer) = &mut self.state {
            if let Err(e) = writer.flush() {
                tracing::warn!("Failed to flush recording: {}", e);
            }
        }
        self.state = State::Idle;
    }

    /// Pass a live value through the log.
    ///
    /// Returns the value the machine should see. On a log failure the
    /// recorder drops back to idle and reports what ended.
    pub fn process(&mut self, live: u32) -> (u32, Option<LogError>) {
        match &mut self.state {
            State::Idle => (live, None),
            State::Recording(writer) => match writer.write_value(live) {
                Ok(()) => (live, None),
                Err(source) => {
                    let written = writer.written();
                    tracing::warn!(
                        "Recording stopped after {} value(s): {}",
                        written,
                        source
                    );
                    self.state = State::Idle;
                    (live, Some(LogError::RecordWriteFailure { written, source }))
                }
            },
            State::Playing(reader) => match reader.read_value() {
                Ok(value) => (value, None),
                Err(source) => {
                    let read = reader.read_count();
                    tracing::info!("Playback ended after {} value(s), continuing live", read);
                    self.state = State::Idle;
                    (live, Some(LogError::PlaybackTruncated { read, source }))
                }
            },
        }
    }
}
