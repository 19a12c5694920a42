//! Error types for building and configuring a session

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::input::SeqType;
use crate::port::{ControlType, LocationParseError};

/// Identifies one descriptor in error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub group: String,
    pub index: usize,
    pub control: ControlType,
    pub mask: u32,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {} ({:#x})",
            self.group, self.index, self.control, self.mask
        )
    }
}

/// A single problem found while building the port registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("record #{index} declares a control before any group marker")]
    ControlOutsideGroup { index: usize },

    #[error("duplicate group tag '{tag}'")]
    DuplicateTag { tag: String },

    #[error("{field}: control type is out of range")]
    InvalidControl { field: FieldRef },

    #[error("{field}: mask is empty")]
    EmptyMask { field: FieldRef },

    #[error("{field}: default value {default:#x} has bits outside the mask")]
    DefaultOutsideMask { field: FieldRef, default: u32 },

    #[error("{field}: player {player} out of range (max {max})")]
    PlayerOutOfRange { field: FieldRef, player: u8, max: usize },

    #[error("{first} overlaps {second} on bits {overlap:#x}")]
    OverlappingMask {
        first: FieldRef,
        second: FieldRef,
        overlap: u32,
    },

    #[error("{field}: location '{location}' names {positions} position(s) but the mask has {bits} bit(s)")]
    LocationMismatch {
        field: FieldRef,
        location: String,
        positions: usize,
        bits: u32,
    },

    #[error("{field}: invalid location '{location}': {reason}")]
    InvalidLocation {
        field: FieldRef,
        location: String,
        reason: LocationParseError,
    },

    #[error("{field}: analog mask must be one contiguous run of at most {max_bits} bits")]
    InvalidAnalogMask { field: FieldRef, max_bits: u32 },

    #[error("{field}: analog control has no analog parameters")]
    MissingAnalogParams { field: FieldRef },

    #[error("{field}: sensitivity must be positive, got {sensitivity}")]
    InvalidSensitivity { field: FieldRef, sensitivity: i32 },

    #[error("{field}: condition references unknown group '{target}'")]
    UnknownConditionTarget { field: FieldRef, target: String },

    #[error("condition cycle involving groups: {}", .groups.join(", "))]
    ConditionCycle { groups: Vec<String> },

    #[error("{field}: {seq_type} sequence still contains DEFAULT after resolution")]
    UnresolvedDefault { field: FieldRef, seq_type: SeqType },

    #[error("custom source for '{tag}' mask {mask:#x} matches no custom control")]
    UnboundCustomSource { tag: String, mask: u32 },
}

/// Every problem found while building, reported together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationErrors(pub Vec<ConfigurationError>);

impl ConfigurationErrors {
    pub fn errors(&self) -> &[ConfigurationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigurationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} configuration error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationErrors {}

/// Failure loading or saving a configuration document
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no configuration directory is available on this platform")]
    NoConfigDir,
}

/// Failure constructing a [`Session`](crate::Session)
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationErrors),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
