//! IoPort Core - control-input ports for emulated hardware
//!
//! This crate turns host input devices into the bit patterns an emulated
//! machine reads from its input registers.
//!
//! # Architecture
//!
//! - [`BindingTable`] - default code sequences per control type and player
//! - [`PortRegistry`] - validated groups of control descriptors
//! - [`FrameScheduler`] - per-frame edge logic, joystick aggregation,
//!   analog channels and composition
//! - [`PlaybackRecorder`] - deterministic record and replay of every read
//! - [`ChangeNotifier`] - edge-triggered callbacks on composite changes
//! - [`Session`] - owns all of the above for one running machine

pub mod bindings;
pub mod config;
pub mod error;
#[cfg(test)]
mod integration;
pub mod input;
pub mod notify;
pub mod port;
pub mod replay;
pub mod runtime;
pub mod session;
#[cfg(test)]
pub mod test_utils;

// Re-export the main entry points
pub use bindings::{BindingOverride, BindingTable};
pub use config::{ConfigDocument, ConfigScope};
pub use error::{ConfigError, ConfigurationError, ConfigurationErrors, SessionError};
pub use input::{AnalogSample, InputCode, InputDevices, NoDevices, SeqType, Sequence};
pub use notify::{ChangeNotifier, PortChange, SubscriptionId};
pub use port::{
    AnalogParams, Condition, ControlDescriptor, ControlType, DescriptorRecord, DescriptorStream,
    PortId, PortLayout, PortRegistry,
};
pub use replay::{
    LogError, LogHeader, LogModeConflict, LogReader, LogWriter, PlaybackRecorder, RecorderMode,
};
pub use runtime::{FrameScheduler, TieBreak};
pub use session::{Session, SessionBuilder, SessionEvent};
