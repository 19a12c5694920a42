//! Device codes, code sequences and the device polling contract

mod code;
mod device;
mod sequence;

pub use code::{Axis, CodeParseError, DeviceClass, InputCode, InputItem, Key};
pub use device::{AnalogSample, InputDevices, NoDevices, SampleKind};
pub use sequence::{SeqItem, SeqType, Sequence, SequenceParseError};
