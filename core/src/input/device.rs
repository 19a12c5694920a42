//! Device polling contract
//!
//! The physical device layer is owned by the host. The port engine only
//! asks two questions of it: is this code active, and what raw analog
//! value does this control see right now. Neither call can fail.

use crate::port::ControlType;

use super::code::InputCode;

/// How an analog sample should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleKind {
    /// No analog device is bound
    #[default]
    None,
    /// Position in `[ABSOLUTE_MIN, ABSOLUTE_MAX]`
    Absolute,
    /// Movement since the last poll, `RELATIVE_PER_STEP` units per output step
    Relative,
}

/// Raw analog reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalogSample {
    pub value: i32,
    pub kind: SampleKind,
}

impl AnalogSample {
    pub const NONE: AnalogSample = AnalogSample {
        value: 0,
        kind: SampleKind::None,
    };

    pub fn absolute(value: i32) -> Self {
        Self {
            value,
            kind: SampleKind::Absolute,
        }
    }

    pub fn relative(value: i32) -> Self {
        Self {
            value,
            kind: SampleKind::Relative,
        }
    }
}

/// Host-provided view of the physical input devices
pub trait InputDevices {
    /// Whether a switch-like code is currently active
    fn code_pressed(&self, code: InputCode) -> bool;

    /// Raw analog value for a control of the given player
    fn poll(&mut self, control: ControlType, player: u8) -> AnalogSample;
}

impl<T: InputDevices + ?Sized> InputDevices for &mut T {
    fn code_pressed(&self, code: InputCode) -> bool {
        (**self).code_pressed(code)
    }

    fn poll(&mut self, control: ControlType, player: u8) -> AnalogSample {
        (**self).poll(control, player)
    }
}

impl<T: InputDevices + ?Sized> InputDevices for Box<T> {
    fn code_pressed(&self, code: InputCode) -> bool {
        (**self).code_pressed(code)
    }

    fn poll(&mut self, control: ControlType, player: u8) -> AnalogSample {
        (**self).poll(control, player)
    }
}

/// A device layer with nothing attached
///
/// Useful for tools and for playback sessions where the log supplies every
/// value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevices;

impl InputDevices for NoDevices {
    fn code_pressed(&self, _code: InputCode) -> bool {
        false
    }

    fn poll(&mut self, _control: ControlType, _player: u8) -> AnalogSample {
        AnalogSample::NONE
    }
}
