//! Per-field runtime state
//!
//! Every registry field becomes one [`FieldRuntime`] variant. The scheduler
//! drives digital and passive fields at frame start, analog fields at frame
//! end, and asks every variant to [`contribute`](FieldRuntime::contribute)
//! its bits when a group is read.

use crate::input::{InputDevices, SeqType, Sequence};
use crate::port::{ControlClass, JoystickDir, JoystickSlot, PortField};

use super::analog::AnalogChannel;
use super::custom::CustomChannel;
use super::joystick::DigitalJoystickAggregator;

/// Joystick binding of a digital field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickBinding {
    pub player: u8,
    pub slot: JoystickSlot,
    pub dir: JoystickDir,
    pub four_way: bool,
}

/// Button-like field
#[derive(Debug, Clone)]
pub struct DigitalField {
    mask: u32,
    standard: Sequence,
    stick: Option<StickBinding>,
    toggle: bool,
    impulse: u8,
    impulse_remaining: u8,
    last_pressed: bool,
    value: u32,
}

impl DigitalField {
    fn from_field(field: &PortField) -> Self {
        let descriptor = field.descriptor();
        Self {
            mask: field.mask(),
            standard: field.sequence(SeqType::Standard).clone(),
            stick: descriptor
                .control
                .joystick_dir()
                .map(|(slot, dir)| StickBinding {
                    player: descriptor.player,
                    slot,
                    dir,
                    four_way: descriptor.four_way,
                }),
            toggle: descriptor.toggle,
            impulse: descriptor.impulse,
            impulse_remaining: 0,
            last_pressed: false,
            value: field.value(),
        }
    }

    pub fn stick(&self) -> Option<StickBinding> {
        self.stick
    }

    /// Current default bits; toggles flip them
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Edge logic for one frame; returns whether the field is active
    fn update<D: InputDevices + ?Sized>(
        &mut self,
        devices: &D,
        joysticks: &DigitalJoystickAggregator,
    ) -> bool {
        let mut active = match self.stick {
            Some(stick) => joysticks
                .directions(stick.player, stick.slot, stick.four_way)
                .contains(stick.dir.bit()),
            None => self.standard.pressed(devices),
        };

        let rising = active && !self.last_pressed;
        self.last_pressed = active;

        if rising {
            if self.impulse != 0 && self.impulse_remaining == 0 {
                self.impulse_remaining = self.impulse;
            }
            if self.toggle {
                self.value ^= self.mask;
            }
        }

        if self.impulse != 0 {
            active = self.impulse_remaining != 0;
            self.impulse_remaining = self.impulse_remaining.saturating_sub(1);
        }
        if self.toggle {
            active = false;
        }
        active
    }
}

/// DIP switch or configuration setting
#[derive(Debug, Clone)]
pub struct PassiveField {
    mask: u32,
    standard: Sequence,
    last_pressed: bool,
    value: u32,
}

impl PassiveField {
    fn from_field(field: &PortField) -> Self {
        Self {
            mask: field.mask(),
            standard: field.sequence(SeqType::Standard).clone(),
            last_pressed: false,
            value: field.value(),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// A bound sequence flips the setting on each press
    fn update<D: InputDevices + ?Sized>(&mut self, devices: &D) {
        let pressed = self.standard.pressed(devices);
        if pressed && !self.last_pressed {
            self.value ^= self.mask;
        }
        self.last_pressed = pressed;
    }
}

/// Runtime behaviour of one field
#[derive(Debug)]
pub enum FieldRuntime {
    Digital(DigitalField),
    Analog(AnalogChannel),
    Custom(CustomChannel),
    Passive(PassiveField),
}

impl FieldRuntime {
    pub fn from_field(field: &PortField) -> Self {
        match field.class() {
            ControlClass::Digital => FieldRuntime::Digital(DigitalField::from_field(field)),
            ControlClass::PassiveToggle => FieldRuntime::Passive(PassiveField::from_field(field)),
            ControlClass::Custom => FieldRuntime::Custom(CustomChannel::new(field.mask())),
            ControlClass::AnalogAbsolute | ControlClass::AnalogRelative => {
                match AnalogChannel::from_field(field) {
                    Some(channel) => FieldRuntime::Analog(channel),
                    // The registry rejects analog fields without parameters
                    None => FieldRuntime::Digital(DigitalField::from_field(field)),
                }
            }
        }
    }

    pub fn mask(&self) -> u32 {
        match self {
            FieldRuntime::Digital(f) => f.mask,
            FieldRuntime::Analog(a) => a.mask(),
            FieldRuntime::Custom(c) => c.mask(),
            FieldRuntime::Passive(p) => p.mask,
        }
    }

    /// Composition layer, applied in ascending order on read
    pub fn layer(&self) -> u8 {
        match self {
            FieldRuntime::Custom(_) => ControlClass::Custom.layer(),
            FieldRuntime::Digital(_) => ControlClass::Digital.layer(),
            FieldRuntime::Analog(_) => ControlClass::AnalogAbsolute.layer(),
            FieldRuntime::Passive(_) => ControlClass::PassiveToggle.layer(),
        }
    }

    /// Bits this field folds into the group default, if any
    pub fn default_bits(&self) -> Option<u32> {
        match self {
            FieldRuntime::Digital(f) => Some(f.value),
            _ => None,
        }
    }

    /// Setting value for passive and toggle fields
    pub fn live_value(&self) -> Option<u32> {
        match self {
            FieldRuntime::Digital(f) if f.toggle => Some(f.value),
            FieldRuntime::Passive(p) => Some(p.value),
            _ => None,
        }
    }

    /// Frame-start update; returns the bits to OR into the digital accumulator
    pub fn frame_start<D: InputDevices + ?Sized>(
        &mut self,
        devices: &D,
        joysticks: &DigitalJoystickAggregator,
    ) -> u32 {
        match self {
            FieldRuntime::Digital(f) => {
                if f.update(devices, joysticks) {
                    f.mask
                } else {
                    0
                }
            }
            FieldRuntime::Passive(p) => {
                p.update(devices);
                0
            }
            FieldRuntime::Analog(_) | FieldRuntime::Custom(_) => 0,
        }
    }

    /// Overlay this field's bits during a read
    pub fn contribute(&mut self, value: u32, fraction: f64) -> u32 {
        match self {
            FieldRuntime::Digital(_) => value,
            FieldRuntime::Custom(c) => c.contribute(value),
            FieldRuntime::Analog(a) => (value & !a.mask()) | a.read(fraction),
            FieldRuntime::Passive(p) => (value & !p.mask) | p.value,
        }
    }
}
