//! Semantic control types
//!
//! A [`ControlType`] says what a control *is* (player 1's coin slot, a
//! paddle, the left stick's up direction). Its [`ControlClass`] decides how
//! the frame scheduler drives it.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Maximum number of players a layout may address
pub const MAX_PLAYERS: usize = 4;

/// Highest numbered button
pub const MAX_BUTTONS: u8 = 16;

/// Widest register field an analog control may occupy
pub const MAX_ANALOG_BITS: u32 = 16;

/// Number of joystick slots per player
pub const JOYSTICK_SLOTS: usize = 3;

/// Behavioural class of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlClass {
    Digital,
    AnalogAbsolute,
    AnalogRelative,
    Custom,
    PassiveToggle,
}

impl ControlClass {
    pub fn is_analog(self) -> bool {
        matches!(self, ControlClass::AnalogAbsolute | ControlClass::AnalogRelative)
    }

    /// Composition layer: later layers overwrite earlier ones
    pub(crate) fn layer(self) -> u8 {
        match self {
            ControlClass::Custom => 0,
            ControlClass::Digital => 1,
            ControlClass::AnalogAbsolute | ControlClass::AnalogRelative => 2,
            ControlClass::PassiveToggle => 3,
        }
    }
}

/// Which stick on a player's panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JoystickSlot {
    Main,
    Right,
    Left,
}

impl JoystickSlot {
    pub const ALL: [JoystickSlot; JOYSTICK_SLOTS] =
        [JoystickSlot::Main, JoystickSlot::Right, JoystickSlot::Left];

    pub fn index(self) -> usize {
        match self {
            JoystickSlot::Main => 0,
            JoystickSlot::Right => 1,
            JoystickSlot::Left => 2,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            JoystickSlot::Main => "JOYSTICK",
            JoystickSlot::Right => "JOYSTICKRIGHT",
            JoystickSlot::Left => "JOYSTICKLEFT",
        }
    }
}

/// Cardinal joystick direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JoystickDir {
    Up,
    Down,
    Left,
    Right,
}

impl JoystickDir {
    pub const ALL: [JoystickDir; 4] = [
        JoystickDir::Up,
        JoystickDir::Down,
        JoystickDir::Left,
        JoystickDir::Right,
    ];

    pub fn bit(self) -> JoystickDirs {
        match self {
            JoystickDir::Up => JoystickDirs::UP,
            JoystickDir::Down => JoystickDirs::DOWN,
            JoystickDir::Left => JoystickDirs::LEFT,
            JoystickDir::Right => JoystickDirs::RIGHT,
        }
    }

    fn name(self) -> &'static str {
        match self {
            JoystickDir::Up => "UP",
            JoystickDir::Down => "DOWN",
            JoystickDir::Left => "LEFT",
            JoystickDir::Right => "RIGHT",
        }
    }
}

bitflags! {
    /// Set of joystick directions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct JoystickDirs: u8 {
        const UP = 0b0001;
        const DOWN = 0b0010;
        const LEFT = 0b0100;
        const RIGHT = 0b1000;

        const VERTICAL = Self::UP.bits() | Self::DOWN.bits();
        const HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

impl JoystickDirs {
    /// True if both a vertical and a horizontal direction are set
    pub fn is_diagonal(self) -> bool {
        self.intersects(Self::VERTICAL) && self.intersects(Self::HORIZONTAL)
    }
}

/// What a control is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlType {
    Joystick { slot: JoystickSlot, dir: JoystickDir },
    /// Button 1-16
    Button(u8),
    Start,
    Select,
    Coin,
    Service,
    Tilt,
    DipSwitch,
    Config,
    Paddle,
    PaddleV,
    AdStickX,
    AdStickY,
    AdStickZ,
    /// Pedal 1-3
    Pedal(u8),
    LightgunX,
    LightgunY,
    Dial,
    DialV,
    TrackballX,
    TrackballY,
    MouseX,
    MouseY,
    Custom,
}

impl ControlType {
    pub const fn joystick(slot: JoystickSlot, dir: JoystickDir) -> Self {
        ControlType::Joystick { slot, dir }
    }

    pub fn class(self) -> ControlClass {
        match self {
            ControlType::Joystick { .. }
            | ControlType::Button(_)
            | ControlType::Start
            | ControlType::Select
            | ControlType::Coin
            | ControlType::Service
            | ControlType::Tilt => ControlClass::Digital,
            ControlType::DipSwitch | ControlType::Config => ControlClass::PassiveToggle,
            ControlType::Paddle
            | ControlType::PaddleV
            | ControlType::AdStickX
            | ControlType::AdStickY
            | ControlType::AdStickZ
            | ControlType::Pedal(_)
            | ControlType::LightgunX
            | ControlType::LightgunY => ControlClass::AnalogAbsolute,
            ControlType::Dial
            | ControlType::DialV
            | ControlType::TrackballX
            | ControlType::TrackballY
            | ControlType::MouseX
            | ControlType::MouseY => ControlClass::AnalogRelative,
            ControlType::Custom => ControlClass::Custom,
        }
    }

    /// Joystick slot and direction, if this is a joystick control
    pub fn joystick_dir(self) -> Option<(JoystickSlot, JoystickDir)> {
        match self {
            ControlType::Joystick { slot, dir } => Some((slot, dir)),
            _ => None,
        }
    }

    pub fn is_pedal(self) -> bool {
        matches!(self, ControlType::Pedal(_))
    }

    pub fn is_lightgun(self) -> bool {
        matches!(self, ControlType::LightgunX | ControlType::LightgunY)
    }

    /// Absolute controls that spring back when released
    pub fn autocenters(self) -> bool {
        self.class() == ControlClass::AnalogAbsolute && !self.is_lightgun()
    }

    /// Whether the numeric payload (button or pedal number) is in range
    pub fn is_valid(self) -> bool {
        match self {
            ControlType::Button(n) => (1..=MAX_BUTTONS).contains(&n),
            ControlType::Pedal(n) => (1..=3).contains(&n),
            _ => true,
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlType::Joystick { slot, dir } => write!(f, "{}_{}", slot.prefix(), dir.name()),
            ControlType::Button(n) => write!(f, "BUTTON{n}"),
            ControlType::Pedal(1) => f.write_str("PEDAL"),
            ControlType::Pedal(n) => write!(f, "PEDAL{n}"),
            other => f.write_str(match other {
                ControlType::Start => "START",
                ControlType::Select => "SELECT",
                ControlType::Coin => "COIN",
                ControlType::Service => "SERVICE",
                ControlType::Tilt => "TILT",
                ControlType::DipSwitch => "DIPSWITCH",
                ControlType::Config => "CONFIG",
                ControlType::Paddle => "PADDLE",
                ControlType::PaddleV => "PADDLE_V",
                ControlType::AdStickX => "AD_STICK_X",
                ControlType::AdStickY => "AD_STICK_Y",
                ControlType::AdStickZ => "AD_STICK_Z",
                ControlType::LightgunX => "LIGHTGUN_X",
                ControlType::LightgunY => "LIGHTGUN_Y",
                ControlType::Dial => "DIAL",
                ControlType::DialV => "DIAL_V",
                ControlType::TrackballX => "TRACKBALL_X",
                ControlType::TrackballY => "TRACKBALL_Y",
                ControlType::MouseX => "MOUSE_X",
                ControlType::MouseY => "MOUSE_Y",
                _ => "CUSTOM",
            }),
        }
    }
}

/// Error parsing a control type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown control type '{0}'")]
pub struct ControlTypeParseError(pub String);

impl FromStr for ControlType {
    type Err = ControlTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ControlTypeParseError(s.to_string());

        for slot in JoystickSlot::ALL {
            if let Some(dir) = s
                .strip_prefix(slot.prefix())
                .and_then(|rest| rest.strip_prefix('_'))
            {
                let dir = JoystickDir::ALL
                    .into_iter()
                    .find(|d| d.name() == dir)
                    .ok_or_else(unknown)?;
                return Ok(ControlType::Joystick { slot, dir });
            }
        }

        if let Some(n) = s.strip_prefix("BUTTON") {
            let n = n.parse::<u8>().map_err(|_| unknown())?;
            let control = ControlType::Button(n);
            return if control.is_valid() {
                Ok(control)
            } else {
                Err(unknown())
            };
        }

        let control = match s {
            "START" => ControlType::Start,
            "SELECT" => ControlType::Select,
            "COIN" => ControlType::Coin,
            "SERVICE" => ControlType::Service,
            "TILT" => ControlType::Tilt,
            "DIPSWITCH" => ControlType::DipSwitch,
            "CONFIG" => ControlType::Config,
            "PADDLE" => ControlType::Paddle,
            "PADDLE_V" => ControlType::PaddleV,
            "AD_STICK_X" => ControlType::AdStickX,
            "AD_STICK_Y" => ControlType::AdStickY,
            "AD_STICK_Z" => ControlType::AdStickZ,
            "PEDAL" => ControlType::Pedal(1),
            "PEDAL2" => ControlType::Pedal(2),
            "PEDAL3" => ControlType::Pedal(3),
            "LIGHTGUN_X" => ControlType::LightgunX,
            "LIGHTGUN_Y" => ControlType::LightgunY,
            "DIAL" => ControlType::Dial,
            "DIAL_V" => ControlType::DialV,
            "TRACKBALL_X" => ControlType::TrackballX,
            "TRACKBALL_Y" => ControlType::TrackballY,
            "MOUSE_X" => ControlType::MouseX,
            "MOUSE_Y" => ControlType::MouseY,
            "CUSTOM" => ControlType::Custom,
            _ => return Err(unknown()),
        };
        Ok(control)
    }
}

impl Serialize for ControlType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ControlType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
