//! Device input codes
//!
//! An [`InputCode`] names one switch or axis on one physical device. Codes
//! have a stable textual form used by configuration documents:
//!
//! - `KEYCODE_A`, `KEYCODE_LSHIFT`
//! - `JOYCODE_1_BUTTON3`, `JOYCODE_2_XAXIS`, `JOYCODE_1_YAXIS_UP_SWITCH`
//! - `MOUSECODE_1_BUTTON1`, `MOUSECODE_1_XAXIS`
//! - `GUNCODE_1_YAXIS`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error parsing the textual form of a code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeParseError {
    #[error("unknown device prefix in '{0}'")]
    UnknownDevice(String),
    #[error("invalid device index in '{0}' (expected 1-255)")]
    InvalidIndex(String),
    #[error("unknown item '{item}' in '{code}'")]
    UnknownItem { code: String, item: String },
}

/// Physical device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceClass {
    Keyboard,
    Joystick,
    Mouse,
    Lightgun,
}

impl DeviceClass {
    fn prefix(self) -> &'static str {
        match self {
            DeviceClass::Keyboard => "KEYCODE",
            DeviceClass::Joystick => "JOYCODE",
            DeviceClass::Mouse => "MOUSECODE",
            DeviceClass::Lightgun => "GUNCODE",
        }
    }
}

/// Axis identifier on a joystick, mouse or lightgun
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
}

impl Axis {
    const ALL: [Axis; 6] = [Axis::X, Axis::Y, Axis::Z, Axis::Rx, Axis::Ry, Axis::Rz];

    fn name(self) -> &'static str {
        match self {
            Axis::X => "XAXIS",
            Axis::Y => "YAXIS",
            Axis::Z => "ZAXIS",
            Axis::Rx => "RXAXIS",
            Axis::Ry => "RYAXIS",
            Axis::Rz => "RZAXIS",
        }
    }

    /// Suffixes for the negative and positive half-switches
    fn switch_names(self) -> (&'static str, &'static str) {
        match self {
            Axis::X => ("LEFT", "RIGHT"),
            Axis::Y => ("UP", "DOWN"),
            _ => ("NEG", "POS"),
        }
    }
}

macro_rules! keys {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Keyboard key
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Key {
            $($variant),*
        }

        impl Key {
            /// Name used after the `KEYCODE_` prefix
            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => $name),*
                }
            }

            /// Look up a key by the name used after the `KEYCODE_` prefix
            pub fn from_name(name: &str) -> Option<Key> {
                match name {
                    $($name => Some(Key::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

keys! {
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
    H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
    O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
    V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Digit0 => "0", Digit1 => "1", Digit2 => "2", Digit3 => "3", Digit4 => "4",
    Digit5 => "5", Digit6 => "6", Digit7 => "7", Digit8 => "8", Digit9 => "9",
    F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5", F6 => "F6",
    F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10", F11 => "F11", F12 => "F12",
    Up => "UP", Down => "DOWN", Left => "LEFT", Right => "RIGHT",
    LShift => "LSHIFT", RShift => "RSHIFT",
    LControl => "LCONTROL", RControl => "RCONTROL",
    LAlt => "LALT", RAlt => "RALT",
    Space => "SPACE", Enter => "ENTER", Escape => "ESC", Tab => "TAB",
    Backspace => "BACKSPACE", Insert => "INSERT", Delete => "DEL",
    Home => "HOME", End => "END", PageUp => "PGUP", PageDown => "PGDN",
    Minus => "MINUS", Equals => "EQUALS", OpenBrace => "OPENBRACE",
    CloseBrace => "CLOSEBRACE", Colon => "COLON", Quote => "QUOTE",
    Comma => "COMMA", Stop => "STOP", Slash => "SLASH", Backslash => "BACKSLASH",
    Tilde => "TILDE",
    Pad0 => "0_PAD", Pad1 => "1_PAD", Pad2 => "2_PAD", Pad3 => "3_PAD",
    Pad4 => "4_PAD", Pad5 => "5_PAD", Pad6 => "6_PAD", Pad7 => "7_PAD",
    Pad8 => "8_PAD", Pad9 => "9_PAD",
}

/// One switch or axis on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputItem {
    /// Keyboard key (keyboard devices only)
    Key(Key),
    /// Button, 1-based
    Button(u8),
    /// Full analog axis
    Axis(Axis),
    /// One half of an axis treated as a switch
    AxisSwitch { axis: Axis, positive: bool },
}

/// A device code: which device, which item on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputCode {
    pub class: DeviceClass,
    /// Zero-based device index (always 0 for keyboards)
    pub index: u8,
    pub item: InputItem,
}

impl InputCode {
    /// Keyboard key code
    pub const fn key(key: Key) -> Self {
        Self {
            class: DeviceClass::Keyboard,
            index: 0,
            item: InputItem::Key(key),
        }
    }

    /// Joystick button (button is 1-based)
    pub const fn joy_button(index: u8, button: u8) -> Self {
        Self {
            class: DeviceClass::Joystick,
            index,
            item: InputItem::Button(button),
        }
    }

    /// Joystick axis
    pub const fn joy_axis(index: u8, axis: Axis) -> Self {
        Self {
            class: DeviceClass::Joystick,
            index,
            item: InputItem::Axis(axis),
        }
    }

    /// Joystick axis half used as a switch
    pub const fn joy_switch(index: u8, axis: Axis, positive: bool) -> Self {
        Self {
            class: DeviceClass::Joystick,
            index,
            item: InputItem::AxisSwitch { axis, positive },
        }
    }

    /// Mouse axis
    pub const fn mouse_axis(index: u8, axis: Axis) -> Self {
        Self {
            class: DeviceClass::Mouse,
            index,
            item: InputItem::Axis(axis),
        }
    }

    /// Mouse button (button is 1-based)
    pub const fn mouse_button(index: u8, button: u8) -> Self {
        Self {
            class: DeviceClass::Mouse,
            index,
            item: InputItem::Button(button),
        }
    }

    /// Lightgun axis
    pub const fn gun_axis(index: u8, axis: Axis) -> Self {
        Self {
            class: DeviceClass::Lightgun,
            index,
            item: InputItem::Axis(axis),
        }
    }
}

impl fmt::Display for InputCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.class.prefix();
        match (self.class, self.item) {
            (DeviceClass::Keyboard, InputItem::Key(key)) => write!(f, "{prefix}_{}", key.name()),
            (_, InputItem::Key(key)) => write!(f, "{prefix}_{}_{}", self.index + 1, key.name()),
            (_, InputItem::Button(button)) => {
                write!(f, "{prefix}_{}_BUTTON{button}", self.index + 1)
            }
            (_, InputItem::Axis(axis)) => write!(f, "{prefix}_{}_{}", self.index + 1, axis.name()),
            (_, InputItem::AxisSwitch { axis, positive }) => {
                let (neg, pos) = axis.switch_names();
                let half = if positive { pos } else { neg };
                write!(f, "{prefix}_{}_{}_{half}_SWITCH", self.index + 1, axis.name())
            }
        }
    }
}

impl FromStr for InputCode {
    type Err = CodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, rest) = s
            .split_once('_')
            .ok_or_else(|| CodeParseError::UnknownDevice(s.to_string()))?;

        let class = match prefix {
            "KEYCODE" => {
                let key = Key::from_name(rest).ok_or_else(|| CodeParseError::UnknownItem {
                    code: s.to_string(),
                    item: rest.to_string(),
                })?;
                return Ok(InputCode::key(key));
            }
            "JOYCODE" => DeviceClass::Joystick,
            "MOUSECODE" => DeviceClass::Mouse,
            "GUNCODE" => DeviceClass::Lightgun,
            _ => return Err(CodeParseError::UnknownDevice(s.to_string())),
        };

        let (number, item) = rest
            .split_once('_')
            .ok_or_else(|| CodeParseError::InvalidIndex(s.to_string()))?;
        let index = match number.parse::<u16>() {
            Ok(n) if (1..=255).contains(&n) => (n - 1) as u8,
            _ => return Err(CodeParseError::InvalidIndex(s.to_string())),
        };

        let item = parse_item(item).ok_or_else(|| CodeParseError::UnknownItem {
            code: s.to_string(),
            item: item.to_string(),
        })?;

        Ok(InputCode { class, index, item })
    }
}

fn parse_item(item: &str) -> Option<InputItem> {
    if let Some(button) = item.strip_prefix("BUTTON") {
        return match button.parse::<u8>() {
            Ok(n) if n >= 1 => Some(InputItem::Button(n)),
            _ => None,
        };
    }

    for axis in Axis::ALL {
        let Some(tail) = item.strip_prefix(axis.name()) else {
            continue;
        };
        if tail.is_empty() {
            return Some(InputItem::Axis(axis));
        }
        let (neg, pos) = axis.switch_names();
        let half = tail.strip_prefix('_')?.strip_suffix("_SWITCH")?;
        if half == neg {
            return Some(InputItem::AxisSwitch {
                axis,
                positive: false,
            });
        }
        if half == pos {
            return Some(InputItem::AxisSwitch {
                axis,
                positive: true,
            });
        }
        return None;
    }

    None
}

impl Serialize for InputCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InputCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
