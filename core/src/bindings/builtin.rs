//! Built-in default bindings
//!
//! Player 1 gets a keyboard layout plus joystick 1. Players 2-4 get a
//! smaller keyboard layout where one exists and always their own joystick.

use crate::input::{Axis, InputCode, Key, Sequence};
use crate::port::{ControlType, JoystickDir, JoystickSlot, MAX_BUTTONS, MAX_PLAYERS};

use super::{BindingEntry, BindingKey};

/// Keys for the main stick, in up/down/left/right order
const STICK_KEYS: [[Key; 4]; MAX_PLAYERS] = [
    [Key::Up, Key::Down, Key::Left, Key::Right],
    [Key::R, Key::F, Key::D, Key::G],
    [Key::I, Key::K, Key::J, Key::L],
    [Key::Pad8, Key::Pad2, Key::Pad4, Key::Pad6],
];

const BUTTON_KEYS: [&[Key]; MAX_PLAYERS] = [
    &[Key::LControl, Key::LAlt, Key::Space, Key::LShift, Key::Z, Key::X],
    &[Key::A, Key::S, Key::Q, Key::W],
    &[Key::RControl, Key::RShift, Key::Enter],
    &[Key::Pad0, Key::Delete],
];

const START_KEYS: [Key; MAX_PLAYERS] = [Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4];
const COIN_KEYS: [Key; MAX_PLAYERS] = [Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8];

fn key(key: Key) -> InputCode {
    InputCode::key(key)
}

/// Axis and half used for a stick direction
fn direction_switch(slot: JoystickSlot, dir: JoystickDir) -> (Axis, bool) {
    let (horizontal, vertical) = match slot {
        JoystickSlot::Main | JoystickSlot::Left => (Axis::X, Axis::Y),
        JoystickSlot::Right => (Axis::Rx, Axis::Ry),
    };
    match dir {
        JoystickDir::Up => (vertical, false),
        JoystickDir::Down => (vertical, true),
        JoystickDir::Left => (horizontal, false),
        JoystickDir::Right => (horizontal, true),
    }
}

fn stick_key(player: usize, slot: JoystickSlot, dir: JoystickDir) -> Option<Key> {
    let index = JoystickDir::ALL.iter().position(|d| *d == dir)?;
    match (player, slot) {
        (_, JoystickSlot::Main) => Some(STICK_KEYS[player][index]),
        (0, JoystickSlot::Right) => Some([Key::I, Key::K, Key::J, Key::L][index]),
        (0, JoystickSlot::Left) => Some([Key::E, Key::D, Key::S, Key::F][index]),
        _ => None,
    }
}

/// Joystick code optionally preceded by a keyboard alternative
fn key_or(key: Option<Key>, code: InputCode) -> Sequence {
    match key {
        Some(k) => Sequence::single(InputCode::key(k)).or_code(code),
        None => Sequence::single(code),
    }
}

/// Decrement/increment pair for an analog control driven digitally
fn digital_pair(player: usize, axis: Axis, keys: Option<(Key, Key)>) -> (Sequence, Sequence) {
    let joy = player as u8;
    let dec = InputCode::joy_switch(joy, axis, false);
    let inc = InputCode::joy_switch(joy, axis, true);
    match keys.filter(|_| player == 0) {
        Some((dec_key, inc_key)) => (key_or(Some(dec_key), dec), key_or(Some(inc_key), inc)),
        None => (Sequence::single(dec), Sequence::single(inc)),
    }
}

fn analog_entry(standard: Sequence, (decrement, increment): (Sequence, Sequence)) -> BindingEntry {
    BindingEntry::new(standard, increment, decrement)
}

fn digital_entry(standard: Sequence) -> BindingEntry {
    BindingEntry::new(standard, Sequence::empty(), Sequence::empty())
}

/// Every built-in binding
pub(super) fn builtin_entries() -> Vec<(BindingKey, BindingEntry)> {
    let mut entries = Vec::new();

    for player in 0..MAX_PLAYERS {
        let joy = player as u8;
        let mut push = |control: ControlType, entry: BindingEntry| {
            entries.push((BindingKey::new(control, joy), entry));
        };

        // Digital sticks
        for slot in JoystickSlot::ALL {
            for dir in JoystickDir::ALL {
                let (axis, positive) = direction_switch(slot, dir);
                let seq = key_or(
                    stick_key(player, slot, dir),
                    InputCode::joy_switch(joy, axis, positive),
                );
                push(ControlType::joystick(slot, dir), digital_entry(seq));
            }
        }

        // Buttons
        for button in 1..=MAX_BUTTONS {
            let key = BUTTON_KEYS[player].get(usize::from(button - 1)).copied();
            let seq = key_or(key, InputCode::joy_button(joy, button));
            push(ControlType::Button(button), digital_entry(seq));
        }

        push(
            ControlType::Start,
            digital_entry(Sequence::single(key(START_KEYS[player]))),
        );
        push(
            ControlType::Coin,
            digital_entry(Sequence::single(key(COIN_KEYS[player]))),
        );
        if player == 0 {
            push(ControlType::Service, digital_entry(Sequence::single(key(Key::Digit9))));
            push(ControlType::Tilt, digital_entry(Sequence::single(key(Key::T))));
        }

        // Absolute analog
        let horizontal = Some((Key::Left, Key::Right));
        let vertical = Some((Key::Up, Key::Down));
        let x_axis = Sequence::single(InputCode::joy_axis(joy, Axis::X))
            .or_code(InputCode::mouse_axis(joy, Axis::X));
        let y_axis = Sequence::single(InputCode::joy_axis(joy, Axis::Y))
            .or_code(InputCode::mouse_axis(joy, Axis::Y));

        push(
            ControlType::Paddle,
            analog_entry(x_axis, digital_pair(player, Axis::X, horizontal)),
        );
        push(
            ControlType::PaddleV,
            analog_entry(y_axis, digital_pair(player, Axis::Y, vertical)),
        );
        push(
            ControlType::AdStickX,
            analog_entry(
                Sequence::single(InputCode::joy_axis(joy, Axis::X)),
                digital_pair(player, Axis::X, horizontal),
            ),
        );
        push(
            ControlType::AdStickY,
            analog_entry(
                Sequence::single(InputCode::joy_axis(joy, Axis::Y)),
                digital_pair(player, Axis::Y, vertical),
            ),
        );
        push(
            ControlType::AdStickZ,
            analog_entry(
                Sequence::single(InputCode::joy_axis(joy, Axis::Z)),
                digital_pair(player, Axis::Z, Some((Key::A, Key::Z))),
            ),
        );

        let pedal_keys = [Key::LControl, Key::LAlt, Key::Space];
        for pedal in 1..=3u8 {
            let button = InputCode::joy_button(joy, pedal);
            let increment = if player == 0 {
                key_or(Some(pedal_keys[usize::from(pedal - 1)]), button)
            } else {
                Sequence::single(button)
            };
            push(
                ControlType::Pedal(pedal),
                BindingEntry::new(
                    Sequence::single(InputCode::joy_axis(joy, Axis::Z)),
                    increment,
                    Sequence::empty(),
                ),
            );
        }

        push(
            ControlType::LightgunX,
            analog_entry(
                Sequence::single(InputCode::gun_axis(joy, Axis::X))
                    .or_code(InputCode::mouse_axis(joy, Axis::X)),
                digital_pair(player, Axis::X, horizontal),
            ),
        );
        push(
            ControlType::LightgunY,
            analog_entry(
                Sequence::single(InputCode::gun_axis(joy, Axis::Y))
                    .or_code(InputCode::mouse_axis(joy, Axis::Y)),
                digital_pair(player, Axis::Y, vertical),
            ),
        );

        // Relative analog
        let mouse_x = Sequence::single(InputCode::mouse_axis(joy, Axis::X));
        let mouse_y = Sequence::single(InputCode::mouse_axis(joy, Axis::Y));
        for (control, standard, axis, keys) in [
            (ControlType::Dial, mouse_x.clone(), Axis::X, horizontal),
            (ControlType::DialV, mouse_y.clone(), Axis::Y, vertical),
            (ControlType::TrackballX, mouse_x.clone(), Axis::X, horizontal),
            (ControlType::TrackballY, mouse_y.clone(), Axis::Y, vertical),
            (ControlType::MouseX, mouse_x.clone(), Axis::X, horizontal),
            (ControlType::MouseY, mouse_y.clone(), Axis::Y, vertical),
        ] {
            push(control, analog_entry(standard, digital_pair(player, axis, keys)));
        }
    }

    entries
}
