//! Frame-by-frame composition through a full session

use super::test_utils::{frame, scripted_session};
use crate::input::{AnalogSample, InputCode, Key};
use crate::port::{
    AnalogParams, Condition, ControlDescriptor, ControlType, DescriptorStream, JoystickDir,
    JoystickSlot,
};
use crate::runtime::{ABSOLUTE_MAX, RELATIVE_PER_STEP};

const COIN1: InputCode = InputCode::key(Key::Digit5);
const BUTTON1: InputCode = InputCode::key(Key::LControl);
const BUTTON2: InputCode = InputCode::key(Key::LAlt);
const UP: InputCode = InputCode::key(Key::Up);
const DOWN: InputCode = InputCode::key(Key::Down);
const LEFT: InputCode = InputCode::key(Key::Left);
const RIGHT: InputCode = InputCode::key(Key::Right);

fn stick(dir: JoystickDir, mask: u32) -> ControlDescriptor {
    ControlDescriptor::new(ControlType::joystick(JoystickSlot::Main, dir), mask)
}

// ============================================================================
// Digital
// ============================================================================

#[test]
fn test_active_low_with_builtin_bindings() {
    let mut session = scripted_session(
        DescriptorStream::new()
            .group("IN0")
            .control(ControlDescriptor::new(ControlType::Coin, 0x01).active_low())
            .control(ControlDescriptor::new(ControlType::Start, 0x02).active_low()),
    );

    assert_eq!(frame(&mut session, &["IN0"]), vec![0x03]);
    session.devices_mut().press(COIN1);
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x02]);
    session.devices_mut().release(COIN1);
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x03]);
}

#[test]
fn test_toggle_and_impulse() {
    let mut session = scripted_session(
        DescriptorStream::new()
            .group("IN0")
            .control(ControlDescriptor::new(ControlType::Button(1), 0x01).toggle())
            .control(ControlDescriptor::new(ControlType::Coin, 0x02).impulse(2)),
    );

    let script: [&[InputCode]; 6] = [
        &[BUTTON1, COIN1],
        &[BUTTON1, COIN1],
        &[COIN1],
        &[BUTTON1, COIN1],
        &[],
        &[COIN1],
    ];
    let mut values = Vec::new();
    for pressed in script {
        session.devices_mut().release_all();
        for code in pressed {
            session.devices_mut().press(*code);
        }
        values.extend(frame(&mut session, &["IN0"]));
    }
    assert_eq!(values, vec![0x03, 0x03, 0x01, 0x00, 0x00, 0x02]);
}

// ============================================================================
// Joysticks
// ============================================================================

#[test]
fn test_four_way_rolls_to_the_new_axis() {
    let mut session = scripted_session(
        DescriptorStream::new()
            .group("IN0")
            .control(stick(JoystickDir::Up, 0x01).four_way().active_low())
            .control(stick(JoystickDir::Down, 0x02).four_way().active_low())
            .control(stick(JoystickDir::Left, 0x04).four_way().active_low())
            .control(stick(JoystickDir::Right, 0x08).four_way().active_low()),
    );

    session.devices_mut().press(UP);
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x0e]);
    session.devices_mut().press(RIGHT);
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x07]);
    session.devices_mut().release(UP);
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x07]);
    session.devices_mut().release(RIGHT);
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x0f]);
}

#[test]
fn test_opposite_directions_cancel() {
    let mut session = scripted_session(
        DescriptorStream::new()
            .group("IN0")
            .control(stick(JoystickDir::Up, 0x01))
            .control(stick(JoystickDir::Down, 0x02))
            .control(stick(JoystickDir::Left, 0x04))
            .control(stick(JoystickDir::Right, 0x08)),
    );

    for code in [UP, DOWN, LEFT] {
        session.devices_mut().press(code);
    }
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x04]);
    session.devices_mut().press(RIGHT);
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x00]);
}

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_never_satisfied_condition_contributes_nothing() {
    let mut session = scripted_session(
        DescriptorStream::new()
            .group("IN0")
            .control(
                ControlDescriptor::new(ControlType::Button(1), 0x01)
                    .condition(Condition::equals("DSW", 0x03, 0x03)),
            )
            .control(
                ControlDescriptor::new(ControlType::Button(2), 0x02)
                    .condition(Condition::not_equals("DSW", 0x03, 0x03)),
            )
            .group("DSW")
            .control(ControlDescriptor::new(ControlType::DipSwitch, 0x03)),
    );

    session.devices_mut().press(BUTTON1);
    session.devices_mut().press(BUTTON2);
    for _ in 0..30 {
        assert_eq!(frame(&mut session, &["IN0", "DSW"]), vec![0x02, 0x00]);
    }
}

#[test]
fn test_condition_sees_dip_flip_in_same_frame() {
    let mut session = scripted_session(
        DescriptorStream::new()
            .group("IN0")
            .control(
                ControlDescriptor::new(ControlType::Button(1), 0x01)
                    .condition(Condition::equals("DSW", 0x01, 0x01)),
            )
            .group("DSW")
            .control(ControlDescriptor::new(ControlType::DipSwitch, 0x01).bind(InputCode::key(Key::F1))),
    );

    session.devices_mut().press(BUTTON1);
    assert_eq!(frame(&mut session, &["IN0", "DSW"]), vec![0x00, 0x00]);
    session.devices_mut().press(InputCode::key(Key::F1));
    assert_eq!(frame(&mut session, &["IN0", "DSW"]), vec![0x01, 0x01]);
    // Still set after release
    session.devices_mut().release(InputCode::key(Key::F1));
    assert_eq!(frame(&mut session, &["IN0", "DSW"]), vec![0x01, 0x01]);
}

// ============================================================================
// Analog
// ============================================================================

#[test]
fn test_paddle_shares_group_with_buttons() {
    let mut session = scripted_session(
        DescriptorStream::new()
            .group("IN0")
            .control(
                ControlDescriptor::new(ControlType::Paddle, 0xff)
                    .default_value(0x80)
                    .analog(AnalogParams::new(0, 0xff)),
            )
            .control(ControlDescriptor::new(ControlType::Button(1), 0x100).active_low()),
    );

    assert_eq!(frame(&mut session, &["IN0"]), vec![0x180]);
    session
        .devices_mut()
        .set_analog(ControlType::Paddle, 0, AnalogSample::absolute(ABSOLUTE_MAX));
    session.devices_mut().press(BUTTON1);
    // Committed at frame end, then interpolated from the old position
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x080]);
    let port = session.lookup("IN0").unwrap();
    session.on_frame_start();
    assert_eq!(session.read(port, 0.0), Some(0x080));
    assert_eq!(session.read(port, 1.0), Some(0x0ff));
    session.on_frame_end();
    assert_eq!(frame(&mut session, &["IN0"]), vec![0x0ff]);
}

#[test]
fn test_relative_dial_interpolates_within_frame() {
    let mut session = scripted_session(
        DescriptorStream::new().group("DIAL").control(
            ControlDescriptor::new(ControlType::Dial, 0x3ff)
                .default_value(512)
                .analog(AnalogParams::new(0, 1023)),
        ),
    );
    let port = session.lookup("DIAL").unwrap();
    frame(&mut session, &["DIAL"]);

    session
        .devices_mut()
        .set_analog(ControlType::Dial, 0, AnalogSample::relative(50 * RELATIVE_PER_STEP));
    session.on_frame_start();
    session.on_frame_end();

    assert_eq!(session.read(port, 0.0), Some(512));
    let mid = session.read(port, 0.5).unwrap();
    assert!(mid > 512 && mid < 562, "{mid}");
    assert_eq!(session.read(port, 1.0), Some(562));
}
