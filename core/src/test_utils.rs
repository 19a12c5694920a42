//! Shared test utilities for integration and unit tests

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use crate::input::{AnalogSample, InputCode, InputDevices};
use crate::port::ControlType;

// ============================================================================
// Scripted device layer
// ============================================================================

/// In-memory device layer driven by the test
///
/// Pressed codes stay pressed until released. Analog samples are returned
/// on every poll until replaced, so a relative sample keeps moving the
/// control each frame.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDevices {
    pressed: HashSet<InputCode>,
    analog: HashMap<(ControlType, u8), AnalogSample>,
    polls: usize,
}

impl ScriptedDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, code: InputCode) {
        self.pressed.insert(code);
    }

    pub fn release(&mut self, code: InputCode) {
        self.pressed.remove(&code);
    }

    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    /// Set the sample returned for `(control, player)`
    pub fn set_analog(&mut self, control: ControlType, player: u8, sample: AnalogSample) {
        self.analog.insert((control, player), sample);
    }

    /// Number of analog polls so far
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl InputDevices for ScriptedDevices {
    fn code_pressed(&self, code: InputCode) -> bool {
        self.pressed.contains(&code)
    }

    fn poll(&mut self, control: ControlType, player: u8) -> AnalogSample {
        self.polls += 1;
        self.analog
            .get(&(control, player))
            .copied()
            .unwrap_or(AnalogSample::NONE)
    }
}

// ============================================================================
// Log sinks
// ============================================================================

/// Writer whose bytes stay reachable after being boxed into a session
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that rejects every write
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
