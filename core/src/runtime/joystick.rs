//! Digital joystick aggregation
//!
//! Every player has one state per joystick slot. Each frame the four
//! direction sequences are folded into a mask, opposite directions cancel,
//! and a 4-way view is derived for ports that can only report one axis.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

use crate::input::{InputDevices, Sequence};
use crate::port::{JOYSTICK_SLOTS, JoystickDir, JoystickDirs, JoystickSlot, MAX_PLAYERS};

/// How a diagonal that appears all at once is reduced to one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Keep the horizontal direction
    #[default]
    PreferHorizontal,
    /// Keep the vertical direction
    PreferVertical,
    /// Pick an axis from a PCG stream seeded once per session
    Seeded(u64),
}

/// Direction state of one stick
#[derive(Debug, Clone, Default)]
pub struct DigitalJoystickState {
    sequences: [Vec<Sequence>; 4],
    current: JoystickDirs,
    current4way: JoystickDirs,
    previous: JoystickDirs,
    in_use: bool,
}

impl DigitalJoystickState {
    pub fn current(&self) -> JoystickDirs {
        self.current
    }

    pub fn current4way(&self) -> JoystickDirs {
        self.current4way
    }

    pub fn previous(&self) -> JoystickDirs {
        self.previous
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }

    fn raw<D: InputDevices + ?Sized>(&self, devices: &D) -> JoystickDirs {
        let mut raw = JoystickDirs::empty();
        for dir in JoystickDir::ALL {
            let index = dir_index(dir);
            if self.sequences[index].iter().any(|seq| seq.pressed(devices)) {
                raw |= dir.bit();
            }
        }
        // Contradictory pairs cancel
        for pair in [JoystickDirs::VERTICAL, JoystickDirs::HORIZONTAL] {
            if raw.contains(pair) {
                raw.remove(pair);
            }
        }
        raw
    }
}

fn dir_index(dir: JoystickDir) -> usize {
    match dir {
        JoystickDir::Up => 0,
        JoystickDir::Down => 1,
        JoystickDir::Left => 2,
        JoystickDir::Right => 3,
    }
}

enum Chooser {
    Horizontal,
    Vertical,
    Random(Pcg32),
}

impl Chooser {
    fn keep_horizontal(&mut self) -> bool {
        match self {
            Chooser::Horizontal => true,
            Chooser::Vertical => false,
            Chooser::Random(rng) => rng.next_u32() & 1 == 0,
        }
    }
}

/// Per player, per slot joystick states
pub struct DigitalJoystickAggregator {
    states: [[DigitalJoystickState; JOYSTICK_SLOTS]; MAX_PLAYERS],
    chooser: Chooser,
}

impl std::fmt::Debug for DigitalJoystickAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalJoystickAggregator")
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl DigitalJoystickAggregator {
    pub fn new(tie_break: TieBreak) -> Self {
        let chooser = match tie_break {
            TieBreak::PreferHorizontal => Chooser::Horizontal,
            TieBreak::PreferVertical => Chooser::Vertical,
            TieBreak::Seeded(seed) => Chooser::Random(Pcg32::seed_from_u64(seed)),
        };
        Self {
            states: Default::default(),
            chooser,
        }
    }

    /// Attach a direction sequence; the stick becomes in use
    pub fn bind(&mut self, player: u8, slot: JoystickSlot, dir: JoystickDir, sequence: Sequence) {
        let Some(state) = self
            .states
            .get_mut(usize::from(player))
            .map(|slots| &mut slots[slot.index()])
        else {
            return;
        };
        state.sequences[dir_index(dir)].push(sequence);
        state.in_use = true;
    }

    pub fn state(&self, player: u8, slot: JoystickSlot) -> Option<&DigitalJoystickState> {
        self.states
            .get(usize::from(player))
            .map(|slots| &slots[slot.index()])
    }

    /// Directions seen by a port, 4-way resolved if requested
    pub fn directions(&self, player: u8, slot: JoystickSlot, four_way: bool) -> JoystickDirs {
        match self.state(player, slot) {
            Some(state) if four_way => state.current4way,
            Some(state) => state.current,
            None => JoystickDirs::empty(),
        }
    }

    /// Sample every stick in use
    pub fn update<D: InputDevices + ?Sized>(&mut self, devices: &D) {
        for slots in self.states.iter_mut() {
            for state in slots.iter_mut().filter(|s| s.in_use) {
                let raw = state.raw(devices);
                state.previous = state.current;
                state.current = raw;
                if state.current != state.previous {
                    state.current4way = resolve_four_way(state.current, state.previous, &mut self.chooser);
                }
            }
        }
    }
}

fn resolve_four_way(current: JoystickDirs, previous: JoystickDirs, chooser: &mut Chooser) -> JoystickDirs {
    let mut four_way = current;
    if four_way.is_diagonal() {
        // Favor the axis that just became active
        four_way.remove(four_way & previous);
    }
    if four_way.is_diagonal() {
        if chooser.keep_horizontal() {
            four_way.remove(JoystickDirs::VERTICAL);
        } else {
            four_way.remove(JoystickDirs::HORIZONTAL);
        }
    }
    four_way
}
