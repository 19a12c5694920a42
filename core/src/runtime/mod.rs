//! Per-frame runtime: joystick aggregation, analog channels, custom
//! callbacks and the scheduler that composes them into group values.

mod analog;
mod custom;
mod field;
mod joystick;
mod scheduler;

pub use analog::{ABSOLUTE_MAX, ABSOLUTE_MIN, AnalogChannel, RELATIVE_PER_STEP};
pub use custom::{CustomChannel, CustomSource};
pub use field::{DigitalField, FieldRuntime, PassiveField, StickBinding};
pub use joystick::{DigitalJoystickAggregator, DigitalJoystickState, TieBreak};
pub use scheduler::{FrameScheduler, PortGroupState};
