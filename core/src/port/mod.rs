//! Control ports: descriptors, validation and the group registry

mod condition;
mod control;
mod descriptor;
mod location;
mod registry;

pub use condition::{Condition, ConditionEvaluator, ConditionOp, ResolvedCondition};
pub use control::{
    ControlClass, ControlType, ControlTypeParseError, JOYSTICK_SLOTS, JoystickDir, JoystickDirs,
    JoystickSlot, MAX_ANALOG_BITS, MAX_BUTTONS, MAX_PLAYERS,
};
pub use descriptor::{
    AnalogParams, ControlDescriptor, DescriptorRecord, DescriptorSequences, DescriptorStream,
    GroupLayout, PortLayout,
};
pub use location::{LocationParseError, SwitchLocation, parse_locations};
pub use registry::{PortField, PortGroup, PortId, PortRegistry};
