//! Control descriptors and the descriptor stream
//!
//! Hardware drivers declare their registers as an ordered stream of
//! records: a group marker starts a new register, and every control record
//! after it belongs to that register.
//!
//! ```ignore
//! let stream = DescriptorStream::new()
//!     .group("IN0")
//!     .control(ControlDescriptor::new(ControlType::Button(1), 0x01).default_value(0x01))
//!     .control(ControlDescriptor::new(ControlType::Coin, 0x80).default_value(0x80).impulse(3));
//! ```
//!
//! The same stream can be loaded from a TOML layout, see [`PortLayout`].

use serde::{Deserialize, Serialize};

use crate::input::{SeqType, Sequence};

use super::condition::Condition;
use super::control::{ControlClass, ControlType};

fn default_sensitivity() -> i32 {
    100
}

/// Parameters of an analog control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogParams {
    /// Lowest register value, in the field's own units
    #[serde(default)]
    pub minimum: u32,
    /// Highest register value, in the field's own units
    pub maximum: u32,
    /// Percentage applied to device motion (100 = unscaled)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: i32,
    /// Register units moved per frame while increment/decrement is held
    #[serde(default)]
    pub delta: i32,
    /// Register units moved back toward center per frame after release
    #[serde(default)]
    pub center_delta: i32,
    #[serde(default)]
    pub reverse: bool,
    /// Report only this frame's motion (relative controls)
    #[serde(default)]
    pub reset: bool,
    /// Wrap around at the range ends instead of clamping
    #[serde(default)]
    pub wraps: bool,
    /// Overrides the per-type pedal behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedal: Option<bool>,
    /// Overrides the per-type interpolation behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolate: Option<bool>,
}

impl AnalogParams {
    pub fn new(minimum: u32, maximum: u32) -> Self {
        Self {
            minimum,
            maximum,
            sensitivity: default_sensitivity(),
            delta: 0,
            center_delta: 0,
            reverse: false,
            reset: false,
            wraps: false,
            pedal: None,
            interpolate: None,
        }
    }

    pub fn sensitivity(mut self, sensitivity: i32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn delta(mut self, delta: i32) -> Self {
        self.delta = delta;
        self
    }

    pub fn center_delta(mut self, center_delta: i32) -> Self {
        self.center_delta = center_delta;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn reset(mut self) -> Self {
        self.reset = true;
        self
    }

    pub fn wraps(mut self) -> Self {
        self.wraps = true;
        self
    }

    pub fn pedal(mut self, pedal: bool) -> Self {
        self.pedal = Some(pedal);
        self
    }

    pub fn interpolate(mut self, interpolate: bool) -> Self {
        self.interpolate = Some(interpolate);
        self
    }
}

/// The three sequences a descriptor declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSequences {
    #[serde(default = "Sequence::default_marker")]
    pub standard: Sequence,
    #[serde(default = "Sequence::default_marker")]
    pub increment: Sequence,
    #[serde(default = "Sequence::default_marker")]
    pub decrement: Sequence,
}

impl Default for DescriptorSequences {
    fn default() -> Self {
        Self {
            standard: Sequence::default_marker(),
            increment: Sequence::default_marker(),
            decrement: Sequence::default_marker(),
        }
    }
}

impl DescriptorSequences {
    pub fn get(&self, seq_type: SeqType) -> &Sequence {
        match seq_type {
            SeqType::Standard => &self.standard,
            SeqType::Increment => &self.increment,
            SeqType::Decrement => &self.decrement,
        }
    }

    pub fn set(&mut self, seq_type: SeqType, sequence: Sequence) {
        match seq_type {
            SeqType::Standard => self.standard = sequence,
            SeqType::Increment => self.increment = sequence,
            SeqType::Decrement => self.decrement = sequence,
        }
    }
}

/// Static declaration of one control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDescriptor {
    #[serde(rename = "type")]
    pub control: ControlType,
    /// Zero-based player index
    #[serde(default)]
    pub player: u8,
    pub mask: u32,
    #[serde(default, rename = "default")]
    pub default_value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub sequences: DescriptorSequences,
    /// Flip the default bit on each press instead of following the input
    #[serde(default)]
    pub toggle: bool,
    /// Hold the bit active for this many frames per press (0 = off)
    #[serde(default)]
    pub impulse: u8,
    /// Joystick directions resolve to four ways
    #[serde(default)]
    pub four_way: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analog: Option<AnalogParams>,
}

impl ControlDescriptor {
    pub fn new(control: ControlType, mask: u32) -> Self {
        Self {
            control,
            player: 0,
            mask,
            default_value: 0,
            name: None,
            condition: None,
            sequences: DescriptorSequences::default(),
            toggle: false,
            impulse: 0,
            four_way: false,
            location: None,
            analog: None,
        }
    }

    pub fn player(mut self, player: u8) -> Self {
        self.player = player;
        self
    }

    pub fn default_value(mut self, value: u32) -> Self {
        self.default_value = value;
        self
    }

    /// Active-low control: the default value is the full mask
    pub fn active_low(self) -> Self {
        let mask = self.mask;
        self.default_value(mask)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn sequence(mut self, seq_type: SeqType, sequence: Sequence) -> Self {
        self.sequences.set(seq_type, sequence);
        self
    }

    /// Shorthand for the standard sequence
    pub fn bind(self, sequence: impl Into<Sequence>) -> Self {
        self.sequence(SeqType::Standard, sequence.into())
    }

    pub fn toggle(mut self) -> Self {
        self.toggle = true;
        self
    }

    pub fn impulse(mut self, frames: u8) -> Self {
        self.impulse = frames;
        self
    }

    pub fn four_way(mut self) -> Self {
        self.four_way = true;
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn analog(mut self, params: AnalogParams) -> Self {
        self.analog = Some(params);
        self
    }

    pub fn class(&self) -> ControlClass {
        self.control.class()
    }

    /// Declared name, or a generated one such as `P1 BUTTON1`
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("P{} {}", u32::from(self.player) + 1, self.control),
        }
    }
}

/// One record of a descriptor stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorRecord {
    BeginGroup { tag: String },
    Control(ControlDescriptor),
}

/// Ordered descriptor records, built fluently
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorStream {
    records: Vec<DescriptorRecord>,
}

impl DescriptorStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new group
    pub fn group(mut self, tag: impl Into<String>) -> Self {
        self.records
            .push(DescriptorRecord::BeginGroup { tag: tag.into() });
        self
    }

    /// Add a control to the current group
    pub fn control(mut self, descriptor: ControlDescriptor) -> Self {
        self.records.push(DescriptorRecord::Control(descriptor));
        self
    }

    pub fn push(&mut self, record: DescriptorRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DescriptorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for DescriptorStream {
    type Item = DescriptorRecord;
    type IntoIter = std::vec::IntoIter<DescriptorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// A group in a TOML layout file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub tag: String,
    #[serde(default, rename = "control")]
    pub controls: Vec<ControlDescriptor>,
}

/// TOML form of a descriptor stream
///
/// ```toml
/// [[group]]
/// tag = "IN0"
///
/// [[group.control]]
/// type = "BUTTON1"
/// mask = 0x01
/// default = 0x01
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortLayout {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupLayout>,
}

impl PortLayout {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Flatten into a descriptor stream, preserving declaration order
    pub fn into_stream(self) -> DescriptorStream {
        let mut stream = DescriptorStream::new();
        for group in self.groups {
            stream.push(DescriptorRecord::BeginGroup { tag: group.tag });
            for control in group.controls {
                stream.push(DescriptorRecord::Control(control));
            }
        }
        stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputCode, Key};
    use crate::port::ConditionOp;

    #[test]
    fn test_builder_defaults_to_default_marker() {
        let desc = ControlDescriptor::new(ControlType::Button(1), 0x01);
        for seq_type in SeqType::ALL {
            assert!(desc.sequences.get(seq_type).is_default());
        }
        assert_eq!(desc.display_name(), "P1 BUTTON1");
    }

    #[test]
    fn test_active_low_sets_default() {
        let desc = ControlDescriptor::new(ControlType::Coin, 0x30).active_low();
        assert_eq!(desc.default_value, 0x30);
    }

    #[test]
    fn test_stream_order() {
        let stream = DescriptorStream::new()
            .group("IN0")
            .control(ControlDescriptor::new(ControlType::Start, 0x01))
            .group("IN1")
            .control(ControlDescriptor::new(ControlType::Coin, 0x01));
        assert_eq!(stream.len(), 4);
        assert!(matches!(
            &stream.records()[2],
            DescriptorRecord::BeginGroup { tag } if tag == "IN1"
        ));
    }

    #[test]
    fn test_layout_from_toml() {
        let text = r#"
[[group]]
tag = "IN0"

[[group.control]]
type = "BUTTON1"
mask = 0x01
default = 0x01
sequences = { standard = "KEYCODE_A OR DEFAULT" }

[[group.control]]
type = "PADDLE"
mask = 0xff00
default = 0x8000
analog = { maximum = 0xff, delta = 4, center_delta = 8 }

[[group]]
tag = "DSW"

[[group.control]]
type = "DIPSWITCH"
mask = 0x03
location = "SW1:1,2"
condition = { tag = "IN0", mask = 1, value = 1, op = "not_equals" }
"#;
        let layout = PortLayout::from_toml_str(text).unwrap();
        assert_eq!(layout.groups.len(), 2);

        let button = &layout.groups[0].controls[0];
        assert_eq!(button.control, ControlType::Button(1));
        assert_eq!(
            button.sequences.standard,
            Sequence::single(InputCode::key(Key::A)).or().with_default()
        );
        assert!(button.sequences.increment.is_default());

        let paddle = &layout.groups[0].controls[1];
        let params = paddle.analog.as_ref().unwrap();
        assert_eq!(params.sensitivity, 100);
        assert_eq!(params.maximum, 0xff);
        assert_eq!(params.center_delta, 8);

        let dip = &layout.groups[1].controls[0];
        assert_eq!(dip.condition.as_ref().unwrap().op, ConditionOp::NotEquals);

        let stream = layout.into_stream();
        assert_eq!(stream.len(), 5);
    }

    #[test]
    fn test_layout_toml_roundtrip() {
        let layout = PortLayout {
            groups: vec![GroupLayout {
                tag: "IN0".to_string(),
                controls: vec![
                    ControlDescriptor::new(ControlType::Dial, 0xff)
                        .analog(AnalogParams::new(0, 0xff).sensitivity(50).wraps()),
                ],
            }],
        };
        let text = layout.to_toml_string().unwrap();
        assert_eq!(PortLayout::from_toml_str(&text).unwrap(), layout);
    }
}

