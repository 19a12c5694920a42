//! Frame scheduler
//!
//! Owns the runtime state of every group and drives it from the two frame
//! hooks. Groups are visited in the registry's evaluation order so that a
//! condition always sees its target's composite for the current frame.
//!
//! A read composes, in order: the digital accumulator, custom overlays,
//! the group default (XOR), analog bits, and passive settings last.

use crate::input::{InputDevices, SeqType};
use crate::notify::PortChange;
use crate::port::{ConditionEvaluator, PortId, PortRegistry, ResolvedCondition};

use super::custom::CustomSource;
use super::field::FieldRuntime;
use super::joystick::{DigitalJoystickAggregator, TieBreak};

struct FieldSlot {
    runtime: FieldRuntime,
    condition: Option<ResolvedCondition>,
    enabled: bool,
}

/// Runtime state of one group
pub struct PortGroupState {
    fields: Vec<FieldSlot>,
    defvalue: u32,
    digital: u32,
    passive_mask: u32,
    analog_mask: u32,
    composite: u32,
}

impl PortGroupState {
    /// Default bits, after toggles, XORed into every read
    pub fn defvalue(&self) -> u32 {
        self.defvalue
    }

    /// Digital bits active this frame
    pub fn digital(&self) -> u32 {
        self.digital
    }

    /// Bits owned by enabled passive settings
    pub fn passive_mask(&self) -> u32 {
        self.passive_mask
    }

    /// Bits owned by analog fields
    pub fn analog_mask(&self) -> u32 {
        self.analog_mask
    }

    /// Composite value computed at the last frame start
    pub fn composite(&self) -> u32 {
        self.composite
    }

    /// Live setting of field `index`, for toggles and passive fields
    pub fn live_value(&self, index: usize) -> Option<u32> {
        self.fields.get(index)?.runtime.live_value()
    }

    fn apply_conditions(&mut self, composites: &[u32]) {
        let evaluator = ConditionEvaluator::new(composites);
        for slot in self.fields.iter_mut() {
            slot.enabled = evaluator.active(slot.condition.as_ref());
        }
    }

    fn refresh_defaults(&mut self) {
        let mut defvalue = 0;
        let mut passive = 0;
        for slot in self.fields.iter().filter(|s| s.enabled) {
            let mask = slot.runtime.mask();
            if let Some(bits) = slot.runtime.default_bits() {
                defvalue = (defvalue & !mask) | (bits & mask);
            }
            if let FieldRuntime::Passive(_) = slot.runtime {
                passive |= mask;
            }
        }
        self.defvalue = defvalue;
        self.passive_mask = passive;
    }

    fn compose(&mut self, fraction: f64) -> u32 {
        let mut value = self.digital;
        for layer in [0u8, 2, 3] {
            if layer == 2 {
                value ^= self.defvalue;
            }
            for slot in self
                .fields
                .iter_mut()
                .filter(|s| s.enabled && s.runtime.layer() == layer)
            {
                value = slot.runtime.contribute(value, fraction);
            }
        }
        value
    }
}

/// Drives every group through the frame hooks
pub struct FrameScheduler {
    groups: Vec<PortGroupState>,
    order: Vec<PortId>,
    joysticks: DigitalJoystickAggregator,
}

impl FrameScheduler {
    pub fn new(registry: &PortRegistry, tie_break: TieBreak) -> Self {
        let mut joysticks = DigitalJoystickAggregator::new(tie_break);
        let groups = registry
            .groups()
            .iter()
            .map(|group| {
                let fields: Vec<FieldSlot> = group
                    .fields()
                    .iter()
                    .map(|field| {
                        let runtime = FieldRuntime::from_field(field);
                        if let FieldRuntime::Digital(digital) = &runtime {
                            if let Some(stick) = digital.stick() {
                                joysticks.bind(
                                    stick.player,
                                    stick.slot,
                                    stick.dir,
                                    field.sequence(SeqType::Standard).clone(),
                                );
                            }
                        }
                        FieldSlot {
                            runtime,
                            condition: field.condition().copied(),
                            enabled: field.condition().is_none(),
                        }
                    })
                    .collect();
                let analog_mask = fields
                    .iter()
                    .filter(|s| matches!(s.runtime, FieldRuntime::Analog(_)))
                    .fold(0, |acc, s| acc | s.runtime.mask());
                PortGroupState {
                    fields,
                    defvalue: 0,
                    digital: 0,
                    passive_mask: 0,
                    analog_mask,
                    composite: 0,
                }
            })
            .collect();

        Self {
            groups,
            order: registry.evaluation_order().to_vec(),
            joysticks,
        }
    }

    /// Attach a callback to the custom field of `port` with exactly `mask`
    pub fn bind_custom(&mut self, port: PortId, mask: u32, source: CustomSource) -> bool {
        let Some(group) = self.groups.get_mut(port.index()) else {
            return false;
        };
        for slot in group.fields.iter_mut() {
            if let FieldRuntime::Custom(channel) = &mut slot.runtime {
                if channel.mask() == mask {
                    channel.bind(source);
                    return true;
                }
            }
        }
        false
    }

    /// Compute initial composites without running any edge logic
    pub fn prime(&mut self) {
        let mut composites: Vec<u32> = self.groups.iter().map(|g| g.composite).collect();
        for &id in &self.order {
            let group = &mut self.groups[id.index()];
            group.apply_conditions(&composites);
            group.refresh_defaults();
            group.composite = group.compose(0.0);
            composites[id.index()] = group.composite;
        }
    }

    /// Start-of-frame work; returns groups whose composite changed
    pub fn on_frame_start<D: InputDevices + ?Sized>(&mut self, devices: &D) -> Vec<PortChange> {
        self.joysticks.update(devices);

        let joysticks = &self.joysticks;
        let mut changes = Vec::new();
        let mut composites: Vec<u32> = self.groups.iter().map(|g| g.composite).collect();

        for &id in &self.order {
            let group = &mut self.groups[id.index()];
            let old = group.composite;
            group.apply_conditions(&composites);

            let mut digital = 0;
            for slot in group.fields.iter_mut().filter(|s| s.enabled) {
                digital |= slot.runtime.frame_start(devices, joysticks);
            }
            group.digital = digital;
            group.refresh_defaults();

            let new = group.compose(0.0);
            group.composite = new;
            composites[id.index()] = new;

            if new != old {
                changes.push(PortChange { port: id, old, new });
            }
        }
        changes
    }

    /// End-of-frame analog commit
    pub fn on_frame_end<D: InputDevices + ?Sized>(&mut self, devices: &mut D) {
        for group in self.groups.iter_mut() {
            for slot in group.fields.iter_mut() {
                if let FieldRuntime::Analog(channel) = &mut slot.runtime {
                    channel.on_frame_end(devices);
                }
            }
        }
    }

    /// Live value of a group at `fraction` of the frame
    pub fn read(&mut self, port: PortId, fraction: f64) -> Option<u32> {
        let group = self.groups.get_mut(port.index())?;
        Some(group.compose(fraction))
    }

    pub fn composite(&self, port: PortId) -> Option<u32> {
        self.groups.get(port.index()).map(|g| g.composite)
    }

    pub fn group(&self, port: PortId) -> Option<&PortGroupState> {
        self.groups.get(port.index())
    }

    pub fn joysticks(&self) -> &DigitalJoystickAggregator {
        &self.joysticks
    }
}
