//! Port registry
//!
//! Turns a descriptor stream into arena-indexed groups. All validation
//! happens here, once, and every problem is collected before failing so a
//! driver author sees the whole list at once.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use hashbrown::HashMap;

use crate::bindings::BindingTable;
use crate::error::{ConfigurationError, ConfigurationErrors, FieldRef};
use crate::input::{SeqType, Sequence};

use super::condition::ResolvedCondition;
use super::control::{ControlClass, MAX_ANALOG_BITS, MAX_PLAYERS};
use super::descriptor::{AnalogParams, ControlDescriptor, DescriptorRecord};
use super::location::parse_locations;

/// Index of a group in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(usize);

impl PortId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One control inside a group, with its sequences resolved
#[derive(Debug, Clone)]
pub struct PortField {
    field_ref: FieldRef,
    descriptor: ControlDescriptor,
    sequences: [Sequence; 3],
    default_sequences: [Sequence; 3],
    condition: Option<ResolvedCondition>,
    value: u32,
    analog: Option<AnalogParams>,
}

impl PortField {
    pub fn descriptor(&self) -> &ControlDescriptor {
        &self.descriptor
    }

    /// Group tag and position, for error messages
    pub fn field_ref(&self) -> &FieldRef {
        &self.field_ref
    }

    pub fn mask(&self) -> u32 {
        self.descriptor.mask
    }

    /// Bit position of the lowest mask bit
    pub fn shift(&self) -> u32 {
        self.descriptor.mask.trailing_zeros()
    }

    pub fn class(&self) -> ControlClass {
        self.descriptor.class()
    }

    pub fn condition(&self) -> Option<&ResolvedCondition> {
        self.condition.as_ref()
    }

    /// Current sequence, with any `DEFAULT` already resolved
    pub fn sequence(&self, seq_type: SeqType) -> &Sequence {
        &self.sequences[seq_type.index()]
    }

    /// Sequence as resolved at build time, before session overrides
    pub fn default_sequence(&self, seq_type: SeqType) -> &Sequence {
        &self.default_sequences[seq_type.index()]
    }

    /// Override a sequence; `DEFAULT` tokens resolve to the build-time value.
    ///
    /// A placeholder that cannot be resolved leaves the field unchanged.
    pub fn set_sequence(
        &mut self,
        seq_type: SeqType,
        sequence: Sequence,
    ) -> Result<(), ConfigurationError> {
        let resolved = sequence.resolve(self.default_sequence(seq_type));
        if resolved.contains_default() {
            return Err(ConfigurationError::UnresolvedDefault {
                field: self.field_ref.clone(),
                seq_type,
            });
        }
        self.sequences[seq_type.index()] = resolved;
        Ok(())
    }

    /// Starting value of the field's default bits
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Set the starting value, masked to the field
    pub fn set_value(&mut self, value: u32) {
        self.value = value & self.descriptor.mask;
    }

    /// Effective analog parameters, including session overrides
    pub fn analog(&self) -> Option<&AnalogParams> {
        self.analog.as_ref()
    }

    pub fn analog_mut(&mut self) -> Option<&mut AnalogParams> {
        self.analog.as_mut()
    }
}

/// A named register made of fields
#[derive(Debug, Clone)]
pub struct PortGroup {
    tag: String,
    fields: Vec<PortField>,
}

impl PortGroup {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn fields(&self) -> &[PortField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [PortField] {
        &mut self.fields
    }

    /// Union of every field mask
    pub fn used_bits(&self) -> u32 {
        self.fields.iter().fold(0, |acc, f| acc | f.mask())
    }
}

/// All groups of a session, in declaration order
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
    groups: Vec<PortGroup>,
    by_tag: HashMap<String, PortId>,
    order: Vec<PortId>,
}

/// Control collected before conditions can be resolved
struct PendingField {
    field_ref: FieldRef,
    descriptor: ControlDescriptor,
    sequences: [Sequence; 3],
}

impl PortRegistry {
    /// Build the registry, resolving `DEFAULT` sequences against `bindings`
    pub fn build(
        records: impl IntoIterator<Item = DescriptorRecord>,
        bindings: &BindingTable,
    ) -> Result<Self, ConfigurationErrors> {
        let mut errors = Vec::new();
        let mut pending: Vec<(String, Vec<PendingField>)> = Vec::new();
        let mut by_tag: HashMap<String, PortId> = HashMap::new();

        for (index, record) in records.into_iter().enumerate() {
            match record {
                DescriptorRecord::BeginGroup { tag } => {
                    if by_tag.contains_key(&tag) {
                        errors.push(ConfigurationError::DuplicateTag { tag: tag.clone() });
                    } else {
                        by_tag.insert(tag.clone(), PortId::new(pending.len()));
                    }
                    pending.push((tag, Vec::new()));
                }
                DescriptorRecord::Control(descriptor) => {
                    let Some((tag, fields)) = pending.last_mut() else {
                        errors.push(ConfigurationError::ControlOutsideGroup { index });
                        continue;
                    };
                    let field_ref = FieldRef {
                        group: tag.clone(),
                        index: fields.len(),
                        control: descriptor.control,
                        mask: descriptor.mask,
                    };
                    validate_descriptor(&field_ref, &descriptor, &mut errors);
                    let sequences = resolve_sequences(&field_ref, &descriptor, bindings, &mut errors);
                    fields.push(PendingField {
                        field_ref,
                        descriptor,
                        sequences,
                    });
                }
            }
        }

        for (_, fields) in &pending {
            check_overlaps(fields, &mut errors);
        }

        // Resolve conditions and collect dependency edges (target -> dependent)
        let mut groups = Vec::with_capacity(pending.len());
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); pending.len()];
        for (group_index, (tag, fields)) in pending.into_iter().enumerate() {
            let mut resolved = Vec::with_capacity(fields.len());
            for field in fields {
                let condition = match &field.descriptor.condition {
                    None => None,
                    Some(cond) => match by_tag.get(&cond.tag) {
                        Some(&target) => {
                            edges[target.index()].push(group_index);
                            Some(ResolvedCondition {
                                group: target,
                                mask: cond.mask,
                                value: cond.value,
                                op: cond.op,
                            })
                        }
                        None => {
                            errors.push(ConfigurationError::UnknownConditionTarget {
                                field: field.field_ref.clone(),
                                target: cond.tag.clone(),
                            });
                            None
                        }
                    },
                };
                resolved.push(PortField {
                    field_ref: field.field_ref,
                    value: field.descriptor.default_value & field.descriptor.mask,
                    analog: field.descriptor.analog.clone(),
                    default_sequences: field.sequences.clone(),
                    sequences: field.sequences,
                    condition,
                    descriptor: field.descriptor,
                });
            }
            groups.push(PortGroup {
                tag,
                fields: resolved,
            });
        }

        let order = match evaluation_order(&edges) {
            Ok(order) => order,
            Err(stuck) => {
                errors.push(ConfigurationError::ConditionCycle {
                    groups: stuck.iter().map(|&i| groups[i].tag.clone()).collect(),
                });
                Vec::new()
            }
        };

        if !errors.is_empty() {
            return Err(ConfigurationErrors(errors));
        }

        tracing::debug!(
            "Port registry built: {} group(s), {} field(s)",
            groups.len(),
            groups.iter().map(|g| g.fields.len()).sum::<usize>()
        );

        Ok(Self {
            groups,
            by_tag,
            order: order.into_iter().map(PortId::new).collect(),
        })
    }

    /// Group id for a symbolic tag
    pub fn lookup(&self, tag: &str) -> Option<PortId> {
        self.by_tag.get(tag).copied()
    }

    pub fn group(&self, id: PortId) -> Option<&PortGroup> {
        self.groups.get(id.index())
    }

    pub fn group_mut(&mut self, id: PortId) -> Option<&mut PortGroup> {
        self.groups.get_mut(id.index())
    }

    pub fn groups(&self) -> &[PortGroup] {
        &self.groups
    }

    /// Groups ordered so every condition target precedes its dependents
    pub fn evaluation_order(&self) -> &[PortId] {
        &self.order
    }

    /// Field addressed by group tag, mask and declared default
    pub fn find_field_mut(&mut self, tag: &str, mask: u32, defvalue: u32) -> Option<&mut PortField> {
        let id = self.lookup(tag)?;
        self.groups[id.index()]
            .fields
            .iter_mut()
            .find(|f| f.descriptor.mask == mask && f.descriptor.default_value == defvalue)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn validate_descriptor(
    field: &FieldRef,
    descriptor: &ControlDescriptor,
    errors: &mut Vec<ConfigurationError>,
) {
    if !descriptor.control.is_valid() {
        errors.push(ConfigurationError::InvalidControl {
            field: field.clone(),
        });
    }
    if descriptor.mask == 0 {
        errors.push(ConfigurationError::EmptyMask {
            field: field.clone(),
        });
    }
    if descriptor.default_value & !descriptor.mask != 0 {
        errors.push(ConfigurationError::DefaultOutsideMask {
            field: field.clone(),
            default: descriptor.default_value,
        });
    }
    if usize::from(descriptor.player) >= MAX_PLAYERS {
        errors.push(ConfigurationError::PlayerOutOfRange {
            field: field.clone(),
            player: descriptor.player,
            max: MAX_PLAYERS,
        });
    }

    if let Some(location) = &descriptor.location {
        match parse_locations(location) {
            Ok(positions) => {
                let bits = descriptor.mask.count_ones();
                if positions.len() != bits as usize {
                    errors.push(ConfigurationError::LocationMismatch {
                        field: field.clone(),
                        location: location.clone(),
                        positions: positions.len(),
                        bits,
                    });
                }
            }
            Err(reason) => errors.push(ConfigurationError::InvalidLocation {
                field: field.clone(),
                location: location.clone(),
                reason,
            }),
        }
    }

    if descriptor.class().is_analog() {
        let bits = descriptor
            .mask
            .checked_shr(descriptor.mask.trailing_zeros())
            .unwrap_or(0);
        let contiguous = bits & bits.wrapping_add(1) == 0;
        if bits != 0 && (!contiguous || bits.count_ones() > MAX_ANALOG_BITS) {
            errors.push(ConfigurationError::InvalidAnalogMask {
                field: field.clone(),
                max_bits: MAX_ANALOG_BITS,
            });
        }
        match &descriptor.analog {
            None => errors.push(ConfigurationError::MissingAnalogParams {
                field: field.clone(),
            }),
            Some(params) if params.sensitivity <= 0 => {
                errors.push(ConfigurationError::InvalidSensitivity {
                    field: field.clone(),
                    sensitivity: params.sensitivity,
                })
            }
            Some(_) => {}
        }
    }
}

fn resolve_sequences(
    field: &FieldRef,
    descriptor: &ControlDescriptor,
    bindings: &BindingTable,
    errors: &mut Vec<ConfigurationError>,
) -> [Sequence; 3] {
    SeqType::ALL.map(|seq_type| {
        let default = bindings.default_sequence(descriptor.control, descriptor.player, seq_type);
        let resolved = descriptor.sequences.get(seq_type).resolve(&default);
        if resolved.contains_default() {
            errors.push(ConfigurationError::UnresolvedDefault {
                field: field.clone(),
                seq_type,
            });
        }
        resolved
    })
}

/// Masks may share bits only across composition layers or when gated
fn check_overlaps(fields: &[PendingField], errors: &mut Vec<ConfigurationError>) {
    for (i, first) in fields.iter().enumerate() {
        for second in &fields[i + 1..] {
            let overlap = first.descriptor.mask & second.descriptor.mask;
            if overlap == 0 {
                continue;
            }
            let gated = first.descriptor.condition.is_some() || second.descriptor.condition.is_some();
            let layered = first.descriptor.class().layer() != second.descriptor.class().layer();
            if !gated && !layered {
                errors.push(ConfigurationError::OverlappingMask {
                    first: first.field_ref.clone(),
                    second: second.field_ref.clone(),
                    overlap,
                });
            }
        }
    }
}

/// Stable topological order (Kahn, lowest index first). On a cycle,
/// returns the groups that could not be ordered.
fn evaluation_order(edges: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let count = edges.len();
    let mut indegree = vec![0usize; count];
    for targets in edges {
        for &dependent in targets {
            indegree[dependent] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &dependent in &edges[node] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() == count {
        Ok(order)
    } else {
        Err((0..count).filter(|&i| indegree[i] > 0).collect())
    }
}
