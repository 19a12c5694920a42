//! Default control bindings
//!
//! The [`BindingTable`] maps `(control type, player)` to the three default
//! sequences a control uses when its descriptor asks for `DEFAULT`.
//!
//! # Lifecycle
//!
//! 1. Start from [`BindingTable::builtin`].
//! 2. [`BindingTable::customize`] applies platform overrides once and takes
//!    the backup baseline.
//! 3. User changes are persisted as [`BindingTable::diff`] against that
//!    baseline and restored with [`BindingTable::apply_diff`].
//! 4. Device profiles may [`BindingTable::remap`] codes across every entry.

mod builtin;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::input::{InputCode, SeqType, Sequence};
use crate::port::ControlType;

/// Lookup key of the binding table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    pub control: ControlType,
    pub player: u8,
}

impl BindingKey {
    pub fn new(control: ControlType, player: u8) -> Self {
        Self { control, player }
    }
}

/// The three default sequences of one control
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingEntry {
    sequences: [Sequence; 3],
}

impl BindingEntry {
    pub fn new(standard: Sequence, increment: Sequence, decrement: Sequence) -> Self {
        Self {
            sequences: [standard, increment, decrement],
        }
    }

    pub fn get(&self, seq_type: SeqType) -> &Sequence {
        &self.sequences[seq_type.index()]
    }

    pub fn set(&mut self, seq_type: SeqType, sequence: Sequence) {
        self.sequences[seq_type.index()] = sequence;
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.iter().all(Sequence::is_empty)
    }
}

/// One changed default sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingOverride {
    #[serde(rename = "type")]
    pub control: ControlType,
    #[serde(default)]
    pub player: u8,
    pub seq_type: SeqType,
    pub sequence: Sequence,
}

/// Default sequences per `(control type, player)` with a backup baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    entries: HashMap<BindingKey, BindingEntry>,
    baseline: HashMap<BindingKey, BindingEntry>,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BindingTable {
    /// The built-in defaults, with the baseline equal to them
    pub fn builtin() -> Self {
        let entries: HashMap<_, _> = builtin::builtin_entries().into_iter().collect();
        Self {
            baseline: entries.clone(),
            entries,
        }
    }

    /// A table with no bindings at all
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            baseline: HashMap::new(),
        }
    }

    /// Current default sequence, if one is bound
    pub fn get_default(
        &self,
        control: ControlType,
        player: u8,
        seq_type: SeqType,
    ) -> Option<&Sequence> {
        self.entries
            .get(&BindingKey::new(control, player))
            .map(|entry| entry.get(seq_type))
            .filter(|seq| !seq.is_empty())
    }

    /// Current default sequence, or the empty sequence when unbound
    pub fn default_sequence(&self, control: ControlType, player: u8, seq_type: SeqType) -> Sequence {
        self.get_default(control, player, seq_type)
            .cloned()
            .unwrap_or_default()
    }

    pub fn entry(&self, control: ControlType, player: u8) -> Option<&BindingEntry> {
        self.entries.get(&BindingKey::new(control, player))
    }

    /// Replace one default sequence
    pub fn set_default(
        &mut self,
        control: ControlType,
        player: u8,
        seq_type: SeqType,
        sequence: Sequence,
    ) {
        let key = BindingKey::new(control, player);
        let entry = self.entries.entry(key).or_default();
        entry.set(seq_type, sequence);

        // Keep the key set canonical so diff round-trips compare equal
        if entry.is_empty() && !self.baseline.contains_key(&key) {
            self.entries.remove(&key);
        }
    }

    /// Apply startup overrides and take the backup baseline
    pub fn customize(&mut self, overrides: impl IntoIterator<Item = BindingOverride>) {
        let mut applied = 0usize;
        for o in overrides {
            self.set_default(o.control, o.player, o.seq_type, o.sequence);
            applied += 1;
        }
        self.baseline = self.entries.clone();
        tracing::debug!("Binding table customized with {} override(s)", applied);
    }

    /// Replace `old` by `new` in every current default sequence
    pub fn remap(&mut self, old: InputCode, new: InputCode) -> usize {
        let mut replaced = 0;
        for entry in self.entries.values_mut() {
            for seq in entry.sequences.iter_mut() {
                replaced += seq.replace_code(old, new);
            }
        }
        tracing::debug!("Remapped {} -> {} in {} place(s)", old, new, replaced);
        replaced
    }

    /// Every default sequence that differs from the baseline, sorted
    pub fn diff(&self) -> Vec<BindingOverride> {
        let empty = BindingEntry::default();
        let mut keys: Vec<&BindingKey> = self.entries.keys().chain(self.baseline.keys()).collect();
        keys.sort();
        keys.dedup();

        let mut diff = Vec::new();
        for key in keys {
            let current = self.entries.get(key).unwrap_or(&empty);
            let base = self.baseline.get(key).unwrap_or(&empty);
            for seq_type in SeqType::ALL {
                if current.get(seq_type) != base.get(seq_type) {
                    diff.push(BindingOverride {
                        control: key.control,
                        player: key.player,
                        seq_type,
                        sequence: current.get(seq_type).clone(),
                    });
                }
            }
        }
        diff
    }

    /// Reset to the baseline, then apply a saved diff
    pub fn apply_diff(&mut self, diff: &[BindingOverride]) {
        self.restore_baseline();
        for o in diff {
            self.set_default(o.control, o.player, o.seq_type, o.sequence.clone());
        }
    }

    /// Discard every change made since the baseline was taken
    pub fn restore_baseline(&mut self) {
        self.entries = self.baseline.clone();
    }

    /// All entries sorted by key
    pub fn sorted_entries(&self) -> Vec<(BindingKey, &BindingEntry)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
