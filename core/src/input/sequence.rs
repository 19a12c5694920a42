//! Boolean code sequences
//!
//! A [`Sequence`] is a flat token list. `OR` splits it into disjuncts, codes
//! inside a disjunct are ANDed, and `NOT` negates the code that follows it.
//!
//! ```text
//! KEYCODE_LCONTROL OR JOYCODE_1_BUTTON1
//! KEYCODE_A NOT KEYCODE_LSHIFT
//! DEFAULT OR KEYCODE_X
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::code::{CodeParseError, InputCode};
use super::device::InputDevices;

/// Which of a control's three sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeqType {
    Standard,
    Increment,
    Decrement,
}

impl SeqType {
    pub const ALL: [SeqType; 3] = [SeqType::Standard, SeqType::Increment, SeqType::Decrement];

    pub fn index(self) -> usize {
        match self {
            SeqType::Standard => 0,
            SeqType::Increment => 1,
            SeqType::Decrement => 2,
        }
    }
}

impl fmt::Display for SeqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeqType::Standard => "standard",
            SeqType::Increment => "increment",
            SeqType::Decrement => "decrement",
        })
    }
}

/// One token of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqItem {
    Code(InputCode),
    Not,
    Or,
    /// Placeholder for the binding table's default
    Default,
}

/// Error parsing a sequence string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceParseError {
    #[error(transparent)]
    Code(#[from] CodeParseError),
    #[error("NONE cannot be combined with other tokens")]
    NoneWithTokens,
}

/// Boolean expression over device codes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Sequence {
    items: SmallVec<[SeqItem; 8]>,
}

impl Sequence {
    /// The empty sequence (never pressed)
    pub fn empty() -> Self {
        Self::default()
    }

    /// A sequence consisting of the default placeholder
    pub fn default_marker() -> Self {
        let mut seq = Self::empty();
        seq.items.push(SeqItem::Default);
        seq
    }

    /// A single plain code
    pub fn single(code: InputCode) -> Self {
        Self::empty().code(code)
    }

    /// Append a code to the current disjunct
    pub fn code(mut self, code: InputCode) -> Self {
        self.items.push(SeqItem::Code(code));
        self
    }

    /// Append a negated code to the current disjunct
    pub fn not(mut self, code: InputCode) -> Self {
        self.items.push(SeqItem::Not);
        self.items.push(SeqItem::Code(code));
        self
    }

    /// Start a new disjunct
    pub fn or(mut self) -> Self {
        self.items.push(SeqItem::Or);
        self
    }

    /// Start a new disjunct containing `code`
    pub fn or_code(self, code: InputCode) -> Self {
        self.or().code(code)
    }

    /// Append the default placeholder
    pub fn with_default(mut self) -> Self {
        self.items.push(SeqItem::Default);
        self
    }

    pub fn items(&self) -> &[SeqItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if the whole sequence is the default placeholder
    pub fn is_default(&self) -> bool {
        self.items.as_slice() == [SeqItem::Default]
    }

    /// True if a default placeholder still needs resolving
    pub fn contains_default(&self) -> bool {
        self.items.contains(&SeqItem::Default)
    }

    /// Iterate over the OR-separated disjuncts
    pub fn disjuncts(&self) -> impl Iterator<Item = &[SeqItem]> {
        self.items.split(|item| *item == SeqItem::Or)
    }

    /// Iterate over every code mentioned, negated or not
    pub fn codes(&self) -> impl Iterator<Item = InputCode> + '_ {
        self.items.iter().filter_map(|item| match item {
            SeqItem::Code(code) => Some(*code),
            _ => None,
        })
    }

    /// Evaluate against the current device state.
    ///
    /// Empty sequences and empty disjuncts are false. A disjunct still
    /// holding the default placeholder is treated as false; registries
    /// resolve placeholders before any evaluation happens.
    pub fn pressed<D: InputDevices + ?Sized>(&self, devices: &D) -> bool {
        self.disjuncts()
            .any(|disjunct| disjunct_pressed(disjunct, devices))
    }

    /// Replace every disjunct that is exactly `DEFAULT` by the disjuncts of
    /// `default`. Placeholders embedded in a larger disjunct are left alone.
    pub fn resolve(&self, default: &Sequence) -> Sequence {
        if !self.contains_default() {
            return self.clone();
        }

        let mut resolved = Sequence::empty();
        for disjunct in self.disjuncts() {
            let parts: &[SeqItem] = if disjunct == [SeqItem::Default] {
                &default.items
            } else {
                disjunct
            };
            if parts.is_empty() {
                continue;
            }
            if !resolved.is_empty() {
                resolved.items.push(SeqItem::Or);
            }
            resolved.items.extend_from_slice(parts);
        }
        resolved
    }

    /// Replace every occurrence of `old` by `new`, returning how many changed
    pub fn replace_code(&mut self, old: InputCode, new: InputCode) -> usize {
        let mut replaced = 0;
        for item in self.items.iter_mut() {
            if *item == SeqItem::Code(old) {
                *item = SeqItem::Code(new);
                replaced += 1;
            }
        }
        replaced
    }
}

fn disjunct_pressed<D: InputDevices + ?Sized>(disjunct: &[SeqItem], devices: &D) -> bool {
    let mut negate = false;
    let mut saw_code = false;

    for item in disjunct {
        match item {
            SeqItem::Not => negate = true,
            SeqItem::Code(code) => {
                saw_code = true;
                if devices.code_pressed(*code) == negate {
                    return false;
                }
                negate = false;
            }
            SeqItem::Default => return false,
            SeqItem::Or => {}
        }
    }

    saw_code
}

impl From<InputCode> for Sequence {
    fn from(code: InputCode) -> Self {
        Sequence::single(code)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return f.write_str("NONE");
        }
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match item {
                SeqItem::Code(code) => write!(f, "{code}")?,
                SeqItem::Not => f.write_str("NOT")?,
                SeqItem::Or => f.write_str("OR")?,
                SeqItem::Default => f.write_str("DEFAULT")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Sequence {
    type Err = SequenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.contains(&"NONE") {
            return if tokens.len() == 1 {
                Ok(Sequence::empty())
            } else {
                Err(SequenceParseError::NoneWithTokens)
            };
        }

        let mut seq = Sequence::empty();
        for token in tokens {
            let item = match token {
                "OR" => SeqItem::Or,
                "NOT" => SeqItem::Not,
                "DEFAULT" => SeqItem::Default,
                code => SeqItem::Code(code.parse()?),
            };
            seq.items.push(item);
        }
        Ok(seq)
    }
}

impl Serialize for Sequence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sequence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;
    use crate::test_utils::ScriptedDevices;

    const A: InputCode = InputCode::key(Key::A);
    const B: InputCode = InputCode::key(Key::B);
    const SHIFT: InputCode = InputCode::key(Key::LShift);

    fn devices(pressed: &[InputCode]) -> ScriptedDevices {
        let mut devices = ScriptedDevices::new();
        for code in pressed {
            devices.press(*code);
        }
        devices
    }

    #[test]
    fn test_single_code_follows_device() {
        let seq = Sequence::single(A);
        assert!(seq.pressed(&devices(&[A])));
        assert!(!seq.pressed(&devices(&[])));
        assert!(!seq.pressed(&devices(&[B])));
    }

    #[test]
    fn test_not_code() {
        let seq = Sequence::empty().not(A);
        assert!(seq.pressed(&devices(&[])));
        assert!(!seq.pressed(&devices(&[A])));
    }

    #[test]
    fn test_code_and_its_negation_never_pressed() {
        let seq = Sequence::single(A).not(A);
        assert!(!seq.pressed(&devices(&[])));
        assert!(!seq.pressed(&devices(&[A])));
    }

    #[test]
    fn test_or_combinator() {
        let seq = Sequence::single(A).or_code(B);
        assert!(!seq.pressed(&devices(&[])));
        assert!(seq.pressed(&devices(&[A])));
        assert!(seq.pressed(&devices(&[B])));
        assert!(seq.pressed(&devices(&[A, B])));
    }

    #[test]
    fn test_and_within_disjunct() {
        let seq = Sequence::single(A).not(SHIFT).or_code(B);
        assert!(seq.pressed(&devices(&[A])));
        assert!(!seq.pressed(&devices(&[A, SHIFT])));
        assert!(seq.pressed(&devices(&[A, SHIFT, B])));
    }

    #[test]
    fn test_empty_and_default_never_pressed() {
        let all = devices(&[A, B, SHIFT]);
        assert!(!Sequence::empty().pressed(&all));
        assert!(!Sequence::default_marker().pressed(&all));
        // Empty disjunct from a trailing OR
        assert!(!Sequence::empty().or().pressed(&all));
    }

    #[test]
    fn test_resolve_default() {
        let default = Sequence::single(A).or_code(B);
        assert_eq!(Sequence::default_marker().resolve(&default), default);

        let extended = Sequence::default_marker().or_code(SHIFT);
        let resolved = extended.resolve(&default);
        assert_eq!(resolved, Sequence::single(A).or_code(B).or_code(SHIFT));
        assert!(!resolved.contains_default());
    }

    #[test]
    fn test_resolve_against_empty_default() {
        let seq = Sequence::default_marker().or_code(SHIFT);
        assert_eq!(seq.resolve(&Sequence::empty()), Sequence::single(SHIFT));
        assert!(Sequence::default_marker().resolve(&Sequence::empty()).is_empty());
    }

    #[test]
    fn test_embedded_default_stays_unresolved() {
        let seq = Sequence::single(A).with_default();
        assert!(seq.resolve(&Sequence::single(B)).contains_default());
    }

    #[test]
    fn test_replace_code() {
        let mut seq = Sequence::single(A).or_code(A).or_code(B);
        assert_eq!(seq.replace_code(A, SHIFT), 2);
        assert_eq!(seq, Sequence::single(SHIFT).or_code(SHIFT).or_code(B));
    }

    #[test]
    fn test_string_roundtrip() {
        let seq = Sequence::single(A).not(SHIFT).or_code(InputCode::joy_button(0, 1));
        let text = seq.to_string();
        assert_eq!(text, "KEYCODE_A NOT KEYCODE_LSHIFT OR JOYCODE_1_BUTTON1");
        assert_eq!(text.parse::<Sequence>(), Ok(seq));
    }

    #[test]
    fn test_none_keyword() {
        assert_eq!(Sequence::empty().to_string(), "NONE");
        assert_eq!("NONE".parse::<Sequence>(), Ok(Sequence::empty()));
        assert_eq!("".parse::<Sequence>(), Ok(Sequence::empty()));
        assert_eq!(
            "NONE KEYCODE_A".parse::<Sequence>(),
            Err(SequenceParseError::NoneWithTokens)
        );
    }
}
