//! Conditional controls
//!
//! A condition enables a control only while another group's composite
//! value, masked, compares a certain way against a constant. Typical use is
//! a DIP switch whose meaning depends on another switch.

use serde::{Deserialize, Serialize};

use super::PortId;

/// Comparison applied to `(composite & mask)` and `value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    #[default]
    Equals,
    NotEquals,
    GreaterThan,
    NotGreaterThan,
    LessThan,
    NotLessThan,
}

impl ConditionOp {
    pub fn test(self, masked: u32, value: u32) -> bool {
        match self {
            ConditionOp::Equals => masked == value,
            ConditionOp::NotEquals => masked != value,
            ConditionOp::GreaterThan => masked > value,
            ConditionOp::NotGreaterThan => masked <= value,
            ConditionOp::LessThan => masked < value,
            ConditionOp::NotLessThan => masked >= value,
        }
    }
}

/// Declared condition, referencing a group by tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub tag: String,
    pub mask: u32,
    pub value: u32,
    #[serde(default)]
    pub op: ConditionOp,
}

impl Condition {
    pub fn new(tag: impl Into<String>, mask: u32, op: ConditionOp, value: u32) -> Self {
        Self {
            tag: tag.into(),
            mask,
            value,
            op,
        }
    }

    pub fn equals(tag: impl Into<String>, mask: u32, value: u32) -> Self {
        Self::new(tag, mask, ConditionOp::Equals, value)
    }

    pub fn not_equals(tag: impl Into<String>, mask: u32, value: u32) -> Self {
        Self::new(tag, mask, ConditionOp::NotEquals, value)
    }
}

/// Condition bound to a group id by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCondition {
    pub group: PortId,
    pub mask: u32,
    pub value: u32,
    pub op: ConditionOp,
}

/// Evaluates conditions against the composites computed so far this frame
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator<'a> {
    composites: &'a [u32],
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(composites: &'a [u32]) -> Self {
        Self { composites }
    }

    /// Whether a control with this condition is enabled
    pub fn active(&self, condition: Option<&ResolvedCondition>) -> bool {
        let Some(cond) = condition else {
            return true;
        };
        let composite = self
            .composites
            .get(cond.group.index())
            .copied()
            .unwrap_or(0);
        cond.op.test(composite & cond.mask, cond.value)
    }
}
