//! Externally computed field bits

use std::fmt;

/// Callback producing the raw, unshifted bits of a custom field
pub type CustomSource = Box<dyn FnMut() -> u32>;

/// A custom field and the callback that feeds it
pub struct CustomChannel {
    mask: u32,
    shift: u32,
    source: Option<CustomSource>,
}

impl fmt::Debug for CustomChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomChannel")
            .field("mask", &self.mask)
            .field("bound", &self.source.is_some())
            .finish()
    }
}

impl CustomChannel {
    pub fn new(mask: u32) -> Self {
        Self {
            mask,
            shift: mask.trailing_zeros(),
            source: None,
        }
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn bind(&mut self, source: CustomSource) {
        self.source = Some(source);
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    /// Overlay the callback's bits onto `value`; unbound channels pass through
    pub fn contribute(&mut self, value: u32) -> u32 {
        match self.source.as_mut() {
            Some(source) => (value & !self.mask) | ((source() << self.shift) & self.mask),
            None => value,
        }
    }
}
