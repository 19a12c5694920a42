//! Physical switch locations
//!
//! Drivers describe where a setting lives on the real board, e.g.
//! `SW1:1,2,3` or `DSW:!8` (inverted). A bank name carries forward to the
//! following entries until another one appears: `SW1:7,8,SW2:1`.

use std::fmt;

/// One physical switch position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchLocation {
    pub bank: String,
    pub position: u32,
    pub inverted: bool,
}

impl fmt::Display for SwitchLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bang = if self.inverted { "!" } else { "" };
        write!(f, "{}:{}{}", self.bank, bang, self.position)
    }
}

/// Error parsing a location string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationParseError {
    #[error("entry {0} is empty")]
    EmptyEntry(usize),
    #[error("entry {0} has no bank name and none precedes it")]
    MissingBank(usize),
    #[error("entry {index} has invalid position '{text}'")]
    InvalidPosition { index: usize, text: String },
}

/// Parse a comma-separated location list
pub fn parse_locations(text: &str) -> Result<Vec<SwitchLocation>, LocationParseError> {
    let mut bank: Option<&str> = None;
    let mut locations = Vec::new();

    for (index, entry) in text.split(',').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(LocationParseError::EmptyEntry(index));
        }

        let position = match entry.split_once(':') {
            Some((name, rest)) if !name.is_empty() => {
                bank = Some(name);
                rest
            }
            Some(_) => return Err(LocationParseError::MissingBank(index)),
            None => entry,
        };
        let Some(bank) = bank else {
            return Err(LocationParseError::MissingBank(index));
        };

        let (inverted, number) = match position.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, position),
        };
        let position = number
            .parse::<u32>()
            .map_err(|_| LocationParseError::InvalidPosition {
                index,
                text: number.to_string(),
            })?;

        locations.push(SwitchLocation {
            bank: bank.to_string(),
            position,
            inverted,
        });
    }

    Ok(locations)
}
