//! Participants and the address book used at send time.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A person taking part in the draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Participant {
    pub fn new(name: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            name: name.into(),
            email: email.map(str::to_string),
        }
    }
}

/// Load participants from a JSON array of `{ "name", "email" }` objects.
///
/// File order is kept; it becomes the draw order.
pub fn load_participants(path: &Path) -> Result<Vec<Participant>, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))
}

/// Participant names in draw order.
pub fn names(participants: &[Participant]) -> Vec<&str> {
    participants.iter().map(|p| p.name.as_str()).collect()
}

/// Name → email lookup. Entries without a usable address are kept but
/// resolve to `None`.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: HashMap<String, Option<String>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_participants(participants: &[Participant]) -> Self {
        let entries = participants
            .iter()
            .map(|p| (p.name.clone(), p.email.clone()))
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, name: impl Into<String>, email: Option<&str>) {
        self.entries.insert(name.into(), email.map(str::to_string));
    }

    /// The address for `name`. Blank addresses count as missing.
    pub fn address_of(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)?
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
