use std::fmt;

use serde::{Deserialize, Serialize};

/// Names the place a single numeric measurement is read from, e.g. `sensor.grid_power`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What the state store holds for a source at one instant.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReading {
    Numeric(f64),
    NonNumeric(String),
    Unavailable,
    NotConfigured,
}

impl RawReading {
    /// Interpret raw state text the way the host reports it.
    ///
    /// Empty text, `unknown` and `unavailable` mean the entity has no value right now.
    pub fn from_state(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed {
            "" | "unknown" | "unavailable" => Self::Unavailable,
            _ => match trimmed.parse::<f64>() {
                Ok(value) => Self::Numeric(value),
                Err(_) => Self::NonNumeric(trimmed.to_string()),
            },
        }
    }

    /// The value, if this reading can go into a sample. NaN and infinities cannot.
    pub fn usable(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }
}
