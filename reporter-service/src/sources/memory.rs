use std::{
    collections::HashMap,
    path::Path,
    sync::{PoisonError, RwLock},
};

use homeflux_client::domain::{RawReading, SourceRef};

use super::StateStore;
use crate::pipeline::PipelineError;

/// Latest raw state text per entity id, as pushed by the host.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: RwLock<HashMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot from a JSON object such as `{"sensor.grid_power": "1234.6", "sensor.pv": 0}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Source(format!("failed to read {}: {e}", path.display())))?;
        let snapshot: HashMap<String, serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|e| PipelineError::Source(format!("invalid state snapshot {}: {e}", path.display())))?;

        let store = Self::new();
        for (entity_id, value) in snapshot {
            store.apply(&entity_id, &value);
        }
        Ok(store)
    }

    pub fn set(&self, entity_id: impl Into<String>, state: impl Into<String>) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_id.into(), state.into());
    }

    pub fn remove(&self, entity_id: &str) -> Option<String> {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entity_id)
    }

    pub fn get(&self, entity_id: &str) -> Option<String> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()
    }

    /// Store a JSON state value. `null` clears the entity.
    pub fn apply(&self, entity_id: &str, value: &serde_json::Value) {
        match state_text(value) {
            Some(text) => self.set(entity_id, text),
            None => {
                self.remove(entity_id);
            }
        }
    }
}

impl StateStore for InMemoryStateStore {
    fn read(&self, source: &SourceRef) -> RawReading {
        match self.get(source.as_str()) {
            Some(text) => RawReading::from_state(&text),
            None => RawReading::Unavailable,
        }
    }
}

fn state_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_entity_reads_as_unavailable() {
        let store = InMemoryStateStore::new();
        assert_eq!(store.read(&SourceRef::new("sensor.nope")), RawReading::Unavailable);
    }

    #[test]
    fn set_and_remove_round_through_read() {
        let store = InMemoryStateStore::new();
        store.set("sensor.grid", "1234.6");
        assert_eq!(store.read(&SourceRef::new("sensor.grid")), RawReading::Numeric(1234.6));

        store.set("sensor.grid", "unavailable");
        assert_eq!(store.read(&SourceRef::new("sensor.grid")), RawReading::Unavailable);

        assert_eq!(store.remove("sensor.grid"), Some("unavailable".to_string()));
        assert_eq!(store.get("sensor.grid"), None);
    }

    #[test]
    fn json_values_are_stored_as_state_text() {
        let store = InMemoryStateStore::new();
        store.apply("a", &json!("12.5"));
        store.apply("b", &json!(-3));
        store.apply("c", &json!(true));
        assert_eq!(store.get("a").as_deref(), Some("12.5"));
        assert_eq!(store.get("b").as_deref(), Some("-3"));
        assert_eq!(store.read(&SourceRef::new("c")), RawReading::NonNumeric("true".to_string()));

        store.apply("a", &json!(null));
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn snapshot_file_loads_every_entity() {
        let path = std::env::temp_dir().join(format!("homeflux-states-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"sensor.grid": "100.4", "sensor.pv_kwh": 12.3456, "sensor.off": null}"#).unwrap();
        let store = InMemoryStateStore::from_json_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(store.read(&SourceRef::new("sensor.grid")), RawReading::Numeric(100.4));
        assert_eq!(store.read(&SourceRef::new("sensor.pv_kwh")), RawReading::Numeric(12.3456));
        assert_eq!(store.read(&SourceRef::new("sensor.off")), RawReading::Unavailable);
    }

    #[test]
    fn unreadable_snapshot_is_a_source_error() {
        let err = InMemoryStateStore::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }
}
