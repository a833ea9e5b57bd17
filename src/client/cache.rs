use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::core::{CanonicalProjection, ScenarioForm, normalize_str};

pub const LAST_PROJECTION_KEY: &str = "last_projection";
pub const LAST_PROJECTION_PARAMS_KEY: &str = "last_projection_params";

/// Per-tab scratch storage for the most recent result, so a results view can
/// be rebuilt after navigating away. Values are JSON text.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<&'static str, String>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, raw: &Value, form: &ScenarioForm) -> serde_json::Result<()> {
        let raw = serde_json::to_string(raw)?;
        let params = serde_json::to_string(form)?;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(LAST_PROJECTION_KEY, raw);
        entries.insert(LAST_PROJECTION_PARAMS_KEY, params);
        Ok(())
    }

    /// The cached projection, re-normalized, with the form that produced it
    /// when that is still readable.
    pub fn restore(&self) -> Option<(CanonicalProjection, Option<ScenarioForm>)> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let projection = normalize_str(entries.get(LAST_PROJECTION_KEY)?)?;
        let form = entries
            .get(LAST_PROJECTION_PARAMS_KEY)
            .and_then(|text| serde_json::from_str(text).ok());
        Some((projection, form))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
