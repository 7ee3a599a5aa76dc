//! Strategy configuration and its deterministic fingerprint.
//!
//! `StrategyConfig` is the single currency between the config file, the
//! optimizer and the factory. Params live in a `BTreeMap` so the canonical
//! JSON, and therefore the hash, never depends on insertion order.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Strategy identifier plus its numeric parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    #[serde(rename = "type")]
    pub strategy_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategyConfig {
    pub fn new(strategy_type: impl Into<String>) -> Self {
        Self {
            strategy_type: strategy_type.into(),
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    pub fn config_hash(&self) -> String {
        let canonical = json!({
            "type": &self.strategy_type,
            "params": &self.params,
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }

    /// Compact `key=value` rendering for logs and summaries.
    pub fn describe(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{}({})", self.strategy_type, params.join(", "))
    }
}
