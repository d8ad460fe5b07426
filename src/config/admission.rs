//! Admission controller configuration structures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Environment variable holding the JSON configuration payload.
pub const CONFIG_ENV_VAR: &str = "SEATKEEPER_CONFIG";

/// Store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory stores for development/testing.
    InMemory,
    /// Postgres-backed stores.
    Postgres,
}

/// Activity recorder backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderBackendConfig {
    /// In-memory bounded ring.
    InMemory,
    /// Postgres activity log.
    Postgres,
    /// No recording.
    Disabled,
}

/// Seed definition for one resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Seat capacity. Must be positive.
    pub capacity: u32,
    /// Optional submission deadline (ms since epoch).
    pub deadline_ms: Option<u128>,
}

/// Root admission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Store backend selection.
    pub store: StoreBackendConfig,
    /// Activity recorder selection.
    pub recorder: RecorderBackendConfig,
    /// Bound on transparent storage-conflict retries.
    pub max_conflict_retries: u32,
    /// Map of resource label to seed configuration.
    pub resources: HashMap<String, ResourceConfig>,
}

impl ResourceConfig {
    /// Validate resource seed values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        Ok(())
    }
}

impl AdmissionConfig {
    /// Validate all resource seeds.
    pub fn validate(&self) -> Result<(), String> {
        for (label, resource) in &self.resources {
            resource
                .validate()
                .map_err(|e| format!("resource `{label}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse admission configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: AdmissionConfig =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file when present, then parses the JSON payload in
    /// [`CONFIG_ENV_VAR`].
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let payload = std::env::var(CONFIG_ENV_VAR)
            .map_err(|_| format!("{CONFIG_ENV_VAR} is not set"))?;
        Self::from_json_str(&payload)
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            store: StoreBackendConfig::InMemory,
            recorder: RecorderBackendConfig::InMemory,
            max_conflict_retries: crate::core::DEFAULT_CONFLICT_RETRIES,
            resources: HashMap::new(),
        }
    }
}
