//! Fixed names the pipeline depends on: maps, layers, fields, layouts, output location.
//!
//! Overrides are partial: they are deep-merged onto [`ExhibitConfig::default`] before
//! deserializing, so a file only needs to name what differs.

use crate::buffer::DEFAULT_DISTANCE_FIELD;
use crate::query::DEFAULT_ID_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub map: String,
    /// Exact name, or a `*` wildcard pattern.
    pub layer: String,
}

impl LayerConfig {
    fn new(map: &str, layer: &str) -> Self {
        Self {
            map: map.to_string(),
            layer: layer.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub layout: String,
    pub frame: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExhibitConfig {
    pub parcels: LayerConfig,
    pub id_field: String,
    pub boundary: LayerConfig,
    pub subject_store: LayerConfig,
    pub buffer_store: LayerConfig,
    pub distance_field: String,
    pub aerial: ViewConfig,
    pub overlay: ViewConfig,
    pub output_dir: PathBuf,
    /// Export resolution in dots per inch.
    pub resolution: u32,
    /// Budget for each select, dissolve or buffer call. Unlimited when absent.
    pub operation_timeout_ms: Option<u64>,
}

pub const DEFAULT_MAP: &str = "Case Map";

impl Default for ExhibitConfig {
    fn default() -> Self {
        Self {
            parcels: LayerConfig::new(DEFAULT_MAP, "Tax Parcels"),
            id_field: DEFAULT_ID_FIELD.to_string(),
            boundary: LayerConfig::new(DEFAULT_MAP, "Urban Growth Area"),
            subject_store: LayerConfig::new(DEFAULT_MAP, "Subject Property"),
            buffer_store: LayerConfig::new(DEFAULT_MAP, "Notification Buffer"),
            distance_field: DEFAULT_DISTANCE_FIELD.to_string(),
            aerial: ViewConfig {
                layout: "Aerial Exhibit".to_string(),
                frame: "Aerial Map Frame".to_string(),
            },
            overlay: ViewConfig {
                layout: "Overlay Exhibit".to_string(),
                frame: "Overlay Map Frame".to_string(),
            },
            output_dir: PathBuf::from("exhibits"),
            resolution: 300,
            operation_timeout_ms: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config overrides must be an object")]
    NotAnObject,
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ExhibitConfig {
    pub fn with_overrides(overrides: &Value) -> Result<Self, ConfigError> {
        if !overrides.is_object() {
            return Err(ConfigError::NotAnObject);
        }
        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge_value(&mut merged, overrides);
        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        Self::with_overrides(&value)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(text)?;
        // An empty YAML document parses as null.
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::with_overrides(&value)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::Invalid("resolution must be positive".into()));
        }
        if self.id_field.trim().is_empty() || self.distance_field.trim().is_empty() {
            return Err(ConfigError::Invalid("field names must not be empty".into()));
        }
        Ok(())
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base, incoming) => {
            *base = incoming.clone();
        }
    }
}
