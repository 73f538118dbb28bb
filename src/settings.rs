//! Tuning settings
//!
//! A flat map of string keys to typed scalar values. The simulation only ever
//! reads from it; each owner pulls the keys it needs when it is built and
//! fails fast if one is missing or has the wrong type.
//!
//! Two on-disk formats are accepted:
//! - JSON object (`{"RobotMass": 1.0, ...}`)
//! - Legacy text lines (`RobotMass: 1.0 // comment`)

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ConfigError;

/// Bundled reference tuning
const BUILTIN_SETTINGS: &str = include_str!("../assets/arena.json");

/// Read-only key → value tuning map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of settings
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse the line-oriented `Key: value` format
    ///
    /// Blank lines and lines starting with `//` are skipped, trailing `//`
    /// comments are stripped and the first `:` separates key from value.
    pub fn parse_text(text: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::new();

        for (index, raw) in text.lines().enumerate() {
            let mut line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if let Some(comment) = line.find("//") {
                line = line[..comment].trim_end();
            }

            let Some((key, value)) = line.split_once(':') else {
                return Err(ConfigError::Syntax {
                    line: index + 1,
                    text: raw.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Syntax {
                    line: index + 1,
                    text: raw.to_string(),
                });
            }

            settings
                .values
                .insert(key.to_string(), parse_scalar(value.trim()));
        }

        Ok(settings)
    }

    /// Load settings from disk (`.json` as JSON, anything else as text)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let settings = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::parse_text(&contents)?
        };

        log::info!(
            "Loaded {} settings from {}",
            settings.values.len(),
            path.display()
        );
        Ok(settings)
    }

    /// The bundled reference tuning (`assets/arena.json`)
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_SETTINGS)
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Remove a value, returning it if present
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a setting as `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.values.get(key).ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
        })?;

        T::deserialize(value).map_err(|err| ConfigError::Malformed {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            reason: err.to_string(),
        })
    }

    /// Read a finite, strictly positive float
    pub fn get_positive(&self, key: &str) -> Result<f32, ConfigError> {
        let value: f32 = self.get(key)?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::OutOfRange {
                key: key.to_string(),
                value: value.to_string(),
                constraint: "must be finite and > 0",
            })
        }
    }

    /// Read a finite float that is >= 0
    pub fn get_non_negative(&self, key: &str) -> Result<f32, ConfigError> {
        let value: f32 = self.get(key)?;
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::OutOfRange {
                key: key.to_string(),
                value: value.to_string(),
                constraint: "must be finite and >= 0",
            })
        }
    }
}

/// Type a bare text value: bool, then integer, then float, else string
fn parse_scalar(text: &str) -> Value {
    if let Ok(flag) = text.parse::<bool>() {
        return Value::Bool(flag);
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(text.to_string())
}
