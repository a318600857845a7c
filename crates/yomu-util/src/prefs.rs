use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preferences lock poisoned")]
    Poisoned,
}

/// Persistent key-value settings supplied by the host.
pub trait PreferenceStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;

    fn get_bool(&self, key: &str) -> Option<bool>;

    fn set_string(&self, key: &str, value: &str) -> Result<(), Error>;

    fn set_bool(&self, key: &str, value: bool) -> Result<(), Error>;

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect(),
            ),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        self.values
            .write()
            .map_err(|_| Error::Poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }
}

impl PreferenceStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).and_then(as_string)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().ok()?.get(key).and_then(as_bool)
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), Error> {
        self.set(key, Value::String(value.to_string()))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), Error> {
        self.set(key, Value::Bool(value))
    }
}

/// Flat JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = PathBuf::new().join(path);
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                info!("open preferences from {:?}", path);
                serde_json::from_str(&contents)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        let mut values = self.values.write().map_err(|_| Error::Poisoned)?;
        values.insert(key.to_string(), value);
        std::fs::write(&self.path, serde_json::to_string_pretty(&*values)?)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).and_then(as_string)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().ok()?.get(key).and_then(as_bool)
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), Error> {
        self.set(key, Value::String(value.to_string()))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), Error> {
        self.set(key, Value::Bool(value))
    }
}
