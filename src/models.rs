use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Config;
use crate::middleware::{AccessGate, AdminCredentials};
use crate::storage::DatasetStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gate: AccessGate,
    pub credentials: AdminCredentials,
    pub store: DatasetStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            gate: AccessGate::new(config.auth.api_key.clone()),
            credentials: AdminCredentials::new(
                config.auth.admin_username.clone(),
                config.auth.admin_password.clone(),
            ),
            store: DatasetStore::new(&config.storage.data_dir),
            config,
        }
    }
}

/// A single cell after column typing. Missing cells are `Text("")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// One data row, keyed by column name in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<(String, CellValue)>);

impl Row {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Row(cells)
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column name to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut cells = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, CellValue>()? {
                    if cells.iter().any(|(n, _): &(String, CellValue)| *n == name) {
                        return Err(de::Error::custom(format!("duplicate column `{}`", name)));
                    }
                    cells.push((name, value));
                }
                Ok(Row(cells))
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// The single persisted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub data: Vec<Row>,
}

// API Request/Response types

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `{success, message}` envelope used by login, delete and the not-found marker.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusMessage {
    pub success: bool,
    pub message: String,
}

impl StatusMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasetSummary {
    pub filename: String,
    pub total_records: usize,
    pub total_under_investigation: i64,
    pub total_closed: i64,
    pub closure_rate: f64,
    pub filters: SummaryFilters,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct SummaryFilters {
    pub years: Vec<String>,
    pub months: Vec<String>,
    pub stations: Vec<String>,
    pub crime_types: Vec<String>,
}
