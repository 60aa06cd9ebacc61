use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::BoxFuture;

/// One result row, keyed by the column names of the final statement.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
    #[error("graph query failed: {0}")]
    Operation(String),
    #[error("invalid {kind} row: {message}")]
    Decode { kind: &'static str, message: String },
    #[error("{0} returned no row")]
    EmptyResult(&'static str),
}

/// Statement text plus named parameters.
///
/// Values never get spliced into `text`; adapters hand `params` to the
/// engine as bound variables (`$name`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphQuery {
    text: String,
    params: Map<String, Value>,
}

impl GraphQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Map::new(),
        }
    }

    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn into_parts(self) -> (String, Map<String, Value>) {
        (self.text, self.params)
    }
}

pub trait GraphStore: Send + Sync {
    fn name(&self) -> &'static str;

    fn health_check(&self) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Runs every statement in `query` and returns the rows of the last one.
    fn execute(&self, query: GraphQuery) -> BoxFuture<'_, Result<Vec<Row>, StoreError>>;
}

pub fn decode_rows<T>(rows: Vec<Row>, kind: &'static str) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
{
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<T>(Value::Object(row)).map_err(|err| StoreError::Decode {
                kind,
                message: err.to_string(),
            })
        })
        .collect()
}
