use std::{convert::TryFrom, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request parameters.
///
/// Either by-position through an array or by-name through an object.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Positional params.
    Array(Vec<Value>),
    /// Params by name.
    Map(Map<String, Value>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Array(Vec::new())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).expect("`Params` is serializable");
        write!(f, "{}", json)
    }
}

impl Params {
    /// Checks if the parameters is an empty array.
    pub fn is_empty_array(&self) -> bool {
        matches!(self, Params::Array(array) if array.is_empty())
    }

    /// Checks if the parameters is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Params::Array(_))
    }

    /// Checks if the parameters is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Params::Map(_))
    }
}

impl From<Vec<Value>> for Params {
    fn from(params: Vec<Value>) -> Self {
        Self::Array(params)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(params: Map<String, Value>) -> Self {
        Self::Map(params)
    }
}

/// Only arrays and objects are structured values; anything else is handed back.
impl TryFrom<Value> for Params {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(array) => Ok(Params::Array(array)),
            Value::Object(object) => Ok(Params::Map(object)),
            other => Err(other),
        }
    }
}

impl From<Params> for Value {
    fn from(params: Params) -> Value {
        match params {
            Params::Array(array) => Value::Array(array),
            Params::Map(object) => Value::Object(object),
        }
    }
}
