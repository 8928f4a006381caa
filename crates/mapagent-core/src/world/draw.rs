use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Last freehand drawing / viewport report from the map widget.
///
/// The payload is opaque to the core and only ever compared by structural
/// equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawInfo(pub Value);

impl DrawInfo {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for DrawInfo {
    fn from(payload: Value) -> Self {
        Self(payload)
    }
}
