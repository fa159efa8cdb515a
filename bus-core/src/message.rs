//! Message envelope for bus traffic

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Message envelope
///
/// The wire format is a JSON object carrying a `type` discriminator and an
/// optional `data` payload. Anything else in the object (`context` and
/// whatever satellites attach) is not interpreted here but must survive
/// re-serialization, so it is captured in a flattened passthrough map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Message type discriminator
    #[serde(rename = "type")]
    pub msg_type: String,

    /// Payload mapping (string keys, arbitrary JSON values)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// Fields this module does not interpret
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl BusMessage {
    /// Create a new message with an empty payload
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            data: None,
            rest: Map::new(),
        }
    }

    /// Set the payload
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Parse a message from its serialized wire form
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize back to the wire form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Look up a payload field
    pub fn data_value(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }
}
