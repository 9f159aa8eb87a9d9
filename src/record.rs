//! Stream records: a fixed envelope plus an open-ended payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One event as delivered by the stream.
///
/// Everything except `payload` is envelope metadata and is stored together
/// in the envelope column. `payload` becomes one column per field when it
/// is a JSON object; any other shape contributes no payload columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    pub data_core_id: String,
    pub event_id: String,
    pub event_type: String,
    pub flow_type: String,
    pub metadata: Map<String, JsonValue>,
    pub time_bucket: String,
    pub valid_time: String,
    pub payload: Option<JsonValue>,
}

/// Borrowed view of a record's envelope fields, serialized in a fixed order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<'a> {
    pub data_core_id: &'a str,
    pub event_id: &'a str,
    pub event_type: &'a str,
    pub flow_type: &'a str,
    pub metadata: &'a Map<String, JsonValue>,
    pub time_bucket: &'a str,
    pub valid_time: &'a str,
}

impl Record {
    /// Record with the given event id and payload; other envelope fields are empty.
    #[must_use]
    pub fn with_payload(event_id: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            event_id: event_id.into(),
            payload: Some(payload),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn envelope(&self) -> Envelope<'_> {
        Envelope {
            data_core_id: &self.data_core_id,
            event_id: &self.event_id,
            event_type: &self.event_type,
            flow_type: &self.flow_type,
            metadata: &self.metadata,
            time_bucket: &self.time_bucket,
            valid_time: &self.valid_time,
        }
    }

    /// Envelope as JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be serialized.
    pub fn envelope_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.envelope())
    }

    /// Payload fields, in the order they appear in the record.
    ///
    /// `None` when there is no payload or it is not an object.
    #[must_use]
    pub fn payload_fields(&self) -> Option<&Map<String, JsonValue>> {
        self.payload.as_ref().and_then(JsonValue::as_object)
    }
}
