use serde::Deserialize;
use serde_json::Value;

/// Canonical record collection handed to every consumer.
pub type Records = Vec<Value>;

/// Response envelopes the dashboard endpoints are known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseShape {
    // Tried first: derived struct variants would also accept a sequence.
    Bare(Records),
    Assets { assets: Records },
    Data { data: Records },
}

impl ResponseShape {
    fn into_records(self) -> Records {
        match self {
            ResponseShape::Bare(records) => records,
            ResponseShape::Assets { assets } => assets,
            ResponseShape::Data { data } => data,
        }
    }
}

/// Collapse a decoded response body into the canonical collection.
/// Anything that is not one of the known envelopes becomes an empty list.
pub fn normalize(body: Value) -> Records {
    serde_json::from_value::<ResponseShape>(body)
        .map(ResponseShape::into_records)
        .unwrap_or_default()
}
