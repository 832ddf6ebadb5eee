//! Payload tagging between the HTTP surface and the storage layer.
//!
//! Backends only ever see opaque strings. Before a write the payload is
//! validated for its declared format and prefixed with a short format tag
//! (`json` or `xml`); on read the tag is stripped again and turned back
//! into a content type.

use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use shared::config::RequestLimits;
use shared::{Error, Result, TtlSeconds};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadType {
    Json,
    Xml,
}

impl PayloadType {
    pub fn parse(kind: &str) -> Result<Self> {
        match kind {
            "json" => Ok(PayloadType::Json),
            "xml" => Ok(PayloadType::Xml),
            other => Err(Error::Validation(format!(
                "type must be 'json' or 'xml', found '{other}'"
            ))),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            PayloadType::Json => "json",
            PayloadType::Xml => "xml",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            PayloadType::Json => "application/json",
            PayloadType::Xml => "application/xml",
        }
    }
}

/// A payload body together with its declared format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub kind: PayloadType,
    pub body: String,
}

impl Payload {
    pub fn new(kind: PayloadType, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// The string handed to the backend.
    pub fn encode(&self) -> String {
        let mut stored = String::with_capacity(self.kind.tag().len() + self.body.len());
        stored.push_str(self.kind.tag());
        stored.push_str(&self.body);
        stored
    }

    /// Reverse of [`Payload::encode`]. A stored value without a known tag
    /// means the entry was written by something else.
    pub fn decode(stored: &str) -> Result<Self> {
        [PayloadType::Json, PayloadType::Xml]
            .into_iter()
            .find_map(|kind| {
                stored
                    .strip_prefix(kind.tag())
                    .map(|body| Payload::new(kind, body))
            })
            .ok_or_else(|| Error::Internal("cache entry is corrupted".into()))
    }
}

/// One validated write, ready for the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutEntry {
    pub payload: Payload,
    pub ttl: TtlSeconds,
}

#[derive(Debug, Deserialize)]
struct PutRequest {
    puts: Vec<PutObject>,
}

#[derive(Debug, Deserialize)]
struct PutObject {
    #[serde(rename = "type")]
    kind: String,
    // `null` is a legitimate JSON value, so "absent" and "null" must differ.
    #[serde(default, deserialize_with = "present")]
    value: Option<Box<RawValue>>,
    #[serde(default)]
    ttlseconds: u64,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

/// Parse and validate a put request body. Every entry is checked before
/// any is returned, so a single bad entry rejects the whole batch.
pub fn parse_put_request(body: &[u8], limits: &RequestLimits) -> Result<Vec<PutEntry>> {
    let request: PutRequest = serde_json::from_slice(body)
        .map_err(|e| Error::Validation(format!("request body is not valid: {e}")))?;

    if request.puts.is_empty() {
        return Err(Error::Validation("puts must contain at least one value".into()));
    }
    if request.puts.len() > limits.max_num_values {
        return Err(Error::Validation(format!(
            "more keys than allowed: {}",
            limits.max_num_values
        )));
    }

    request
        .puts
        .into_iter()
        .map(|put| to_entry(put, limits))
        .collect()
}

fn to_entry(put: PutObject, limits: &RequestLimits) -> Result<PutEntry> {
    let kind = PayloadType::parse(&put.kind)?;
    let raw = put
        .value
        .ok_or_else(|| Error::Validation("missing value".into()))?;

    let body = match kind {
        PayloadType::Json => raw.get().to_string(),
        PayloadType::Xml => serde_json::from_str::<String>(raw.get())
            .map_err(|_| Error::Validation("xml values must be strings".into()))?,
    };

    if body.len() > limits.max_value_bytes {
        return Err(Error::Validation(format!(
            "value is larger than max allowed size: {}",
            limits.max_value_bytes
        )));
    }

    Ok(PutEntry {
        payload: Payload::new(kind, body),
        ttl: TtlSeconds(put.ttlseconds),
    })
}
