//! Object-created notification envelope:
//! `{"Records":[{"s3":{"object":{"key":"<filename>"}}}]}`

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Envelope is not valid JSON: {0}")]
    Json(String),

    #[error("Envelope has no Records")]
    NoRecords,

    #[error("Envelope object key is empty")]
    EmptyKey,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Records", default)]
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    #[serde(default)]
    s3: S3Entity,
}

#[derive(Deserialize, Default)]
struct S3Entity {
    #[serde(default)]
    object: S3Object,
}

#[derive(Deserialize, Default)]
struct S3Object {
    #[serde(default)]
    key: String,
}

/// Key of the first record's object
pub fn object_key(body: &str) -> Result<String, EnvelopeError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| EnvelopeError::Json(e.to_string()))?;
    let record = envelope.records.first().ok_or(EnvelopeError::NoRecords)?;
    let key = record.s3.object.key.trim();
    if key.is_empty() {
        return Err(EnvelopeError::EmptyKey);
    }
    Ok(key.to_string())
}
