//! Bridge sanitization.
//!
//! A record whose `input` is a known bridge identifier has that identifier replaced by
//! its SHA-1 fingerprint, its `bridge_address` nulled and the bridge's distribution
//! method attached. Any other occurrence of the identifier or raw address inside the
//! record, keys included, is replaced by the fingerprint too. Unknown records pass through untouched.

pub mod bridge_db;

use crate::constants::{
    BRIDGE_ADDRESS_FIELD, BRIDGE_HASHED_FINGERPRINT_FIELD, DISTRIBUTOR_FIELD, INPUT_FIELD,
};
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use sha1::{Digest, Sha1};
use tracing::warn;

pub use bridge_db::{BridgeDb, BridgeInfo};

/// Deterministic one-way fingerprint of a bridge identifier (lowercase hex SHA-1).
pub fn hash_fingerprint(identifier: &str) -> String {
    hex::encode(Sha1::digest(identifier.as_bytes()))
}

/// Sanitize one header or entry. Never fails; unrecognized records are returned as-is.
pub fn sanitize(record: Mapping, bridge_db: &BridgeDb) -> Mapping {
    let identifier = match record.get(INPUT_FIELD).and_then(Value::as_str) {
        Some(input) => input.to_owned(),
        None => return record,
    };
    let Some(bridge) = bridge_db.get(&identifier) else {
        return record;
    };

    let fingerprint = hash_fingerprint(&identifier);
    let mut secrets = vec![identifier];
    if let Some(address) = record.get(BRIDGE_ADDRESS_FIELD).and_then(Value::as_str) {
        if !address.is_empty() && !secrets.iter().any(|s| s == address) {
            secrets.push(address.to_owned());
        }
    }

    // Rebuild in the original key order; `input` is renamed in place.
    let mut sanitized = Mapping::with_capacity(record.len() + 2);
    for (key, value) in record {
        let (key, value) = if key == INPUT_FIELD {
            (
                Value::from(BRIDGE_HASHED_FINGERPRINT_FIELD),
                Value::from(fingerprint.clone()),
            )
        } else if key == BRIDGE_ADDRESS_FIELD {
            (key, Value::Null)
        } else {
            (
                redact(key, &secrets, &fingerprint),
                redact(value, &secrets, &fingerprint),
            )
        };
        insert_first(&mut sanitized, key, value);
    }

    // downstream consumers rely on bridge_address being present
    sanitized.insert(Value::from(BRIDGE_ADDRESS_FIELD), Value::Null);
    sanitized.insert(
        Value::from(DISTRIBUTOR_FIELD),
        Value::from(bridge.distributor.clone()),
    );
    sanitized
}

fn redact(value: Value, secrets: &[String], replacement: &str) -> Value {
    match value {
        Value::String(s) => {
            let mut s = s;
            for secret in secrets {
                if s.contains(secret.as_str()) {
                    s = s.replace(secret.as_str(), replacement);
                }
            }
            Value::String(s)
        }
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| redact(item, secrets, replacement))
                .collect(),
        ),
        Value::Mapping(map) => {
            let mut redacted = Mapping::with_capacity(map.len());
            for (k, v) in map {
                insert_first(
                    &mut redacted,
                    redact(k, secrets, replacement),
                    redact(v, secrets, replacement),
                );
            }
            Value::Mapping(redacted)
        }
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            Value::Tagged(Box::new(TaggedValue {
                tag,
                value: redact(value, secrets, replacement),
            }))
        }
        other => other,
    }
}

/// Keys that only differed by a secret collapse into one after redaction; the first
/// occurrence keeps its value.
fn insert_first(map: &mut Mapping, key: Value, value: Value) {
    if map.contains_key(&key) {
        warn!("Dropping duplicate key {:?} produced by redaction", key.as_str());
        return;
    }
    map.insert(key, value);
}
