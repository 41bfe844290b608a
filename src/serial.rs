//! Binary snapshots of compiled rule sets.
//!
//! A snapshot lets a store keep a [`RuleSet`](crate::RuleSet) without
//! re-parsing its tabular document. The format is a 32-byte fixed header
//! followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"RGRD"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! decoding fails with [`DeserializeError::IncompatibleVersion`]. The engine
//! version is informational only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ColumnDefinitions, Metadata, Rule, RuleSet};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"RGRD";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when encoding a [`RuleSet`](crate::RuleSet).
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule set: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("rule set too large to snapshot: {0} bytes")]
    TooLarge(usize),
}

/// Errors that can occur when decoding a [`RuleSet`](crate::RuleSet) snapshot.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a rule set snapshot: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    counts: SnapshotCounts,
    metadata: Metadata,
    rules: Vec<Rule>,
    definitions: ColumnDefinitions,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotCounts {
    rule_count: usize,
    column_count: usize,
}

fn to_snapshot(rule_set: &RuleSet) -> Snapshot {
    Snapshot {
        counts: SnapshotCounts {
            rule_count: rule_set.rules.len(),
            column_count: rule_set.definitions.len(),
        },
        metadata: rule_set.metadata.clone(),
        rules: rule_set.rules.clone(),
        definitions: rule_set.definitions.clone(),
    }
}

fn from_snapshot(snapshot: Snapshot) -> Result<RuleSet, DeserializeError> {
    validate(&snapshot)?;
    Ok(RuleSet {
        metadata: snapshot.metadata,
        rules: snapshot.rules,
        definitions: snapshot.definitions,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A decoded snapshot must look like something [`RuleSet::new`] produced.
fn validate(snapshot: &Snapshot) -> Result<(), DeserializeError> {
    if snapshot.counts.rule_count != snapshot.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "header says {} rules but payload has {}",
            snapshot.counts.rule_count,
            snapshot.rules.len()
        )));
    }
    if snapshot.counts.column_count != snapshot.definitions.len() {
        return Err(DeserializeError::Validation(format!(
            "header says {} columns but payload has {}",
            snapshot.counts.column_count,
            snapshot.definitions.len()
        )));
    }

    for (position, rule) in snapshot.rules.iter().enumerate() {
        let expected = (position + 1).to_string();
        if rule.index != expected {
            return Err(DeserializeError::Validation(format!(
                "rule at position {position} has index '{}', expected '{expected}'",
                rule.index
            )));
        }
        if rule.is_definition() {
            return Err(DeserializeError::Validation(format!(
                "definition row stored as rule {expected}"
            )));
        }
        if !rule.has_action() {
            return Err(DeserializeError::Validation(format!(
                "rule {expected} has no action"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8], payload_len: u32) {
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] engine version, bytes[8..12] flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(rule_set: &RuleSet) -> Result<Vec<u8>, SerializeError> {
    let payload = bincode::serde::encode_to_vec(to_snapshot(rule_set), bincode::config::standard())?;
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload, payload_len);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() != payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (snapshot, _): (Snapshot, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    from_snapshot(snapshot)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Combinator, RuleSetBuilder, SET_APPLIED_RULES};

    fn sample() -> RuleSet {
        RuleSetBuilder::new("1")
            .class_name("AvailableFlight")
            .combinator(Combinator::Or)
            .general_action(SET_APPLIED_RULES)
            .column("Condition_1", "CabinClass", "Equals")
            .column("Action_1", "MaxPrice", "Set")
            .rule(|r| r.when("Condition_1", "E").then("Action_1", "100"))
            .rule(|r| r.when("Condition_1", "B").then("Action_1", "900"))
            .build()
    }

    fn encode_snapshot(snapshot: &Snapshot) -> Vec<u8> {
        let payload = bincode::serde::encode_to_vec(snapshot, bincode::config::standard()).unwrap();
        let mut buf = Vec::new();
        write_header(&mut buf, &payload, payload.len() as u32);
        buf.extend_from_slice(&payload);
        buf
    }

    #[test]
    fn round_trip() {
        let rule_set = sample();
        let restored = decode(&encode(&rule_set).unwrap()).unwrap();
        assert_eq!(restored, rule_set);
    }

    #[test]
    fn header_layout() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[0..4], b"RGRD");
        let (version, len, hash) = read_header(&bytes).unwrap();
        assert_eq!(version, FORMAT_VERSION);
        assert_eq!(len as usize, bytes.len() - HEADER_SIZE);
        assert_eq!(&hash, &blake3::hash(&bytes[HEADER_SIZE..]).as_bytes()[..16]);
    }

    #[test]
    fn short_input() {
        assert!(matches!(
            decode(b"RGRD"),
            Err(DeserializeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn rejects_count_mismatch() {
        let mut snapshot = to_snapshot(&sample());
        snapshot.counts.rule_count = 5;
        assert!(matches!(
            decode(&encode_snapshot(&snapshot)),
            Err(DeserializeError::Validation(_))
        ));
    }

    #[test]
    fn rejects_unnumbered_rules() {
        let mut snapshot = to_snapshot(&sample());
        snapshot.rules[1].index = "7".into();
        let err = decode(&encode_snapshot(&snapshot)).unwrap_err();
        assert!(err.to_string().contains("expected '2'"));
    }

    #[test]
    fn rejects_actionless_rules() {
        let mut snapshot = to_snapshot(&sample());
        snapshot.rules[0].actions.clear();
        assert!(matches!(
            decode(&encode_snapshot(&snapshot)),
            Err(DeserializeError::Validation(_))
        ));
    }
}
