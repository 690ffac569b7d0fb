//! Claim mutation for decoded tokens.
//!
//! Applies a sequence of claim edits (set or remove, on header or
//! payload) to a decoded token, producing a new decoded token. Editing
//! never touches the signature segment: the result is stale relative to
//! the new content, and re-signing is a separate explicit step.
//!
//! Editing never fails. Malformed claim names and arbitrary JSON value
//! shapes are accepted verbatim, since attacker-controlled malformed
//! input is exactly what this tool produces on purpose.

use serde_json::Value;

use crate::core::codec::DecodedToken;

/// Which section of the token an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Header,
    Payload,
}

/// The mutation to perform on the targeted claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Insert or overwrite the claim with the given value.
    Set(Value),
    /// Delete the claim. A no-op when the claim is absent.
    Remove,
}

/// One atomic claim mutation instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimEdit {
    pub target: EditTarget,
    pub claim: String,
    pub op: EditOp,
}

impl ClaimEdit {
    /// Set a header claim.
    pub fn set_header(claim: impl Into<String>, value: Value) -> Self {
        Self {
            target: EditTarget::Header,
            claim: claim.into(),
            op: EditOp::Set(value),
        }
    }

    /// Set a payload claim.
    pub fn set_payload(claim: impl Into<String>, value: Value) -> Self {
        Self {
            target: EditTarget::Payload,
            claim: claim.into(),
            op: EditOp::Set(value),
        }
    }

    /// Remove a header claim.
    pub fn remove_header(claim: impl Into<String>) -> Self {
        Self {
            target: EditTarget::Header,
            claim: claim.into(),
            op: EditOp::Remove,
        }
    }

    /// Remove a payload claim.
    pub fn remove_payload(claim: impl Into<String>) -> Self {
        Self {
            target: EditTarget::Payload,
            claim: claim.into(),
            op: EditOp::Remove,
        }
    }
}

/// Apply a sequence of edits to copies of the token's claim maps.
///
/// Edits are applied in order. `Set` overwrites an existing claim in
/// place (its position in the map is preserved) or appends a new one;
/// `Remove` shifts later claims up rather than swapping, so claim order
/// stays stable for diffing. The signature segment is carried over
/// untouched.
pub fn apply_edits(decoded: &DecodedToken, edits: &[ClaimEdit]) -> DecodedToken {
    let mut result = decoded.clone().into_mutated();

    for edit in edits {
        let map = match edit.target {
            EditTarget::Header => &mut result.header,
            EditTarget::Payload => &mut result.payload,
        };
        match &edit.op {
            EditOp::Set(value) => {
                map.insert(edit.claim.clone(), value.clone());
            }
            EditOp::Remove => {
                map.shift_remove(&edit.claim);
            }
        }
    }

    result
}
