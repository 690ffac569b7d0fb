//! Domain error types for jwt-probe.
//!
//! All business-logic errors are defined here using `thiserror`.
//! These errors are converted to user-friendly messages at the CLI boundary;
//! the core never prints or exits on its own.

use thiserror::Error;

/// Errors that can occur during JWT probing operations.
///
/// Every variant maps to a distinct, stable message naming exactly which
/// segment, claim, or algorithm was implicated, so scripted consumers can
/// match on the output.
#[derive(Debug, Error)]
pub enum JwtProbeError {
    /// The provided token does not have the expected three-part structure.
    #[error("invalid token format: expected 'header.payload.signature' structure")]
    InvalidTokenFormat,

    /// Failed to decode a base64url-encoded token segment.
    #[error("failed to decode {segment}: invalid base64url encoding")]
    Base64DecodeError {
        /// Which segment failed to decode (e.g., "header", "payload").
        segment: String,
    },

    /// A decoded segment is not valid UTF-8.
    #[error("failed to decode {segment}: invalid UTF-8")]
    Utf8DecodeError {
        /// Which segment failed to decode.
        segment: String,
    },

    /// Failed to parse decoded segment content as JSON.
    #[error("failed to parse {segment} as JSON: {reason}")]
    JsonParseError {
        /// Which segment failed to parse (e.g., "header", "payload").
        segment: String,
        /// Description of the parsing failure.
        reason: String,
    },

    /// A decoded segment parsed as JSON, but its top level is not an object.
    #[error("decoded {segment} is not a JSON object")]
    NotAnObject {
        /// Which segment had a non-object top-level value.
        segment: String,
    },

    /// Failed to re-serialize a token segment to compact JSON.
    #[error("failed to serialize {segment} as JSON: {reason}")]
    JsonSerializeError {
        /// Which segment failed to serialize.
        segment: String,
        /// Description of the serialization failure.
        reason: String,
    },

    /// The specified algorithm name is not supported.
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The algorithm name that was encountered.
        algorithm: String,
    },

    /// The supplied key material does not match the shape the algorithm requires.
    ///
    /// This signals a caller programming error, distinct from a failed
    /// verification attempt (which is a plain `false`).
    #[error("key shape mismatch for {algorithm}: expected {expected}, got {supplied}")]
    KeyShapeMismatch {
        /// The algorithm that was requested.
        algorithm: String,
        /// The key shape the algorithm requires.
        expected: String,
        /// The key shape that was actually supplied.
        supplied: String,
    },

    /// Non-empty key material was supplied for the `none` algorithm.
    #[error("the 'none' algorithm takes no key material, but a non-empty key was supplied")]
    UnsupportedKey,

    /// A specifically requested claim exists in neither header nor payload.
    #[error("the claim '{claim}' was not found in either header or payload")]
    ClaimNotFound {
        /// Name of the missing claim.
        claim: String,
    },

    /// I/O failure while streaming the candidate key source mid-search.
    ///
    /// Fatal to the search invocation: reported as a failure rather than a
    /// false "no key found".
    #[error("failed reading candidate source '{origin}': {reason}")]
    CandidateSourceError {
        /// Description of the candidate source (path or "single key").
        origin: String,
        /// Description of the I/O failure.
        reason: String,
    },

    /// Failed to read the provided key file.
    #[error("failed to read key file '{path}': {reason}")]
    KeyFileError {
        /// Path to the key file.
        path: String,
        /// Description of the read failure.
        reason: String,
    },

    /// The provided PEM data could not be parsed as any supported key type.
    #[error("failed to parse key material: {reason}")]
    InvalidKeyPem {
        /// Description of the parsing failure.
        reason: String,
    },

    /// A claim edit expression was not of the form NAME=VALUE.
    #[error("invalid edit expression '{expression}': expected NAME=VALUE")]
    InvalidEditExpression {
        /// The offending expression.
        expression: String,
    },

    /// Failure while dispatching a forged token to a target URL.
    #[error("failed to dispatch to '{url}': {reason}")]
    HttpDispatchError {
        /// The target URL.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The specified environment variable is not set.
    #[error("environment variable '{name}' is not set")]
    EnvVarNotFound {
        /// Name of the missing environment variable.
        name: String,
    },

    /// No token was provided via any input method.
    #[error("no token provided: pass a token as an argument, via --token-env, or through stdin")]
    NoTokenProvided,
}
