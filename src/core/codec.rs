//! Token wire-format codec.
//!
//! Handles splitting a raw JWT string into its three parts (header,
//! payload, signature), base64url-decoding the header and payload into
//! ordered claim maps, and re-encoding a decoded token back to compact
//! wire form.
//!
//! Decoding is deliberately permissive: attacker-controlled tokens with
//! 0-2 `=` padding characters are accepted. Re-encoding always emits
//! compact JSON without padding, so `encode(decode(t))` normalizes any
//! whitespace or padding variation in `t` while preserving the original
//! claim insertion order. This canonicalization is intentional.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

use crate::error::JwtProbeError;

/// base64url engine that accepts both padded and unpadded input.
///
/// The JWT wire format strips padding, but tampered or hand-built tokens
/// frequently carry it. Lengths of `4n + 1` are still rejected.
const URL_SAFE_FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The immutable three-segment wire form of a JWT.
///
/// Re-joining the segments with `.` always reproduces a syntactically
/// valid token string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The base64url-encoded header segment.
    pub header_raw: String,
    /// The base64url-encoded payload segment.
    pub payload_raw: String,
    /// The base64url-encoded signature segment (may be empty).
    pub signature_raw: String,
}

impl Token {
    /// Split a raw token string into its three segments.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTokenFormat` unless the string contains exactly
    /// two `.` separators. No segment content is validated here.
    pub fn parse(raw: &str) -> Result<Self, JwtProbeError> {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 {
            return Err(JwtProbeError::InvalidTokenFormat);
        }
        Ok(Self {
            header_raw: parts[0].to_string(),
            payload_raw: parts[1].to_string(),
            signature_raw: parts[2].to_string(),
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.header_raw, self.payload_raw, self.signature_raw
        )
    }
}

/// The decoded working form of a JWT.
///
/// Header and payload are ordered claim maps (`serde_json` is built with
/// `preserve_order`, so key insertion order survives a decode/encode
/// round trip). The signature segment stays opaque and is never parsed.
///
/// Implements a custom `Debug` that redacts `payload` and `signature`
/// to prevent accidental leakage of sensitive claim data.
#[derive(Clone)]
pub struct DecodedToken {
    /// The parsed JWT header (typically contains `alg` and `typ`).
    pub header: Map<String, Value>,
    /// The parsed JWT payload (claims).
    pub payload: Map<String, Value>,
    /// The raw base64url-encoded signature segment.
    pub signature_raw: String,
    /// The wire segments this token was decoded from, kept so signature
    /// verification runs over the exact original bytes even when the
    /// issuer's JSON was not in compact form. Cleared by any mutation.
    raw_segments: Option<(String, String)>,
}

/// Custom `Debug` that redacts payload and signature to prevent
/// accidental leakage through debug formatting or error chains.
impl fmt::Debug for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("header", &self.header)
            .field("payload", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

impl DecodedToken {
    /// Return a copy with the original wire segments forgotten.
    ///
    /// Any operation that changes header or payload content must go
    /// through this, so stale wire bytes never leak into a signature
    /// computation over mutated claims.
    pub fn into_mutated(self) -> Self {
        Self {
            raw_segments: None,
            ..self
        }
    }

    /// The exact bytes a signature for this token is computed over:
    /// `base64url(header) + "." + base64url(payload)`.
    ///
    /// Uses the original wire segments when the token is an unmodified
    /// decode, falling back to compact re-encoding otherwise.
    pub fn signing_input(&self) -> Result<String, JwtProbeError> {
        match &self.raw_segments {
            Some((header_raw, payload_raw)) => Ok(format!("{header_raw}.{payload_raw}")),
            None => {
                let header_raw = encode_segment(&self.header, "header")?;
                let payload_raw = encode_segment(&self.payload, "payload")?;
                Ok(format!("{header_raw}.{payload_raw}"))
            }
        }
    }

    /// The value of the `alg` header claim, if present and a string.
    pub fn algorithm_name(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// Look up a claim by name, checking the header first, then the payload.
    pub fn find_claim(&self, claim: &str) -> Option<&Value> {
        self.header
            .get(claim)
            .or_else(|| self.payload.get(claim))
    }
}

/// Decode a raw JWT string into its constituent parts.
///
/// Splits the token on `.` separators, base64url-decodes the header
/// and payload segments, and parses each as a JSON object. The
/// signature is retained as its raw base64url-encoded string and never
/// parsed.
///
/// # Errors
///
/// Returns `InvalidTokenFormat` if the token doesn't have exactly three
/// parts, and a `MalformedToken`-family error naming the failing segment
/// if base64url decoding, UTF-8 decoding, or JSON parsing fails, or if
/// the decoded top-level value is not an object.
pub fn decode(raw: &str) -> Result<DecodedToken, JwtProbeError> {
    let token = Token::parse(raw)?;

    let header = decode_segment(&token.header_raw, "header")?;
    let payload = decode_segment(&token.payload_raw, "payload")?;

    Ok(DecodedToken {
        header,
        payload,
        signature_raw: token.signature_raw,
        raw_segments: Some((token.header_raw, token.payload_raw)),
    })
}

/// Re-encode a decoded token to wire form.
///
/// Header and payload are serialized as compact JSON (no whitespace,
/// UTF-8, insertion order preserved) and base64url-encoded without
/// padding. The signature segment is carried over verbatim.
pub fn encode(decoded: &DecodedToken) -> Result<Token, JwtProbeError> {
    Ok(Token {
        header_raw: encode_segment(&decoded.header, "header")?,
        payload_raw: encode_segment(&decoded.payload, "payload")?,
        signature_raw: decoded.signature_raw.clone(),
    })
}

/// Base64url-decode a segment and parse it as a JSON object.
fn decode_segment(encoded: &str, segment_name: &str) -> Result<Map<String, Value>, JwtProbeError> {
    let bytes =
        URL_SAFE_FORGIVING
            .decode(encoded)
            .map_err(|_| JwtProbeError::Base64DecodeError {
                segment: segment_name.to_string(),
            })?;

    let text = std::str::from_utf8(&bytes).map_err(|_| JwtProbeError::Utf8DecodeError {
        segment: segment_name.to_string(),
    })?;

    let value: Value =
        serde_json::from_str(text).map_err(|e| JwtProbeError::JsonParseError {
            segment: segment_name.to_string(),
            reason: e.to_string(),
        })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(JwtProbeError::NotAnObject {
            segment: segment_name.to_string(),
        }),
    }
}

/// Serialize a claim map as compact JSON and base64url-encode it without padding.
fn encode_segment(map: &Map<String, Value>, segment_name: &str) -> Result<String, JwtProbeError> {
    let json = serde_json::to_vec(map).map_err(|e| JwtProbeError::JsonSerializeError {
        segment: segment_name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_token_debug_redacts_sensitive_fields() {
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IlRlc3QgVXNlciIsImlhdCI6MTUxNjIzOTAyMn0.\
                     SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";
        let decoded = decode(token).unwrap();
        let debug_output = format!("{:?}", decoded);

        // Header is shown (not sensitive, contains algorithm info)
        assert!(debug_output.contains("HS256"));
        // Payload and signature are redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("1234567890"));
        assert!(!debug_output.contains("Test User"));
        assert!(!debug_output.contains("SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c"));
    }

    #[test]
    fn test_decode_valid_hs256_token() {
        // Header: {"alg":"HS256","typ":"JWT"}
        // Payload: {"sub":"1234567890","name":"Test User","iat":1516239022}
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IlRlc3QgVXNlciIsImlhdCI6MTUxNjIzOTAyMn0.\
                     SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";

        let decoded = decode(token).unwrap();

        assert_eq!(decoded.header["alg"], "HS256");
        assert_eq!(decoded.header["typ"], "JWT");
        assert_eq!(decoded.payload["sub"], "1234567890");
        assert_eq!(decoded.payload["name"], "Test User");
        assert_eq!(decoded.payload["iat"], 1516239022);
        assert_eq!(
            decoded.signature_raw,
            "SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c"
        );
    }

    #[test]
    fn test_decode_accepts_padded_segments() {
        // {"alg":"none"} encodes to eyJhbGciOiJub25lIn0 (19 chars, needs one '=')
        let decoded = decode("eyJhbGciOiJub25lIn0=.e30.").unwrap();
        assert_eq!(decoded.header["alg"], "none");
    }

    #[test]
    fn test_decode_token_with_two_parts_fails() {
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxMjM0In0";
        let err = decode(token).unwrap_err();
        assert!(matches!(err, JwtProbeError::InvalidTokenFormat));
    }

    #[test]
    fn test_decode_token_with_one_part_fails() {
        let err = decode("just-one-part").unwrap_err();
        assert!(matches!(err, JwtProbeError::InvalidTokenFormat));
    }

    #[test]
    fn test_decode_token_with_four_parts_fails() {
        let err = decode("a.b.c.d").unwrap_err();
        assert!(matches!(err, JwtProbeError::InvalidTokenFormat));
    }

    #[test]
    fn test_decode_token_empty_string_fails() {
        let err = decode("").unwrap_err();
        assert!(matches!(err, JwtProbeError::InvalidTokenFormat));
    }

    #[test]
    fn test_decode_token_invalid_base64_header_fails() {
        let err = decode("!!!invalid!!!.eyJzdWIiOiIxMjM0In0.sig").unwrap_err();
        assert!(matches!(
            err,
            JwtProbeError::Base64DecodeError { segment } if segment == "header"
        ));
    }

    #[test]
    fn test_decode_token_invalid_base64_payload_fails() {
        // Valid base64 header, invalid base64 payload
        let err = decode("eyJhbGciOiJIUzI1NiJ9.!!!invalid!!!.sig").unwrap_err();
        assert!(matches!(
            err,
            JwtProbeError::Base64DecodeError { segment } if segment == "payload"
        ));
    }

    #[test]
    fn test_decode_token_length_one_mod_four_fails() {
        // 5 characters: 5 % 4 == 1, not decodable under any padding
        let err = decode("eyJhb.eyJzdWIiOiIxMjM0In0.sig").unwrap_err();
        assert!(matches!(
            err,
            JwtProbeError::Base64DecodeError { segment } if segment == "header"
        ));
    }

    #[test]
    fn test_decode_token_invalid_utf8_payload_fails() {
        // base64url of 0xFF 0xFE 0xFD: invalid UTF-8 after decoding
        let err = decode("eyJhbGciOiJIUzI1NiJ9.__79.sig").unwrap_err();
        assert!(matches!(
            err,
            JwtProbeError::Utf8DecodeError { segment } if segment == "payload"
        ));
    }

    #[test]
    fn test_decode_token_invalid_json_header_fails() {
        // bm90IGpzb24 is base64url("not json")
        let err = decode("bm90IGpzb24.eyJzdWIiOiIxMjM0In0.sig").unwrap_err();
        assert!(matches!(
            err,
            JwtProbeError::JsonParseError { segment, .. } if segment == "header"
        ));
    }

    #[test]
    fn test_decode_token_non_object_payload_fails() {
        // WyJhIl0 is base64url("[\"a\"]"), valid JSON but not an object
        let err = decode("eyJhbGciOiJIUzI1NiJ9.WyJhIl0.sig").unwrap_err();
        assert!(matches!(
            err,
            JwtProbeError::NotAnObject { segment } if segment == "payload"
        ));
    }

    #[test]
    fn test_decode_token_with_empty_payload_object() {
        // Header: {"alg":"none"}, Payload: {}
        let token = "eyJhbGciOiJub25lIn0.e30.";
        let decoded = decode(token).unwrap();
        assert_eq!(decoded.header["alg"], "none");
        assert!(decoded.payload.is_empty());
        assert_eq!(decoded.signature_raw, "");
    }

    #[test]
    fn test_encode_decode_round_trip_is_byte_identical_for_compact_tokens() {
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IlRlc3QgVXNlciIsImlhdCI6MTUxNjIzOTAyMn0.\
                     SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";
        let decoded = decode(token).unwrap();
        let encoded = encode(&decoded).unwrap();
        assert_eq!(encoded.to_string(), token);
    }

    #[test]
    fn test_encode_normalizes_padded_input() {
        let decoded = decode("eyJhbGciOiJub25lIn0=.e30.").unwrap();
        let encoded = encode(&decoded).unwrap();
        // Padding is stripped on re-encoding
        assert_eq!(encoded.to_string(), "eyJhbGciOiJub25lIn0.e30.");
    }

    #[test]
    fn test_encode_preserves_claim_order() {
        // Payload {"z":1,"a":2}: insertion order must survive, not be sorted
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJ6IjoxLCJhIjoyfQ.sig";
        let decoded = decode(token).unwrap();
        let keys: Vec<&String> = decoded.payload.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);

        let encoded = encode(&decoded).unwrap();
        assert_eq!(encoded.payload_raw, "eyJ6IjoxLCJhIjoyfQ");
    }

    #[test]
    fn test_signing_input_uses_original_segments() {
        // Non-compact payload JSON ( {"sub": "1"} with a space) still
        // verifies against its original bytes
        let payload_spaced = URL_SAFE_NO_PAD.encode(b"{\"sub\": \"1\"}");
        let raw = format!("eyJhbGciOiJIUzI1NiJ9.{payload_spaced}.sig");
        let decoded = decode(&raw).unwrap();
        assert_eq!(
            decoded.signing_input().unwrap(),
            format!("eyJhbGciOiJIUzI1NiJ9.{payload_spaced}")
        );
    }

    #[test]
    fn test_signing_input_recomputed_after_mutation() {
        let payload_spaced = URL_SAFE_NO_PAD.encode(b"{\"sub\": \"1\"}");
        let raw = format!("eyJhbGciOiJIUzI1NiJ9.{payload_spaced}.sig");
        let decoded = decode(&raw).unwrap().into_mutated();
        // After mutation the input is the compact re-encoding
        let compact = URL_SAFE_NO_PAD.encode(b"{\"sub\":\"1\"}");
        assert_eq!(
            decoded.signing_input().unwrap(),
            format!("eyJhbGciOiJIUzI1NiJ9.{compact}")
        );
    }

    #[test]
    fn test_find_claim_prefers_header() {
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxMjM0In0.sig";
        let decoded = decode(token).unwrap();
        assert_eq!(
            decoded.find_claim("alg").and_then(Value::as_str),
            Some("HS256")
        );
        assert_eq!(
            decoded.find_claim("sub").and_then(Value::as_str),
            Some("1234")
        );
        assert!(decoded.find_claim("missing").is_none());
    }
}
