//! Shared test fixtures and helper utilities.
//!
//! Provides pre-built JWT tokens with known claims for use in
//! integration tests.
#![allow(dead_code)]

use std::io::Write;

/// A valid HS256-signed JWT for testing.
///
/// Header: `{"alg":"HS256","typ":"JWT"}`
/// Payload: `{"sub":"1234567890","name":"Test User","iat":1516239022}`
/// Secret: `"your-256-bit-secret"`
pub const VALID_HS256_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IlRlc3QgVXNlciIsImlhdCI6MTUxNjIzOTAyMn0.\
     drDhO00ywU1JZtnkHkIkI0Dni1d3HZ1mtPTf3PLfyeY";

/// The HMAC secret [`VALID_HS256_TOKEN`] is signed with.
pub const VALID_HS256_SECRET: &str = "your-256-bit-secret";

/// A malformed token with only two parts (missing signature).
pub const MALFORMED_TOKEN_TWO_PARTS: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxMjM0NTY3ODkwIn0";

/// A completely invalid token string.
pub const INVALID_TOKEN: &str = "not-a-valid-jwt";

/// Path to the test RSA public key fixture.
pub const RSA_PUBLIC_KEY_PATH: &str = "tests/fixtures/rsa_public.pem";

/// Path to the test RSA private key fixture.
pub const RSA_PRIVATE_KEY_PATH: &str = "tests/fixtures/rsa_private.pem";

/// Path to the test EC public key fixture.
pub const EC_PUBLIC_KEY_PATH: &str = "tests/fixtures/ec_public.pem";

/// Path to the test EC private key fixture.
pub const EC_PRIVATE_KEY_PATH: &str = "tests/fixtures/ec_private.pem";

/// Create an HS256-signed token with the given claims.
pub fn create_hs256_token(secret: &str, claims: &serde_json::Value) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&header, claims, &key).unwrap()
}

/// Create an RS256-signed token using the test RSA private key.
pub fn create_rs256_token(claims: &serde_json::Value) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    let private_key = std::fs::read(RSA_PRIVATE_KEY_PATH).unwrap();
    let header = Header::new(Algorithm::RS256);
    let key = EncodingKey::from_rsa_pem(&private_key).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// Standard test claims used across tests.
pub fn standard_claims() -> serde_json::Value {
    serde_json::json!({
        "sub": "1234567890",
        "name": "Test User",
        "iat": 1516239022
    })
}

/// Write a wordlist file with one candidate per line.
pub fn write_wordlist(candidates: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for candidate in candidates {
        writeln!(file, "{candidate}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// Decode a base64url token segment into a JSON value.
pub fn decode_segment(segment: &str) -> serde_json::Value {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    let bytes = URL_SAFE_NO_PAD.decode(segment).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
