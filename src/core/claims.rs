//! Claim name dictionary.
//!
//! Maps registered claim names to short human descriptions, used when
//! rendering tokens. A dictionary file can extend or replace the
//! built-in set; unknown claims fall back to a generic label.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::JwtProbeError;

/// Label returned for claims the dictionary does not know.
pub const CUSTOM_CLAIM: &str = "custom claim";

/// On-disk dictionary format: `{"claims": {"iss": "...", ...}}`.
#[derive(Deserialize)]
struct DictionaryFile {
    claims: HashMap<String, String>,
}

/// Claim name to description lookup. Lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct ClaimDictionary {
    entries: HashMap<String, String>,
}

impl ClaimDictionary {
    /// The registered claim names of RFC 7519 plus the common JOSE
    /// header parameters.
    pub fn builtin() -> Self {
        let entries = [
            ("iss", "issuer of the token"),
            ("sub", "subject of the token"),
            ("aud", "intended audience"),
            ("exp", "expiration time"),
            ("nbf", "not valid before"),
            ("iat", "issued at"),
            ("jti", "unique token identifier"),
            ("alg", "signing algorithm"),
            ("typ", "token type"),
            ("cty", "content type"),
            ("kid", "key identifier"),
            ("jku", "JWK Set URL"),
            ("jwk", "embedded JSON Web Key"),
            ("x5u", "X.509 certificate URL"),
            ("x5t", "X.509 certificate thumbprint"),
        ]
        .into_iter()
        .map(|(name, description)| (name.to_string(), description.to_string()))
        .collect();
        ClaimDictionary { entries }
    }

    /// Load a dictionary from a JSON file.
    ///
    /// Keys are normalized to lowercase at load time so that lookups
    /// stay case-insensitive regardless of how the file spells them.
    pub fn from_file(path: &Path) -> Result<Self, JwtProbeError> {
        let content = fs::read_to_string(path).map_err(|e| JwtProbeError::KeyFileError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file: DictionaryFile =
            serde_json::from_str(&content).map_err(|e| JwtProbeError::JsonParseError {
                segment: "claim dictionary".to_string(),
                reason: e.to_string(),
            })?;
        let entries = file
            .claims
            .into_iter()
            .map(|(name, description)| (name.to_lowercase(), description))
            .collect();
        Ok(ClaimDictionary { entries })
    }

    /// Load from a file, falling back to the built-in set when the file
    /// is absent. A present but malformed file is still an error.
    pub fn from_file_or_builtin(path: &Path) -> Result<Self, JwtProbeError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// Description for a claim name, or the custom-claim label.
    pub fn lookup(&self, claim: &str) -> &str {
        self.entries
            .get(&claim.to_lowercase())
            .map(String::as_str)
            .unwrap_or(CUSTOM_CLAIM)
    }
}
