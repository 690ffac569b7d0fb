//! Key material loading and representation.
//!
//! Parses PEM-encoded RSA and EC (P-256/P-384) keys and wraps them,
//! together with symmetric secrets, in the tagged [`KeyMaterial`] union
//! the signer operates on. Parsed asymmetric public keys retain their
//! PEM text, because several attacks reuse those exact bytes (e.g. as
//! an HMAC secret for algorithm confusion).

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{Value, json};

use crate::error::JwtProbeError;

/// Key material for signing or verification, tagged by shape.
#[derive(Clone)]
pub enum KeyMaterial {
    /// Raw secret bytes for the HMAC family.
    Symmetric(Vec<u8>),
    /// A private key for the RSA/ECDSA families.
    AsymmetricPrivate(PrivateKey),
    /// A public key for the RSA/ECDSA families (verification only).
    AsymmetricPublic(PublicKey),
}

impl KeyMaterial {
    /// Human-readable shape name, used in `KeyShapeMismatch` messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            KeyMaterial::Symmetric(_) => "a symmetric secret",
            KeyMaterial::AsymmetricPrivate(_) => "an asymmetric private key",
            KeyMaterial::AsymmetricPublic(_) => "an asymmetric public key",
        }
    }

    /// Whether this counts as "no key material" for `none`-algorithm signing.
    pub fn is_empty(&self) -> bool {
        matches!(self, KeyMaterial::Symmetric(bytes) if bytes.is_empty())
    }
}

/// Custom `Debug` that redacts the actual key bytes.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape_name())
    }
}

/// A parsed asymmetric private key.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

/// Custom `Debug` that shows the key family, never the key itself.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKey::Rsa(_) => f.write_str("PrivateKey::Rsa"),
            PrivateKey::P256(_) => f.write_str("PrivateKey::P256"),
            PrivateKey::P384(_) => f.write_str("PrivateKey::P384"),
        }
    }
}

impl PrivateKey {
    /// Parse a PEM-encoded private key.
    ///
    /// Tries RSA (PKCS#8, then PKCS#1) and EC P-256/P-384 (PKCS#8, then
    /// SEC1) in turn.
    pub fn from_pem(pem: &str) -> Result<Self, JwtProbeError> {
        if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
            return Ok(PrivateKey::Rsa(key));
        }
        if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(pem) {
            return Ok(PrivateKey::Rsa(key));
        }
        if let Ok(secret) = p256::SecretKey::from_pkcs8_pem(pem) {
            return Ok(PrivateKey::P256(secret.into()));
        }
        if let Ok(secret) = p256::SecretKey::from_sec1_pem(pem) {
            return Ok(PrivateKey::P256(secret.into()));
        }
        if let Ok(secret) = p384::SecretKey::from_pkcs8_pem(pem) {
            return Ok(PrivateKey::P384(secret.into()));
        }
        if let Ok(secret) = p384::SecretKey::from_sec1_pem(pem) {
            return Ok(PrivateKey::P384(secret.into()));
        }
        Err(JwtProbeError::InvalidKeyPem {
            reason: "not a supported RSA or EC (P-256/P-384) private key".to_string(),
        })
    }

    /// Read and parse a PEM private key file.
    pub fn from_pem_file(path: &Path) -> Result<Self, JwtProbeError> {
        let pem = read_key_file(path)?;
        Self::from_pem(&pem)
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> Result<PublicKey, JwtProbeError> {
        let (kind, pem) = match self {
            PrivateKey::Rsa(key) => {
                let public = key.to_public_key();
                let pem = public
                    .to_public_key_pem(LineEnding::LF)
                    .map_err(|e| JwtProbeError::InvalidKeyPem {
                        reason: e.to_string(),
                    })?;
                (PublicKeyKind::Rsa(public), pem)
            }
            PrivateKey::P256(key) => {
                let public = *key.verifying_key();
                let pem = public
                    .to_public_key_pem(LineEnding::LF)
                    .map_err(|e| JwtProbeError::InvalidKeyPem {
                        reason: e.to_string(),
                    })?;
                (PublicKeyKind::P256(public), pem)
            }
            PrivateKey::P384(key) => {
                let public = *key.verifying_key();
                let pem = public
                    .to_public_key_pem(LineEnding::LF)
                    .map_err(|e| JwtProbeError::InvalidKeyPem {
                        reason: e.to_string(),
                    })?;
                (PublicKeyKind::P384(public), pem)
            }
        };
        Ok(PublicKey { kind, pem })
    }
}

/// A parsed asymmetric public key plus the PEM text it came from.
#[derive(Clone)]
pub struct PublicKey {
    pub kind: PublicKeyKind,
    /// The PEM representation. For keys loaded from a file this is the
    /// file content verbatim; attacks that abuse a verifier's key bytes
    /// (RS→HS confusion) need exactly these bytes.
    pub pem: String,
}

/// The algorithm family of a parsed public key.
#[derive(Clone)]
pub enum PublicKeyKind {
    Rsa(RsaPublicKey),
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PublicKeyKind::Rsa(_) => f.write_str("PublicKey::Rsa"),
            PublicKeyKind::P256(_) => f.write_str("PublicKey::P256"),
            PublicKeyKind::P384(_) => f.write_str("PublicKey::P384"),
        }
    }
}

impl PublicKey {
    /// Parse a PEM-encoded public key (SPKI, then RSA PKCS#1).
    pub fn from_pem(pem: &str) -> Result<Self, JwtProbeError> {
        let kind = if let Ok(key) = RsaPublicKey::from_public_key_pem(pem) {
            PublicKeyKind::Rsa(key)
        } else if let Ok(key) = RsaPublicKey::from_pkcs1_pem(pem) {
            PublicKeyKind::Rsa(key)
        } else if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_pem(pem) {
            PublicKeyKind::P256(key)
        } else if let Ok(key) = p384::ecdsa::VerifyingKey::from_public_key_pem(pem) {
            PublicKeyKind::P384(key)
        } else {
            return Err(JwtProbeError::InvalidKeyPem {
                reason: "not a supported RSA or EC (P-256/P-384) public key".to_string(),
            });
        };
        Ok(Self {
            kind,
            pem: pem.to_string(),
        })
    }

    /// Read and parse a PEM public key file.
    pub fn from_pem_file(path: &Path) -> Result<Self, JwtProbeError> {
        let pem = read_key_file(path)?;
        Self::from_pem(&pem)
    }

    /// The PEM bytes, as fed to a confused verifier's HMAC.
    pub fn pem_bytes(&self) -> &[u8] {
        self.pem.as_bytes()
    }

    /// Render this key as a public JSON Web Key object.
    pub fn to_jwk(&self) -> Value {
        match &self.kind {
            PublicKeyKind::Rsa(key) => json!({
                "kty": "RSA",
                "n": URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
            }),
            PublicKeyKind::P256(key) => {
                let point = key.to_encoded_point(false);
                json!({
                    "kty": "EC",
                    "crv": "P-256",
                    "x": URL_SAFE_NO_PAD.encode(point.x().map(|x| x.to_vec()).unwrap_or_default()),
                    "y": URL_SAFE_NO_PAD.encode(point.y().map(|y| y.to_vec()).unwrap_or_default()),
                })
            }
            PublicKeyKind::P384(key) => {
                let point = key.to_encoded_point(false);
                json!({
                    "kty": "EC",
                    "crv": "P-384",
                    "x": URL_SAFE_NO_PAD.encode(point.x().map(|x| x.to_vec()).unwrap_or_default()),
                    "y": URL_SAFE_NO_PAD.encode(point.y().map(|y| y.to_vec()).unwrap_or_default()),
                })
            }
        }
    }
}

/// Read a key file, mapping I/O failures to a path-carrying error.
fn read_key_file(path: &Path) -> Result<String, JwtProbeError> {
    std::fs::read_to_string(path).map_err(|e| JwtProbeError::KeyFileError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_material_debug_redacts_bytes() {
        let key = KeyMaterial::Symmetric(b"super-secret".to_vec());
        assert_eq!(format!("{:?}", key), "a symmetric secret");
    }

    #[test]
    fn test_empty_symmetric_key_is_empty() {
        assert!(KeyMaterial::Symmetric(Vec::new()).is_empty());
        assert!(!KeyMaterial::Symmetric(b"x".to_vec()).is_empty());
    }

    #[test]
    fn test_garbage_pem_is_rejected() {
        let err = PrivateKey::from_pem("not a pem at all").unwrap_err();
        assert!(matches!(err, JwtProbeError::InvalidKeyPem { .. }));

        let err = PublicKey::from_pem("-----BEGIN GARBAGE-----\nAAAA\n-----END GARBAGE-----\n")
            .unwrap_err();
        assert!(matches!(err, JwtProbeError::InvalidKeyPem { .. }));
    }

    #[test]
    fn test_missing_key_file_reports_path() {
        let err = PrivateKey::from_pem_file(Path::new("/nonexistent/key.pem")).unwrap_err();
        assert!(matches!(
            err,
            JwtProbeError::KeyFileError { path, .. } if path == "/nonexistent/key.pem"
        ));
    }

    #[test]
    fn test_round_trip_public_key_pem_from_private() {
        let mut rng = rand::thread_rng();
        let private = PrivateKey::Rsa(RsaPrivateKey::new(&mut rng, 2048).unwrap());
        let public = private.public_key().unwrap();

        assert!(public.pem.contains("BEGIN PUBLIC KEY"));
        // The derived PEM parses back to the same key
        let reparsed = PublicKey::from_pem(&public.pem).unwrap();
        assert!(matches!(reparsed.kind, PublicKeyKind::Rsa(_)));
    }

    #[test]
    fn test_rsa_jwk_has_modulus_and_exponent() {
        let mut rng = rand::thread_rng();
        let private = PrivateKey::Rsa(RsaPrivateKey::new(&mut rng, 2048).unwrap());
        let jwk = private.public_key().unwrap().to_jwk();

        assert_eq!(jwk["kty"], "RSA");
        assert!(!jwk["n"].as_str().unwrap().is_empty());
        assert!(!jwk["e"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_ec_jwk_has_coordinates() {
        let signing = p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
        let private = PrivateKey::P256(signing);
        let jwk = private.public_key().unwrap().to_jwk();

        assert_eq!(jwk["kty"], "EC");
        assert_eq!(jwk["crv"], "P-256");
        // Uncompressed P-256 coordinates are 32 bytes, 43 base64url chars
        assert_eq!(jwk["x"].as_str().unwrap().len(), 43);
        assert_eq!(jwk["y"].as_str().unwrap().len(), 43);
    }
}
