//! Signature computation and verification.
//!
//! Signs a decoded token under a named algorithm, or checks whether a
//! candidate key validates a token's existing signature. Verification
//! here is deliberately a probing primitive, not a safe validator: it
//! answers "does this key produce this signature", nothing about
//! expiry, audience, or whether the algorithm should be trusted.
//!
//! HMAC comparisons are constant-time. ECDSA signatures use the JWT
//! wire convention of raw `r || s` bytes, not ASN.1 DER.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::{Digest, Sha256, Sha384, Sha512};
use signature::{Signer, Verifier};

use crate::core::codec::{self, DecodedToken, Token};
use crate::core::keys::{KeyMaterial, PrivateKey, PublicKey, PublicKeyKind};
use crate::error::JwtProbeError;

/// The signing algorithms this tool can compute, including the
/// deliberately unsafe `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
    None,
}

impl Algorithm {
    /// All supported algorithms, in the order they are documented.
    pub fn all() -> &'static [Algorithm] {
        &[
            Algorithm::HS256,
            Algorithm::HS384,
            Algorithm::HS512,
            Algorithm::RS256,
            Algorithm::RS384,
            Algorithm::RS512,
            Algorithm::ES256,
            Algorithm::ES384,
            Algorithm::None,
        ]
    }

    /// The canonical `alg` header value.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            Algorithm::None => "none",
        }
    }

    /// Parse an algorithm name, case-insensitively.
    ///
    /// Case-insensitive on purpose: tokens under test frequently carry
    /// `None`/`NONE` casing variants, and those still name this family.
    pub fn from_name(name: &str) -> Result<Self, JwtProbeError> {
        Algorithm::all()
            .iter()
            .copied()
            .find(|alg| alg.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| JwtProbeError::UnsupportedAlgorithm {
                algorithm: name.to_string(),
            })
    }

    /// Whether this algorithm signs with a symmetric secret.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
    }

    /// The key shape `sign` requires, for mismatch messages.
    fn required_shape(&self) -> &'static str {
        match self {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => "a symmetric secret",
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::ES256
            | Algorithm::ES384 => "an asymmetric private key",
            Algorithm::None => "no key material",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sign a decoded token, producing a complete wire-form token.
///
/// Sets `header["alg"]` to the algorithm's canonical name, computes the
/// signature over `base64url(header) + "." + base64url(payload)` and
/// appends it base64url-encoded without padding. For `none` the
/// signature segment is empty.
///
/// # Errors
///
/// `KeyShapeMismatch` when the key material's shape doesn't fit the
/// algorithm, `UnsupportedKey` when non-empty key material is supplied
/// for `none`.
pub fn sign(
    decoded: &DecodedToken,
    alg: Algorithm,
    key: &KeyMaterial,
) -> Result<Token, JwtProbeError> {
    let mut prepared = decoded.clone().into_mutated();
    prepared.header.insert("alg".to_string(), json!(alg.name()));

    let signing_input = prepared.signing_input()?;
    let signature = compute_signature(&signing_input, alg, key)?;

    prepared.signature_raw = match signature {
        Some(bytes) => URL_SAFE_NO_PAD.encode(bytes),
        None => String::new(),
    };
    codec::encode(&prepared)
}

/// Check whether `key` validates the token's existing signature under `alg`.
///
/// Returns `Ok(false)` for any mismatch, including undecodable or
/// wrong-size signatures. Raises only when the key material's shape is
/// structurally nonsensical for the algorithm family, which is a caller
/// error rather than a probing result.
pub fn verify(
    decoded: &DecodedToken,
    alg: Algorithm,
    key: &KeyMaterial,
) -> Result<bool, JwtProbeError> {
    if alg == Algorithm::None {
        return Ok(decoded.signature_raw.is_empty());
    }

    // Shape errors must surface even when the signature segment does not
    // decode; an undecodable signature is only ever a plain mismatch.
    check_key_shape(alg, key)?;

    let signing_input = decoded.signing_input()?;
    let Ok(actual) = URL_SAFE_NO_PAD.decode(&decoded.signature_raw) else {
        return Ok(false);
    };

    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            let KeyMaterial::Symmetric(secret) = key else {
                return Err(shape_mismatch(alg, key));
            };
            let expected = hmac_signature(&signing_input, alg, secret)?;
            Ok(expected.len() == actual.len() && constant_time_eq(&expected, &actual))
        }
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
            let public = rsa_public_half(alg, key)?;
            let digest = match alg {
                Algorithm::RS256 => {
                    Sha256::digest(signing_input.as_bytes()).to_vec()
                }
                Algorithm::RS384 => Sha384::digest(signing_input.as_bytes()).to_vec(),
                _ => Sha512::digest(signing_input.as_bytes()).to_vec(),
            };
            let padding = rsa_padding(alg);
            Ok(public.verify(padding, &digest, &actual).is_ok())
        }
        Algorithm::ES256 => {
            let verifying = p256_public_half(alg, key)?;
            let Ok(signature) = p256::ecdsa::Signature::from_slice(&actual) else {
                return Ok(false);
            };
            Ok(verifying.verify(signing_input.as_bytes(), &signature).is_ok())
        }
        Algorithm::ES384 => {
            let verifying = p384_public_half(alg, key)?;
            let Ok(signature) = p384::ecdsa::Signature::from_slice(&actual) else {
                return Ok(false);
            };
            Ok(verifying.verify(signing_input.as_bytes(), &signature).is_ok())
        }
        Algorithm::None => unreachable!("handled above"),
    }
}

/// Compute the raw signature bytes for a signing input.
///
/// `None` (the algorithm) yields `Ok(None)`: an empty signature segment.
fn compute_signature(
    signing_input: &str,
    alg: Algorithm,
    key: &KeyMaterial,
) -> Result<Option<Vec<u8>>, JwtProbeError> {
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            let KeyMaterial::Symmetric(secret) = key else {
                return Err(shape_mismatch(alg, key));
            };
            Ok(Some(hmac_signature(signing_input, alg, secret)?))
        }
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
            let KeyMaterial::AsymmetricPrivate(PrivateKey::Rsa(private)) = key else {
                return Err(shape_mismatch(alg, key));
            };
            let digest = match alg {
                Algorithm::RS256 => Sha256::digest(signing_input.as_bytes()).to_vec(),
                Algorithm::RS384 => Sha384::digest(signing_input.as_bytes()).to_vec(),
                _ => Sha512::digest(signing_input.as_bytes()).to_vec(),
            };
            let signature = private
                .sign(rsa_padding(alg), &digest)
                .map_err(|e| JwtProbeError::InvalidKeyPem {
                    reason: format!("RSA signing failed: {e}"),
                })?;
            Ok(Some(signature))
        }
        Algorithm::ES256 => {
            let KeyMaterial::AsymmetricPrivate(PrivateKey::P256(signing_key)) = key else {
                return Err(shape_mismatch(alg, key));
            };
            let signature: p256::ecdsa::Signature = signing_key.sign(signing_input.as_bytes());
            Ok(Some(signature.to_bytes().to_vec()))
        }
        Algorithm::ES384 => {
            let KeyMaterial::AsymmetricPrivate(PrivateKey::P384(signing_key)) = key else {
                return Err(shape_mismatch(alg, key));
            };
            let signature: p384::ecdsa::Signature = signing_key.sign(signing_input.as_bytes());
            Ok(Some(signature.to_bytes().to_vec()))
        }
        Algorithm::None => {
            if key.is_empty() {
                Ok(None)
            } else {
                Err(JwtProbeError::UnsupportedKey)
            }
        }
    }
}

/// HMAC over the signing input with the hash width matching the algorithm.
///
/// HMAC accepts keys of any length, including empty; the error arm is
/// unreachable in practice but propagated rather than unwrapped.
fn hmac_signature(
    signing_input: &str,
    alg: Algorithm,
    secret: &[u8],
) -> Result<Vec<u8>, JwtProbeError> {
    let rejected = |_| JwtProbeError::InvalidKeyPem {
        reason: "HMAC rejected the secret".to_string(),
    };
    Ok(match alg {
        Algorithm::HS256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(rejected)?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::HS384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(secret).map_err(rejected)?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        _ => {
            let mut mac = Hmac::<Sha512>::new_from_slice(secret).map_err(rejected)?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
    })
}

fn rsa_padding(alg: Algorithm) -> rsa::Pkcs1v15Sign {
    match alg {
        Algorithm::RS256 => rsa::Pkcs1v15Sign::new::<Sha256>(),
        Algorithm::RS384 => rsa::Pkcs1v15Sign::new::<Sha384>(),
        _ => rsa::Pkcs1v15Sign::new::<Sha512>(),
    }
}

/// The RSA public key to verify with: supplied directly, or derived
/// from a supplied private key.
fn rsa_public_half(alg: Algorithm, key: &KeyMaterial) -> Result<rsa::RsaPublicKey, JwtProbeError> {
    match key {
        KeyMaterial::AsymmetricPublic(PublicKey {
            kind: PublicKeyKind::Rsa(public),
            ..
        }) => Ok(public.clone()),
        KeyMaterial::AsymmetricPrivate(PrivateKey::Rsa(private)) => Ok(private.to_public_key()),
        _ => Err(shape_mismatch(alg, key)),
    }
}

fn p256_public_half(
    alg: Algorithm,
    key: &KeyMaterial,
) -> Result<p256::ecdsa::VerifyingKey, JwtProbeError> {
    match key {
        KeyMaterial::AsymmetricPublic(PublicKey {
            kind: PublicKeyKind::P256(public),
            ..
        }) => Ok(*public),
        KeyMaterial::AsymmetricPrivate(PrivateKey::P256(private)) => Ok(*private.verifying_key()),
        _ => Err(shape_mismatch(alg, key)),
    }
}

fn p384_public_half(
    alg: Algorithm,
    key: &KeyMaterial,
) -> Result<p384::ecdsa::VerifyingKey, JwtProbeError> {
    match key {
        KeyMaterial::AsymmetricPublic(PublicKey {
            kind: PublicKeyKind::P384(public),
            ..
        }) => Ok(*public),
        KeyMaterial::AsymmetricPrivate(PrivateKey::P384(private)) => Ok(*private.verifying_key()),
        _ => Err(shape_mismatch(alg, key)),
    }
}

/// Reject key material whose shape cannot fit the algorithm family.
fn check_key_shape(alg: Algorithm, key: &KeyMaterial) -> Result<(), JwtProbeError> {
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => match key {
            KeyMaterial::Symmetric(_) => Ok(()),
            _ => Err(shape_mismatch(alg, key)),
        },
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
            rsa_public_half(alg, key).map(|_| ())
        }
        Algorithm::ES256 => p256_public_half(alg, key).map(|_| ()),
        Algorithm::ES384 => p384_public_half(alg, key).map(|_| ()),
        Algorithm::None => Ok(()),
    }
}

fn shape_mismatch(alg: Algorithm, key: &KeyMaterial) -> JwtProbeError {
    JwtProbeError::KeyShapeMismatch {
        algorithm: alg.name().to_string(),
        expected: alg.required_shape().to_string(),
        supplied: key.shape_name().to_string(),
    }
}

/// An empty symmetric key, the only key material the `none` algorithm
/// accepts.
pub fn no_key() -> KeyMaterial {
    KeyMaterial::Symmetric(Vec::new())
}
