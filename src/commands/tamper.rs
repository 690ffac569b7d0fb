//! Handler for the `tamper` subcommand.
//!
//! Applies claim edits to a JWT and prints the resulting token,
//! either re-signed with a supplied key or carrying the original,
//! now-stale signature for verifier testing.

use anyhow::Result;
use colored::Colorize;
use serde_json::{json, Value};
use zeroize::Zeroizing;

use crate::cli::TamperArgs;
use crate::core::codec::{self, Token};
use crate::core::editor::{self, ClaimEdit};
use crate::core::keys::{KeyMaterial, PrivateKey};
use crate::core::signer::{self, Algorithm};
use crate::error::JwtProbeError;

/// Execute the `tamper` subcommand with the given arguments.
pub fn execute(args: &TamperArgs) -> Result<()> {
    let token = super::resolve_token(args.token.as_deref(), args.token_env.as_deref())?;
    let decoded = codec::decode(&token)?;

    let edits = collect_edits(args)?;
    let edited = editor::apply_edits(&decoded, &edits);

    let (output, resigned) = match &args.resign {
        Some(name) => {
            let algorithm = Algorithm::from_name(name)?;
            let key = load_signing_key(args, algorithm)?;
            (signer::sign(&edited, algorithm, &key)?, true)
        }
        None => (codec::encode(&edited)?, false),
    };

    print_result(&output, resigned, !edits.is_empty(), args.json);
    Ok(())
}

/// Collect set and remove operations in CLI order within each flag.
fn collect_edits(args: &TamperArgs) -> Result<Vec<ClaimEdit>, JwtProbeError> {
    let mut edits = Vec::new();
    for expression in &args.set_header {
        let (name, value) = parse_assignment(expression)?;
        edits.push(ClaimEdit::set_header(name, value));
    }
    for expression in &args.set_payload {
        let (name, value) = parse_assignment(expression)?;
        edits.push(ClaimEdit::set_payload(name, value));
    }
    for name in &args.remove_header {
        edits.push(ClaimEdit::remove_header(name.clone()));
    }
    for name in &args.remove_payload {
        edits.push(ClaimEdit::remove_payload(name.clone()));
    }
    Ok(edits)
}

/// Split a NAME=VALUE expression, parsing VALUE as JSON first and
/// falling back to a plain string. `role=admin` becomes the string
/// "admin"; `admin=true` becomes the boolean true; quoting forces a
/// string: `admin="true"`.
fn parse_assignment(expression: &str) -> Result<(String, Value), JwtProbeError> {
    let (name, raw_value) =
        expression
            .split_once('=')
            .ok_or_else(|| JwtProbeError::InvalidEditExpression {
                expression: expression.to_string(),
            })?;
    if name.is_empty() {
        return Err(JwtProbeError::InvalidEditExpression {
            expression: expression.to_string(),
        });
    }
    let value = serde_json::from_str(raw_value).unwrap_or_else(|_| Value::String(raw_value.to_string()));
    Ok((name.to_string(), value))
}

/// Pick the signing key matching the requested algorithm's shape.
fn load_signing_key(args: &TamperArgs, algorithm: Algorithm) -> Result<KeyMaterial, JwtProbeError> {
    if algorithm == Algorithm::None {
        // Any supplied key material is passed through, so a
        // contradictory `--resign none --secret ...` is rejected by the
        // signer rather than silently ignored.
        if let Some(secret) = &args.secret {
            return Ok(KeyMaterial::Symmetric(secret.as_bytes().to_vec()));
        }
        if let Some(path) = &args.key_file {
            return Ok(KeyMaterial::AsymmetricPrivate(PrivateKey::from_pem_file(
                path,
            )?));
        }
        return Ok(signer::no_key());
    }
    if algorithm.is_symmetric() {
        let secret: &Zeroizing<String> =
            args.secret
                .as_ref()
                .ok_or_else(|| JwtProbeError::KeyShapeMismatch {
                    algorithm: algorithm.name().to_string(),
                    expected: "a symmetric secret (--secret)".to_string(),
                    supplied: "nothing".to_string(),
                })?;
        return Ok(KeyMaterial::Symmetric(secret.as_bytes().to_vec()));
    }
    let path = args
        .key_file
        .as_ref()
        .ok_or_else(|| JwtProbeError::KeyShapeMismatch {
            algorithm: algorithm.name().to_string(),
            expected: "an asymmetric private key (--key-file)".to_string(),
            supplied: "nothing".to_string(),
        })?;
    Ok(KeyMaterial::AsymmetricPrivate(PrivateKey::from_pem_file(
        path,
    )?))
}

fn print_result(token: &Token, resigned: bool, edited: bool, json: bool) {
    if json {
        let output = json!({
            "token": token.to_string(),
            "resigned": resigned,
        });
        println!("{output}");
        return;
    }
    println!("{token}");
    if edited && !resigned && !token.signature_raw.is_empty() {
        eprintln!(
            "{}",
            "warning: claims changed but the signature was not; pass --resign to re-sign"
                .yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_parses_json_values() {
        let (name, value) = parse_assignment("admin=true").unwrap();
        assert_eq!(name, "admin");
        assert_eq!(value, Value::Bool(true));

        let (_, value) = parse_assignment("count=42").unwrap();
        assert_eq!(value, json!(42));

        let (_, value) = parse_assignment(r#"aud=["a","b"]"#).unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn test_assignment_falls_back_to_string() {
        let (name, value) = parse_assignment("role=admin").unwrap();
        assert_eq!(name, "role");
        assert_eq!(value, Value::String("admin".to_string()));
    }

    #[test]
    fn test_quoted_assignment_forces_string() {
        let (_, value) = parse_assignment(r#"admin="true""#).unwrap();
        assert_eq!(value, Value::String("true".to_string()));
    }

    #[test]
    fn test_assignment_keeps_equals_in_value() {
        let (name, value) = parse_assignment("query=a=b").unwrap();
        assert_eq!(name, "query");
        assert_eq!(value, Value::String("a=b".to_string()));
    }

    #[test]
    fn test_assignment_without_equals_is_rejected() {
        assert!(parse_assignment("role").is_err());
        assert!(parse_assignment("=admin").is_err());
    }

    #[test]
    fn test_empty_value_is_the_empty_string() {
        let (_, value) = parse_assignment("jti=").unwrap();
        assert_eq!(value, Value::String(String::new()));
    }
}
