//! Handler for the `attack` subcommand.
//!
//! Generates the known attack variants of a token and either prints
//! them or sends each one to a target URL as a Bearer token, reporting
//! the response status per variant.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use crate::cli::AttackArgs;
use crate::core::attacks::{self, AttackVariant, Capabilities};
use crate::core::codec;
use crate::core::keys::{PrivateKey, PublicKey};
use crate::error::JwtProbeError;

/// Execute the `attack` subcommand with the given arguments.
pub fn execute(args: &AttackArgs) -> Result<()> {
    let token = super::resolve_token(args.token.as_deref(), args.token_env.as_deref())?;
    let decoded = codec::decode(&token)?;

    let capabilities = Capabilities {
        public_key: args
            .public_key
            .as_deref()
            .map(PublicKey::from_pem_file)
            .transpose()?,
        private_key: args
            .private_key
            .as_deref()
            .map(PrivateKey::from_pem_file)
            .transpose()?,
    };

    let variants = attacks::generate(&decoded, &capabilities)?;

    let responses = match &args.url {
        Some(url) => Some(dispatch_all(&variants, url, args)?),
        None => None,
    };

    if args.json {
        print_json(&variants, responses.as_deref());
    } else {
        print_table(&variants, responses.as_deref());
    }
    Ok(())
}

/// Per-variant dispatch result. A failed request annotates the variant;
/// it never aborts the rest of the catalog.
enum DispatchOutcome {
    Status(u16),
    Failed(String),
}

/// Send every variant to the target URL as a Bearer token.
///
/// # Security
///
/// - Only HTTPS URLs are accepted (HTTP is rejected before any network call).
/// - Redirects are disabled to prevent HTTPS to HTTP downgrade.
/// - A request timeout is enforced.
fn dispatch_all(
    variants: &[AttackVariant],
    url: &str,
    args: &AttackArgs,
) -> Result<Vec<DispatchOutcome>, JwtProbeError> {
    validate_url_scheme(url)?;
    let method = reqwest::Method::from_bytes(args.method.to_uppercase().as_bytes()).map_err(
        |_| JwtProbeError::HttpDispatchError {
            url: url.to_string(),
            reason: format!("invalid HTTP method '{}'", args.method),
        },
    )?;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(args.http_timeout))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| JwtProbeError::HttpDispatchError {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(variants
        .iter()
        .map(
            |variant| match dispatch_one(&client, method.clone(), url, variant, args) {
                Ok(status) => DispatchOutcome::Status(status),
                Err(e) => DispatchOutcome::Failed(e.to_string()),
            },
        )
        .collect())
}

fn dispatch_one(
    client: &reqwest::blocking::Client,
    method: reqwest::Method,
    url: &str,
    variant: &AttackVariant,
    args: &AttackArgs,
) -> Result<u16, JwtProbeError> {
    let mut request = client
        .request(method, url)
        .header("Authorization", format!("Bearer {}", variant.token));

    for header in &args.headers {
        let (name, value) =
            header
                .split_once(':')
                .ok_or_else(|| JwtProbeError::HttpDispatchError {
                    url: url.to_string(),
                    reason: format!("invalid header '{header}': expected 'Name: value'"),
                })?;
        request = request.header(name.trim(), value.trim());
    }
    if let Some(cookies) = &args.cookies {
        request = request.header("Cookie", cookies.as_str());
    }

    let response = request
        .send()
        .map_err(|e| JwtProbeError::HttpDispatchError {
            url: url.to_string(),
            reason: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                "request failed".to_string()
            },
        })?;
    Ok(response.status().as_u16())
}

/// Reject non-HTTPS URLs before any network call.
fn validate_url_scheme(url: &str) -> Result<(), JwtProbeError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "https" => Ok(()),
        Ok(parsed) => Err(JwtProbeError::HttpDispatchError {
            url: url.to_string(),
            reason: format!(
                "only HTTPS URLs are accepted (got scheme '{}')",
                parsed.scheme()
            ),
        }),
        Err(_) => Err(JwtProbeError::HttpDispatchError {
            url: url.to_string(),
            reason: "invalid URL".to_string(),
        }),
    }
}

fn print_json(variants: &[AttackVariant], responses: Option<&[DispatchOutcome]>) {
    let entries: Vec<_> = variants
        .iter()
        .enumerate()
        .map(|(i, variant)| {
            let (status, error) = match responses.map(|r| &r[i]) {
                Some(DispatchOutcome::Status(status)) => (json!(status), json!(null)),
                Some(DispatchOutcome::Failed(reason)) => (json!(null), json!(reason)),
                None => (json!(null), json!(null)),
            };
            json!({
                "name": variant.name,
                "description": variant.description,
                "token": variant.token.to_string(),
                "requires_network_check": variant.requires_network_check,
                "response_status": status,
                "dispatch_error": error,
            })
        })
        .collect();
    println!("{}", json!(entries));
}

fn print_table(variants: &[AttackVariant], responses: Option<&[DispatchOutcome]>) {
    for (i, variant) in variants.iter().enumerate() {
        println!("{}", variant.name.bold());
        println!("  {}", variant.description);
        if variant.requires_network_check {
            println!(
                "  {}",
                "needs attacker-hosted key material to complete".yellow()
            );
        }
        println!("  {}", variant.token);
        match responses.map(|r| &r[i]) {
            Some(DispatchOutcome::Status(status)) => {
                let line = format!("  HTTP {status}");
                if (200..300).contains(status) {
                    println!("{}", line.green().bold());
                } else {
                    println!("{line}");
                }
            }
            Some(DispatchOutcome::Failed(reason)) => {
                println!("  {}", format!("dispatch failed: {reason}").red());
            }
            None => {}
        }
        println!();
    }
}
