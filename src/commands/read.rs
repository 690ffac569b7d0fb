//! Handler for the `read` subcommand.
//!
//! Decodes a JWT and prints a claim-by-claim report with dictionary
//! descriptions and temporal status, without verifying the signature.
//! Supports reading the token from a CLI argument, environment
//! variable, or stdin.

use anyhow::Result;
use serde_json::json;

use crate::cli::ReadArgs;
use crate::core::claims::ClaimDictionary;
use crate::core::codec;
use crate::display::{json_printer, token_report};
use crate::error::JwtProbeError;

/// Execute the `read` subcommand with the given arguments.
pub fn execute(args: &ReadArgs) -> Result<()> {
    let token = super::resolve_token(args.token.as_deref(), args.token_env.as_deref())?;
    let decoded = codec::decode(&token)?;

    if let Some(claim) = &args.claim {
        let value = decoded
            .find_claim(claim)
            .ok_or_else(|| JwtProbeError::ClaimNotFound {
                claim: claim.clone(),
            })?;
        json_printer::print_json(value, !args.json);
        return Ok(());
    }

    if args.json {
        let output = json!({
            "header": decoded.header,
            "payload": decoded.payload,
            "signature": decoded.signature_raw,
        });
        json_printer::print_json(&output, false);
        return Ok(());
    }

    let dictionary = match &args.claims_file {
        Some(path) => ClaimDictionary::from_file_or_builtin(path)?,
        None => ClaimDictionary::builtin(),
    };
    token_report::print_report(&decoded, &dictionary, true);
    Ok(())
}
