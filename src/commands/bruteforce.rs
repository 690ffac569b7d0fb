//! Handler for the `bruteforce` subcommand.
//!
//! Searches a candidate source (single secret or wordlist) for the
//! HMAC secret that validates a token's signature, using a concurrent
//! worker pool. The exit code reflects whether a key was found.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use crate::cli::BruteforceArgs;
use crate::core::codec;
use crate::core::search::{self, CandidateSource, SearchStatus};
use crate::core::signer::Algorithm;
use crate::error::JwtProbeError;

/// Execute the `bruteforce` subcommand with the given arguments.
///
/// Returns whether a matching key was found, for the process exit code.
pub fn execute(args: &BruteforceArgs) -> Result<bool> {
    let token = super::resolve_token(args.token.as_deref(), args.token_env.as_deref())?;
    let decoded = codec::decode(&token)?;

    let alg_name = decoded
        .algorithm_name()
        .ok_or_else(|| JwtProbeError::ClaimNotFound {
            claim: "alg".to_string(),
        })?;
    let algorithm = Algorithm::from_name(alg_name)?;

    // clap's ArgGroup guarantees exactly one of the two is present
    let source = if let Some(secret) = &args.secret {
        CandidateSource::Single(secret.to_string())
    } else if let Some(path) = &args.wordlist {
        CandidateSource::Wordlist(path.clone())
    } else {
        return Err(JwtProbeError::CandidateSourceError {
            origin: "none".to_string(),
            reason: "no candidate source supplied".to_string(),
        }
        .into());
    };

    // No --timeout means effectively unbounded
    let timeout = args
        .timeout
        .map_or(Duration::MAX, Duration::from_secs);

    let result = search::search(&decoded, algorithm, &source, args.threads, timeout)?;

    if args.json {
        let status = match result.status {
            SearchStatus::Found => "found",
            SearchStatus::Exhausted => "exhausted",
            SearchStatus::Cancelled => "cancelled",
        };
        let output = json!({
            "status": status,
            "matched_key": result.matched_key,
            "attempts": result.attempts,
        });
        println!("{output}");
        return Ok(result.status == SearchStatus::Found);
    }

    match result.status {
        SearchStatus::Found => {
            let key = result.matched_key.as_deref().unwrap_or_default();
            println!(
                "{} key '{}' after {} attempts",
                "FOUND".green().bold(),
                key,
                result.attempts
            );
            Ok(true)
        }
        SearchStatus::Exhausted => {
            println!(
                "{} no key matched after {} attempts",
                "EXHAUSTED".red().bold(),
                result.attempts
            );
            Ok(false)
        }
        SearchStatus::Cancelled => {
            println!(
                "{} timed out after {} attempts",
                "CANCELLED".yellow().bold(),
                result.attempts
            );
            Ok(false)
        }
    }
}
