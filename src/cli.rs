//! CLI argument definitions for jwt-probe.
//!
//! Uses `clap` derive macros to define the command-line interface.
//! Each subcommand has its own argument struct for type-safe parsing.
//!
//! # Security
//!
//! The argument structs implement custom `Debug` to redact sensitive
//! fields (tokens and secrets) and prevent accidental leakage through
//! debug formatting, error chains, or logging.

use std::fmt;
use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use zeroize::Zeroizing;

/// A security-testing CLI for JSON Web Tokens: decode, tamper with,
/// brute-force, and generate known attack variants of JWTs.
#[derive(Debug, Parser)]
#[command(name = "jwt-probe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode a JWT and report its claims without verifying anything.
    Read(ReadArgs),

    /// Edit claims and optionally re-sign the token.
    Tamper(TamperArgs),

    /// Search for the HMAC secret of a token.
    Bruteforce(BruteforceArgs),

    /// Generate known attack variants of a token.
    Attack(AttackArgs),
}

/// Arguments for the `read` subcommand.
#[derive(clap::Args)]
pub struct ReadArgs {
    /// The JWT token to read. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    /// Path to a JSON claim dictionary ({"claims": {...}}). Falls back
    /// to the built-in RFC 7519 set when the file does not exist.
    #[arg(long, value_name = "FILE")]
    pub claims_file: Option<PathBuf>,

    /// Print only this claim's value, searching the header first and
    /// then the payload. Fails when the claim is in neither.
    #[arg(long, value_name = "NAME")]
    pub claim: Option<String>,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts the token field to prevent accidental leakage.
impl fmt::Debug for ReadArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("claims_file", &self.claims_file)
            .field("claim", &self.claim)
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `tamper` subcommand.
#[derive(clap::Args)]
pub struct TamperArgs {
    /// The JWT token to modify. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    /// Set a payload claim, as NAME=VALUE. VALUE is parsed as JSON
    /// first and falls back to a plain string. Repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set_payload: Vec<String>,

    /// Set a header claim, as NAME=VALUE. Repeatable.
    #[arg(long, value_name = "NAME=VALUE")]
    pub set_header: Vec<String>,

    /// Remove a payload claim by name. Repeatable.
    #[arg(long = "remove", value_name = "NAME")]
    pub remove_payload: Vec<String>,

    /// Remove a header claim by name. Repeatable.
    #[arg(long, value_name = "NAME")]
    pub remove_header: Vec<String>,

    /// Re-sign the edited token with this algorithm (HS256, HS384,
    /// HS512, RS256, RS384, RS512, ES256, ES384, or none). Without
    /// this flag the original, now-stale signature is kept.
    #[arg(long, value_name = "ALG")]
    pub resign: Option<String>,

    /// HMAC shared secret for re-signing.
    ///
    /// WARNING: Passing secrets via CLI arguments may expose them in shell
    /// history. Prefer piping the token via stdin and using --key-file.
    #[arg(long, value_name = "SECRET", value_parser = parse_zeroizing_string)]
    pub secret: Option<Zeroizing<String>>,

    /// Path to a PEM-encoded private key file for re-signing (RSA or
    /// ECDSA).
    #[arg(long, value_name = "FILE")]
    pub key_file: Option<PathBuf>,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts token and secret fields to prevent
/// accidental leakage through debug formatting or error chains.
impl fmt::Debug for TamperArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TamperArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("set_payload", &self.set_payload)
            .field("set_header", &self.set_header)
            .field("remove_payload", &self.remove_payload)
            .field("remove_header", &self.remove_header)
            .field("resign", &self.resign)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("key_file", &self.key_file)
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `bruteforce` subcommand.
#[derive(clap::Args)]
#[command(group(
    ArgGroup::new("candidates")
        .required(true)
        .args(["secret", "wordlist"]),
))]
pub struct BruteforceArgs {
    /// The JWT token to attack. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    /// Try a single candidate secret.
    #[arg(long, value_name = "SECRET", value_parser = parse_zeroizing_string)]
    pub secret: Option<Zeroizing<String>>,

    /// Try every line of a wordlist file as a candidate secret.
    #[arg(long, value_name = "FILE")]
    pub wordlist: Option<PathBuf>,

    /// Number of worker threads.
    #[arg(long, default_value_t = 4, value_name = "N")]
    pub threads: usize,

    /// Give up after this many seconds. Without it the search runs
    /// until the candidates are exhausted.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts token and secret fields.
impl fmt::Debug for BruteforceArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BruteforceArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("wordlist", &self.wordlist)
            .field("threads", &self.threads)
            .field("timeout", &self.timeout)
            .field("json", &self.json)
            .finish()
    }
}

/// Arguments for the `attack` subcommand.
#[derive(clap::Args)]
pub struct AttackArgs {
    /// The JWT token to forge variants of. If omitted, reads from stdin.
    pub token: Option<String>,

    /// Read the token from the specified environment variable.
    #[arg(long, value_name = "VAR_NAME")]
    pub token_env: Option<String>,

    /// Path to the target's PEM-encoded public key. Enables the
    /// RS-to-HS confusion variant.
    #[arg(long, value_name = "FILE")]
    pub public_key: Option<PathBuf>,

    /// Path to an attacker-controlled PEM-encoded private key. Enables
    /// the embedded-jwk variant.
    #[arg(long, value_name = "FILE")]
    pub private_key: Option<PathBuf>,

    /// Send each variant to this URL as a Bearer token and report the
    /// response status.
    ///
    /// Must be HTTPS. Redirects are not followed.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// HTTP method for dispatch requests.
    #[arg(long, default_value = "GET", value_name = "METHOD")]
    pub method: String,

    /// Extra request header, as "Name: value". Repeatable.
    #[arg(long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Cookie header value to send with each request.
    #[arg(long, value_name = "COOKIES")]
    pub cookies: Option<String>,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 10, value_name = "SECONDS")]
    pub http_timeout: u64,

    /// Output raw JSON without colors (machine-readable).
    #[arg(long)]
    pub json: bool,
}

/// Custom `Debug` that redacts the token and cookie fields.
impl fmt::Debug for AttackArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttackArgs")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies.as_ref().map(|_| "[REDACTED]"))
            .field("http_timeout", &self.http_timeout)
            .field("json", &self.json)
            .finish()
    }
}

/// Parse a string into a `Zeroizing<String>` for secure CLI arguments.
fn parse_zeroizing_string(s: &str) -> Result<Zeroizing<String>, std::convert::Infallible> {
    Ok(Zeroizing::new(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_structure_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bruteforce_requires_a_candidate_source() {
        let result = Cli::try_parse_from(["jwt-probe", "bruteforce", "a.b.c"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bruteforce_rejects_both_candidate_sources() {
        let result = Cli::try_parse_from([
            "jwt-probe",
            "bruteforce",
            "a.b.c",
            "--secret",
            "s",
            "--wordlist",
            "words.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tamper_debug_redacts_secret() {
        let cli = Cli::try_parse_from([
            "jwt-probe",
            "tamper",
            "a.b.c",
            "--set",
            "role=admin",
            "--resign",
            "HS256",
            "--secret",
            "hunter2",
        ])
        .unwrap();
        let debug = format!("{cli:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("a.b.c"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_tamper_collects_repeated_edits() {
        let cli = Cli::try_parse_from([
            "jwt-probe",
            "tamper",
            "a.b.c",
            "--set",
            "role=admin",
            "--set",
            "sub=0",
            "--remove",
            "jti",
        ])
        .unwrap();
        match cli.command {
            Commands::Tamper(args) => {
                assert_eq!(args.set_payload, vec!["role=admin", "sub=0"]);
                assert_eq!(args.remove_payload, vec!["jti"]);
            }
            _ => panic!("expected tamper"),
        }
    }
}
