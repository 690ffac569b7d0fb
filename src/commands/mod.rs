//! Command handlers for each CLI subcommand.
//!
//! Each subcommand is implemented in its own module and exposes
//! a single `execute` function that receives the parsed arguments.

pub mod attack;
pub mod bruteforce;
pub mod read;
pub mod tamper;

use std::io::Read;

use crate::error::JwtProbeError;

/// Resolve the token to operate on: positional argument first, then the
/// named environment variable, then stdin.
///
/// Whitespace is trimmed so tokens piped with a trailing newline work.
pub(crate) fn resolve_token(
    token: Option<&str>,
    token_env: Option<&str>,
) -> Result<String, JwtProbeError> {
    if let Some(token) = token {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
    if let Some(name) = token_env {
        return match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(JwtProbeError::EnvVarNotFound {
                name: name.to_string(),
            }),
        };
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|_| JwtProbeError::NoTokenProvided)?;
    let token = buffer.trim();
    if token.is_empty() {
        return Err(JwtProbeError::NoTokenProvided);
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_token_wins() {
        let token = resolve_token(Some("  a.b.c\n"), None).unwrap();
        assert_eq!(token, "a.b.c");
    }

    #[test]
    fn test_env_var_fallback() {
        std::env::set_var("JWT_PROBE_TEST_TOKEN", "x.y.z");
        let token = resolve_token(None, Some("JWT_PROBE_TEST_TOKEN")).unwrap();
        assert_eq!(token, "x.y.z");
        std::env::remove_var("JWT_PROBE_TEST_TOKEN");
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let err = resolve_token(None, Some("JWT_PROBE_DEFINITELY_UNSET")).unwrap_err();
        assert!(err.to_string().contains("JWT_PROBE_DEFINITELY_UNSET"));
    }
}
