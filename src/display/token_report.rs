//! Human-readable token report.
//!
//! Renders a decoded token claim by claim, annotating each claim with
//! its dictionary description and temporal claims (`exp`, `iat`, `nbf`)
//! with UTC timestamps and expiry status:
//! - Expired tokens: red "EXPIRED (X ago)"
//! - Valid tokens: green "VALID (expires in X)"
//! - Not-yet-valid tokens: yellow "NOT YET VALID (valid in X)"

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::{Map, Value};

use crate::core::claims::ClaimDictionary;
use crate::core::codec::DecodedToken;

/// Print the full claim-by-claim report for a decoded token.
pub fn print_report(decoded: &DecodedToken, dictionary: &ClaimDictionary, use_color: bool) {
    print!("{}", render_report(decoded, dictionary, use_color));
}

/// Render the report to a string.
pub fn render_report(
    decoded: &DecodedToken,
    dictionary: &ClaimDictionary,
    use_color: bool,
) -> String {
    let mut out = String::new();

    out.push_str(&section("Header", use_color));
    render_claims(&decoded.header, dictionary, use_color, &mut out);

    out.push_str(&section("Payload", use_color));
    render_claims(&decoded.payload, dictionary, use_color, &mut out);

    out.push_str(&section("Signature", use_color));
    if decoded.signature_raw.is_empty() {
        out.push_str("  (none)\n");
    } else {
        out.push_str(&format!(
            "  {} base64url characters\n",
            decoded.signature_raw.len()
        ));
    }

    out
}

fn section(title: &str, use_color: bool) -> String {
    if use_color {
        format!("{}\n", title.bold())
    } else {
        format!("{title}\n")
    }
}

fn render_claims(
    claims: &Map<String, Value>,
    dictionary: &ClaimDictionary,
    use_color: bool,
    out: &mut String,
) {
    if claims.is_empty() {
        out.push_str("  (empty)\n");
        return;
    }
    for (name, value) in claims {
        let description = dictionary.lookup(name);
        let mut line = format!("  {name} = {value}  [{description}]");
        if let Some(annotation) = temporal_annotation(name, value, use_color) {
            line.push_str("  ");
            line.push_str(&annotation);
        }
        line.push('\n');
        out.push_str(&line);
    }
}

/// Annotate `exp`, `iat`, and `nbf` with a UTC timestamp, plus expiry
/// status for `exp` and validity status for `nbf`.
fn temporal_annotation(name: &str, value: &Value, use_color: bool) -> Option<String> {
    if !matches!(name, "exp" | "iat" | "nbf") {
        return None;
    }
    let secs = value.as_i64()?;
    let when = DateTime::<Utc>::from_timestamp(secs, 0)?;
    let mut annotation = when.format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let now = Utc::now();
    match name {
        "exp" => {
            let status = if when <= now {
                paint(
                    &format!("EXPIRED ({} ago)", humanize(now - when)),
                    Tint::Red,
                    use_color,
                )
            } else {
                paint(
                    &format!("VALID (expires in {})", humanize(when - now)),
                    Tint::Green,
                    use_color,
                )
            };
            annotation.push_str(", ");
            annotation.push_str(&status);
        }
        "nbf" if when > now => {
            annotation.push_str(", ");
            annotation.push_str(&paint(
                &format!("NOT YET VALID (valid in {})", humanize(when - now)),
                Tint::Yellow,
                use_color,
            ));
        }
        _ => {}
    }
    Some(annotation)
}

enum Tint {
    Red,
    Green,
    Yellow,
}

fn paint(text: &str, tint: Tint, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    match tint {
        Tint::Red => text.red().to_string(),
        Tint::Green => text.green().to_string(),
        Tint::Yellow => text.yellow().to_string(),
    }
}

/// Coarse single-unit rendering of a duration ("3 days", "2 hours").
fn humanize(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    let (count, unit) = if secs >= 86_400 {
        (secs / 86_400, "day")
    } else if secs >= 3_600 {
        (secs / 3_600, "hour")
    } else if secs >= 60 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec;
    use crate::core::editor::{self, ClaimEdit};
    use serde_json::json;

    fn token_with_payload(payload: Value) -> DecodedToken {
        let decoded = codec::decode("eyJhbGciOiJIUzI1NiJ9.e30.c2ln").unwrap();
        let edits: Vec<ClaimEdit> = payload
            .as_object()
            .unwrap()
            .iter()
            .map(|(name, value)| ClaimEdit::set_payload(name.clone(), value.clone()))
            .collect();
        editor::apply_edits(&decoded, &edits)
    }

    #[test]
    fn test_report_lists_claims_with_descriptions() {
        let dict = ClaimDictionary::builtin();
        let decoded = token_with_payload(json!({"sub": "123", "role": "admin"}));
        let report = render_report(&decoded, &dict, false);

        assert!(report.contains("alg = \"HS256\"  [signing algorithm]"));
        assert!(report.contains("sub = \"123\"  [subject of the token]"));
        assert!(report.contains("role = \"admin\"  [custom claim]"));
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let dict = ClaimDictionary::builtin();
        let past = Utc::now().timestamp() - 7_200;
        let decoded = token_with_payload(json!({"exp": past}));
        let report = render_report(&decoded, &dict, false);

        assert!(report.contains("EXPIRED (2 hours ago)"));
    }

    #[test]
    fn test_live_token_reports_remaining_validity() {
        let dict = ClaimDictionary::builtin();
        let future = Utc::now().timestamp() + 3 * 86_400 + 60;
        let decoded = token_with_payload(json!({"exp": future}));
        let report = render_report(&decoded, &dict, false);

        assert!(report.contains("VALID (expires in 3 days)"));
    }

    #[test]
    fn test_future_nbf_reports_not_yet_valid() {
        let dict = ClaimDictionary::builtin();
        let future = Utc::now().timestamp() + 600;
        let decoded = token_with_payload(json!({"nbf": future}));
        let report = render_report(&decoded, &dict, false);

        assert!(report.contains("NOT YET VALID"));
    }

    #[test]
    fn test_iat_gets_timestamp_without_status() {
        let dict = ClaimDictionary::builtin();
        let decoded = token_with_payload(json!({"iat": 1_700_000_000}));
        let report = render_report(&decoded, &dict, false);

        assert!(report.contains("2023-11-14 22:13:20 UTC"));
        assert!(!report.contains("VALID"));
        assert!(!report.contains("EXPIRED"));
    }

    #[test]
    fn test_non_numeric_temporal_claim_is_left_alone() {
        let dict = ClaimDictionary::builtin();
        let decoded = token_with_payload(json!({"exp": "tomorrow"}));
        let report = render_report(&decoded, &dict, false);

        assert!(report.contains("exp = \"tomorrow\""));
        assert!(!report.contains("UTC"));
    }

    #[test]
    fn test_empty_signature_is_reported() {
        let dict = ClaimDictionary::builtin();
        let decoded = codec::decode("eyJhbGciOiJub25lIn0.e30.").unwrap();
        let report = render_report(&decoded, &dict, false);

        assert!(report.contains("Signature\n  (none)"));
    }
}
