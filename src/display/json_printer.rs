//! Colorized JSON pretty-printing for terminal output.
//!
//! Renders JSON values with syntax highlighting:
//! - Field names in cyan
//! - Strings in green
//! - Numbers in yellow
//! - Booleans in magenta
//! - Null in red

use colored::Colorize;
use serde_json::Value;

/// Print a JSON value with colorized syntax highlighting.
///
/// Renders the value with 2-space indentation and ANSI color codes.
/// When `use_color` is false, outputs plain JSON without colors
/// (suitable for machine consumption or piping).
pub fn print_json(value: &Value, use_color: bool) {
    println!("{}", render_json(value, use_color));
}

/// Render a JSON value to a string, optionally colorized.
pub fn render_json(value: &Value, use_color: bool) -> String {
    if use_color {
        let mut out = String::new();
        render_value(value, 0, &mut out);
        out
    } else {
        // serde_json's own pretty printer already emits 2-space indents.
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

fn render_value(value: &Value, indent: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str(&"null".red().to_string()),
        Value::Bool(b) => out.push_str(&b.to_string().magenta().to_string()),
        Value::Number(n) => out.push_str(&n.to_string().yellow().to_string()),
        Value::String(s) => out.push_str(&format!("{:?}", s).green().to_string()),
        Value::Array(items) => render_array(items, indent, out),
        Value::Object(map) => render_object(map, indent, out),
    }
}

fn render_array(items: &[Value], indent: usize, out: &mut String) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push_str("[\n");
    for (i, item) in items.iter().enumerate() {
        out.push_str(&pad(indent + 1));
        render_value(item, indent + 1, out);
        if i + 1 < items.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&pad(indent));
    out.push(']');
}

fn render_object(map: &serde_json::Map<String, Value>, indent: usize, out: &mut String) {
    if map.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for (i, (key, value)) in map.iter().enumerate() {
        out.push_str(&pad(indent + 1));
        out.push_str(&format!("{:?}", key).cyan().to_string());
        out.push_str(": ");
        render_value(value, indent + 1, out);
        if i + 1 < map.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&pad(indent));
    out.push('}');
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}
