//! Building template variables from loosely typed input.

use serde_json::{Map, Value};

use super::render::Variables;

/// Key that carries the recipient in an API payload.
pub const RECIPIENT_KEY: &str = "to";

/// Convert a `camelCase` key to `snake_case`. Keys already in snake case are
/// returned unchanged.
#[must_use]
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Format an integer with `,` thousands separators.
#[must_use]
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Render a JSON value as a template variable.
///
/// Numbers get thousands separators; `null` becomes empty.
#[must_use]
pub fn value_to_variable(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_i64().map_or_else(
            || {
                let text = n.to_string();
                match text.split_once('.') {
                    Some((int, frac)) => int
                        .parse::<i64>()
                        .map_or_else(|_| text.clone(), |i| format!("{}.{frac}", group_thousands(i))),
                    None => text,
                }
            },
            group_thousands,
        ),
        Value::Array(items) => items
            .iter()
            .map(value_to_variable)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => value.to_string(),
    }
}

/// Split an API payload into recipient and template variables.
///
/// Every key except `to` becomes a variable under its snake case name.
#[must_use]
pub fn from_payload(data: &Map<String, Value>) -> (Option<String>, Variables) {
    let recipient = data
        .get(RECIPIENT_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let variables = data
        .iter()
        .filter(|(key, _)| key.as_str() != RECIPIENT_KEY)
        .map(|(key, value)| (to_snake_case(key), value_to_variable(value)))
        .collect();

    (recipient, variables)
}
