//! `{{name}}` token substitution.
//!
//! Grammar: `{{`, optional whitespace, an identifier of ASCII letters, digits
//! and `_`, optional whitespace, `}}`. The scan is a single left-to-right pass;
//! substituted values are copied verbatim and never re-scanned. Tokens with
//! no matching variable stay in the output exactly as written.

use std::collections::HashMap;

/// Variables available to a template, by token name.
pub type Variables = HashMap<String, String>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Substitute every known token in `template`.
#[must_use]
pub fn render_tokens(template: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some((before, after_open)) = rest.split_once(OPEN) {
        out.push_str(before);

        let Some((inner, after_close)) = after_open.split_once(CLOSE) else {
            out.push_str(OPEN);
            out.push_str(after_open);
            return out;
        };

        let name = inner.trim();
        if !is_identifier(name) {
            // Not a token; emit the braces and keep scanning right after them
            out.push_str(OPEN);
            rest = after_open;
            continue;
        }

        match variables.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str(OPEN);
                out.push_str(inner);
                out.push_str(CLOSE);
            }
        }
        rest = after_close;
    }

    out.push_str(rest);
    out
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_unknown_tokens_left_verbatim() {
        let rendered = render_tokens(
            "Hello {{name}}, order {{order_number}}",
            &vars(&[("name", "Taro")]),
        );
        assert_eq!(rendered, "Hello Taro, order {{order_number}}");
    }

    #[test]
    fn test_whitespace_inside_braces() {
        let rendered = render_tokens("Hi {{ name }}!", &vars(&[("name", "Hanako")]));
        assert_eq!(rendered, "Hi Hanako!");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let rendered = render_tokens(
            "{{a}} and {{b}}",
            &vars(&[("a", "{{b}}"), ("b", "B")]),
        );
        assert_eq!(rendered, "{{b}} and B");
    }

    #[test]
    fn test_repeated_tokens() {
        let rendered = render_tokens("{{x}}-{{x}}-{{x}}", &vars(&[("x", "1")]));
        assert_eq!(rendered, "1-1-1");
    }

    #[test]
    fn test_malformed_braces_pass_through() {
        let v = vars(&[("name", "Taro")]);
        assert_eq!(render_tokens("{{", &v), "{{");
        assert_eq!(render_tokens("a {{name", &v), "a {{name");
        assert_eq!(render_tokens("{{first name}}", &v), "{{first name}}");
        assert_eq!(render_tokens("{{}}", &v), "{{}}");
        assert_eq!(render_tokens("{{ {{name}}", &v), "{{ Taro");
    }

    #[test]
    fn test_non_ascii_text_is_preserved() {
        let rendered = render_tokens(
            "{{customer_name}} 様\n合計: ¥{{total}}",
            &vars(&[("customer_name", "山田"), ("total", "3,980")]),
        );
        assert_eq!(rendered, "山田 様\n合計: ¥3,980");
    }

    #[test]
    fn test_render_is_idempotent_on_same_input() {
        let v = vars(&[("name", "Taro")]);
        let template = "Hello {{name}} {{missing}}";
        assert_eq!(render_tokens(template, &v), render_tokens(template, &v));
    }
}
