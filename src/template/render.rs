//! Placeholder substitution for message templates.
//!
//! Rendering is a pure textual transform: every `{{key}}` whose key appears
//! in the supplied variables is replaced by the value's string form, in every
//! fragment of the template. There is no escaping mechanism for literal
//! `{{...}}` sequences, and a placeholder with no supplied value survives
//! verbatim in the output.

use std::collections::BTreeMap;

use super::{PromptTemplate, Role};

/// Variables supplied to [`render`].
///
/// Keys are applied in sorted order, so substitution is deterministic. If a
/// value itself contains placeholder syntax for a key that sorts later, that
/// later key substitutes into it as well: last writer wins.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: BTreeMap<String, String>,
}

impl Vars {
    /// Create an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, converting the value to its string form.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    /// Iterate over (key, value) pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A concrete (role, content) pair produced by rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Role carried over from the template fragment.
    pub role: Role,
    /// Fragment text with placeholders substituted.
    pub content: String,
}

/// Render a template into a concrete message sequence.
///
/// Deterministic, pure function of its inputs: rendering the same template
/// with the same variables always yields the same output.
pub fn render(template: &PromptTemplate, vars: &Vars) -> Vec<RenderedMessage> {
    template
        .messages
        .iter()
        .map(|fragment| {
            let mut content = fragment.content.clone();
            for (key, value) in vars.iter() {
                content = content.replace(&format!("{{{{{key}}}}}"), value);
            }
            RenderedMessage {
                role: fragment.role,
                content,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MessageTemplate;

    fn template(fragments: &[(Role, &str)]) -> PromptTemplate {
        PromptTemplate {
            name: "test".to_string(),
            messages: fragments
                .iter()
                .map(|(role, content)| MessageTemplate {
                    role: *role,
                    content: (*content).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let t = template(&[
            (Role::System, "You handle {{task}}."),
            (Role::User, "{{task}}: {{input}} / again {{input}}"),
        ]);
        let vars = Vars::new().set("task", "summarization").set("input", "abc");

        let rendered = render(&t, &vars);

        assert_eq!(rendered[0].content, "You handle summarization.");
        assert_eq!(rendered[1].content, "summarization: abc / again abc");
        assert_eq!(rendered[0].role, Role::System);
        assert_eq!(rendered[1].role, Role::User);
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = template(&[(Role::User, "{{a}} {{b}} {{c}}")]);
        let vars = Vars::new().set("c", "3").set("a", "1").set("b", "2");

        let first = render(&t, &vars);
        let second = render(&t, &vars);

        assert_eq!(first, second);
        assert_eq!(first[0].content, "1 2 3");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let t = template(&[(Role::User, "known {{known}}, unknown {{missing}}")]);
        let vars = Vars::new().set("known", "yes");

        let rendered = render(&t, &vars);

        assert_eq!(rendered[0].content, "known yes, unknown {{missing}}");
    }

    #[test]
    fn test_render_no_brace_escaping() {
        // There is no way to protect a literal placeholder: it is substituted.
        let t = template(&[(Role::User, "literal {{x}} stays? no")]);
        let vars = Vars::new().set("x", "GONE");

        let rendered = render(&t, &vars);
        assert_eq!(rendered[0].content, "literal GONE stays? no");
    }

    #[test]
    fn test_render_last_writer_wins_across_keys() {
        // The value for "alpha" contains placeholder syntax for "beta",
        // which sorts later, so the "beta" pass rewrites it too.
        let t = template(&[(Role::User, "{{alpha}}")]);
        let vars = Vars::new().set("alpha", "see {{beta}}").set("beta", "B");

        let rendered = render(&t, &vars);
        assert_eq!(rendered[0].content, "see B");
    }

    #[test]
    fn test_render_numeric_values_stringified() {
        let t = template(&[(Role::User, "count = {{num}}, flag = {{flag}}")]);
        let vars = Vars::new().set("num", 5).set("flag", false);

        let rendered = render(&t, &vars);
        assert_eq!(rendered[0].content, "count = 5, flag = false");
    }
}
