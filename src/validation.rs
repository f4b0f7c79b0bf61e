//! Declarative required-field checks over typed request bodies.

use crate::error::{AppError, AppResult};

/// One required field: body key and the label reported back to the client.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub key: &'static str,
    pub label: &'static str,
}

/// How a field arrived in a request body. JSON `null` counts as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Absent,
    Blank,
    Filled,
}

impl Presence {
    pub fn of<T>(value: &Option<T>) -> Self {
        match value {
            None => Self::Absent,
            Some(_) => Self::Filled,
        }
    }

    /// Whitespace-only text is blank.
    pub fn of_text(value: &Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None => Self::Absent,
            Some("") => Self::Blank,
            Some(_) => Self::Filled,
        }
    }
}

/// Request body that can report how each of its fields arrived, by wire key.
pub trait Fields {
    fn presence(&self, key: &str) -> Presence;
}

/// Ordered set of rules; violations are always reported in rule order.
#[derive(Debug, Clone, Copy)]
pub struct RequiredFields {
    rules: &'static [Rule],
}

impl RequiredFields {
    pub const fn new(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// Rules whose field is absent from `body` or blank.
    pub fn violations<B: Fields + ?Sized>(&self, body: &B) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|rule| body.presence(rule.key) != Presence::Filled)
            .copied()
            .collect()
    }

    /// Rules whose field is present in `body` but blank. Absent fields pass.
    pub fn blank_supplied<B: Fields + ?Sized>(&self, body: &B) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|rule| body.presence(rule.key) == Presence::Blank)
            .copied()
            .collect()
    }

    pub fn check<B: Fields + ?Sized>(&self, body: &B) -> AppResult<()> {
        let failed = self.violations(body);
        if failed.is_empty() {
            return Ok(());
        }
        Err(missing(&failed))
    }

    pub fn check_supplied<B: Fields + ?Sized>(&self, body: &B) -> AppResult<()> {
        let failed = self.blank_supplied(body);
        if failed.is_empty() {
            return Ok(());
        }
        Err(AppError::Validation {
            message: format!(
                "Cannot update, required field(s) {} may not be blank.",
                join_labels(&failed)
            ),
            location: Some(failed[0].key),
        })
    }
}

fn missing(failed: &[Rule]) -> AppError {
    AppError::Validation {
        message: format!(
            "Please correct: required field(s) {} missing from request body.",
            join_labels(failed)
        ),
        location: failed.first().map(|rule| rule.key),
    }
}

fn join_labels(rules: &[Rule]) -> String {
    rules
        .iter()
        .map(|rule| rule.label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trimmed text, or `None` when absent or blank.
pub fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Unwraps a field that a preceding [`RequiredFields::check`] already vouched for.
pub fn require<T>(value: Option<T>, rule: Rule) -> AppResult<T> {
    value.ok_or_else(|| missing(&[rule]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Body {
        user_id: Option<String>,
        category: Option<String>,
        order: Option<i64>,
        text: Option<String>,
    }

    impl Fields for Body {
        fn presence(&self, key: &str) -> Presence {
            match key {
                "userId" => Presence::of_text(&self.user_id),
                "category" => Presence::of_text(&self.category),
                "order" => Presence::of(&self.order),
                "text" => Presence::of_text(&self.text),
                _ => Presence::Absent,
            }
        }
    }

    const RULES: RequiredFields = RequiredFields::new(&[
        Rule { key: "userId", label: "User Id" },
        Rule { key: "category", label: "Category" },
        Rule { key: "order", label: "Order" },
        Rule { key: "text", label: "Text" },
    ]);

    fn body(value: serde_json::Value) -> Body {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn enumerates_every_missing_or_blank_field() {
        let err = RULES
            .check(&body(serde_json::json!({ "userId": "abc", "category": "   ", "order": 3 })))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Category"), "{msg}");
        assert!(msg.contains("Text"), "{msg}");
        assert!(!msg.contains("Order"), "{msg}");
        assert_eq!(msg.matches('.').count(), 1, "single sentence: {msg}");
        assert_eq!(err.location(), Some("category"));
    }

    #[test]
    fn violations_keep_rule_order() {
        let labels: Vec<_> = RULES
            .violations(&body(serde_json::json!({})))
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels, ["User Id", "Category", "Order", "Text"]);
    }

    #[test]
    fn null_counts_as_missing() {
        let b = body(serde_json::json!({ "userId": "a", "category": null, "order": 1, "text": "x" }));
        assert_eq!(RULES.violations(&b).len(), 1);
        assert!(RULES.check_supplied(&b).is_ok());
    }

    #[test]
    fn supplied_check_ignores_absent_fields() {
        assert!(RULES
            .check_supplied(&body(serde_json::json!({ "text": "hello" })))
            .is_ok());
        let err = RULES
            .check_supplied(&body(serde_json::json!({ "text": " " })))
            .unwrap_err();
        assert!(err.to_string().contains("Text"));
    }

    #[test]
    fn filled_trims_and_drops_blanks() {
        assert_eq!(filled(Some("  hi ".into())).as_deref(), Some("hi"));
        assert_eq!(filled(Some("   ".into())), None);
        assert_eq!(filled(None), None);
        assert!(require::<i64>(None, RULES.rules[2]).is_err());
    }
}
