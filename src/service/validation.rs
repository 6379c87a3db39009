//! Request validation from declared field rules.
//!
//! Every failing field is reported, not just the first one. Store-dependent rules
//! (isbn uniqueness, author existence) live in the services and append to the same map.

use crate::error::{AppError, ValidationErrors};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    /// Calendar date as `YYYY-MM-DD`.
    Date,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl FieldRule {
    const fn new(field: &'static str, kind: FieldKind) -> Self {
        FieldRule {
            field,
            kind,
            required: true,
            min_length: None,
            max_length: None,
        }
    }

    pub const fn string(field: &'static str) -> Self {
        Self::new(field, FieldKind::String)
    }

    pub const fn integer(field: &'static str) -> Self {
        Self::new(field, FieldKind::Integer)
    }

    pub const fn date(field: &'static str) -> Self {
        Self::new(field, FieldKind::Date)
    }

    pub const fn min(self, n: usize) -> Self {
        FieldRule {
            min_length: Some(n),
            ..self
        }
    }

    pub const fn max(self, n: usize) -> Self {
        FieldRule {
            max_length: Some(n),
            ..self
        }
    }
}

/// Authors only require string name/email; declared column lengths are left to the store.
pub const AUTHOR_RULES: &[FieldRule] = &[FieldRule::string("name"), FieldRule::string("email")];

pub const BOOK_RULES: &[FieldRule] = &[
    FieldRule::string("title").max(255),
    FieldRule::string("isbn").max(20),
    FieldRule::date("published_date"),
    FieldRule::integer("author_id"),
];

pub const SEARCH_RULES: &[FieldRule] = &[FieldRule::string("title").min(1)];

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body against every rule. Required fields must be present.
    pub fn validate(body: &HashMap<String, Value>, rules: &[FieldRule]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for rule in rules {
            match body.get(rule.field) {
                Some(v) => validate_field(rule, v, &mut errors),
                None if rule.required => errors.add(rule.field, required_message(rule.field)),
                None => {}
            }
        }
        errors
    }

    /// Validate only the fields present in body (for PUT/PATCH). A present field must still satisfy `required`.
    pub fn validate_partial(body: &HashMap<String, Value>, rules: &[FieldRule]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for rule in rules {
            if let Some(v) = body.get(rule.field) {
                validate_field(rule, v, &mut errors);
            }
        }
        errors
    }
}

/// Turn an already validated body into its typed input. Fields without a rule are dropped.
pub fn into_input<T: DeserializeOwned>(body: HashMap<String, Value>, rules: &[FieldRule]) -> Result<T, AppError> {
    let map: serde_json::Map<String, Value> = body
        .into_iter()
        .filter(|(k, _)| rules.iter().any(|r| r.field == k.as_str()))
        .collect();
    serde_json::from_value(Value::Object(map)).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn attribute(field: &str) -> String {
    field.replace('_', " ")
}

fn required_message(field: &str) -> String {
    format!("The {} field is required.", attribute(field))
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn validate_field(rule: &FieldRule, v: &Value, errors: &mut ValidationErrors) {
    if is_blank(v) {
        if rule.required {
            errors.add(rule.field, required_message(rule.field));
        }
        return;
    }
    let name = attribute(rule.field);
    match rule.kind {
        FieldKind::String => {
            let Some(s) = v.as_str() else {
                errors.add(rule.field, format!("The {} field must be a string.", name));
                return;
            };
            let len = s.chars().count();
            if let Some(min) = rule.min_length {
                if len < min {
                    errors.add(
                        rule.field,
                        format!("The {} field must be at least {} characters.", name, min),
                    );
                }
            }
            if let Some(max) = rule.max_length {
                if len > max {
                    errors.add(
                        rule.field,
                        format!("The {} field must not be greater than {} characters.", name, max),
                    );
                }
            }
        }
        FieldKind::Integer => {
            if v.as_i64().is_none() {
                errors.add(rule.field, format!("The {} field must be an integer.", name));
            }
        }
        FieldKind::Date => {
            let valid = v
                .as_str()
                .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                .unwrap_or(false);
            if !valid {
                errors.add(rule.field, format!("The {} field must be a valid date.", name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookChanges, NewBook};
    use serde_json::json;

    fn body(v: Value) -> HashMap<String, Value> {
        match v {
            Value::Object(m) => m.into_iter().collect(),
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn create_reports_every_missing_field() {
        let errors = RequestValidator::validate(&body(json!({})), BOOK_RULES);
        for field in ["title", "isbn", "published_date", "author_id"] {
            assert!(errors.has(field), "{field} should be required");
        }
        assert_eq!(
            errors.get("published_date").unwrap(),
            ["The published date field is required."]
        );
    }

    #[test]
    fn wrong_types_and_lengths_fail() {
        let errors = RequestValidator::validate(
            &body(json!({
                "title": 42,
                "isbn": "x".repeat(21),
                "published_date": "August 1965",
                "author_id": "1",
            })),
            BOOK_RULES,
        );
        assert_eq!(errors.get("title").unwrap(), ["The title field must be a string."]);
        assert_eq!(
            errors.get("isbn").unwrap(),
            ["The isbn field must not be greater than 20 characters."]
        );
        assert!(errors.has("published_date"));
        assert!(errors.has("author_id"));
    }

    #[test]
    fn blank_strings_and_nulls_count_as_missing() {
        let errors = RequestValidator::validate(&body(json!({"name": "  ", "email": null})), AUTHOR_RULES);
        assert_eq!(errors.get("name").unwrap(), ["The name field is required."]);
        assert_eq!(errors.get("email").unwrap(), ["The email field is required."]);
    }

    #[test]
    fn author_lengths_are_not_enforced() {
        let errors = RequestValidator::validate(
            &body(json!({"name": "n".repeat(400), "email": "not-an-email"})),
            AUTHOR_RULES,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn partial_only_checks_supplied_fields() {
        assert!(RequestValidator::validate_partial(&body(json!({})), BOOK_RULES).is_empty());
        let errors = RequestValidator::validate_partial(&body(json!({"title": null, "extra": 1})), BOOK_RULES);
        assert_eq!(errors.len(), 1);
        assert!(errors.has("title"));
    }

    #[test]
    fn search_title_must_be_non_empty() {
        let errors = RequestValidator::validate(&body(json!({"title": ""})), SEARCH_RULES);
        assert!(errors.has("title"));
        assert!(RequestValidator::validate(&body(json!({"title": "D"})), SEARCH_RULES).is_empty());
    }

    #[test]
    fn validated_body_becomes_typed_input() {
        let input: NewBook = into_input(
            body(json!({
                "title": "Dune",
                "isbn": "9780441013593",
                "published_date": "1965-08-01",
                "author_id": 1,
                "ignored": true,
            })),
            BOOK_RULES,
        )
        .unwrap();
        assert_eq!(input.published_date, NaiveDate::from_ymd_opt(1965, 8, 1).unwrap());

        let changes: BookChanges = into_input(body(json!({"isbn": "123"})), BOOK_RULES).unwrap();
        assert_eq!(changes.isbn.as_deref(), Some("123"));
        assert!(changes.title.is_none());
    }
}
