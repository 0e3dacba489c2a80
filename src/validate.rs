//! Declarative request validation.
//!
//! A [`Schema`] is a list of [`FieldRule`]s evaluated against a JSON object by
//! the single [`validate`] function. Every failing rule contributes one
//! message; validation never stops at the first error except that a missing
//! required field skips that field's remaining checks.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Expected JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub kind: Option<FieldKind>,
    /// Minimum length in characters (strings only).
    pub min_length: Option<usize>,
    /// Maximum length in characters (strings only).
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
}

impl FieldRule {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            required: false,
            kind: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, re: Regex) -> Self {
        self.pattern = Some(re);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Evaluate `schema` against `data`. A non-object `data` is treated as an
/// object with no fields.
pub fn validate(data: &Value, schema: &Schema) -> Validation {
    let mut errors = Vec::new();

    for rule in schema.rules() {
        let value = data.get(rule.field).filter(|v| !v.is_null());

        let missing = match value {
            None => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };

        if rule.required && missing {
            errors.push(format!("{} is required", rule.field));
            continue;
        }

        let Some(value) = value else { continue };

        if let Some(kind) = rule.kind {
            if !kind.matches(value) {
                errors.push(format!("{} must be of type {}", rule.field, kind.as_str()));
            }
        }

        if let Value::String(s) = value {
            let len = s.chars().count();
            if let Some(min) = rule.min_length {
                if len < min {
                    errors.push(format!(
                        "{} must be at least {} characters long",
                        rule.field, min
                    ));
                }
            }
            if let Some(max) = rule.max_length {
                if len > max {
                    errors.push(format!(
                        "{} must be no more than {} characters long",
                        rule.field, max
                    ));
                }
            }
            if let Some(re) = &rule.pattern {
                if !re.is_match(s) {
                    errors.push(format!("{} format is invalid", rule.field));
                }
            }
        }
    }

    Validation {
        valid: errors.is_empty(),
        errors,
    }
}
