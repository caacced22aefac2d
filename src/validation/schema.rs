//! Typed schema descriptors.
//!
//! A [`Schema`] is data: a list of [`FieldSpec`]s plus the names that must be
//! present. It renders itself as a JSON Schema document, which `engine.rs`
//! compiles once, so new payload shapes are added by describing them, not by
//! writing new validation code.

use std::fmt;

use serde_json::{json, Map, Value};

/// JSON type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// Semantic string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Email => f.write_str("email"),
        }
    }
}

/// Constraints on a single field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub allowed: Option<&'static [&'static str]>,
    pub pattern: Option<&'static str>,
    pub format: Option<Format>,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            allowed: None,
            pattern: None,
            format: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// Restrict a string field to a closed set of values.
    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Require a string field to match an ECMA-262 `pattern`.
    pub fn matching(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut rule = Map::new();
        rule.insert("type".into(), json!(self.kind.to_string()));
        if let Some(allowed) = self.allowed {
            rule.insert("enum".into(), json!(allowed));
        }
        if let Some(pattern) = self.pattern {
            rule.insert("pattern".into(), json!(pattern));
        }
        if let Some(format) = self.format {
            rule.insert("format".into(), json!(format.to_string()));
        }
        Value::Object(rule)
    }
}

/// An object schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
    pub required: Vec<&'static str>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field that must be present.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.required.push(spec.name);
        self.fields.push(spec);
        self
    }

    /// Add a field that is checked only when present.
    pub fn optional(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// The equivalent JSON Schema document. Undeclared properties are allowed.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|spec| (spec.name.to_string(), spec.to_json_schema()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}
