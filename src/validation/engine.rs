//! Validation engine.
//!
//! A [`Schema`] is compiled once into a `jsonschema` validator with format
//! checks enabled. Every violation is collected, then one is reported:
//! missing required fields first, in declaration order, then the first
//! declared field at fault. Within a field a type error wins over enum,
//! pattern and format errors. Fields the schema does not mention are ignored.

use std::fmt;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::validation::schema::{FieldKind, Format, Schema};

/// The schema document itself was rejected at compile time.
#[derive(Debug, Error)]
#[error("invalid payload schema: {0}")]
pub struct SchemaError(String);

/// The violation reported for a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("'{field}' is a required property")]
    MissingField { field: &'static str },

    #[error("'{field}': {found} is not of type '{expected}'")]
    WrongType {
        field: &'static str,
        expected: FieldKind,
        found: String,
    },

    #[error("'{field}': {found} is not one of {}", quoted(.allowed))]
    NotInEnum {
        field: &'static str,
        found: String,
        allowed: &'static [&'static str],
    },

    #[error("'{field}': {found} does not match '{pattern}'")]
    PatternMismatch {
        field: &'static str,
        found: String,
        pattern: String,
    },

    #[error("'{field}': {found} is not a valid '{format}'")]
    InvalidFormat {
        field: &'static str,
        found: String,
        format: Format,
    },

    /// A violation with no typed counterpart, reported as the validator phrased it.
    #[error("{0}")]
    Rejected(String),
}

fn quoted(allowed: &[&str]) -> String {
    let items: Vec<String> = allowed.iter().map(|a| format!("'{a}'")).collect();
    format!("[{}]", items.join(", "))
}

// (group, position, kind): lower sorts first.
type Rank = (u8, usize, u8);

/// A schema paired with its compiled validator. Cheap to clone.
#[derive(Clone)]
pub struct CompiledSchema {
    schema: Arc<Schema>,
    validator: Arc<Validator>,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    pub fn compile(schema: Schema) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&schema.to_json_schema())
            .map_err(|e| SchemaError(e.to_string()))?;

        Ok(Self {
            schema: Arc::new(schema),
            validator: Arc::new(validator),
        })
    }

    fn classify(&self, error: &jsonschema::ValidationError<'_>) -> Option<(Rank, ValidationError)> {
        if let ValidationErrorKind::Required { property } = &error.kind {
            let (position, field) = self
                .schema
                .required
                .iter()
                .enumerate()
                .find(|(_, name)| property.as_str() == Some(**name))?;
            return Some(((0, position, 0), ValidationError::MissingField { field: *field }));
        }

        let path = error.instance_path.to_string();
        let name = path.strip_prefix('/')?;
        let (position, spec) = self
            .schema
            .fields
            .iter()
            .enumerate()
            .find(|(_, spec)| spec.name == name)?;
        let field = spec.name;
        let found = error.instance.to_string();

        let (kind, violation) = match &error.kind {
            ValidationErrorKind::Type { .. } => (
                0,
                ValidationError::WrongType {
                    field,
                    expected: spec.kind,
                    found,
                },
            ),
            ValidationErrorKind::Enum { .. } => (
                1,
                ValidationError::NotInEnum {
                    field,
                    found,
                    allowed: spec.allowed.unwrap_or(&[]),
                },
            ),
            ValidationErrorKind::Pattern { .. } => (
                2,
                ValidationError::PatternMismatch {
                    field,
                    found,
                    pattern: spec.pattern.unwrap_or_default().to_string(),
                },
            ),
            ValidationErrorKind::Format { .. } => (
                3,
                ValidationError::InvalidFormat {
                    field,
                    found,
                    format: spec.format?,
                },
            ),
            _ => return None,
        };
        Some(((1, position, kind), violation))
    }
}

/// Check `payload` against `schema`.
pub fn validate(payload: &Value, schema: &CompiledSchema) -> Result<(), ValidationError> {
    if !payload.is_object() {
        return Err(ValidationError::NotAnObject);
    }

    let mut reported: Option<(Rank, ValidationError)> = None;
    for error in schema.validator.iter_errors(payload) {
        let candidate = schema
            .classify(&error)
            .unwrap_or_else(|| ((2, 0, 0), ValidationError::Rejected(error.to_string())));
        if reported.as_ref().map_or(true, |(rank, _)| candidate.0 < *rank) {
            reported = Some(candidate);
        }
    }

    match reported {
        Some((_, violation)) => Err(violation),
        None => Ok(()),
    }
}
