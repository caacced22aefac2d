//! Inbound payload validation.
//!
//! # Data Flow
//! ```text
//! request body (serde_json::Value)
//!     → engine.rs validate(payload, compiled schema)
//!         ← schema.rs descriptors (FieldSpec / Schema), rendered to JSON Schema
//!         ← jsonschema validator, compiled once per schema
//!         ← catalog.rs (search + reservation schemas, compiled at startup)
//!     → Ok(()) or one ValidationError
//! ```

pub mod catalog;
pub mod engine;
pub mod schema;

pub use catalog::Schemas;
pub use engine::{validate, CompiledSchema, SchemaError, ValidationError};
pub use schema::{FieldKind, FieldSpec, Format, Schema};
