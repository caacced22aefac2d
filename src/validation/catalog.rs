//! Schemas for the payloads the gateway accepts.

use crate::validation::engine::{CompiledSchema, SchemaError};
use crate::validation::schema::{FieldSpec, Format, Schema};

/// `YYYY-MM-DD HH:mm`, 24-hour clock.
pub const PICKUP_DATETIME_PATTERN: &str =
    r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[1-2]\d|3[01]) (2[0-3]|[01]\d):[0-5]\d$";

pub const TRIP_MODES: &[&str] = &["one_way", "round_trip"];

/// Compiled schemas, built once at startup.
#[derive(Debug, Clone)]
pub struct Schemas {
    pub search: CompiledSchema,
    pub reservation: CompiledSchema,
}

impl Schemas {
    pub fn compile() -> Result<Self, SchemaError> {
        Ok(Self {
            search: CompiledSchema::compile(search_request())?,
            reservation: CompiledSchema::compile(reservation_request())?,
        })
    }
}

pub fn search_request() -> Schema {
    Schema::new()
        .field(FieldSpec::string("start_address"))
        .field(FieldSpec::string("end_address"))
        .field(FieldSpec::string("mode").one_of(TRIP_MODES))
        .field(FieldSpec::string("pickup_datetime").matching(PICKUP_DATETIME_PATTERN))
        .field(FieldSpec::integer("num_passengers"))
        .field(FieldSpec::string("currency"))
}

pub fn reservation_request() -> Schema {
    Schema::new()
        .field(FieldSpec::string("result_id"))
        .field(FieldSpec::string("email").with_format(Format::Email))
        .field(FieldSpec::string("phone_number"))
        .field(FieldSpec::string("first_name"))
        .field(FieldSpec::string("last_name"))
        .field(FieldSpec::string("airline"))
        .field(FieldSpec::string("flight_number"))
}
