//! Typed request payloads.
//!
//! The gateway itself forwards raw JSON after schema validation; these types
//! are what clients build payloads from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripMode {
    OneWay,
    RoundTrip,
}

/// Body of `POST /search/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub start_address: String,
    pub end_address: String,
    pub mode: TripMode,
    /// `YYYY-MM-DD HH:mm`
    pub pickup_datetime: String,
    pub num_passengers: u32,
    pub currency: String,
}

/// Body of `POST /reservations/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_id: Option<String>,
    pub result_id: String,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub airline: String,
    pub flight_number: String,
}
