//! The five proxied operations.

use axum::http::{Method, StatusCode};

/// A gateway operation: its name in messages and metrics, the upstream
/// method it issues and the status upstream must answer with.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: &'static str,
    pub method: Method,
    pub expected: StatusCode,
}

impl Operation {
    pub fn completed_message(&self) -> String {
        format!("{} completed", self.name)
    }

    pub fn unsuccessful_message(&self) -> String {
        format!("{} external API returned unsuccessful response", self.name)
    }
}

pub static CREATE_SEARCH: Operation = Operation {
    name: "api_search",
    method: Method::POST,
    expected: StatusCode::CREATED,
};

pub static POLL_SEARCH: Operation = Operation {
    name: "api_search_poll",
    method: Method::GET,
    expected: StatusCode::OK,
};

pub static CREATE_RESERVATION: Operation = Operation {
    name: "api_reservations",
    method: Method::POST,
    expected: StatusCode::CREATED,
};

pub static POLL_RESERVATION: Operation = Operation {
    name: "api_reservations_poll",
    method: Method::GET,
    expected: StatusCode::OK,
};

pub static DELETE_RESERVATION: Operation = Operation {
    name: "api_reservations_delete",
    method: Method::DELETE,
    expected: StatusCode::ACCEPTED,
};
