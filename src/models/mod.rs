pub mod itinerary;
pub mod like;
pub mod trip;
pub mod user;

use serde::Serialize;

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseDto<T> {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ResponseDto<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: 200,
            code: "OK",
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            code: "OK",
            message: message.into(),
            data: None,
        }
    }
}
