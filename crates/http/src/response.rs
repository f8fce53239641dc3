//! JSend success envelope: `{"status": "success", "data": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Envelope<T> {
    status: &'static str,
    data: T,
}

/// Successful response carrying `data` under a JSend envelope.
#[derive(Debug)]
pub struct Success<T> {
    status: StatusCode,
    data: T,
}

impl<T: Serialize> Success<T> {
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self { status, data }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: "success",
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}
