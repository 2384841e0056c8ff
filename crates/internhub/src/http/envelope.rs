use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{success, message?, data?}` wrapper returned by every workflow endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, None, data)
}

pub fn ok_with_message<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::OK, Some(message.into()), data)
}

pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::CREATED, Some(message.into()), data)
}

pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Envelope::<()> {
        success: false,
        message: Some(message.into()),
        data: None,
    };
    (status, Json(body)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, message: Option<String>, data: T) -> Response {
    let body = Envelope {
        success: true,
        message,
        data: Some(data),
    };
    (status, Json(body)).into_response()
}
