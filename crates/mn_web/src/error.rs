use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use mn_core::Error;

use crate::dto::ResponseEnvelope;

/// Wraps the core error so it can cross the axum boundary as a response
/// with the envelope body and the status the original contract assigns to
/// each failure class.
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidQuery(_) | Error::Discovery(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        error!("Request failed ({}): {}", status, message);

        let body = ResponseEnvelope::error(status.as_u16(), message.clone(), vec![message]);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::InvalidQuery("x".into()), StatusCode::BAD_REQUEST),
            (Error::Discovery("x".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::Conflict("x".into()), StatusCode::CONFLICT),
            (Error::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError(error).status(), expected);
        }
    }
}
