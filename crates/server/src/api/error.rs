use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use procura_core::errors::{ApplicationError, InterfaceError};

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self(value.into_interface(Uuid::new_v4().to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, correlation_id) = match &self.0 {
            InterfaceError::BadRequest { correlation_id, .. } => {
                (StatusCode::BAD_REQUEST, correlation_id)
            }
            InterfaceError::NotFound { correlation_id, .. } => (StatusCode::NOT_FOUND, correlation_id),
            InterfaceError::Internal { correlation_id, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, correlation_id)
            }
        };

        if status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = %correlation_id,
                error = %self.0,
                "request failed"
            );
        } else {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %correlation_id,
                error = %self.0,
                "request rejected"
            );
        }

        // Client errors echo the cause; internal detail stays in the log.
        let message = if status.is_server_error() {
            self.0.user_message().to_string()
        } else {
            self.0.message().to_string()
        };
        let body = ErrorBody { error: message, correlation_id: correlation_id.clone() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use procura_core::errors::{ApplicationError, DomainError};

    use super::ApiError;

    #[test]
    fn application_errors_map_to_status_codes() {
        let cases = [
            (ApplicationError::from(DomainError::Validation("bad".into())), StatusCode::BAD_REQUEST),
            (ApplicationError::not_found("rfp", "r1"), StatusCode::NOT_FOUND),
            (ApplicationError::UpstreamUnavailable("imap".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApplicationError::Persistence("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), expected);
        }
    }
}
