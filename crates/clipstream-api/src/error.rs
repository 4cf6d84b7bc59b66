use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clipstream_types::Error;
use tracing::error;

/// Newtype so the shared taxonomy can carry an IntoResponse impl here
/// without the types crate growing an axum dependency. Handlers return
/// `ApiResult<T>`; `?` on any store or engine call converts through `From`.
#[derive(Debug)]
pub struct ApiError(pub Error);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Error::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            error!("store unavailable: {}", self.0);
        }

        let body = Json(serde_json::json!({
            "error": code,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// A spawn_blocking join failure means the worker panicked or was
/// cancelled; surface it as the store being unavailable.
pub fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {e}");
    ApiError(Error::Unavailable("worker task failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        let cases = [
            (Error::invalid("x"), StatusCode::BAD_REQUEST),
            (Error::not_found("x"), StatusCode::NOT_FOUND),
            (Error::Conflict("x".into()), StatusCode::CONFLICT),
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                Error::Unavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            let resp = ApiError(err).into_response();
            assert_eq!(resp.status(), expected);
        }
    }
}
