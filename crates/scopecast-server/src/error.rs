use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scopecast_ai::AiError;
use scopecast_core::EstimateError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 409 Conflict errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ConflictError(String);

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConflictError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self(ConflictError(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<ConflictError>().is_some() {
            return StatusCode::CONFLICT;
        }
        if let Some(e) = self.0.downcast_ref::<EstimateError>() {
            return estimate_status(e);
        }
        if let Some(e) = self.0.downcast_ref::<AiError>() {
            return match e {
                AiError::NoApiKey { .. } => StatusCode::SERVICE_UNAVAILABLE,
                AiError::Http(_)
                | AiError::Api { .. }
                | AiError::Empty { .. }
                | AiError::Parse(_)
                | AiError::Rejected(_) => StatusCode::BAD_GATEWAY,
            };
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn estimate_status(e: &EstimateError) -> StatusCode {
    match e {
        EstimateError::Validation(_) | EstimateError::InvalidRateInput(_) => {
            StatusCode::BAD_REQUEST
        }
        EstimateError::NoEstimate => StatusCode::NOT_FOUND,
        EstimateError::AnalysisInProgress => StatusCode::CONFLICT,
        // Only generated documents are parsed server-side.
        EstimateError::Malformed(_)
        | EstimateError::Shape { .. }
        | EstimateError::UnknownRole { .. } => StatusCode::BAD_GATEWAY,
        EstimateError::HomeNotFound
        | EstimateError::Io(_)
        | EstimateError::Yaml(_)
        | EstimateError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({ "error": self.0.to_string() });
        if let Some(EstimateError::Validation(fields)) = self.0.downcast_ref::<EstimateError>() {
            body["fields"] = serde_json::json!(fields);
        }
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{:#}", self.0);
        }
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopecast_core::request::FieldError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_maps_to_400() {
        let err = EstimateError::Validation(vec![FieldError {
            field: "description".into(),
            message: "description is required".into(),
        }]);
        assert_eq!(status_of(err.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bad_rate_maps_to_400() {
        let err = EstimateError::InvalidRateInput("abc".into());
        assert_eq!(status_of(err.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn no_estimate_maps_to_404() {
        assert_eq!(status_of(EstimateError::NoEstimate.into()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn in_progress_maps_to_409() {
        assert_eq!(
            status_of(EstimateError::AnalysisInProgress.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(AppError::conflict("superseded")), StatusCode::CONFLICT);
    }

    #[test]
    fn service_failures_map_to_502() {
        let api = AiError::Api {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(status_of(api.into()), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(AiError::Parse("eof".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        let rejected = AiError::Rejected(EstimateError::Shape {
            path: "phases".into(),
            reason: "at least one phase is required".into(),
        });
        assert_eq!(status_of(rejected.into()), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_key_maps_to_503() {
        let err = AiError::NoApiKey {
            env: "GEMINI_API_KEY".into(),
        };
        assert_eq!(status_of(err.into()), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unknown_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
