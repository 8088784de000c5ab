use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use snafu::{Location, Snafu};

use crate::model::{TrackerId, UnknownFieldType};
use crate::supabase::SupabaseError;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, Snafu, Serialize)]
#[snafu(visibility(pub(crate)))]
#[serde(tag = "error", content = "data")]
pub enum ApiError {
    #[snafu(display("the backend is not configured"))]
    Unconfigured {
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("backend request failed: {source}"))]
    Backend {
        #[serde(skip)]
        source: SupabaseError,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("tracker `{id}` does not exist"))]
    TrackerNotFound {
        id: TrackerId,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("a tracker needs a name"))]
    MissingName {
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("field `{name}` is declared more than once"))]
    DuplicateField {
        name: String,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    InvalidFieldType {
        #[serde(skip)]
        source: UnknownFieldType,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unconfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Backend { .. } => StatusCode::BAD_GATEWAY,
            ApiError::TrackerNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MissingName { .. }
            | ApiError::DuplicateField { .. }
            | ApiError::InvalidFieldType { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(flatten)]
    data: ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "{}", self);
        }

        let content = ErrorResponse {
            message: self.to_string(),
            data: self,
        };

        (status, Json(content)).into_response()
    }
}
