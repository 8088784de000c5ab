use reqwest::StatusCode;
use snafu::{Location, Snafu};
use url::Url;

pub type Result<T, E = SupabaseError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SupabaseError {
    #[snafu(display("cannot build endpoint `{path}` from the project url: {source}"))]
    Endpoint {
        path: String,
        source: url::ParseError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("request to `{url}` failed: {source}"))]
    Transport {
        url: Url,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("`{url}` responded with {status}: {message}"))]
    Rejected {
        url: Url,
        status: StatusCode,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("`{url}` returned no rows"))]
    EmptyResponse {
        url: Url,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to encode the session for storage: {source}"))]
    EncodeSession {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

impl SupabaseError {
    /// Whether the backend itself refused the request, as opposed to the request
    /// never completing.
    pub fn is_rejected(&self) -> bool {
        matches!(self, SupabaseError::Rejected { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SupabaseError::Rejected { status, .. } => Some(*status),
            SupabaseError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Pulls a human readable message out of an error body. The auth and data
/// APIs disagree on the field name, so try each of them before falling back
/// to the raw body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    const KEYS: [&str; 4] = ["error_description", "msg", "message", "error"];

    if let Ok(serde_json::Value::Object(object)) = serde_json::from_str(body) {
        let message = KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(serde_json::Value::as_str));

        if let Some(message) = message {
            return message.to_owned();
        }
    }

    match body.trim() {
        "" => status.canonical_reason().unwrap_or("unknown error").to_owned(),
        body => body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_auth_error_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Invalid login credentials"
        );
    }

    #[test]
    fn message_from_rest_error_body() {
        let body = r#"{"code":"42501","details":null,"hint":null,"message":"permission denied for table trackers"}"#;
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, body),
            "permission denied for table trackers"
        );
    }

    #[test]
    fn message_falls_back_to_body_then_reason() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::NOT_FOUND, "  "), "Not Found");
    }
}
