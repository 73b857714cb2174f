use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// A resolution stage found the document but not the element it needed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("playlist for {pid} has no programme item")]
    NoProgramme { pid: String },

    #[error("media selection for {vpid} has no `{service}` media")]
    NoMediaService { vpid: String, service: String },

    #[error("media `{service}` for {vpid} has no `{supplier}` connection")]
    NoConnection {
        vpid: String,
        service: String,
        supplier: String,
    },
}

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("fetch {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("pattern {pattern} did not match {input:?}")]
    PatternMismatch { pattern: &'static str, input: String },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("no route for {0}")]
    UnknownRoute(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl CatalogueError {
    pub fn parse(msg: impl Into<String>) -> Self {
        CatalogueError::Parse(msg.into())
    }

    /// Stable machine-readable tag, echoed in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogueError::Fetch { .. } => "fetch",
            CatalogueError::Parse(_) => "parse",
            CatalogueError::PatternMismatch { .. } => "pattern_mismatch",
            CatalogueError::Resolution(ResolutionError::NoProgramme { .. }) => "no_programme",
            CatalogueError::Resolution(ResolutionError::NoMediaService { .. }) => {
                "no_media_service"
            }
            CatalogueError::Resolution(ResolutionError::NoConnection { .. }) => "no_connection",
            CatalogueError::UnknownRoute(_) => "unknown_route",
            CatalogueError::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for CatalogueError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogueError::Fetch { .. } => {
                tracing::warn!("Upstream fetch failed: {self}");
                StatusCode::BAD_GATEWAY
            }
            CatalogueError::Parse(_)
            | CatalogueError::PatternMismatch { .. }
            | CatalogueError::Resolution(_) => {
                tracing::warn!("Upstream document rejected: {self}");
                StatusCode::BAD_GATEWAY
            }
            CatalogueError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            CatalogueError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = json!({ "error": self.to_string(), "kind": self.kind() });
        (status, Json(body)).into_response()
    }
}

pub type Result<T, E = CatalogueError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_failures_have_distinct_kinds() {
        let programme: CatalogueError = ResolutionError::NoProgramme {
            pid: "b00xyz12".into(),
        }
        .into();
        let connection: CatalogueError = ResolutionError::NoConnection {
            vpid: "p01abcd3".into(),
            service: "svc".into(),
            supplier: "akamai".into(),
        }
        .into();
        assert_eq!(programme.kind(), "no_programme");
        assert_eq!(connection.kind(), "no_connection");
        assert_eq!(
            connection.to_string(),
            "media `svc` for p01abcd3 has no `akamai` connection"
        );
    }

    #[test]
    fn unknown_route_maps_to_404() {
        let resp = CatalogueError::UnknownRoute("/nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
