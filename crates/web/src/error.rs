use askama::Template;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

/// Non-table outcome of a page request, rendered as a status page (or a
/// fragment for htmx swaps). A store that is still loading also short-circuits
/// through here, with status 200 and an auto-refresh.
///
/// Fragments are always served with 200: htmx ignores the body of 4xx/5xx
/// responses, which would leave a search box silently doing nothing.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub refresh: bool,
    pub fragment: bool,
    /// Request URI a loading fragment re-polls.
    pub poll: Option<String>,
}

#[derive(Template)]
#[template(path = "status.html")]
struct StatusPage<'a> {
    message: &'a str,
    refresh: bool,
}

#[derive(Template)]
#[template(path = "partials/status.html")]
struct StatusFragment<'a> {
    message: &'a str,
    poll: Option<&'a str>,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            refresh: false,
            fragment: false,
            poll: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            refresh: true,
            ..Self::new(StatusCode::OK, "Loading...")
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Render as a table fragment instead of a full page. A loading fragment
    /// polls `uri`, the request it answers, until the store is ready.
    pub fn fragment(self, uri: &Uri) -> Self {
        Self {
            fragment: true,
            poll: self.refresh.then(|| uri.to_string()),
            ..self
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, message = %self.message, "serving error page");
        }
        let (status, rendered) = if self.fragment {
            let html = StatusFragment {
                message: &self.message,
                poll: self.poll.as_deref(),
            }
            .render();
            (StatusCode::OK, html)
        } else {
            let html = StatusPage {
                message: &self.message,
                refresh: self.refresh,
            }
            .render();
            (self.status, html)
        };
        match rendered {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "rendering status page failed");
                (status, self.message).into_response()
            }
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        tracing::error!(error = %e, "template render failed");
        AppError::internal("template render failed")
    }
}
