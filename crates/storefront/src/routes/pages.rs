//! CMS page route handlers.
//!
//! Pages are fetched from the content backend by path and rendered section by
//! section; `/` shows the page stored under `index`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::backend::BackendError;
use crate::filters;
use crate::layout::Layout;
use crate::middleware::RequestId;
use crate::sections::{RenderContext, RenderedSection, render_sections};
use crate::state::AppState;

/// Path of the page served at `/`.
pub const HOME_PAGE: &str = "index";

/// CMS page template.
#[derive(Template, WebTemplate)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub layout: Layout,
    pub subtitle: Option<String>,
    pub sections: Vec<RenderedSection>,
}

/// Error page template (404 and backend failures).
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub layout: Layout,
    pub status: u16,
    pub heading: String,
    pub message: String,
    pub request_id: String,
}

/// Render the error page for `status`.
#[must_use]
pub fn error_page(layout: Layout, status: StatusCode, request_id: String) -> Response {
    let (heading, message) = if status == StatusCode::NOT_FOUND {
        ("Page not found", "The page you are looking for does not exist.")
    } else {
        (
            "Something went wrong",
            "This page is temporarily unavailable. Please try again later.",
        )
    };

    let template = ErrorTemplate {
        layout: layout.titled(Some(heading)),
        status: status.as_u16(),
        heading: heading.to_owned(),
        message: message.to_owned(),
        request_id,
    };
    (status, template).into_response()
}

/// Page for a backend failure: 404 passes through, everything else is a 502.
#[must_use]
pub fn backend_error_page(layout: Layout, error: &BackendError, request_id: String) -> Response {
    if error.is_not_found() {
        error_page(layout, StatusCode::NOT_FOUND, request_id)
    } else {
        tracing::warn!(status = error.status(), error = error.message(), "Backend request failed");
        error_page(layout, StatusCode::BAD_GATEWAY, request_id)
    }
}

/// Display the home page.
#[instrument(skip(state, layout, request_id))]
pub async fn home(
    State(state): State<AppState>,
    layout: Layout,
    RequestId(request_id): RequestId,
) -> Response {
    render_page(&state, HOME_PAGE, layout, request_id).await
}

/// Display a CMS page by path.
#[instrument(skip(state, layout, request_id))]
pub async fn show(
    State(state): State<AppState>,
    Path(path): Path<String>,
    layout: Layout,
    RequestId(request_id): RequestId,
) -> Response {
    render_page(&state, &path, layout, request_id).await
}

/// Fallback for routes nothing else matched.
pub async fn not_found(layout: Layout, RequestId(request_id): RequestId) -> Response {
    error_page(layout, StatusCode::NOT_FOUND, request_id)
}

async fn render_page(state: &AppState, path: &str, layout: Layout, request_id: String) -> Response {
    let page = match state.backend().get_page(path).await {
        Ok(page) => page,
        Err(e) => return backend_error_page(layout, &e, request_id),
    };

    let ctx = RenderContext {
        media_base: &state.config().api_url,
        captcha_site_key: layout.captcha_site_key.as_deref(),
    };
    let sections = render_sections(&page.content, &ctx);

    PageTemplate {
        layout: layout
            .titled(page.title.as_deref())
            .described(page.description.as_deref(), page.keywords.as_deref()),
        subtitle: page.subtitle.clone(),
        sections,
    }
    .into_response()
}
