//! Cookie consent submission.
//!
//! The banner posts `accept=all`, `accept=none` or `accept=selected` with one
//! `category` field per ticked checkbox.

use axum::{
    Form,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::cookies::{AcceptedCookies, new_session_id_cookie, session_id_from_headers};
use crate::notifications::is_htmx;
use crate::routes::back_path;
use crate::state::AppState;

/// Interpret the posted banner form.
///
/// Repeated `category` fields arrive as separate pairs, so the form is read as
/// a list instead of a struct.
#[must_use]
pub fn parse_choice(fields: &[(String, String)]) -> AcceptedCookies {
    let accept = fields
        .iter()
        .find(|(name, _)| name == "accept")
        .map_or("selected", |(_, value)| value.as_str());

    match accept {
        "all" => AcceptedCookies::accept_all(),
        "none" => AcceptedCookies::default(),
        _ => AcceptedCookies::selected(
            fields
                .iter()
                .filter(|(name, _)| name == "category")
                .map(|(_, value)| value.as_str()),
        ),
    }
}

/// Store the consent choice; issue a visitor id once anything is accepted.
#[instrument(skip(state, headers, fields))]
pub async fn accept(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let accepted = parse_choice(&fields);
    let secure = state.config().is_secure();

    let mut response_headers = HeaderMap::new();
    let mut set_cookie = |value: String| match HeaderValue::from_str(&value) {
        Ok(value) => {
            response_headers.append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Invalid Set-Cookie value: {e}"),
    };

    set_cookie(accepted.set_cookie(secure));
    if accepted.has_consent() && session_id_from_headers(&headers).is_none() {
        let (_, cookie) = new_session_id_cookie(secure);
        set_cookie(cookie);
    }

    tracing::debug!(all = accepted.all, none = accepted.none, "Cookie consent stored");

    if is_htmx(&headers) {
        // Empty body removes the banner
        return (StatusCode::OK, response_headers).into_response();
    }
    (response_headers, Redirect::to(&back_path(&headers, "/"))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_accept_all() {
        let choice = parse_choice(&fields(&[("accept", "all"), ("category", "essential")]));
        assert!(choice.all);
        assert!(choice.allows("statistics"));
    }

    #[test]
    fn test_accept_selected_categories() {
        let choice = parse_choice(&fields(&[("accept", "selected"), ("category", "statistics")]));
        assert!(!choice.all);
        assert!(choice.allows("essential"));
        assert!(choice.allows("statistics"));
        assert!(!choice.allows("marketing"));
    }

    #[test]
    fn test_decline() {
        let choice = parse_choice(&fields(&[("accept", "none")]));
        assert!(!choice.has_consent());
    }
}
