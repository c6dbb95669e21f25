//! Contact form submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use emporium_core::{Email, Message};

use crate::error::add_breadcrumb;
use crate::middleware::ClientIp;
use crate::models::Flash;
use crate::notifications::{HxTrigger, is_htmx, push_flash};
use crate::routes::{back_path, notify_only};
use crate::state::AppState;

/// Contact form data, as posted by the contact section.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub salutation: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subject: Option<String>,
    pub content: String,
    pub captcha_token: Option<String>,
}

impl ContactForm {
    fn to_message(&self) -> Result<Message, String> {
        let email =
            Email::parse(&self.email).map_err(|_| "Please enter a valid email address.".to_owned())?;
        let message = Message {
            id: None,
            salutation: non_empty(self.salutation.as_deref()),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email,
            subject: non_empty(self.subject.as_deref()),
            content: self.content.trim().to_owned(),
            created_at: None,
        };
        message
            .validate()
            .map_err(|_| "Please fill in your name and a message.".to_owned())?;
        Ok(message)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Confirmation fragment replacing the form (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/contact_success.html")]
pub struct ContactSuccessTemplate {
    pub first_name: String,
}

/// Forward a contact message to the content backend.
///
/// Validation and backend failures keep the form in place and show a
/// notification.
#[instrument(skip(state, session, client_ip, headers, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    Form(form): Form<ContactForm>,
) -> Response {
    let htmx = is_htmx(&headers);
    let back_to = back_path(&headers, "/");

    let message = match form.to_message() {
        Ok(message) => message,
        Err(text) => return notify_only(htmx, &session, Flash::warning(text), &back_to).await,
    };

    let token = form.captcha_token.as_deref().filter(|t| !t.is_empty());
    if let Err(e) = state.backend().submit_message(&message, token, client_ip).await {
        tracing::warn!(status = e.status(), error = e.message(), "Contact message failed");
        let flash = Flash::error(format!("Your message could not be sent: {}", e.message()));
        return notify_only(htmx, &session, flash, &back_to).await;
    }

    add_breadcrumb("contact", "Message sent", &[]);
    let flash = Flash::success("Thank you for your message!");

    if htmx {
        let template = ContactSuccessTemplate {
            first_name: message.first_name,
        };
        return (HxTrigger::new().notify(&flash).headers(), template).into_response();
    }

    push_flash(&session, flash).await;
    Redirect::to(&back_to).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            salutation: Some(String::new()),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            subject: Some(" Hello ".to_string()),
            content: "Do you ship to the Moon?".to_string(),
            captcha_token: None,
        }
    }

    #[test]
    fn test_form_to_message() {
        let message = form().to_message().unwrap();
        assert_eq!(message.salutation, None);
        assert_eq!(message.subject.as_deref(), Some("Hello"));
        assert_eq!(message.email.as_str(), "grace@example.com");
    }

    #[test]
    fn test_blank_content_is_rejected() {
        let blank = ContactForm {
            content: "   ".to_string(),
            ..form()
        };
        assert!(blank.to_message().is_err());

        let bad_email = ContactForm {
            email: "grace".to_string(),
            ..form()
        };
        assert!(bad_email.to_message().is_err());
    }
}
