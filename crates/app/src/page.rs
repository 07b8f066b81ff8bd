use axum::{
    Json,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use fyyur_models::forms::{FORM_CHOICES, FieldErrors};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

/// What the template layer receives: the template to render (or a redirect
/// target), flashed messages, per-field form errors and the page context.
#[derive(Debug, Serialize)]
pub struct Page {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flash: Vec<String>,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
    pub context: Value,
    #[serde(skip)]
    status: StatusCode,
    /// Set when the context could not be serialized; the page then answers
    /// the 500 error page instead.
    #[serde(skip)]
    broken: bool,
}

impl Page {
    pub fn new(template: &'static str) -> Self {
        Self {
            template: Some(template),
            redirect: None,
            flash: Vec::new(),
            errors: FieldErrors::new(),
            context: json!({}),
            status: StatusCode::OK,
            broken: false,
        }
    }

    pub fn home() -> Self {
        Self::new("pages/home.html")
    }

    /// 303 See Other to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            template: None,
            redirect: Some(location.into()),
            status: StatusCode::SEE_OTHER,
            ..Self::new("")
        }
    }

    /// A form page: the current field values plus the choice lists.
    pub fn form(template: &'static str, form: &impl Serialize) -> Self {
        Self::new(template).with(json!({ "form": form, "choices": FORM_CHOICES }))
    }

    pub fn with(mut self, context: impl Serialize) -> Self {
        match serde_json::to_value(context) {
            Ok(value) => self.context = value,
            Err(e) => self.fail(e),
        }
        self
    }

    /// Adds `key` to an object context.
    pub fn insert(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                if let Value::Object(map) = &mut self.context {
                    map.insert(key.to_string(), value);
                }
            }
            Err(e) => self.fail(e),
        }
        self
    }

    fn fail(&mut self, e: serde_json::Error) {
        error!("Could not build context for {:?}: {e}", self.template);
        self.broken = true;
    }

    pub fn flash(mut self, message: impl Into<String>) -> Self {
        self.flash.push(message.into());
        self
    }

    pub fn errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        if self.broken {
            return Page::new("errors/500.html")
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
        let status = self.status;
        match self.redirect.clone() {
            Some(location) => (status, [(LOCATION, location)], Json(self)).into_response(),
            None => (status, Json(self)).into_response(),
        }
    }
}
