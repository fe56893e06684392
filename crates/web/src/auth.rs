//! Credential checking for the demo login form.
//!
//! There is one test user. `E2E_USER` / `E2E_PASS` add an accepted
//! username / password next to the built-in `demo` / `password123`; the two
//! halves are checked independently. No hashing, no lockout.

use axum::{
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use demoapp_common::credentials::{DEFAULT_PASSWORD, DEFAULT_USERNAME, PASS_ENV, USER_ENV};
use demoapp_common::Credentials;
use serde_json::Value;

/// Accepted usernames and passwords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPolicy {
    usernames: Vec<String>,
    passwords: Vec<String>,
}

impl CredentialPolicy {
    /// Built-in pair plus optional overrides.
    pub fn new(user_override: Option<String>, pass_override: Option<String>) -> Self {
        let mut usernames = Vec::new();
        let mut passwords = Vec::new();

        usernames.extend(user_override.filter(|v| !v.is_empty()));
        passwords.extend(pass_override.filter(|v| !v.is_empty()));
        usernames.push(DEFAULT_USERNAME.to_string());
        passwords.push(DEFAULT_PASSWORD.to_string());

        Self { usernames, passwords }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(lookup(USER_ENV), lookup(PASS_ENV))
    }

    pub fn accepts(&self, creds: &Credentials) -> bool {
        self.usernames.iter().any(|u| *u == creds.username)
            && self.passwords.iter().any(|p| *p == creds.password)
    }
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Login body, either `application/x-www-form-urlencoded` or JSON.
///
/// Only single string values count. A repeated form field, or a JSON field
/// that is not a string, becomes an empty string and fails the credential
/// check. Any other content type (or none) yields empty credentials. JSON
/// that does not parse is rejected before any check.
#[derive(Debug)]
pub struct LoginForm(pub Credentials);

#[axum::async_trait]
impl<S> FromRequest<S> for LoginForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let creds = if content_type.starts_with("application/json") {
            let Json(body) = Json::<Value>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Credentials::new(json_field(&body, "username"), json_field(&body, "password"))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Credentials::new(form_field(&pairs, "username"), form_field(&pairs, "password"))
        } else {
            Credentials::new("", "")
        };

        Ok(Self(creds))
    }
}

fn form_field(pairs: &[(String, String)], name: &str) -> String {
    let mut values = pairs.iter().filter(|(k, _)| k == name).map(|(_, v)| v);
    match (values.next(), values.next()) {
        (Some(value), None) => value.clone(),
        _ => String::new(),
    }
}

fn json_field(body: &Value, name: &str) -> String {
    body.get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
