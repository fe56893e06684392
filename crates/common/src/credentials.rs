//! Test-user credentials.

/// Username accepted when no override is configured.
pub const DEFAULT_USERNAME: &str = "demo";

/// Password accepted when no override is configured.
pub const DEFAULT_PASSWORD: &str = "password123";

/// Environment variable overriding the test username.
pub const USER_ENV: &str = "E2E_USER";

/// Environment variable overriding the test password.
pub const PASS_ENV: &str = "E2E_PASS";

/// A username/password pair as submitted through the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Credentials of the default test user, honouring `E2E_USER` / `E2E_PASS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Credentials::from_env`] with an injectable variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            username: non_empty(lookup(USER_ENV)).unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: non_empty(lookup(PASS_ENV)).unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
