//! Login helpers shared by scenarios and browser tests.

use std::time::Duration;

use demoapp_common::{testid, Credentials};
use tracing::debug;

use crate::error::E2eResult;
use crate::playwright::{BrowserSession, UrlMatch};

/// Either outcome of a login form post
pub const DASHBOARD_OR_LOGIN: &str = r"/(dashboard|login)";

/// How long [`probe_logged_in`] waits for the user name
pub const LOGGED_IN_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Result of looking for the logged-in user on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Present,
    TimedOut,
}

/// Submit the login form. Returns once the browser is on the dashboard or
/// back on a login page; it does not assert which.
pub async fn login(session: &mut BrowserSession, creds: &Credentials) -> E2eResult<()> {
    debug!("Logging in as {}", creds.username);

    session.goto("/login").await?;
    session.fill(testid::USERNAME_INPUT, &creds.username).await?;
    session.fill(testid::PASSWORD_INPUT, &creds.password).await?;
    session.click(testid::LOGIN_BUTTON).await?;
    session.wait_for_url(&UrlMatch::regex(DASHBOARD_OR_LOGIN), None).await
}

/// [`login`] with `E2E_USER` / `E2E_PASS`, falling back to `demo` / `password123`
pub async fn login_as_default_user(session: &mut BrowserSession) -> E2eResult<Credentials> {
    let creds = Credentials::from_env();
    login(session, &creds).await?;
    Ok(creds)
}

pub async fn logout(session: &mut BrowserSession) -> E2eResult<()> {
    session.click(testid::LOGOUT_LINK).await?;
    session.wait_for_url(&UrlMatch::path("/"), None).await
}

pub async fn probe_logged_in(session: &mut BrowserSession) -> E2eResult<ProbeOutcome> {
    match session
        .wait_for_test_id(testid::USER_NAME, Some(LOGGED_IN_PROBE_TIMEOUT))
        .await
    {
        Ok(()) => Ok(ProbeOutcome::Present),
        Err(e) if e.is_timeout() => Ok(ProbeOutcome::TimedOut),
        Err(e) => Err(e),
    }
}

/// Whether the page shows a logged-in user. Never fails: any error reads as `false`.
pub async fn is_logged_in(session: &mut BrowserSession) -> bool {
    match probe_logged_in(session).await {
        Ok(outcome) => outcome == ProbeOutcome::Present,
        Err(e) => {
            debug!("logged-in probe failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_or_login_pattern() {
        let re = regex::Regex::new(DASHBOARD_OR_LOGIN).unwrap();
        assert!(re.is_match("http://localhost:3000/dashboard?session=abc"));
        assert!(re.is_match("http://localhost:3000/login"));
        // a rejected form post lands on the API route
        assert!(re.is_match("http://localhost:3000/api/login"));
        assert!(!re.is_match("http://localhost:3000/"));
        assert!(!re.is_match("http://localhost:3000/about"));
    }
}
