//! `data-testid` values rendered by the web server and looked up by the
//! E2E harness. Values are matched string-exact.

// Landing page
pub const MAIN_HEADING: &str = "main-heading";
pub const WELCOME_MESSAGE: &str = "welcome-message";
pub const NAV_HOME: &str = "nav-home";
pub const NAV_LOGIN: &str = "nav-login";
pub const NAV_DASHBOARD: &str = "nav-dashboard";
pub const NAV_ABOUT: &str = "nav-about";

// Login form and failure page
pub const LOGIN_HEADING: &str = "login-heading";
pub const USERNAME_INPUT: &str = "username-input";
pub const PASSWORD_INPUT: &str = "password-input";
pub const ERROR_MESSAGE: &str = "error-message";
pub const LOGIN_BUTTON: &str = "login-button";

// Dashboard
pub const DASHBOARD_HEADING: &str = "dashboard-heading";
pub const USER_NAME: &str = "user-name";
pub const LOGIN_TIME: &str = "login-time";
pub const LOGOUT_LINK: &str = "logout-link";

// About page
pub const ABOUT_HEADING: &str = "about-heading";
pub const ABOUT_DESCRIPTION: &str = "about-description";

/// Every selector the server is expected to render somewhere.
pub const ALL: &[&str] = &[
    MAIN_HEADING,
    WELCOME_MESSAGE,
    NAV_HOME,
    NAV_LOGIN,
    NAV_DASHBOARD,
    NAV_ABOUT,
    LOGIN_HEADING,
    USERNAME_INPUT,
    PASSWORD_INPUT,
    ERROR_MESSAGE,
    LOGIN_BUTTON,
    DASHBOARD_HEADING,
    USER_NAME,
    LOGIN_TIME,
    LOGOUT_LINK,
    ABOUT_HEADING,
    ABOUT_DESCRIPTION,
];

/// The attribute as it appears in markup, e.g. `data-testid="user-name"`.
pub fn attr(id: &str) -> String {
    format!("data-testid=\"{}\"", id)
}
