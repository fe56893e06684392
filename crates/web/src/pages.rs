//! HTML pages.
//!
//! Every element the E2E harness interacts with carries a `data-testid`
//! from [`demoapp_common::testid`].

use demoapp_common::testid;

use crate::session::Session;

const TITLE_SUFFIX: &str = "AI Coding Agent Skills";

const BASE_STYLE: &str =
    "body { font-family: sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; }";

fn layout(title: &str, style: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    {style}
  </style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        style = style,
        body = body,
    )
}

/// Landing page (`GET /`)
pub fn index() -> String {
    let style = format!(
        r#"{BASE_STYLE}
    h1 {{ color: #333; }}
    .nav {{ margin: 20px 0; }}
    .nav a {{ margin-right: 15px; color: #0066cc; text-decoration: none; }}
    .nav a:hover {{ text-decoration: underline; }}
    .card {{ border: 1px solid #ddd; padding: 20px; margin: 20px 0; border-radius: 8px; }}"#
    );

    let body = format!(
        r#"  <h1 data-testid="{heading}">AI Coding Agent Skills</h1>
  <p data-testid="{welcome}">Welcome to the demo web application for testing Playwright E2E skills.</p>

  <div class="nav">
    <a href="/" data-testid="{nav_home}">Home</a>
    <a href="/login" data-testid="{nav_login}">Login</a>
    <a href="/dashboard" data-testid="{nav_dashboard}">Dashboard</a>
    <a href="/about" data-testid="{nav_about}">About</a>
  </div>

  <div class="card">
    <h2>Features</h2>
    <ul>
      <li>Simple authentication flow</li>
      <li>Dashboard with user info</li>
      <li>Stable test selectors with data-testid</li>
      <li>Playwright MCP integration ready</li>
    </ul>
  </div>"#,
        heading = testid::MAIN_HEADING,
        welcome = testid::WELCOME_MESSAGE,
        nav_home = testid::NAV_HOME,
        nav_login = testid::NAV_LOGIN,
        nav_dashboard = testid::NAV_DASHBOARD,
        nav_about = testid::NAV_ABOUT,
    );

    layout(&format!("{} - Demo App", TITLE_SUFFIX), &style, &body)
}

/// Login form (`GET /login`). Posts to `/api/login`.
pub fn login() -> String {
    let style = r#"body { font-family: sans-serif; max-width: 400px; margin: 50px auto; padding: 20px; }
    form { border: 1px solid #ddd; padding: 20px; border-radius: 8px; }
    input { width: 100%; padding: 8px; margin: 10px 0; box-sizing: border-box; }
    button { width: 100%; padding: 10px; background: #0066cc; color: white; border: none; border-radius: 4px; cursor: pointer; }
    button:hover { background: #0052a3; }
    .error { color: red; margin: 10px 0; display: none; }"#;

    let body = format!(
        r#"  <h1 data-testid="{heading}">Login</h1>
  <form action="/api/login" method="POST">
    <div>
      <label for="username">Username:</label>
      <input type="text" id="username" name="username" data-testid="{username}" required>
    </div>
    <div>
      <label for="password">Password:</label>
      <input type="password" id="password" name="password" data-testid="{password}" required>
    </div>
    <div class="error" data-testid="{error}"></div>
    <button type="submit" data-testid="{button}">Login</button>
  </form>
  <p><a href="/">Back to Home</a></p>
  <p><small>Test credentials: demo / password123</small></p>"#,
        heading = testid::LOGIN_HEADING,
        username = testid::USERNAME_INPUT,
        password = testid::PASSWORD_INPUT,
        error = testid::ERROR_MESSAGE,
        button = testid::LOGIN_BUTTON,
    );

    layout(&format!("Login - {}", TITLE_SUFFIX), style, &body)
}

/// Body of the 401 response to a rejected login
pub fn login_failed() -> String {
    let body = format!(
        r#"  <h1>Login Failed</h1>
  <p data-testid="{error}">Invalid credentials</p>
  <a href="/login">Try again</a>"#,
        error = testid::ERROR_MESSAGE,
    );

    layout("Login Failed", BASE_STYLE, &body)
}

/// Dashboard for a live session (`GET /dashboard`)
pub fn dashboard(session: &Session) -> String {
    let style = format!(
        r#"{BASE_STYLE}
    .card {{ border: 1px solid #ddd; padding: 20px; margin: 20px 0; border-radius: 8px; }}
    .logout {{ color: #cc0000; text-decoration: none; }}"#
    );

    let body = format!(
        r#"  <h1 data-testid="{heading}">Dashboard</h1>
  <div class="card">
    <h2>Welcome, <span data-testid="{user_name}">{username}</span>!</h2>
    <p>Login time: <span data-testid="{login_time}">{created_at}</span></p>
    <p><a href="/logout?session={session_id}" class="logout" data-testid="{logout}">Logout</a></p>
  </div>
  <p><a href="/">Back to Home</a></p>"#,
        heading = testid::DASHBOARD_HEADING,
        user_name = testid::USER_NAME,
        username = escape_html(&session.username),
        login_time = testid::LOGIN_TIME,
        created_at = session.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        session_id = escape_html(&session.id),
        logout = testid::LOGOUT_LINK,
    );

    layout(&format!("Dashboard - {}", TITLE_SUFFIX), &style, &body)
}

/// About page (`GET /about`)
pub fn about() -> String {
    let body = format!(
        r#"  <h1 data-testid="{heading}">About</h1>
  <p data-testid="{description}">
    This is a demo application for testing the Playwright E2E skill integration
    with AI coding agents and Playwright MCP.
  </p>
  <p><a href="/">Back to Home</a></p>"#,
        heading = testid::ABOUT_HEADING,
        description = testid::ABOUT_DESCRIPTION,
    );

    layout(&format!("About - {}", TITLE_SUFFIX), BASE_STYLE, &body)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
