//! Authentication flow: login, dashboard access, logout.

mod support;

use demoapp_common::{testid, Credentials};
use demoapp_e2e::{helpers, ProbeOutcome, UrlMatch};
use reqwest::StatusCode;

#[tokio::test]
async fn login_dashboard_logout_over_http() {
    let base = support::spawn_app().await;
    let client = support::http_client();
    let creds = Credentials::from_env();

    let resp = client
        .post(format!("{}/api/login", base))
        .form(&[("username", &creds.username), ("password", &creds.password)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);

    let dashboard = support::location(&resp);
    let session = dashboard
        .strip_prefix("/dashboard?session=")
        .expect("redirect to the dashboard")
        .to_string();
    assert_eq!(session.len(), 32);

    let html = client
        .get(format!("{}{}", base, dashboard))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(&testid::attr(testid::DASHBOARD_HEADING)));
    assert!(html.contains(&format!(r#"<span data-testid="user-name">{}</span>"#, creds.username)));
    assert!(html.contains(&testid::attr(testid::LOGIN_TIME)));

    let resp = client
        .get(format!("{}/logout?session={}", base, session))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(support::location(&resp), "/");

    let resp = client.get(format!("{}{}", base, dashboard)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(support::location(&resp), "/login");
}

#[tokio::test]
async fn invalid_credentials_are_rejected() {
    let base = support::spawn_app().await;

    let resp = support::http_client()
        .post(format!("{}/api/login", base))
        .form(&[("username", "invalid-user"), ("password", "wrong-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.text().await.unwrap().contains("Invalid credentials"));
}

#[tokio::test]
async fn dashboard_requires_authentication() {
    let base = support::spawn_app().await;

    let resp = support::http_client()
        .get(format!("{}/dashboard", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(support::location(&resp), "/login");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires node and Playwright"]
async fn browser_successful_login_and_logout() {
    let base = support::spawn_app().await;
    let mut page = support::browser(&base).await;

    let creds = helpers::login_as_default_user(&mut page).await.unwrap();
    assert!(page.url().await.unwrap().contains("/dashboard"));
    page.wait_for_test_id(testid::DASHBOARD_HEADING, None).await.unwrap();
    assert_eq!(page.text(testid::USER_NAME).await.unwrap(), creds.username);
    page.wait_for_test_id(testid::LOGIN_TIME, None).await.unwrap();
    assert!(helpers::is_logged_in(&mut page).await);

    helpers::logout(&mut page).await.unwrap();
    assert_eq!(page.url().await.unwrap(), format!("{}/", base));
    page.wait_for_test_id(testid::MAIN_HEADING, None).await.unwrap();
    assert!(!helpers::is_logged_in(&mut page).await);

    page.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires node and Playwright"]
async fn browser_failed_login_shows_error() {
    let base = support::spawn_app().await;
    let mut page = support::browser(&base).await;

    helpers::login(&mut page, &Credentials::new("invalid-user", "wrong-password"))
        .await
        .unwrap();

    page.wait_for_test_id(testid::ERROR_MESSAGE, None).await.unwrap();
    assert!(page
        .text(testid::ERROR_MESSAGE)
        .await
        .unwrap()
        .contains("Invalid credentials"));
    assert_eq!(
        helpers::probe_logged_in(&mut page).await.unwrap(),
        ProbeOutcome::TimedOut
    );

    page.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires node and Playwright"]
async fn browser_dashboard_requires_authentication() {
    let base = support::spawn_app().await;
    let mut page = support::browser(&base).await;

    page.goto("/dashboard").await.unwrap();
    page.wait_for_url(&UrlMatch::path("/login"), None).await.unwrap();
    page.wait_for_test_id(testid::LOGIN_HEADING, None).await.unwrap();

    page.close().await.unwrap();
}
