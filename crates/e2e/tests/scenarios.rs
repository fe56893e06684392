//! The bundled scenario files parse, and pass against a live app.

mod support;

use std::path::PathBuf;

use demoapp_e2e::runner::{RunnerConfig, Target, TestRunner};
use demoapp_e2e::{PlaywrightConfig, Scenario, TestStep};

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

#[test]
fn bundled_scenarios_parse() {
    let scenarios = Scenario::load_all(&scenarios_dir()).unwrap();

    let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "auth-dashboard-requires-login",
            "auth-failed-login",
            "auth-helpers",
            "auth-login-logout",
            "smoke-health",
            "smoke-home-page",
            "smoke-login-page",
            "smoke-navigation",
        ]
    );

    assert_eq!(scenarios.iter().filter(|s| s.has_tag("smoke")).count(), 4);
    assert_eq!(scenarios.iter().filter(|s| s.has_tag("auth")).count(), 4);
}

#[test]
fn auth_scenario_uses_default_user_placeholders() {
    let scenario = Scenario::from_file(&scenarios_dir().join("auth-login-logout.yaml")).unwrap();

    assert!(scenario.steps.contains(&TestStep::Fill {
        test_id: "username-input".to_string(),
        value: "${E2E_USER}".to_string(),
    }));
    assert!(scenario.steps.contains(&TestStep::ExpectText {
        test_id: "user-name".to_string(),
        text: "${E2E_USER}".to_string(),
    }));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires node and Playwright"]
async fn bundled_scenarios_pass() {
    let base = support::spawn_app().await;
    let output = tempfile::tempdir().unwrap();

    let mut runner = TestRunner::new(RunnerConfig {
        target: Target::External(base),
        playwright: PlaywrightConfig {
            node_dir: support::node_dir(),
            ..Default::default()
        },
        scenarios_dir: scenarios_dir(),
        output_dir: output.path().to_path_buf(),
    });

    let results = runner.run_all().await.unwrap();
    for result in &results.results {
        assert!(result.success, "{}: {:?}", result.name, result.error);
    }
    assert_eq!(results.total, 8);

    let path = runner.write_results(&results).unwrap();
    assert!(path.exists());
}
