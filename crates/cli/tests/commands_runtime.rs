use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use storefront_cli::commands::{also_bought, config, doctor, recommend, search, smoke};
use storefront_core::config::{ConfigOverrides, LoadOptions};
use tempfile::TempDir;

fn fixture() -> TempDir {
    let dir = TempDir::new().expect("tempdir should be created");
    let files = [
        (
            "catalog.csv",
            "article_id,prod_name,product_type_name,price\n\
             1,Basic Tee,T-shirt,0.01\n\
             2,Slim Jeans,Trousers,0.05\n\
             3,Ankle Socks,Socks,0.002\n",
        ),
        ("co_purchase.json", r#"{"1": ["2", "3"]}"#),
        ("candidates.json", r#"{"A": ["3", "2", "1"]}"#),
        ("user_summary.json", r#"{"B": {"last_5_items": ["1"]}}"#),
    ];
    for (name, body) in files {
        fs::write(dir.path().join(name), body).expect("fixture should be written");
    }
    dir
}

fn options_for(dir: &TempDir) -> LoadOptions {
    LoadOptions {
        overrides: ConfigOverrides {
            artifacts_dir: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }
}

#[test]
fn recommend_returns_precomputed_list() {
    let dir = fixture();
    with_env(&[], || {
        let result = recommend::run(&options_for(&dir), "A", Some(2));
        assert_eq!(result.exit_code, 0, "expected successful recommendation");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["source"], "precomputed");
        assert_eq!(payload["data"]["items"][0]["item_id"], "0000000003");
        assert_eq!(payload["data"]["items"][0]["name"], "Ankle Socks");
        assert_eq!(payload["data"]["items"].as_array().map(Vec::len), Some(2));
    });
}

#[test]
fn recommend_rejects_out_of_range_limit() {
    let dir = fixture();
    with_env(&[], || {
        let result = recommend::run(&options_for(&dir), "A", Some(0));
        assert_eq!(result.exit_code, 1, "expected invalid input failure");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn recommend_rejects_blank_user() {
    let dir = fixture();
    with_env(&[], || {
        let result = recommend::run(&options_for(&dir), "  ", None);
        assert_eq!(result.exit_code, 1);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn recommend_names_degraded_artifacts_for_wrong_dir() {
    let dir = TempDir::new().expect("tempdir should be created");
    with_env(&[], || {
        let result = recommend::run(&options_for(&dir), "A", None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["source"], "popularity");
        let message = payload["message"].as_str().expect("message should be a string");
        assert!(message.contains("serving empty tables for: catalog"), "{message}");
        let degraded = payload["data"]["degraded"].as_array().expect("degraded list");
        assert_eq!(degraded.len(), 5);
    });
}

#[test]
fn search_lists_only_the_missing_artifact() {
    let dir = fixture();
    with_env(&[], || {
        let payload = parse_payload(&search::run(&options_for(&dir), "jeans", None).output);
        let degraded = payload["data"]["degraded"].as_array().expect("degraded list");
        assert_eq!(degraded, &vec![Value::from("model")]);
    });
}

#[test]
fn invalid_env_returns_config_failure() {
    let dir = fixture();
    with_env(&[("STOREFRONT_RECOMMEND_MAX_LIMIT", "0")], || {
        let result = recommend::run(&options_for(&dir), "A", None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn also_bought_expands_purchase_history() {
    let dir = fixture();
    with_env(&[], || {
        let result = also_bought::run(&options_for(&dir), "B", Some(2));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["source"], "purchase_history");
        assert_eq!(payload["data"]["items"][0]["item_id"], "0000000002");
        assert_eq!(payload["data"]["items"][1]["item_id"], "0000000003");
    });
}

#[test]
fn search_reads_artifact_dir_from_env() {
    let dir = fixture();
    let artifacts_dir = dir.path().display().to_string();
    with_env(&[("STOREFRONT_ARTIFACTS_DIR", artifacts_dir.as_str())], || {
        let result = search::run(&LoadOptions::default(), "JEANS", None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["query"], "JEANS");
        assert_eq!(payload["data"]["items"][0]["item_id"], "0000000002");
        assert_eq!(payload["data"]["items"].as_array().map(Vec::len), Some(1));
    });
}

#[test]
fn doctor_reports_missing_artifacts() {
    let dir = fixture();
    with_env(&[], || {
        let output = doctor::run(&options_for(&dir), true);
        let report = parse_payload(&output);
        assert_eq!(report["overall_status"], "fail");

        let checks = report["checks"].as_array().expect("checks should be an array");
        let status_of = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].clone())
        };
        assert_eq!(status_of("config_validation"), Some(Value::from("pass")));
        assert_eq!(status_of("artifact_catalog"), Some(Value::from("pass")));
        assert_eq!(status_of("artifact_model"), Some(Value::from("fail")));
    });
}

#[test]
fn doctor_skips_artifacts_when_config_is_invalid() {
    with_env(&[("STOREFRONT_LOGGING_LEVEL", "loud")], || {
        let output = doctor::run(&LoadOptions::default(), false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation"));
        assert!(output.contains("- [skip] artifact_catalog"));
    });
}

#[test]
fn smoke_passes_with_catalog_and_tables() {
    let dir = fixture();
    with_env(&[], || {
        let result = smoke::run(&options_for(&dir));
        assert_eq!(result.exit_code, 0, "expected smoke pass: {}", result.output);

        let machine = result.output.lines().nth(1).expect("smoke prints a JSON line");
        let report = parse_payload(machine);
        assert_eq!(report["command"], "smoke");
        assert_eq!(report["status"], "pass");
        assert_eq!(report["checks"].as_array().map(Vec::len), Some(5));
    });
}

#[test]
fn smoke_fails_without_catalog() {
    let dir = TempDir::new().expect("tempdir should be created");
    with_env(&[], || {
        let result = smoke::run(&options_for(&dir));
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("\"status\":\"fail\""));
    });
}

#[test]
fn config_attributes_env_and_override_sources() {
    let dir = fixture();
    with_env(&[("STOREFRONT_RECOMMEND_PARTNER_FILL", "exhaustive")], || {
        let output = config::run(&options_for(&dir));
        assert!(output.contains(
            "- recommend.partner_fill = Exhaustive (source: env (STOREFRONT_RECOMMEND_PARTNER_FILL))"
        ));
        assert!(output.contains(&format!(
            "- artifacts.dir = {} (source: override (command line))",
            PathBuf::from(dir.path()).display()
        )));
        assert!(output.contains("- server.port = 8080 (source: default)"));
    });
}

fn parse_payload(raw: &str) -> Value {
    serde_json::from_str(raw).expect("command output should be valid json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STOREFRONT_ARTIFACTS_DIR",
        "STOREFRONT_ARTIFACTS_CATALOG_FILE",
        "STOREFRONT_ARTIFACTS_MODEL_FILE",
        "STOREFRONT_ARTIFACTS_CO_PURCHASE_FILE",
        "STOREFRONT_ARTIFACTS_CANDIDATES_FILE",
        "STOREFRONT_ARTIFACTS_USER_SUMMARY_FILE",
        "STOREFRONT_ARTIFACTS_IMAGES_DIR",
        "STOREFRONT_RECOMMEND_DEFAULT_LIMIT",
        "STOREFRONT_RECOMMEND_ALSO_BOUGHT_LIMIT",
        "STOREFRONT_RECOMMEND_SEARCH_LIMIT",
        "STOREFRONT_RECOMMEND_MAX_LIMIT",
        "STOREFRONT_RECOMMEND_PARTNER_FILL",
        "STOREFRONT_SERVER_BIND_ADDRESS",
        "STOREFRONT_SERVER_PORT",
        "STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "STOREFRONT_SERVER_MAX_CART_SESSIONS",
        "STOREFRONT_LOGGING_LEVEL",
        "STOREFRONT_LOGGING_FORMAT",
        "STOREFRONT_LOG_LEVEL",
        "STOREFRONT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
