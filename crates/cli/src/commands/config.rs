use std::env;
use std::fs;
use std::path::Path;

use storefront_core::config::{detect_config_path, AppConfig, LoadOptions};
use toml::Value;

/// Where each effective value came from.
struct Sources<'a> {
    doc: Option<Value>,
    path: Option<&'a Path>,
    overridden: Vec<&'static str>,
}

impl Sources<'_> {
    fn line(&self, key_path: &str, env_key: &str, value: impl ToString) -> String {
        let source = if self.overridden.iter().any(|key| *key == key_path) {
            "override (command line)".to_string()
        } else {
            field_source(key_path, env_key, self.doc.as_ref(), self.path)
        };
        format!("- {key_path} = {} (source: {source})", value.to_string())
    }
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let sources = Sources {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path.as_deref(),
        overridden: overridden_keys(options),
    };

    let artifacts = &config.artifacts;
    let recommend = &config.recommend;
    let mut lines = vec![
        "effective config (source precedence: override > env > file > default):".to_string(),
        sources.line("artifacts.dir", "STOREFRONT_ARTIFACTS_DIR", artifacts.dir.display()),
        sources.line(
            "artifacts.catalog_file",
            "STOREFRONT_ARTIFACTS_CATALOG_FILE",
            &artifacts.catalog_file,
        ),
        sources.line("artifacts.model_file", "STOREFRONT_ARTIFACTS_MODEL_FILE", &artifacts.model_file),
        sources.line(
            "artifacts.co_purchase_file",
            "STOREFRONT_ARTIFACTS_CO_PURCHASE_FILE",
            &artifacts.co_purchase_file,
        ),
        sources.line(
            "artifacts.candidates_file",
            "STOREFRONT_ARTIFACTS_CANDIDATES_FILE",
            &artifacts.candidates_file,
        ),
        sources.line(
            "artifacts.user_summary_file",
            "STOREFRONT_ARTIFACTS_USER_SUMMARY_FILE",
            &artifacts.user_summary_file,
        ),
        sources.line(
            "artifacts.images_dir",
            "STOREFRONT_ARTIFACTS_IMAGES_DIR",
            artifacts.images_dir.display(),
        ),
    ];

    lines.extend([
        sources.line(
            "recommend.default_limit",
            "STOREFRONT_RECOMMEND_DEFAULT_LIMIT",
            recommend.default_limit,
        ),
        sources.line(
            "recommend.also_bought_limit",
            "STOREFRONT_RECOMMEND_ALSO_BOUGHT_LIMIT",
            recommend.also_bought_limit,
        ),
        sources.line(
            "recommend.search_limit",
            "STOREFRONT_RECOMMEND_SEARCH_LIMIT",
            recommend.search_limit,
        ),
        sources.line("recommend.max_limit", "STOREFRONT_RECOMMEND_MAX_LIMIT", recommend.max_limit),
        sources.line(
            "recommend.partner_fill",
            "STOREFRONT_RECOMMEND_PARTNER_FILL",
            format!("{:?}", recommend.partner_fill),
        ),
    ]);

    lines.extend([
        sources.line(
            "server.bind_address",
            "STOREFRONT_SERVER_BIND_ADDRESS",
            &config.server.bind_address,
        ),
        sources.line("server.port", "STOREFRONT_SERVER_PORT", config.server.port),
        sources.line(
            "server.graceful_shutdown_secs",
            "STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS",
            config.server.graceful_shutdown_secs,
        ),
        sources.line(
            "server.max_cart_sessions",
            "STOREFRONT_SERVER_MAX_CART_SESSIONS",
            config.server.max_cart_sessions,
        ),
        sources.line("logging.level", "STOREFRONT_LOGGING_LEVEL", &config.logging.level),
        sources.line(
            "logging.format",
            "STOREFRONT_LOGGING_FORMAT",
            format!("{:?}", config.logging.format),
        ),
    ]);

    lines.join("\n")
}

fn overridden_keys(options: &LoadOptions) -> Vec<&'static str> {
    let overrides = &options.overrides;
    [
        ("artifacts.dir", overrides.artifacts_dir.is_some()),
        ("logging.level", overrides.log_level.is_some()),
        ("recommend.partner_fill", overrides.partner_fill.is_some()),
        ("server.port", overrides.server_port.is_some()),
    ]
    .into_iter()
    .filter_map(|(key, set)| set.then_some(key))
    .collect()
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
