use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recommend::{
    PartnerFill, DEFAULT_ALSO_BOUGHT, DEFAULT_RECOMMENDATIONS, DEFAULT_SEARCH_RESULTS,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub recommend: RecommendConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
    pub catalog_file: String,
    pub model_file: String,
    pub co_purchase_file: String,
    pub candidates_file: String,
    pub user_summary_file: String,
    pub images_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendConfig {
    pub default_limit: usize,
    pub also_bought_limit: usize,
    pub search_limit: usize,
    pub max_limit: usize,
    pub partner_fill: PartnerFill,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    /// Carts kept in memory before the least recently used session is evicted.
    pub max_cart_sessions: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub artifacts_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub partner_fill: Option<PartnerFill>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig::default(),
            recommend: RecommendConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
                max_cart_sessions: 10_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            catalog_file: "catalog.csv".to_string(),
            model_file: "als_model.json".to_string(),
            co_purchase_file: "co_purchase.json".to_string(),
            candidates_file: "candidates.json".to_string(),
            user_summary_file: "user_summary.json".to_string(),
            images_dir: PathBuf::from("images"),
        }
    }
}

impl ArtifactsConfig {
    /// Defaults rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Self::default() }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(&self.catalog_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn co_purchase_path(&self) -> PathBuf {
        self.dir.join(&self.co_purchase_file)
    }

    pub fn candidates_path(&self) -> PathBuf {
        self.dir.join(&self.candidates_file)
    }

    pub fn user_summary_path(&self) -> PathBuf {
        self.dir.join(&self.user_summary_file)
    }

    pub fn images_path(&self) -> PathBuf {
        self.dir.join(&self.images_dir)
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_RECOMMENDATIONS,
            also_bought_limit: DEFAULT_ALSO_BOUGHT,
            search_limit: DEFAULT_SEARCH_RESULTS,
            max_limit: 100,
            partner_fill: PartnerFill::PerSource,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("storefront.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(artifacts) = patch.artifacts {
            if let Some(dir) = artifacts.dir {
                self.artifacts.dir = dir;
            }
            if let Some(catalog_file) = artifacts.catalog_file {
                self.artifacts.catalog_file = catalog_file;
            }
            if let Some(model_file) = artifacts.model_file {
                self.artifacts.model_file = model_file;
            }
            if let Some(co_purchase_file) = artifacts.co_purchase_file {
                self.artifacts.co_purchase_file = co_purchase_file;
            }
            if let Some(candidates_file) = artifacts.candidates_file {
                self.artifacts.candidates_file = candidates_file;
            }
            if let Some(user_summary_file) = artifacts.user_summary_file {
                self.artifacts.user_summary_file = user_summary_file;
            }
            if let Some(images_dir) = artifacts.images_dir {
                self.artifacts.images_dir = images_dir;
            }
        }

        if let Some(recommend) = patch.recommend {
            if let Some(default_limit) = recommend.default_limit {
                self.recommend.default_limit = default_limit;
            }
            if let Some(also_bought_limit) = recommend.also_bought_limit {
                self.recommend.also_bought_limit = also_bought_limit;
            }
            if let Some(search_limit) = recommend.search_limit {
                self.recommend.search_limit = search_limit;
            }
            if let Some(max_limit) = recommend.max_limit {
                self.recommend.max_limit = max_limit;
            }
            if let Some(partner_fill) = recommend.partner_fill {
                self.recommend.partner_fill = partner_fill;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(max_cart_sessions) = server.max_cart_sessions {
                self.server.max_cart_sessions = max_cart_sessions;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOREFRONT_ARTIFACTS_DIR") {
            self.artifacts.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("STOREFRONT_ARTIFACTS_CATALOG_FILE") {
            self.artifacts.catalog_file = value;
        }
        if let Some(value) = read_env("STOREFRONT_ARTIFACTS_MODEL_FILE") {
            self.artifacts.model_file = value;
        }
        if let Some(value) = read_env("STOREFRONT_ARTIFACTS_CO_PURCHASE_FILE") {
            self.artifacts.co_purchase_file = value;
        }
        if let Some(value) = read_env("STOREFRONT_ARTIFACTS_CANDIDATES_FILE") {
            self.artifacts.candidates_file = value;
        }
        if let Some(value) = read_env("STOREFRONT_ARTIFACTS_USER_SUMMARY_FILE") {
            self.artifacts.user_summary_file = value;
        }
        if let Some(value) = read_env("STOREFRONT_ARTIFACTS_IMAGES_DIR") {
            self.artifacts.images_dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("STOREFRONT_RECOMMEND_DEFAULT_LIMIT") {
            self.recommend.default_limit =
                parse_usize("STOREFRONT_RECOMMEND_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_RECOMMEND_ALSO_BOUGHT_LIMIT") {
            self.recommend.also_bought_limit =
                parse_usize("STOREFRONT_RECOMMEND_ALSO_BOUGHT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_RECOMMEND_SEARCH_LIMIT") {
            self.recommend.search_limit = parse_usize("STOREFRONT_RECOMMEND_SEARCH_LIMIT", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_RECOMMEND_MAX_LIMIT") {
            self.recommend.max_limit = parse_usize("STOREFRONT_RECOMMEND_MAX_LIMIT", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_RECOMMEND_PARTNER_FILL") {
            self.recommend.partner_fill = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "STOREFRONT_RECOMMEND_PARTNER_FILL".to_string(),
                    value: value.clone(),
                }
            })?;
        }

        if let Some(value) = read_env("STOREFRONT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("STOREFRONT_SERVER_PORT") {
            self.server.port = parse_u16("STOREFRONT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("STOREFRONT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_SERVER_MAX_CART_SESSIONS") {
            self.server.max_cart_sessions =
                parse_usize("STOREFRONT_SERVER_MAX_CART_SESSIONS", &value)?;
        }

        let log_level =
            read_env("STOREFRONT_LOGGING_LEVEL").or_else(|| read_env("STOREFRONT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOREFRONT_LOGGING_FORMAT").or_else(|| read_env("STOREFRONT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(artifacts_dir) = overrides.artifacts_dir {
            self.artifacts.dir = artifacts_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(partner_fill) = overrides.partner_fill {
            self.recommend.partner_fill = partner_fill;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_artifacts(&self.artifacts)?;
        validate_recommend(&self.recommend)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("storefront.toml"), PathBuf::from("config/storefront.toml")]
        .into_iter()
        .find(|path| path.exists())
}

/// The config file `load` would read, if any.
pub fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    resolve_config_path(explicit_path)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_artifacts(artifacts: &ArtifactsConfig) -> Result<(), ConfigError> {
    if artifacts.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("artifacts.dir must not be empty".to_string()));
    }

    let files = [
        ("artifacts.catalog_file", &artifacts.catalog_file),
        ("artifacts.model_file", &artifacts.model_file),
        ("artifacts.co_purchase_file", &artifacts.co_purchase_file),
        ("artifacts.candidates_file", &artifacts.candidates_file),
        ("artifacts.user_summary_file", &artifacts.user_summary_file),
    ];
    for (key, value) in files {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    Ok(())
}

fn validate_recommend(recommend: &RecommendConfig) -> Result<(), ConfigError> {
    if recommend.max_limit == 0 {
        return Err(ConfigError::Validation(
            "recommend.max_limit must be greater than zero".to_string(),
        ));
    }

    let limits = [
        ("recommend.default_limit", recommend.default_limit),
        ("recommend.also_bought_limit", recommend.also_bought_limit),
        ("recommend.search_limit", recommend.search_limit),
    ];
    for (key, value) in limits {
        if value == 0 || value > recommend.max_limit {
            return Err(ConfigError::Validation(format!(
                "{key} must be in range 1..={} (recommend.max_limit)",
                recommend.max_limit
            )));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if server.max_cart_sessions == 0 {
        return Err(ConfigError::Validation(
            "server.max_cart_sessions must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    artifacts: Option<ArtifactsPatch>,
    recommend: Option<RecommendPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtifactsPatch {
    dir: Option<PathBuf>,
    catalog_file: Option<String>,
    model_file: Option<String>,
    co_purchase_file: Option<String>,
    candidates_file: Option<String>,
    user_summary_file: Option<String>,
    images_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendPatch {
    default_limit: Option<usize>,
    also_bought_limit: Option<usize>,
    search_limit: Option<usize>,
    max_limit: Option<usize>,
    partner_fill: Option<PartnerFill>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    max_cart_sessions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
