//! Loader for leadscout configuration with YAML + environment overlays.
//!
//! Sources are merged in order: an optional/required YAML file (or inline YAML
//! snippets), then `LEADSCOUT__`-prefixed environment variables where `__`
//! separates nesting levels (`LEADSCOUT__GOOGLE__API_KEY` sets `google.api_key`).
//! After merging, `${VAR}` placeholders anywhere in string values are expanded
//! from the process environment, recursively up to a fixed depth.
//!
//! Every section has defaults, so an empty configuration is valid. Only
//! operations that talk to Google need an API key; see
//! [`LeadscoutConfig::require_api_key`].
use config::{Config, ConfigError, Environment, File};
use leadscout_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "leadscout.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeadscoutConfig {
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8001".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub retries: usize,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_google_endpoint(),
            timeout_secs: 15,
            retries: 2,
        }
    }
}

impl GoogleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_google_endpoint() -> String {
    "https://maps.googleapis.com/maps/api/".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://leadscout.db".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Radius applied when a request leaves it out, in metres.
    pub default_radius_m: u32,
    /// Concurrent place-details lookups per search.
    pub details_concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_m: leadscout_common::DEFAULT_RADIUS_M,
            details_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub dir: Option<PathBuf>,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            dir: None,
            filter: "info".into(),
        }
    }
}

impl LoggingConfig {
    /// Translate into the observability initializer's settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            app_name: "leadscout",
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

impl LeadscoutConfig {
    /// The Google Maps key, or a config error naming how to supply one.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self.google.api_key.trim();
        if key.is_empty() || key.contains("${") {
            return Err(ConfigError::Message(
                "google.api_key is not set (use leadscout.yaml or LEADSCOUT__GOOGLE__API_KEY)"
                    .into(),
            ));
        }
        Ok(key)
    }
}

/// Expand `${VAR}`/`$VAR` until the text stops changing or the depth cap is hit.
/// Unknown variables stay verbatim, which also ends reference cycles.
fn expand_str(raw: &str) -> String {
    let mut cur = raw.to_string();
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let next = shellexpand::env_with_context_no_errors(&cur, |name| std::env::var(name).ok());
        if next == cur {
            break;
        }
        cur = next.into_owned();
    }
    cur
}

fn expand_placeholders(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => *s = expand_str(s),
        Value::Array(items) => items.iter_mut().for_each(expand_placeholders),
        Value::Object(map) => map.values_mut().for_each(expand_placeholders),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct LeadscoutConfigLoader {
    files: Vec<(PathBuf, bool)>,
    snippets: Vec<String>,
}

impl Default for LeadscoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LeadscoutConfigLoader {
    /// Start with no files; `LEADSCOUT__` env overrides are always applied last.
    ///
    /// ```
    /// use leadscout_config::LeadscoutConfigLoader;
    ///
    /// let config = LeadscoutConfigLoader::new()
    ///     .with_yaml_str("server:\n  bind: '127.0.0.1:9000'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.server.bind, "127.0.0.1:9000");
    /// assert_eq!(config.database.max_connections, 5);
    /// ```
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            snippets: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is skipped when missing (env-only deployments).
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use leadscout_config::LeadscoutConfigLoader;
    ///
    /// let cfg = LeadscoutConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// google:
    ///   api_key: "example"
    /// search:
    ///   details_concurrency: 2
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.require_api_key().unwrap(), "example");
    /// assert_eq!(cfg.search.details_concurrency, 2);
    /// assert_eq!(cfg.search.default_radius_m, 20_000);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.snippets.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use leadscout_config::LeadscoutConfigLoader;
    ///
    /// unsafe { std::env::set_var("LEADSCOUT_DOC_KEY", "injected-from-env"); }
    ///
    /// let config = LeadscoutConfigLoader::new()
    ///     .with_yaml_str("google:\n  api_key: \"${LEADSCOUT_DOC_KEY}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.google.api_key, "injected-from-env");
    /// assert_eq!(config.google.endpoint, "https://maps.googleapis.com/maps/api/");
    ///
    /// unsafe { std::env::remove_var("LEADSCOUT_DOC_KEY"); }
    /// ```
    pub fn load(self) -> Result<LeadscoutConfig, ConfigError> {
        let mut builder = Config::builder();
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.snippets {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("LEADSCOUT")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let mut v: Value = cfg.try_deserialize()?;
        expand_placeholders(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
