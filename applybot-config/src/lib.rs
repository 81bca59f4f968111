//! Loader for the applybot configuration with YAML + environment overlays.
//!
//! `applybot.yaml` carries the operator profile, the campaign, the knowledge
//! seed table and per-layer settings. Environment variables prefixed
//! `APPLYBOT__` override file values (`APPLYBOT__CAMPAIGN__TOTAL_QUOTA=10`),
//! and `${VAR}` placeholders anywhere in string values are expanded after the
//! sources are merged.
use applybot_common::observability::{LogConfig, LogFormat};
use applybot_common::{
    ApplyError, BrowserSettings, Campaign, EmbeddingConfig, KnowledgeSeed, Profile, SiteSettings,
    StorageSettings, WizardSettings,
};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] ConfigError),
    #[error(transparent)]
    Invalid(#[from] ApplyError),
}

/// Fully merged configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub profile: Profile,
    pub campaign: Campaign,
    #[serde(default)]
    pub knowledge: KnowledgeSeed,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub wizard: WizardSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Normalise the campaign and reject values the pipeline cannot run with.
    pub fn validate(mut self) -> Result<Self, ApplyError> {
        self.campaign = self.campaign.validated()?;
        if self.site.domain.trim().is_empty() {
            return Err(ApplyError::Config("site.domain must not be empty".into()));
        }
        if self.wizard.max_steps == 0 {
            return Err(ApplyError::Config("wizard.max_steps must be positive".into()));
        }
        if self.browser.fidget_ms.0 > self.browser.fidget_ms.1
            || self.browser.keystroke_ms.0 > self.browser.keystroke_ms.1
        {
            return Err(ApplyError::Config(
                "browser delay ranges must be given as [min, max]".into(),
            ));
        }
        Ok(self)
    }
}

/// `logging:` section, mapped onto [`LogConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub filter: String,
    pub stderr: bool,
    pub progress_stdout: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            filter: "info".into(),
            stderr: false,
            progress_stdout: true,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
            progress_stdout: self.progress_stdout,
            ..LogConfig::default()
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Start empty; the `APPLYBOT__` environment overlay is applied last in
    /// [`ConfigLoader::load`] so it wins over every file and snippet.
    ///
    /// ```
    /// use applybot_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "1"
    /// campaign:
    ///   queries: ["rust developer"]
    ///   regions: [{ location: "remote", country: "canada" }]
    ///   total_quota: 4
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.campaign.per_pair_quota(), 4);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder, expand `${VAR}` placeholders and validate.
    ///
    /// ```
    /// use applybot_config::ConfigLoader;
    /// use applybot_common::EmbeddingConfig;
    ///
    /// temp_env::with_var("APPLYBOT_DOC_TOKEN", Some("injected-from-env"), || {
    ///     let config = ConfigLoader::new()
    ///         .with_yaml_str(r#"
    /// campaign:
    ///   queries: ["data engineer"]
    ///   regions: [{ location: "Dublin", country: "Ireland" }]
    ///   total_quota: 2
    /// embedding:
    ///   provider: "openai"
    ///   model: "text-embedding-3-small"
    ///   auth_token: "${APPLYBOT_DOC_TOKEN}"
    /// "#)
    ///         .load()
    ///         .expect("valid configuration");
    ///
    ///     assert_eq!(config.campaign.regions[0].country, "ireland");
    ///     match &config.embedding {
    ///         EmbeddingConfig::Openai { auth_token, endpoint, .. } => {
    ///             assert_eq!(auth_token, "injected-from-env");
    ///             assert_eq!(endpoint, "https://api.openai.com/v1");
    ///         }
    ///         other => panic!("expected OpenAI configuration, got {other:?}"),
    ///     }
    /// });
    /// ```
    pub fn load(self) -> Result<AppConfig, LoadError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("APPLYBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: AppConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed.validate()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_APPLYBOT}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_APPLYBOT}"));
    }

    #[test]
    fn logging_section_maps_onto_log_config() {
        let settings = LoggingSettings {
            dir: Some(PathBuf::from("/tmp/applybot")),
            format: LogFormat::Json,
            stderr: true,
            ..LoggingSettings::default()
        };
        let cfg = settings.to_log_config();
        assert_eq!(cfg.app_name, "applybot");
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(cfg.emit_stderr);
        assert!(cfg.progress_stdout);
        assert_eq!(cfg.log_dir, Some(PathBuf::from("/tmp/applybot")));
    }
}
