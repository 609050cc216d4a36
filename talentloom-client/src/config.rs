//! Configuration loading for the TalentLoom client.
//!
//! The file path comes from `--config <path>` or `TALENTLOOM_CONFIG`. Every
//! section is optional and falls back to the demo defaults; values are
//! validated after parsing.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use talentloom_cache::{QueryOptions, QueryOverrides, Resource};
use talentloom_core::{CompanyId, ConfigError, DurationMs, EntityIdType};
use talentloom_events::{ExhaustionPolicy, DEFAULT_TICK_INTERVAL};

pub const CONFIG_ENV_VAR: &str = "TALENTLOOM_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Active tenant scope; events of other companies are dropped.
    pub company_id: Option<String>,
    pub log_format: LogFormat,
    pub realtime: RealtimeConfig,
    pub mock_api: MockApiConfig,
    /// Per-resource observer overrides, keyed by resource name.
    pub queries: BTreeMap<String, QueryOverrides>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RealtimeConfig {
    pub enabled: bool,
    pub tick_interval_ms: DurationMs,
    pub exhaustion: ExhaustionPolicy,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: u64::try_from(DEFAULT_TICK_INTERVAL.as_millis()).unwrap_or(45_000),
            exhaustion: ExhaustionPolicy::Wrap,
        }
    }
}

impl RealtimeConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MockApiConfig {
    /// Multiplies the simulated latency of every operation.
    pub latency_scale: f64,
    /// Probability of a random transient failure per call.
    pub failure_rate: f64,
    pub seed_demo_data: bool,
}

impl Default for MockApiConfig {
    fn default() -> Self {
        Self {
            latency_scale: 1.0,
            failure_rate: 0.0,
            seed_demo_data: true,
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args(std::env::args().skip(1)).or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(company_id) = &self.company_id {
            if company_id.trim().is_empty() {
                return Err(invalid("company_id", "must not be empty"));
            }
        }
        if self.realtime.tick_interval_ms == 0 {
            return Err(invalid("realtime.tick_interval_ms", "must be > 0"));
        }
        let scale = self.mock_api.latency_scale;
        if !scale.is_finite() || scale < 0.0 {
            return Err(invalid("mock_api.latency_scale", "must be >= 0"));
        }
        let rate = self.mock_api.failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(invalid("mock_api.failure_rate", "must be within 0.0..=1.0"));
        }
        for (name, overrides) in &self.queries {
            let field = format!("queries.{}", name);
            if Resource::from_name(name).is_none() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "unknown resource".to_string(),
                });
            }
            overrides.validate(&field)?;
        }
        Ok(())
    }

    pub fn company(&self) -> Option<CompanyId> {
        self.company_id.as_deref().map(CompanyId::new)
    }

    pub fn overrides(&self, resource: Resource) -> QueryOverrides {
        self.queries
            .get(resource.as_str())
            .copied()
            .unwrap_or_default()
    }

    /// Resource defaults with the configured overrides layered on top.
    pub fn query_options(&self, resource: Resource) -> QueryOptions {
        self.overrides(resource)
            .apply(QueryOptions::for_resource(resource))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}
