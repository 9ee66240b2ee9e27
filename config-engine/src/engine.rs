use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::error::{ConfigError, Result};
use crate::settings::AppConfig;
use crate::validation::ConfigValidator;

/// Environment variable prefix (`IPS__API__BASE_URL`)
pub const ENV_PREFIX: &str = "IPS";

/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// A configuration file layer
#[derive(Debug, Clone)]
enum FileSource {
    Path { path: PathBuf, required: bool },
    Inline { content: String, format: FileFormat },
}

/// Builder that resolves an [`AppConfig`] from defaults, a file and the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigEngine {
    file: Option<FileSource>,
    env_overrides: Option<HashMap<String, String>>,
    skip_env: bool,
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an optional configuration file; a missing file is not an error
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(FileSource::Path {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Read a configuration file that must exist
    pub fn with_required_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(FileSource::Path {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Use literal YAML content as the file layer
    pub fn with_yaml(mut self, content: impl Into<String>) -> Self {
        self.file = Some(FileSource::Inline {
            content: content.into(),
            format: FileFormat::Yaml,
        });
        self
    }

    /// Replace the process environment with `vars` for the environment layer
    pub fn with_env_overrides(mut self, vars: HashMap<String, String>) -> Self {
        self.env_overrides = Some(vars);
        self
    }

    /// Ignore environment variables entirely
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Resolve and validate the configuration
    pub fn load(&self) -> Result<AppConfig> {
        let mut builder = Config::builder();

        match &self.file {
            Some(FileSource::Path { path, required }) => {
                if *required && !path.exists() {
                    return Err(ConfigError::SourceNotFound(path.display().to_string()));
                }
                tracing::debug!(path = %path.display(), required, "Adding configuration file layer");
                builder = builder.add_source(File::from(path.as_path()).required(*required));
            }
            Some(FileSource::Inline { content, format }) => {
                builder = builder.add_source(File::from_str(content, *format));
            }
            None => {}
        }

        if !self.skip_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(self.env_overrides.clone()),
            );
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            base_url = %config.api.base_url,
            fetch_limit = config.billing.fetch_limit,
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = ConfigEngine::new().without_env().load().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.billing.fallback_unit_value, Some(50_000));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = ConfigEngine::new()
            .with_yaml(
                "api:\n  base_url: https://ips.example.co/api\nbilling:\n  max_appointments_per_invoice: 20\n",
            )
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.api.base_url, "https://ips.example.co/api");
        assert_eq!(config.billing.max_appointments_per_invoice, 20);
        assert_eq!(config.billing.fetch_limit, 1000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = ConfigEngine::new()
            .with_yaml("api:\n  base_url: https://file.example.co/api\n")
            .with_env_overrides(env(&[
                ("IPS__API__BASE_URL", "https://env.example.co/api"),
                ("IPS__BILLING__FETCH_LIMIT", "250"),
                ("IPS__LOGGING__JSON", "true"),
            ]))
            .load()
            .unwrap();

        assert_eq!(config.api.base_url, "https://env.example.co/api");
        assert_eq!(config.billing.fetch_limit, 250);
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = ConfigEngine::new()
            .with_env_overrides(env(&[("IPS__API__TIMEOUT_SECS", "0")]))
            .load();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_required_file() {
        let result = ConfigEngine::new()
            .with_required_file("/nonexistent/ips-billing.yaml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::SourceNotFound(_))));
    }
}
