// Configuration validation
use crate::error::{ConfigError, Result};
use crate::settings::{ApiConfig, AppConfig, BillingPolicy};

pub trait ConfigValidator {
    fn validate(&self) -> Result<()>;
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::ValidationError("api.base_url must not be empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL, got '{base}'"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("api.timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl ConfigValidator for BillingPolicy {
    fn validate(&self) -> Result<()> {
        let limits = [
            ("billing.fetch_limit", self.fetch_limit),
            ("billing.max_appointments_per_invoice", self.max_appointments_per_invoice),
            ("billing.default_list_limit", self.default_list_limit),
            ("billing.summary_limit", self.summary_limit),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ValidationError(format!("{name} must be greater than 0")));
        }
        if self.invoice_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError("billing.invoice_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.billing.validate()
    }
}
