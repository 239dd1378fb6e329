//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_recording(config, &mut result);
        Self::validate_credentials(config, &mut result);
        Self::validate_replay(config, &mut result);

        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "Port cannot be 0",
            ));
        }

        if config.browser.viewport_width == 0 || config.browser.viewport_height == 0 {
            result.add_error(ValidationError::new(
                "browser.viewport",
                "Viewport dimensions must be greater than 0",
            ));
        }

        if let Some(ref path) = config.browser.chrome_path {
            if !path.exists() {
                result.add_warning(ValidationWarning::new(
                    "browser.chrome_path",
                    format!("Chrome path does not exist: {:?}", path),
                ));
            }
        }
    }

    fn validate_recording(config: &Config, result: &mut ValidationResult) {
        let url = &config.recording.url;
        if url.is_empty() {
            result.add_warning(ValidationWarning::new(
                "recording.url",
                "Start URL is not set, pass --url when recording",
            ));
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "recording.url",
                "url must start with http:// or https://",
            ));
        }

        if config.recording.output_dir.as_os_str().is_empty() {
            result.add_error(ValidationError::new(
                "recording.output_dir",
                "Output directory cannot be empty",
            ));
        }
    }

    fn validate_credentials(config: &Config, result: &mut ValidationResult) {
        let creds = &config.credentials;
        if creds.identity.is_none() {
            result.add_warning(ValidationWarning::new(
                "credentials.identity",
                "Identity is not set, redacted identity inputs will be skipped",
            ));
        }
        if creds.secret.is_none() {
            result.add_warning(ValidationWarning::new(
                "credentials.secret",
                "Secret is not set, redacted secret inputs will be skipped",
            ));
        }

        for (path, selector) in [
            ("credentials.identity_selector", &creds.identity_selector),
            ("credentials.secret_selector", &creds.secret_selector),
        ] {
            if selector.as_deref().is_some_and(|s| s.trim().is_empty()) {
                result.add_error(ValidationError::new(path, "Selector cannot be blank"));
            }
        }
    }

    fn validate_replay(config: &Config, result: &mut ValidationResult) {
        let replay = &config.replay;
        if !(replay.timescale.is_finite() && replay.timescale > 0.0) {
            result.add_error(ValidationError::new(
                "replay.timescale",
                "timescale must be a positive number",
            ));
        }

        if replay.candidate_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "replay.candidate_timeout_ms",
                "candidate_timeout_ms must be greater than 0",
            ));
        }

        if replay.max_gap_ms > 60_000 {
            result.add_warning(ValidationWarning::new(
                "replay.max_gap_ms",
                "max_gap_ms is very high (>60s), long idle periods will be replayed",
            ));
        }

        for (path, value) in [
            ("replay.url_change_timeout_ms", replay.url_change_timeout_ms),
            ("replay.network_idle_timeout_ms", replay.network_idle_timeout_ms),
            ("replay.dom_ready_timeout_ms", replay.dom_ready_timeout_ms),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "Timeout must be greater than 0"));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
