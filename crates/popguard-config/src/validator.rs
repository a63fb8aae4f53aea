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
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_engine(config, &mut result);
        Self::validate_domains(config, &mut result);

        Ok(result)
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        let engine = &config.engine;

        if engine.patterns_path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "engine.patterns_path",
                "patterns_path cannot be empty",
            ));
        }

        if engine.find_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "engine.find_timeout_ms",
                "find_timeout_ms must be greater than 0",
            ));
        }

        if engine.action_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "engine.action_timeout_ms",
                "action_timeout_ms must be greater than 0",
            ));
        }

        if engine.find_timeout_ms > 30_000 {
            result.add_warning(ValidationWarning::new(
                "engine.find_timeout_ms",
                "find_timeout_ms is very high (>30s), a missing element will stall every pass",
            ));
        }

        if !engine.enabled {
            result.add_warning(ValidationWarning::new(
                "engine.enabled",
                "engine is disabled, no interruption will be dismissed",
            ));
        }
    }

    fn validate_domains(config: &Config, result: &mut ValidationResult) {
        let lists = [("domains.allow", &config.domains.allow), ("domains.deny", &config.domains.deny)];

        for (path, entries) in lists {
            for entry in entries.iter() {
                let entry = entry.trim();
                if entry.is_empty() {
                    result.add_error(ValidationError::new(path, "domain entry cannot be empty"));
                } else if entry.contains("://") || entry.contains('/') {
                    result.add_error(ValidationError::new(
                        path,
                        format!("'{}' must be a hostname, not a URL", entry),
                    ));
                } else if entry.contains('*') && !entry.starts_with("*.") {
                    result.add_error(ValidationError::new(
                        path,
                        format!("'{}' wildcards are only supported as a '*.' prefix", entry),
                    ));
                }
            }
        }

        for entry in &config.domains.allow {
            if config.domains.deny.contains(entry) {
                result.add_warning(ValidationWarning::new(
                    "domains",
                    format!("'{}' is both allowed and denied, deny wins", entry),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
