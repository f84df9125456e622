//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce uniqueness of trigger names and topic patterns
//! - Validate value ranges (durations >= 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::{BridgeConfig, Mapping};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required mapping field is empty.
    MissingField { mapping: String, field: &'static str },
    DuplicateTriggerName(String),
    DuplicateTopicPattern(String),
    /// A numeric field is negative or not finite.
    InvalidNumber { mapping: String, field: &'static str, value: f64 },
    InvalidPort { mapping: String },
    /// `#` appears somewhere other than the last character.
    MisplacedWildcard { mapping: String, pattern: String },
    InvalidBrokerPort,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField { mapping, field } => {
                write!(f, "mapping '{}': {} is required", mapping, field)
            }
            ValidationError::DuplicateTriggerName(name) => {
                write!(f, "duplicate trigger name '{}'", name)
            }
            ValidationError::DuplicateTopicPattern(pattern) => {
                write!(f, "duplicate topic pattern '{}'", pattern)
            }
            ValidationError::InvalidNumber { mapping, field, value } => {
                write!(f, "mapping '{}': {} must be a non-negative number, got {}", mapping, field, value)
            }
            ValidationError::InvalidPort { mapping } => {
                write!(f, "mapping '{}': udp_port must be between 1 and 65535", mapping)
            }
            ValidationError::MisplacedWildcard { mapping, pattern } => {
                write!(f, "mapping '{}': '#' must be the last character of '{}'", mapping, pattern)
            }
            ValidationError::InvalidBrokerPort => write!(f, "broker port must be between 1 and 65535"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a whole configuration, collecting every problem.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.broker.port == 0 {
        errors.push(ValidationError::InvalidBrokerPort);
    }

    errors.extend(validate_mappings(&config.mappings));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a mapping set on its own.
pub fn validate_mappings(mappings: &[Mapping]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();
    let mut patterns = HashSet::new();

    for mapping in mappings {
        let name = mapping.trigger_name.clone();

        for (field, value) in [
            ("trigger_name", &mapping.trigger_name),
            ("topic_pattern", &mapping.topic_pattern),
            ("udp_ip", &mapping.udp_ip),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::MissingField { mapping: name.clone(), field });
            }
        }

        if !mapping.trigger_name.is_empty() && !names.insert(mapping.trigger_name.as_str()) {
            errors.push(ValidationError::DuplicateTriggerName(name.clone()));
        }
        if !mapping.topic_pattern.is_empty() && !patterns.insert(mapping.topic_pattern.as_str()) {
            errors.push(ValidationError::DuplicateTopicPattern(mapping.topic_pattern.clone()));
        }

        for (field, value) in [
            ("timeout", mapping.timeout),
            ("udp_delay", mapping.udp_delay),
            ("car_length", mapping.car_length),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::InvalidNumber { mapping: name.clone(), field, value });
            }
        }

        if mapping.udp_port == 0 {
            errors.push(ValidationError::InvalidPort { mapping: name.clone() });
        }

        let pattern = &mapping.topic_pattern;
        if let Some(pos) = pattern.find('#') {
            if pos != pattern.len() - 1 {
                errors.push(ValidationError::MisplacedWildcard {
                    mapping: name.clone(),
                    pattern: pattern.clone(),
                });
            } else if hash_without_level_boundary(pattern) {
                // Matching is a plain prefix test, so "a#" also matches "abc".
                tracing::warn!(
                    trigger = %name,
                    pattern = %pattern,
                    "'#' wildcard is not preceded by '/'; it will match any topic starting with the prefix"
                );
            }
        }
    }

    errors
}

/// True for a trailing `#` that does not start its own level, as in `a#`.
pub fn hash_without_level_boundary(pattern: &str) -> bool {
    match pattern.strip_suffix('#') {
        Some(prefix) => !prefix.is_empty() && !prefix.ends_with('/'),
        None => false,
    }
}
