// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express. All
//! violations are collected; validation does not stop at the first one.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::LevoConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &LevoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if let Some(path) = &config.agent.persona_file
        && path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "agent.persona_file",
            "must not be empty when set",
        ));
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host", "must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(
            "server.host",
            format!("`{host}` is not a valid IP address or hostname"),
        ));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::validation("server.port", "must not be 0"));
    }

    if config.server.stream_buffer == 0 {
        errors.push(ConfigError::validation(
            "server.stream_buffer",
            "must be greater than 0",
        ));
    }

    if config.completion.base_url.trim().is_empty() {
        errors.push(ConfigError::validation(
            "completion.base_url",
            "must not be empty",
        ));
    }

    if config.completion.model.trim().is_empty() {
        errors.push(ConfigError::validation("completion.model", "must not be empty"));
    }

    if config.completion.max_tokens == 0 {
        errors.push(ConfigError::validation(
            "completion.max_tokens",
            "must be greater than 0",
        ));
    }

    if let Some(t) = config.completion.temperature
        && !(0.0..=2.0).contains(&t)
    {
        errors.push(ConfigError::validation(
            "completion.temperature",
            format!("must be between 0.0 and 2.0, got {t}"),
        ));
    }

    if config.completion.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "completion.timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.search.max_results == 0 || config.search.max_results > 10 {
        errors.push(ConfigError::validation(
            "search.max_results",
            format!("must be between 1 and 10, got {}", config.search.max_results),
        ));
    }

    if config.search.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "search.timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.context.history_max_entries == 0 {
        errors.push(ConfigError::validation(
            "context.history_max_entries",
            "must be greater than 0",
        ));
    }

    if config.context.history_char_budget == 0 {
        errors.push(ConfigError::validation(
            "context.history_char_budget",
            "must be greater than 0",
        ));
    }

    let mut seen = HashSet::new();
    for (i, trigger) in config.triggers.iter().enumerate() {
        if trigger.name.trim().is_empty() {
            errors.push(ConfigError::validation(
                format!("triggers[{i}].name"),
                "must not be empty",
            ));
        } else if !seen.insert(trigger.name.as_str()) {
            errors.push(ConfigError::validation(
                format!("triggers[{i}].name"),
                format!("duplicate trigger name `{}`", trigger.name),
            ));
        }

        if trigger.keywords.iter().all(|k| k.trim().is_empty()) {
            errors.push(ConfigError::validation(
                format!("triggers[{i}].keywords"),
                "must contain at least one non-empty keyword",
            ));
        }

        if let Some(site) = &trigger.site_filter
            && site.trim().is_empty()
        {
            errors.push(ConfigError::validation(
                format!("triggers[{i}].site_filter"),
                "must not be empty when set",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
