// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./levo.toml` > `~/.config/levo/levo.toml` > `/etc/levo/levo.toml`
//! with environment variable overrides via `LEVO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LevoConfig;

/// Sections addressable through `LEVO_<SECTION>_<KEY>` environment variables.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "completion",
    "search",
    "storage",
    "context",
    "server",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/levo/levo.toml` (system-wide)
/// 3. `~/.config/levo/levo.toml` (user XDG config)
/// 4. `./levo.toml` (local directory)
/// 5. `LEVO_*` environment variables
pub fn load_config() -> Result<LevoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<LevoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LevoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LevoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LevoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LevoConfig::default()))
        .merge(Toml::file("/etc/levo/levo.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("levo/levo.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("levo.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `LEVO_COMPLETION_API_KEY` must map to `completion.api_key`,
/// not `completion.api.key`.
fn env_provider() -> Env {
    Env::prefixed("LEVO_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env key to its lowercased, dotted config path.
///
/// figment hands the key over in its original case. Only the leading section
/// name is rewritten; unknown sections pass through so `deny_unknown_fields`
/// can report them.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
        {
            return format!("{section}.{field}");
        }
    }
    key
}
