// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona: the fixed system instructions that open every prompt.

use levo_config::model::AgentConfig;
use tracing::{info, warn};

/// Loads the persona following config priority: file > inline > default.
///
/// An unreadable or empty persona file is logged and skipped rather than
/// failing startup.
pub async fn load_persona(config: &AgentConfig) -> String {
    if let Some(path) = &config.persona_file {
        match tokio::fs::read_to_string(path).await {
            Ok(content) if !content.trim().is_empty() => {
                info!(path = path.as_str(), "loaded persona from file");
                return content.trim().to_string();
            }
            Ok(_) => warn!(path = path.as_str(), "persona file is empty, falling back"),
            Err(e) => warn!(
                path = path.as_str(),
                error = %e,
                "failed to read persona file, falling back"
            ),
        }
    }

    if let Some(persona) = &config.persona
        && !persona.trim().is_empty()
    {
        return persona.clone();
    }

    default_persona(&config.name)
}

/// The built-in persona for an agent called `name`.
pub fn default_persona(name: &str) -> String {
    format!(
        "You are {name}, a fast, funny, confident Gen-Z AI created for LeCore. \
         You speak casually, stay helpful, and always keep responses accurate, \
         short, and energetic. Do NOT speak like an old robot."
    )
}
