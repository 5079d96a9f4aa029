use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::genai::settings::{SafetyPolicy, SettingsUpdate, StopSequences};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub candidate_count: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub stop_sequences: Option<StopSequences>,
    pub safety: Option<String>,
    pub timeout: Option<u64>,
    pub output: Option<String>,
    pub show_usage: Option<bool>,
}

impl ProfileConfig {
    /// Settings fields the profile carries, for layering under env and
    /// CLI values.
    pub fn settings_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            candidate_count: self.candidate_count,
            max_output_tokens: self.max_output_tokens,
            stop_sequences: self.stop_sequences.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, String> {
    let (path, profiles) = read_profiles()?;

    profiles.get(name).cloned().ok_or_else(|| {
        format!(
            "Profile '{}' not found in config file '{}'.",
            name,
            path.display()
        )
    })
}

/// Parses the config file and validates one profile, or all of them.
/// Returns the path that was checked.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, String> {
    let (path, profiles) = read_profiles()?;

    match profile {
        Some(name) => {
            let profile = profiles.get(name).ok_or_else(|| {
                format!(
                    "Profile '{}' not found in config file '{}'.",
                    name,
                    path.display()
                )
            })?;
            check_profile(name, profile)?;
        }
        None => {
            for (name, profile) in &profiles {
                check_profile(name, profile)?;
            }
        }
    }
    Ok(path)
}

fn read_profiles() -> Result<(PathBuf, HashMap<String, ProfileConfig>), String> {
    let path = config_path()?;
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;

    let config: ConfigFile = toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))?;

    let profiles = config.profiles.ok_or_else(|| {
        format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        )
    })?;

    Ok((path, profiles))
}

fn check_profile(name: &str, profile: &ProfileConfig) -> Result<(), String> {
    if let Some(preset) = &profile.safety {
        SafetyPolicy::preset(preset).map_err(|err| {
            format!("Invalid profile safety '{preset}' in profile '{name}': {err}")
        })?;
    }
    if let Some(output) = &profile.output {
        if output != "text" && output != "json" {
            return Err(format!(
                "Invalid profile output '{output}' in profile '{name}'. Supported values: text, json."
            ));
        }
    }
    profile
        .settings_update()
        .validate()
        .map_err(|err| format!("Invalid profile '{name}': {err}"))
}

fn config_path() -> Result<PathBuf, String> {
    if let Ok(path) = env::var("GP_CONFIG") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed).join("gempipe").join("config.toml"));
        }
    }

    let home = env::var("HOME").map_err(|_| {
        "Cannot resolve config path: set GP_CONFIG or HOME/XDG_CONFIG_HOME.".to_string()
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("gempipe")
        .join("config.toml"))
}
