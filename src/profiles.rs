//! Rule Profiles - Configurable Rule Sets

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::layout::LayoutOptions;
use crate::validation::OffsetWindow;

pub type ProfileId = String;

pub const STANDARD_PROFILE_ID: &str = "standard";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleProfile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub profile_version: String,
    pub engine_min_version: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub rules: RuleSettings,
    #[serde(default)]
    pub layout: LayoutOptions,
    #[serde(default)]
    pub failure_mode: FailureMode,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("Rule profile {id}: offset window {min}..{max} must be finite, non-negative and ordered")]
    InvalidOffsetWindow { id: ProfileId, min: f64, max: f64 },

    #[error("Rule profile {id}: leading padding must be finite and non-negative, got {padding}")]
    InvalidLeadingPadding { id: ProfileId, padding: f64 },
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl RuleProfile {
    /// Rejects values that would make every rig fail or draw off-canvas.
    pub fn check(&self) -> Result<(), ProfileError> {
        let offsets = &self.rules.connection_offset;
        if !non_negative(offsets.min_offset)
            || !non_negative(offsets.max_offset)
            || offsets.min_offset > offsets.max_offset
        {
            return Err(ProfileError::InvalidOffsetWindow {
                id: self.id.clone(),
                min: offsets.min_offset,
                max: offsets.max_offset,
            });
        }

        if !non_negative(self.layout.leading_padding) {
            return Err(ProfileError::InvalidLeadingPadding {
                id: self.id.clone(),
                padding: self.layout.leading_padding,
            });
        }

        Ok(())
    }

    /// Built-in profile: every rule on, 2-10 m backup offset window.
    pub fn standard() -> Self {
        Self {
            id: STANDARD_PROFILE_ID.to_string(),
            name: "Standard".to_string(),
            description: "Length, loop placement and 2-10 m backup offset checks".to_string(),
            profile_version: "1.0.0".to_string(),
            engine_min_version: crate::MIN_ENGINE_VERSION.to_string(),
            deprecated: false,
            superseded_by: None,
            rules: RuleSettings::default(),
            layout: LayoutOptions::default(),
            failure_mode: FailureMode::Block,
        }
    }
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Plans with errors are rejected.
    #[default]
    Block,
    /// Plans with errors are approved, errors are recorded and logged as warnings.
    Warn,
    /// As `Warn`, logged at info level.
    Log,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSettings {
    #[serde(default)]
    pub section_loops: RuleToggle,
    #[serde(default)]
    pub connection_offset: OffsetRuleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RuleToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetRuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_min_offset")]
    pub min_offset: f64,
    #[serde(default = "default_max_offset")]
    pub max_offset: f64,
}

fn default_min_offset() -> f64 { OffsetWindow::STANDARD.min }
fn default_max_offset() -> f64 { OffsetWindow::STANDARD.max }

impl Default for OffsetRuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_offset: default_min_offset(),
            max_offset: default_max_offset(),
        }
    }
}

impl OffsetRuleConfig {
    pub fn window(&self) -> OffsetWindow {
        OffsetWindow::new(self.min_offset, self.max_offset)
    }
}

/// Profile registry - loads and caches rule profiles
pub struct ProfileRegistry {
    profiles: HashMap<ProfileId, RuleProfile>,
}

impl ProfileRegistry {
    /// An empty registry, without the built-in profile.
    pub fn empty() -> Self {
        Self { profiles: HashMap::new() }
    }

    pub fn new() -> Self {
        let standard = RuleProfile::standard();
        let mut registry = Self::empty();
        registry.profiles.insert(standard.id.clone(), standard);
        registry
    }

    /// Built-in profiles plus every `*.json` profile in `dir`. Files with the
    /// same id replace the built-in entry. Unparseable or insane files are skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if !dir.exists() {
            debug!("profile directory {} not found, using built-ins", dir.display());
            return Ok(registry);
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let loaded = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<RuleProfile>(&content).map_err(|e| e.to_string())
                })
                .and_then(|profile| {
                    let id = profile.id.clone();
                    registry.register(profile).map(|()| id).map_err(|e| e.to_string())
                });
            match loaded {
                Ok(id) => debug!("loaded rule profile {} from {}", id, path.display()),
                Err(e) => warn!("skipping rule profile {}: {}", path.display(), e),
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&RuleProfile> {
        self.profiles.get(id)
    }

    /// Profiles sorted by id.
    pub fn list(&self) -> Vec<&RuleProfile> {
        let mut profiles: Vec<_> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles
    }

    pub fn register(&mut self, profile: RuleProfile) -> Result<(), ProfileError> {
        profile.check()?;
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
