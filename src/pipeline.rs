//! Rig Pipeline - Single Entry Point
//!
//! CRITICAL: approve MUST call validate internally. No bypass.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::hashing::{configuration_hash, plan_hash};
use crate::layout::{layout_rig, ConnectorResolver, LoopSpliceResolver, RigLayout};
use crate::profiles::{FailureMode, ProfileRegistry, RuleProfile};
use crate::section::{ConfigurationError, RigConfiguration};
use crate::validation::{ValidationResult, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Rule profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Rule profile {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Everything a form layer needs after an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigReport {
    pub profile_id: String,
    pub profile_version: String,
    pub configuration_hash: String,
    pub validation: ValidationResult,
    pub layout: RigLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub highline_id: String,
    pub profile_id: String,
    pub configuration: RigConfiguration,
}

/// A plan cleared for saving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedPlan {
    pub id: String,
    pub highline_id: String,
    pub profile_id: String,
    pub profile_version: String,
    pub engine_version: String,
    pub approved_at: DateTime<Utc>,
    pub configuration_hash: String,
    pub plan_hash: String,
    pub validation: ValidationResult,
    pub configuration: RigConfiguration,
}

/// The rig pipeline - single entry point for evaluating and approving plans
pub struct RigPipeline {
    registry: ProfileRegistry,
    validator: Validator,
    resolver: Box<dyn ConnectorResolver + Send + Sync>,
}

impl RigPipeline {
    pub fn new(registry: ProfileRegistry) -> Self {
        Self {
            registry,
            validator: Validator::new(),
            resolver: Box::new(LoopSpliceResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: impl ConnectorResolver + Send + Sync + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn list_profiles(&self) -> Vec<&RuleProfile> {
        self.registry.list()
    }

    pub fn get_profile(&self, id: &str) -> Option<&RuleProfile> {
        self.registry.get(id)
    }

    /// Validate a snapshot against a profile
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(
        &self,
        profile_id: &str,
        config: &RigConfiguration,
    ) -> Result<ValidationResult, PipelineError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let profile = self.profile(profile_id)?;
        config.check_invariants()?;

        Ok(self.validator.validate(config, profile))
    }

    /// Full re-evaluation: validation plus layout for both lines.
    pub fn evaluate(
        &self,
        profile_id: &str,
        config: &RigConfiguration,
    ) -> Result<RigReport, PipelineError> {
        let validation = self.validate(profile_id, config)?;
        let profile = self.profile(profile_id)?;
        let configuration_hash = configuration_hash(config)?;

        debug!(
            "evaluated rig {} with profile {}: valid={}",
            configuration_hash, profile.id, validation.is_valid()
        );

        Ok(RigReport {
            profile_id: profile.id.clone(),
            profile_version: profile.profile_version.clone(),
            configuration_hash,
            validation,
            layout: layout_rig(config, &profile.layout, self.resolver.as_ref()),
        })
    }

    /// Pre-save check
    ///
    /// CRITICAL: This ALWAYS calls validate internally. No bypass possible.
    pub fn approve(&self, request: &ApprovalRequest) -> Result<ApprovedPlan, PipelineError> {
        let profile = self.profile(&request.profile_id)?;

        // MANDATORY: Validation is always called.
        let validation = self.validate(&request.profile_id, &request.configuration)?;

        if !validation.is_valid() {
            let messages: Vec<_> = validation
                .errors()
                .map(|(check, e)| format!("{:?}: {}", check, e))
                .collect();
            match profile.failure_mode {
                FailureMode::Block => {
                    return Err(PipelineError::ValidationFailed(messages.join("; ")));
                }
                FailureMode::Warn => {
                    warn!(
                        "approving highline {} with errors: {}",
                        request.highline_id,
                        messages.join("; ")
                    );
                }
                FailureMode::Log => {
                    info!(
                        "approving highline {} with errors: {}",
                        request.highline_id,
                        messages.join("; ")
                    );
                }
            }
        }

        let configuration_hash = configuration_hash(&request.configuration)?;
        let plan_hash = plan_hash(
            &request.highline_id,
            &profile.id,
            &profile.profile_version,
            &request.configuration,
            ENGINE_VERSION,
        )?;

        debug!("approved highline {} as {}", request.highline_id, plan_hash);

        Ok(ApprovedPlan {
            id: Uuid::new_v4().to_string(),
            highline_id: request.highline_id.clone(),
            profile_id: profile.id.clone(),
            profile_version: profile.profile_version.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            approved_at: Utc::now(),
            configuration_hash,
            plan_hash,
            validation,
            configuration: request.configuration.clone(),
        })
    }

    fn profile(&self, id: &str) -> Result<&RuleProfile, PipelineError> {
        let profile = self
            .registry
            .get(id)
            .ok_or_else(|| PipelineError::ProfileNotFound(id.to_string()))?;
        check_engine_version(profile)?;
        Ok(profile)
    }
}

fn check_engine_version(profile: &RuleProfile) -> Result<(), PipelineError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)?;
    let min_ver = semver::Version::parse(&profile.engine_min_version)?;

    if engine_ver < min_ver {
        return Err(PipelineError::EngineVersionMismatch(
            profile.id.clone(),
            profile.engine_min_version.clone(),
            ENGINE_VERSION.to_string(),
        ));
    }

    Ok(())
}

impl Default for RigPipeline {
    fn default() -> Self {
        Self::new(ProfileRegistry::default())
    }
}
