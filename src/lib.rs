//! Highline Rig - Rig Configuration Validation & Layout Engine
//!
//! # Pipeline
//! 1. Sections are the only truth; loops, splices and offsets are derived
//! 2. Loop resolution corrects lone loops on end pieces
//! 3. Connection detection marks spliced neighbours
//! 4. Validation runs three independent checks, one error each at most
//! 5. Layout emits logical offsets and flags for a renderer
//!
//! Every step is a pure function of an immutable snapshot.

pub mod section;
pub mod loops;
pub mod validation;
pub mod layout;
pub mod profiles;
pub mod hashing;
pub mod pipeline;

pub use section::{ConfigurationError, Line, LineKind, RigConfiguration, WebbingId, WebbingSection};
pub use loops::{connection_boundaries, detect_connections, resolve_loops, EffectiveLoop};
pub use validation::{
    validate, validate_connections, validate_section_loops, Check, ErrorKind, OffsetWindow,
    ValidationResult, ValidationRule, Validator,
};
pub use layout::{
    layout_line, layout_line_with, layout_rig, ConnectorKind, ConnectorResolver, LayoutDescriptor,
    LayoutOptions, LoopSpliceResolver, RigLayout, SectionGeometry,
};
pub use profiles::{FailureMode, ProfileError, ProfileRegistry, RuleProfile, STANDARD_PROFILE_ID};
pub use hashing::{canonical_json, configuration_hash, plan_hash};
pub use pipeline::{ApprovalRequest, ApprovedPlan, PipelineError, RigPipeline, RigReport};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_ENGINE_VERSION: &str = "1.0.0";
