//! Configuration system
//!
//! Three levels, from simplest to most complete:
//! - Target preset (`cortex-m4`, `avr`, ...) with default policies
//! - Builder overrides on [`AnalysisConfig`]
//! - YAML schema v1 with per-field target overrides
//!
//! # Examples
//!
//! ```rust,ignore
//! use priority_ceiling::config::{AnalysisConfig, IndirectCallPolicy, TargetPreset};
//!
//! let config = AnalysisConfig::preset(TargetPreset::CortexM4)
//!     .with_indirect_calls(IndirectCallPolicy::Reject)
//!     .build()?;
//!
//! let config = AnalysisConfig::from_yaml("firmware-analysis.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod io;
pub mod target;
pub mod validation;

pub use analysis_config::{
    AnalysisConfig, DebugGuardConfig, IndirectCallPolicy, OpaqueCallPolicy, SUPPORTED_VERSIONS,
};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigFileV1, TargetOverrides};
pub use target::{MaskEncoding, MaskingIntrinsics, TargetCapabilities, TargetPreset};
pub use validation::Validatable;
