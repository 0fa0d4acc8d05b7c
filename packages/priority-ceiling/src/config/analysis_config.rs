//! Analysis configuration
//!
//! One immutable value, built once before analysis and threaded explicitly
//! through every stage.

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigFileV1, TargetOverrides};
use super::target::{TargetCapabilities, TargetPreset};
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Supported YAML schema versions
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// What to do with calls through function pointers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndirectCallPolicy {
    /// Every unresolved call site is an `UnresolvableCallError`
    Reject,
    /// Address-taken functions are reachable from every context
    AssumeAllContexts,
}

impl Default for IndirectCallPolicy {
    fn default() -> Self {
        Self::Reject
    }
}

/// How calls inside critical regions contribute to the region ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpaqueCallPolicy {
    /// Any call not proven resource-free forces the highest interrupt priority
    Conservative,
    /// Calls to defined functions contribute their transitive resource footprint
    TransitiveFootprint,
}

impl Default for OpaqueCallPolicy {
    fn default() -> Self {
        Self::Conservative
    }
}

/// Runtime ceiling-assumption checks for instrumented builds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebugGuardConfig {
    pub enabled: bool,
    /// Expression yielding the logical priority of the running context
    pub current_priority_fn: String,
    /// Function called with the region label on violation; must not return
    pub violation_handler: String,
}

impl Default for DebugGuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            current_priority_fn: "__crit_current_priority".to_string(),
            violation_handler: "__crit_ceiling_violation".to_string(),
        }
    }
}

impl DebugGuardConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    preset: TargetPreset,
    target: TargetCapabilities,
    indirect_calls: IndirectCallPolicy,
    opaque_calls: OpaqueCallPolicy,
    debug_guards: DebugGuardConfig,
    trusted_functions: BTreeSet<String>,
}

impl AnalysisConfig {
    /// Start from a target preset with default policies
    pub fn preset(preset: TargetPreset) -> Self {
        Self {
            preset,
            target: TargetCapabilities::from_preset(preset),
            indirect_calls: IndirectCallPolicy::default(),
            opaque_calls: OpaqueCallPolicy::default(),
            debug_guards: DebugGuardConfig::default(),
            trusted_functions: BTreeSet::new(),
        }
    }

    /// Replace the capability descriptor wholesale
    pub fn with_target(mut self, target: TargetCapabilities) -> Self {
        self.target = target;
        self
    }

    /// Adjust the preset capability descriptor in place
    pub fn target_with<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut TargetCapabilities),
    {
        f(&mut self.target);
        self
    }

    pub fn with_indirect_calls(mut self, policy: IndirectCallPolicy) -> Self {
        self.indirect_calls = policy;
        self
    }

    pub fn with_opaque_calls(mut self, policy: OpaqueCallPolicy) -> Self {
        self.opaque_calls = policy;
        self
    }

    pub fn with_debug_guards(mut self, guards: DebugGuardConfig) -> Self {
        self.debug_guards = guards;
        self
    }

    /// External functions known not to touch any declared resource
    pub fn with_trusted_function(mut self, name: impl Into<String>) -> Self {
        self.trusted_functions.insert(name.into());
        self
    }

    pub fn target_preset(&self) -> TargetPreset {
        self.preset
    }

    pub fn target(&self) -> &TargetCapabilities {
        &self.target
    }

    pub fn indirect_calls(&self) -> IndirectCallPolicy {
        self.indirect_calls
    }

    pub fn opaque_calls(&self) -> OpaqueCallPolicy {
        self.opaque_calls
    }

    pub fn debug_guards(&self) -> &DebugGuardConfig {
        &self.debug_guards
    }

    pub fn trusted_functions(&self) -> &BTreeSet<String> {
        &self.trusted_functions
    }

    /// Validate and freeze
    pub fn build(self) -> ConfigResult<Self> {
        if let Err(e) = self.target.validate() {
            tracing::warn!("{} rejected: {}", self.target.config_name(), e);
            return Err(e);
        }
        if self.debug_guards.enabled
            && (self.debug_guards.current_priority_fn.is_empty()
                || self.debug_guards.violation_handler.is_empty())
        {
            return Err(ConfigError::inconsistent(
                "debug guards enabled without runtime hooks",
                "set debug_guards.current_priority_fn and debug_guards.violation_handler",
            ));
        }
        Ok(self)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml(path: &str) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text (schema v1)
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        if raw.get("version").is_none() {
            return Err(ConfigError::MissingVersion);
        }

        let file: ConfigFileV1 = serde_yaml::from_value(raw)?;
        if !SUPPORTED_VERSIONS.contains(&file.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: file.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = TargetPreset::from_str(&file.target)?;
        let mut config = Self::preset(preset)
            .with_indirect_calls(file.indirect_calls)
            .with_opaque_calls(file.opaque_calls);

        if let Some(guards) = file.debug_guards {
            config.debug_guards = guards;
        }
        config.trusted_functions.extend(file.trusted_functions);
        if let Some(overrides) = file.target_overrides {
            overrides.apply(&mut config.target);
        }

        tracing::debug!("loaded analysis config (target={})", config.preset);
        config.build()
    }

    /// Serialize to YAML (schema v1); overrides capture every capability field
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: 1,
            target: self.preset.to_string(),
            indirect_calls: self.indirect_calls,
            opaque_calls: self.opaque_calls,
            debug_guards: Some(self.debug_guards.clone()),
            trusted_functions: self.trusted_functions.iter().cloned().collect(),
            target_overrides: Some(TargetOverrides::capture(&self.target)),
        };

        serde_yaml::to_string(&file).map_err(ConfigError::Yaml)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::preset(TargetPreset::default())
    }
}
