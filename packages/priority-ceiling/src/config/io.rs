//! Configuration I/O schema (YAML v1)

use super::analysis_config::{DebugGuardConfig, IndirectCallPolicy, OpaqueCallPolicy};
use super::target::{MaskEncoding, MaskingIntrinsics, TargetCapabilities};
use crate::shared::models::AccessWidth;
use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Target preset name
    pub target: String,

    #[serde(default)]
    pub indirect_calls: IndirectCallPolicy,

    #[serde(default)]
    pub opaque_calls: OpaqueCallPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_guards: Option<DebugGuardConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trusted_functions: Vec<String>,

    /// Fine-grained capability overrides on top of the preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_overrides: Option<TargetOverrides>,
}

/// Patch type for TargetCapabilities (all fields optional)
///
/// `lock_free_retry_max_width` and `max_selective_priority` are nullable in
/// the descriptor itself, so the patch wraps them twice: absent leaves the
/// preset value, explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_selective_masking: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub lock_free_retry_max_width: Option<Option<AccessWidth>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_access_width: Option<AccessWidth>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub max_selective_priority: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_encoding: Option<MaskEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsics: Option<MaskingIntrinsics>,
}

impl TargetOverrides {
    pub fn apply(self, target: &mut TargetCapabilities) {
        if let Some(v) = self.supports_selective_masking {
            target.supports_selective_masking = v;
        }
        if let Some(v) = self.lock_free_retry_max_width {
            target.lock_free_retry_max_width = v;
        }
        if let Some(v) = self.native_access_width {
            target.native_access_width = v;
        }
        if let Some(v) = self.max_selective_priority {
            target.max_selective_priority = v;
        }
        if let Some(v) = self.mask_encoding {
            target.mask_encoding = v;
        }
        if let Some(v) = self.intrinsics {
            target.intrinsics = v;
        }
    }

    /// Patch reproducing `target` exactly
    pub fn capture(target: &TargetCapabilities) -> Self {
        Self {
            supports_selective_masking: Some(target.supports_selective_masking),
            lock_free_retry_max_width: Some(target.lock_free_retry_max_width),
            native_access_width: Some(target.native_access_width),
            max_selective_priority: Some(target.max_selective_priority),
            mask_encoding: Some(target.mask_encoding),
            intrinsics: Some(target.intrinsics.clone()),
        }
    }
}

/// Distinguishes a missing key from an explicit `null`
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, TargetPreset};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_file_loading() {
        let yaml_content = r#"
version: 1
target: cortex-m4
indirect_calls: assume_all_contexts
trusted_functions:
  - memcpy
debug_guards:
  enabled: true
  current_priority_fn: current_irq_priority
  violation_handler: ceiling_panic
target_overrides:
  mask_encoding:
    kind: cortex_m_basepri
    priority_bits: 3
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();
        let path = temp_file.path().to_str().unwrap();

        let config = AnalysisConfig::from_yaml(path).unwrap();
        assert_eq!(config.indirect_calls(), IndirectCallPolicy::AssumeAllContexts);
        assert!(config.trusted_functions().contains("memcpy"));
        assert!(config.debug_guards().enabled);
        assert_eq!(config.debug_guards().violation_handler, "ceiling_panic");
        assert_eq!(
            config.target().mask_encoding,
            MaskEncoding::CortexMBasepri { priority_bits: 3 }
        );
    }

    #[test]
    fn test_explicit_null_clears_retry_width() {
        let yaml = r#"
version: 1
target: cortex-m3
target_overrides:
  lock_free_retry_max_width: null
"#;
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.target().lock_free_retry_max_width, None);

        let untouched = AnalysisConfig::from_yaml_str("version: 1\ntarget: cortex-m3\n").unwrap();
        assert_eq!(
            untouched.target().lock_free_retry_max_width,
            Some(AccessWidth::Bits32)
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "version: 1\ntarget: avr\nescape_hatch: true\n";
        assert!(AnalysisConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_capture_apply_identity() {
        let source = TargetCapabilities::from_preset(TargetPreset::Avr);
        let mut target = TargetCapabilities::from_preset(TargetPreset::CortexM4);
        TargetOverrides::capture(&source).apply(&mut target);
        assert_eq!(target, source);
    }
}
