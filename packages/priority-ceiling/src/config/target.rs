//! Target capability descriptors
//!
//! The build/target-configuration stage tells the verifier what the
//! microcontroller can do: whether it can mask interrupts selectively by
//! priority, whether it has an exclusive load/store retry primitive and for
//! which operand widths, and which intrinsics implement each of these.

use super::error::{ConfigError, ConfigResult};
use super::validation::Validatable;
use crate::shared::models::AccessWidth;
use serde::{Deserialize, Serialize};

/// How a logical masking threshold is written to hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskEncoding {
    /// Threshold intrinsics take logical priorities; raises are guarded by a compare
    Logical,
    /// ARMv7-M BASEPRI: lower numeric value masks more, 0 disables masking
    CortexMBasepri { priority_bits: u8 },
}

impl MaskEncoding {
    /// Hardware value for a logical ceiling, `None` if it cannot be expressed
    pub fn encode(&self, ceiling: u32) -> Option<u32> {
        match *self {
            Self::Logical => Some(ceiling),
            Self::CortexMBasepri { priority_bits } => {
                if priority_bits == 0 || priority_bits > 8 {
                    return None;
                }
                let levels = 1u32 << priority_bits;
                if ceiling == 0 || ceiling >= levels {
                    return None;
                }
                Some((levels - ceiling) << (8 - u32::from(priority_bits)))
            }
        }
    }
}

/// C intrinsics used by emitted fragments
///
/// Templates containing `{}` receive one argument (a level or a saved slot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingIntrinsics {
    pub threshold_type: String,
    pub get_threshold: String,
    pub set_threshold: String,
    /// Hardware-monotonic raise (e.g. `__set_BASEPRI_MAX`), used instead of a compare
    pub raise_threshold: Option<String>,
    pub irq_state_type: String,
    pub save_irq_state: String,
    pub disable_irqs: String,
    pub restore_irq_state: String,
    pub load_exclusive_prefix: String,
    pub store_exclusive_prefix: String,
}

impl MaskingIntrinsics {
    /// Integration-provided runtime hooks for targets without vendor headers
    pub fn generic() -> Self {
        Self {
            threshold_type: "uint32_t".to_string(),
            get_threshold: "__crit_get_level()".to_string(),
            set_threshold: "__crit_set_level({})".to_string(),
            raise_threshold: None,
            irq_state_type: "uint32_t".to_string(),
            save_irq_state: "__crit_irq_save()".to_string(),
            disable_irqs: "__crit_irq_disable()".to_string(),
            restore_irq_state: "__crit_irq_restore({})".to_string(),
            load_exclusive_prefix: "__crit_load_exclusive".to_string(),
            store_exclusive_prefix: "__crit_store_exclusive".to_string(),
        }
    }

    /// CMSIS intrinsics (PRIMASK, BASEPRI, LDREX/STREX)
    pub fn cmsis() -> Self {
        Self {
            threshold_type: "uint32_t".to_string(),
            get_threshold: "__get_BASEPRI()".to_string(),
            set_threshold: "__set_BASEPRI({})".to_string(),
            raise_threshold: Some("__set_BASEPRI_MAX({})".to_string()),
            irq_state_type: "uint32_t".to_string(),
            save_irq_state: "__get_PRIMASK()".to_string(),
            disable_irqs: "__disable_irq()".to_string(),
            restore_irq_state: "__set_PRIMASK({})".to_string(),
            load_exclusive_prefix: "__LDREX".to_string(),
            store_exclusive_prefix: "__STREX".to_string(),
        }
    }

    /// avr-libc status register save/restore
    pub fn avr() -> Self {
        Self {
            threshold_type: "uint8_t".to_string(),
            irq_state_type: "uint8_t".to_string(),
            save_irq_state: "SREG".to_string(),
            disable_irqs: "cli()".to_string(),
            restore_irq_state: "SREG = {}".to_string(),
            ..Self::generic()
        }
    }
}

impl Default for MaskingIntrinsics {
    fn default() -> Self {
        Self::generic()
    }
}

/// Target capability descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCapabilities {
    /// Hardware can block only contexts at or below a given priority
    pub supports_selective_masking: bool,
    /// Widest operand the exclusive retry primitive supports (`None` = no primitive)
    pub lock_free_retry_max_width: Option<AccessWidth>,
    /// Widest single load/store the core performs indivisibly
    pub native_access_width: AccessWidth,
    /// Highest ceiling selective masking may express; above it global disable is used
    pub max_selective_priority: Option<u32>,
    pub mask_encoding: MaskEncoding,
    pub intrinsics: MaskingIntrinsics,
}

impl TargetCapabilities {
    pub fn from_preset(preset: TargetPreset) -> Self {
        match preset {
            TargetPreset::Generic => Self {
                supports_selective_masking: true,
                lock_free_retry_max_width: None,
                native_access_width: AccessWidth::Bits32,
                max_selective_priority: None,
                mask_encoding: MaskEncoding::Logical,
                intrinsics: MaskingIntrinsics::generic(),
            },
            // ARMv6-M: PRIMASK only, no exclusive monitor
            TargetPreset::CortexM0 => Self {
                supports_selective_masking: false,
                lock_free_retry_max_width: None,
                native_access_width: AccessWidth::Bits32,
                max_selective_priority: None,
                mask_encoding: MaskEncoding::Logical,
                intrinsics: MaskingIntrinsics::cmsis(),
            },
            TargetPreset::CortexM3 | TargetPreset::CortexM4 | TargetPreset::CortexM7 => Self {
                supports_selective_masking: true,
                lock_free_retry_max_width: Some(AccessWidth::Bits32),
                native_access_width: AccessWidth::Bits32,
                max_selective_priority: None,
                mask_encoding: MaskEncoding::CortexMBasepri { priority_bits: 4 },
                intrinsics: MaskingIntrinsics::cmsis(),
            },
            TargetPreset::Avr => Self {
                supports_selective_masking: false,
                lock_free_retry_max_width: None,
                native_access_width: AccessWidth::Bits8,
                max_selective_priority: None,
                mask_encoding: MaskEncoding::Logical,
                intrinsics: MaskingIntrinsics::avr(),
            },
        }
    }

    /// Selective masking is usable for this ceiling
    pub fn can_mask_selectively(&self, ceiling: u32) -> bool {
        if !self.supports_selective_masking {
            return false;
        }
        if let Some(limit) = self.max_selective_priority {
            if ceiling > limit {
                return false;
            }
        }
        self.mask_encoding.encode(ceiling).is_some()
    }

    /// Exclusive retry primitive covers this operand width
    pub fn retry_covers(&self, width: AccessWidth) -> bool {
        self.lock_free_retry_max_width
            .map(|max| width.bits() <= max.bits() && width.exclusive_suffix().is_some())
            .unwrap_or(false)
    }
}

impl Default for TargetCapabilities {
    fn default() -> Self {
        Self::from_preset(TargetPreset::default())
    }
}

impl Validatable for TargetCapabilities {
    fn validate(&self) -> ConfigResult<()> {
        if let MaskEncoding::CortexMBasepri { priority_bits } = self.mask_encoding {
            if priority_bits == 0 || priority_bits > 8 {
                return Err(ConfigError::range_with_hint(
                    "mask_encoding.priority_bits",
                    priority_bits,
                    1,
                    8,
                    "BASEPRI holds at most 8 implemented priority bits",
                ));
            }
            if !self.supports_selective_masking {
                return Err(ConfigError::inconsistent(
                    "BASEPRI encoding on a target without selective masking",
                    "set supports_selective_masking: true or use the logical encoding",
                ));
            }
        }

        if let Some(width) = self.lock_free_retry_max_width {
            if width.exclusive_suffix().is_none() {
                return Err(ConfigError::range_with_hint(
                    "lock_free_retry_max_width",
                    width.bits(),
                    8,
                    32,
                    "exclusive load/store intrinsics exist for 8, 16 and 32 bit operands",
                ));
            }
        }

        for (field, template) in [
            ("intrinsics.set_threshold", &self.intrinsics.set_threshold),
            ("intrinsics.restore_irq_state", &self.intrinsics.restore_irq_state),
        ] {
            if !template.contains("{}") {
                return Err(ConfigError::inconsistent(
                    format!("{} template '{}' has no '{{}}' placeholder", field, template),
                    "add '{}' where the level or saved value is substituted",
                ));
            }
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "TargetCapabilities"
    }
}

/// Named target presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetPreset {
    /// Logical threshold hooks supplied by the integration, no retry primitive
    Generic,
    CortexM0,
    CortexM3,
    CortexM4,
    CortexM7,
    Avr,
}

impl TargetPreset {
    pub const ALL: [TargetPreset; 6] = [
        Self::Generic,
        Self::CortexM0,
        Self::CortexM3,
        Self::CortexM4,
        Self::CortexM7,
        Self::Avr,
    ];

    /// Parse preset from string
    pub fn from_str(s: &str) -> ConfigResult<Self> {
        let lowered = s.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == lowered)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                ConfigError::unknown_target(s, &names)
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::CortexM0 => "cortex-m0",
            Self::CortexM3 => "cortex-m3",
            Self::CortexM4 => "cortex-m4",
            Self::CortexM7 => "cortex-m7",
            Self::Avr => "avr",
        }
    }
}

impl Default for TargetPreset {
    fn default() -> Self {
        Self::Generic
    }
}

impl std::fmt::Display for TargetPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
