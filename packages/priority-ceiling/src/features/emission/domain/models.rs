/// Emission models
use crate::features::access_collection::RegionId;
use crate::features::context_model::Priority;
use crate::shared::models::{AccessWidth, Span};
use serde::{Deserialize, Serialize};

/// Synchronization strategy for a protected site or region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStrategy {
    LockFreeRetry,
    SelectiveMask,
    GlobalDisable,
    None,
}

impl SyncStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LockFreeRetry => "lock-free-retry",
            Self::SelectiveMask => "selective-mask",
            Self::GlobalDisable => "global-disable",
            Self::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Abstract masking operation; `slot` names the C local holding a saved value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MaskOp {
    SaveThreshold { slot: String },
    /// Raise to `level` if the active threshold is lower; never lowers
    RaiseThreshold { level: Priority },
    RestoreThreshold { slot: String },
    SaveInterruptState { slot: String },
    DisableInterrupts,
    RestoreInterruptState { slot: String },
    LoadExclusive { resource: String, width: AccessWidth },
    /// Store-exclusive; loop back to the load until it succeeds
    StoreExclusiveRetry { resource: String, width: AccessWidth },
}

/// Enter/exit pair handed to the statement emitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFragment {
    pub strategy: SyncStrategy,
    /// Logical masking level (selective mask only)
    pub level: Option<Priority>,
    /// Hardware value written for `level`
    pub hardware_level: Option<u32>,
    pub enter_ops: Vec<MaskOp>,
    pub exit_ops: Vec<MaskOp>,
    /// Rendered C, one statement per line
    pub enter: Vec<String>,
    pub exit: Vec<String>,
}

impl SyncFragment {
    pub fn none() -> Self {
        Self {
            strategy: SyncStrategy::None,
            level: None,
            hardware_level: None,
            enter_ops: Vec::new(),
            exit_ops: Vec::new(),
            enter: Vec::new(),
            exit: Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.strategy.is_none()
    }
}

/// Emission for one critical region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEmission {
    pub region: RegionId,
    pub function: String,
    pub ceiling: Priority,
    pub fragment: SyncFragment,
    /// Debug-build variant with the ceiling guard; the plain fragment is unchanged
    pub guarded: Option<SyncFragment>,
}

/// Emission for one access site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEmission {
    /// Index into the collected site list
    pub site: usize,
    pub resource: String,
    pub function: String,
    pub span: Span,
    pub strategy: SyncStrategy,
    /// Region carrying the fragment for sites inside a critical block
    pub covered_by: Option<RegionId>,
    /// Site-local fragment (atomic read-modify-write, wide atomic load/store)
    pub fragment: Option<SyncFragment>,
    /// Debug-build variant of `fragment` with the ceiling guard
    pub guarded: Option<SyncFragment>,
}

impl SiteEmission {
    pub fn label(&self) -> String {
        format!(
            "S{} ({}) in {} at line {}",
            self.site, self.resource, self.function, self.span.start_line
        )
    }
}
