//! C rendering of synchronization fragments
//!
//! Intrinsic templates come from the target descriptor; `{}` is replaced by
//! the single argument (a level literal or a saved slot).

use crate::config::{MaskEncoding, TargetCapabilities};
use crate::features::context_model::Priority;
use crate::features::emission::domain::{MaskOp, SyncFragment, SyncStrategy};
use crate::shared::models::AccessWidth;

fn fill(template: &str, arg: &str) -> String {
    template.replacen("{}", arg, 1)
}

pub struct CRenderer<'a> {
    target: &'a TargetCapabilities,
}

impl<'a> CRenderer<'a> {
    pub fn new(target: &'a TargetCapabilities) -> Self {
        Self { target }
    }

    /// Threshold literal in the target's encoding
    fn literal(&self, hardware: u32) -> String {
        match self.target.mask_encoding {
            MaskEncoding::Logical => format!("{}u", hardware),
            MaskEncoding::CortexMBasepri { .. } => format!("0x{:02X}u", hardware),
        }
    }

    /// Save threshold, raise monotonically, restore the saved value.
    ///
    /// Returns `None` when the encoding cannot express `level`.
    pub fn selective_mask(&self, level: Priority, tag: &str) -> Option<SyncFragment> {
        let hardware = self.target.mask_encoding.encode(level.value())?;
        let intrinsics = &self.target.intrinsics;
        let slot = format!("__crit_mask_{}", tag);
        let value = self.literal(hardware);

        let mut enter = vec![format!(
            "{} {} = {};",
            intrinsics.threshold_type, slot, intrinsics.get_threshold
        )];
        match (&intrinsics.raise_threshold, self.target.mask_encoding) {
            (Some(raise), _) => enter.push(format!("{};", fill(raise, &value))),
            (None, MaskEncoding::Logical) => enter.push(format!(
                "if ({} < {}) {{ {}; }}",
                slot,
                value,
                fill(&intrinsics.set_threshold, &value)
            )),
            // 0 disables BASEPRI masking; lower non-zero values mask more
            (None, MaskEncoding::CortexMBasepri { .. }) => enter.push(format!(
                "if ({slot} == 0u || {slot} > {value}) {{ {}; }}",
                fill(&intrinsics.set_threshold, &value)
            )),
        }

        Some(SyncFragment {
            strategy: SyncStrategy::SelectiveMask,
            level: Some(level),
            hardware_level: Some(hardware),
            enter_ops: vec![
                MaskOp::SaveThreshold { slot: slot.clone() },
                MaskOp::RaiseThreshold { level },
            ],
            exit_ops: vec![MaskOp::RestoreThreshold { slot: slot.clone() }],
            enter,
            exit: vec![format!("{};", fill(&intrinsics.set_threshold, &slot))],
        })
    }

    /// Save the interrupt-enable state, disable everything, restore on exit
    pub fn global_disable(&self, tag: &str) -> SyncFragment {
        let intrinsics = &self.target.intrinsics;
        let slot = format!("__crit_irq_{}", tag);

        SyncFragment {
            strategy: SyncStrategy::GlobalDisable,
            level: None,
            hardware_level: None,
            enter_ops: vec![
                MaskOp::SaveInterruptState { slot: slot.clone() },
                MaskOp::DisableInterrupts,
            ],
            exit_ops: vec![MaskOp::RestoreInterruptState { slot: slot.clone() }],
            enter: vec![
                format!("{} {} = {};", intrinsics.irq_state_type, slot, intrinsics.save_irq_state),
                format!("{};", intrinsics.disable_irqs),
            ],
            exit: vec![format!("{};", fill(&intrinsics.restore_irq_state, &slot))],
        }
    }

    /// Exclusive load/store retry loop around a read-modify-write.
    ///
    /// The statement emitter computes `__crit_new_<tag>` from
    /// `__crit_old_<tag>` between enter and exit.
    pub fn lock_free_retry(&self, resource: &str, width: AccessWidth, tag: &str) -> Option<SyncFragment> {
        let suffix = width.exclusive_suffix()?;
        let intrinsics = &self.target.intrinsics;
        let old = format!("__crit_old_{}", tag);
        let new = format!("__crit_new_{}", tag);

        Some(SyncFragment {
            strategy: SyncStrategy::LockFreeRetry,
            level: None,
            hardware_level: None,
            enter_ops: vec![MaskOp::LoadExclusive {
                resource: resource.to_string(),
                width,
            }],
            exit_ops: vec![MaskOp::StoreExclusiveRetry {
                resource: resource.to_string(),
                width,
            }],
            enter: vec![
                format!("{} {};", width.c_type(), new),
                "do {".to_string(),
                format!(
                    "    {} {} = {}{}(&{});",
                    width.c_type(),
                    old,
                    intrinsics.load_exclusive_prefix,
                    suffix,
                    resource
                ),
            ],
            exit: vec![format!(
                "}} while ({}{}({}, &{}) != 0u);",
                intrinsics.store_exclusive_prefix, suffix, new, resource
            )],
        })
    }
}
