//! Masking simulator
//!
//! Interprets [`MaskOp`] sequences over a simulated core: a logical masking
//! threshold, the global interrupt-enable flag, saved slots and the exclusive
//! monitor. Used to check nesting behaviour of emitted fragments.

use crate::features::context_model::Priority;
use crate::features::emission::domain::MaskOp;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("restore from slot '{0}' that was never saved")]
    UnknownSlot(String),

    #[error("slot '{0}' holds a different kind of state")]
    SlotKindMismatch(String),

    #[error("store-exclusive on '{0}' without a matching load-exclusive")]
    UnpairedExclusive(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Saved {
    Threshold(Priority),
    InterruptsEnabled(bool),
}

#[derive(Debug, Clone)]
pub struct MaskingSimulator {
    level: Priority,
    interrupts_enabled: bool,
    slots: FxHashMap<String, Saved>,
    exclusive: Option<String>,
}

impl Default for MaskingSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskingSimulator {
    /// Unmasked core with interrupts enabled
    pub fn new() -> Self {
        Self::at_level(Priority::ZERO)
    }

    /// Core already masked at `level` (e.g. running inside a handler)
    pub fn at_level(level: Priority) -> Self {
        Self {
            level,
            interrupts_enabled: true,
            slots: FxHashMap::default(),
            exclusive: None,
        }
    }

    pub fn level(&self) -> Priority {
        self.level
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    /// Context at `priority` cannot preempt right now
    pub fn blocks(&self, priority: Priority) -> bool {
        !self.interrupts_enabled || priority <= self.level
    }

    pub fn step(&mut self, op: &MaskOp) -> Result<(), SimulationError> {
        match op {
            MaskOp::SaveThreshold { slot } => {
                self.slots.insert(slot.clone(), Saved::Threshold(self.level));
            }
            MaskOp::RaiseThreshold { level } => {
                self.level = self.level.max(*level);
            }
            MaskOp::RestoreThreshold { slot } => match self.slots.get(slot) {
                Some(Saved::Threshold(saved)) => self.level = *saved,
                Some(_) => return Err(SimulationError::SlotKindMismatch(slot.clone())),
                None => return Err(SimulationError::UnknownSlot(slot.clone())),
            },
            MaskOp::SaveInterruptState { slot } => {
                self.slots
                    .insert(slot.clone(), Saved::InterruptsEnabled(self.interrupts_enabled));
            }
            MaskOp::DisableInterrupts => self.interrupts_enabled = false,
            MaskOp::RestoreInterruptState { slot } => match self.slots.get(slot) {
                Some(Saved::InterruptsEnabled(enabled)) => self.interrupts_enabled = *enabled,
                Some(_) => return Err(SimulationError::SlotKindMismatch(slot.clone())),
                None => return Err(SimulationError::UnknownSlot(slot.clone())),
            },
            MaskOp::LoadExclusive { resource, .. } => self.exclusive = Some(resource.clone()),
            MaskOp::StoreExclusiveRetry { resource, .. } => {
                if self.exclusive.as_deref() != Some(resource.as_str()) {
                    return Err(SimulationError::UnpairedExclusive(resource.clone()));
                }
                self.exclusive = None;
            }
        }
        Ok(())
    }

    pub fn run(&mut self, ops: &[MaskOp]) -> Result<(), SimulationError> {
        ops.iter().try_for_each(|op| self.step(op))
    }
}
