use crate::config::DebugGuardConfig;
use crate::features::context_model::Priority;
use crate::features::emission::SyncFragment;

pub struct GuardInjector<'a> {
    config: &'a DebugGuardConfig,
}

impl<'a> GuardInjector<'a> {
    pub fn new(config: &'a DebugGuardConfig) -> Self {
        Self { config }
    }

    pub fn guard_line(&self, ceiling: Priority, label: &str) -> String {
        format!(
            "if ({}() > {}u) {{ {}(\"{}\"); }}",
            self.config.current_priority_fn,
            ceiling,
            self.config.violation_handler,
            label.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }

    /// Guarded copy of `fragment`; `None` when guards are off or nothing is emitted
    pub fn inject(&self, fragment: &SyncFragment, ceiling: Priority, label: &str) -> Option<SyncFragment> {
        if !self.config.enabled || fragment.is_none() {
            return None;
        }
        let mut guarded = fragment.clone();
        guarded.enter.insert(0, self.guard_line(ceiling, label));
        Some(guarded)
    }
}
