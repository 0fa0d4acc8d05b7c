/// Protection level models
use crate::features::context_model::Priority;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statement that transfers control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlTransfer {
    Return,
    Break,
    Continue,
}

impl ControlTransfer {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
        }
    }
}

/// Minimum masking level guaranteed on entry to each function
///
/// The minimum is taken over every call site; entry and address-taken
/// functions start at 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritedLevels {
    levels: BTreeMap<String, Priority>,
}

impl InheritedLevels {
    pub(crate) fn new(levels: BTreeMap<String, Priority>) -> Self {
        Self { levels }
    }

    /// Level for `function`; 0 when no call path was found
    pub fn level_of(&self, function: &str) -> Priority {
        self.levels.get(function).copied().unwrap_or(Priority::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Priority)> {
        self.levels.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
