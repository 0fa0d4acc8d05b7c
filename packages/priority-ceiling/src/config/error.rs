//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Missing version field in YAML
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Unknown target preset name
    #[error("Unknown target '{name}'. {suggestion}")]
    UnknownTarget { name: String, suggestion: String },

    /// Capability descriptor is internally inconsistent
    #[error("Inconsistent target capabilities: {issue}. Fix: {fix}")]
    InconsistentTarget { issue: String, fix: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Create an unknown target error with the closest valid name
    pub fn unknown_target(name: impl Into<String>, valid: &[&str]) -> Self {
        let name = name.into();
        let suggestion = find_closest_match(&name, valid);
        Self::UnknownTarget { name, suggestion }
    }

    pub fn inconsistent(issue: impl Into<String>, fix: impl Into<String>) -> Self {
        Self::InconsistentTarget {
            issue: issue.into(),
            fix: fix.into(),
        }
    }
}

/// Find closest match using simple edit distance
fn find_closest_match(target: &str, candidates: &[&str]) -> String {
    match candidates
        .iter()
        .min_by_key(|candidate| levenshtein_distance(target, candidate))
    {
        Some(closest) => format!("Did you mean '{}'?", closest),
        None => "No valid targets available".to_string(),
    }
}

/// Simple Levenshtein distance implementation
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        prev = current;
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("cortex-m4", "cortex-m4"), 0);
        assert_eq!(levenshtein_distance("cortex-m", "cortex-m4"), 1);
        assert_eq!(levenshtein_distance("", "avr"), 3);
    }

    #[test]
    fn test_unknown_target_suggestion() {
        let err = ConfigError::unknown_target("cortexm4", &["generic", "cortex-m4", "avr"]);
        let msg = err.to_string();
        assert!(msg.contains("cortexm4"));
        assert!(msg.contains("Did you mean 'cortex-m4'?"));
    }

    #[test]
    fn test_range_error_message() {
        let err = ConfigError::range_with_hint("priority_bits", 9, 1, 8, "Cortex-M implements 2-8 bits");
        assert!(err.to_string().contains("priority_bits"));
    }
}
