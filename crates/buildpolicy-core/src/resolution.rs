//! Shared dependency-resolution rule aggregation.

use serde::{Deserialize, Serialize};

/// Rule-set dependencies and optional rule activations applied to the whole
/// build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolutionRules {
    /// Rule-set artifact coordinates (`group:name:version`).
    pub dependencies: Vec<String>,
    /// Named optional rules to activate.
    pub optional: Vec<String>,
}

impl ResolutionRules {
    /// Add a rule-set dependency and activate an optional rule. Both lists are
    /// deduplicated by value.
    pub fn append_resolution_rule(&mut self, coordinate: &str, optional_name: Option<&str>) {
        if !self.dependencies.iter().any(|d| d == coordinate) {
            self.dependencies.push(coordinate.to_string());
        }
        if let Some(name) = optional_name {
            if !self.optional.iter().any(|o| o == name) {
                self.optional.push(name.to_string());
            }
        }
    }
}
