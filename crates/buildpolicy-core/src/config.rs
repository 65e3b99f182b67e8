//! Policy configuration.
//!
//! Every section has working defaults; a JSON file only needs to name the
//! fields it overrides.

use crate::env::SignalNames;
use crate::error::{PolicyError, Result};
use crate::publish_gate::PublishGateConfig;
use crate::task::{DocOptions, Visibility};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_LINT_FLAGS: &[&str] = &[
    "-Xlint:cast",
    "-Xlint:deprecation",
    "-Xlint:divzero",
    "-Xlint:empty",
    "-Xlint:fallthrough",
    "-Xlint:finally",
    "-Xlint:overrides",
    "-Xlint:rawtypes",
    "-Xlint:unchecked",
];

pub const DEFAULT_STATIC_ANALYSIS_FLAGS: &[&str] = &[
    "-XepDisableWarningsInGeneratedCode",
    "-XepExcludedPaths:.*/build/generated/.*",
];

pub const DEFAULT_RULE_SET: &str = "com.netflix.nebula:gradle-resolution-rules:0.52.0";
pub const DEFAULT_OPTIONAL_RULE: &str = "slf4j-bridge";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompilerPolicyConfig {
    pub enabled: bool,
    pub lint_flags: Vec<String>,
    pub encoding: Option<String>,
}

impl Default for CompilerPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lint_flags: to_strings(DEFAULT_LINT_FLAGS),
            encoding: Some("UTF-8".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StaticAnalysisConfig {
    pub enabled: bool,
    pub flags: Vec<String>,
}

impl Default for StaticAnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flags: to_strings(DEFAULT_STATIC_ANALYSIS_FLAGS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocPolicyConfig {
    pub enabled: bool,
    pub options: DocOptions,
}

impl Default for DocPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            options: DocOptions {
                visibility: Some(Visibility::Protected),
                suppressed_warnings: vec!["missing".to_string()],
                links: vec!["https://docs.oracle.com/javase/8/docs/api/".to_string()],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolutionPolicyConfig {
    pub enabled: bool,
    pub rule_set: String,
    pub optional_rule: Option<String>,
}

impl Default for ResolutionPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rule_set: DEFAULT_RULE_SET.to_string(),
            optional_rule: Some(DEFAULT_OPTIONAL_RULE.to_string()),
        }
    }
}

/// Top-level configuration for one build invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    pub compiler: CompilerPolicyConfig,
    pub static_analysis: StaticAnalysisConfig,
    pub docs: DocPolicyConfig,
    pub resolution: ResolutionPolicyConfig,
    pub publish: PublishGateConfig,
    pub signals: SignalNames,
}

impl PolicyConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Reject blank values that would otherwise produce silently broken
    /// task options.
    pub fn validate(&self) -> Result<()> {
        let lists = [
            ("compiler.lint_flags", &self.compiler.lint_flags),
            ("static_analysis.flags", &self.static_analysis.flags),
            ("docs.options.links", &self.docs.options.links),
        ];
        for (field, values) in lists {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(invalid(field, "entries must not be blank"));
            }
        }

        if self.resolution.enabled && self.resolution.rule_set.trim().is_empty() {
            return Err(invalid("resolution.rule_set", "must not be blank"));
        }

        let p = &self.publish;
        let names = [
            ("publish.release_target", &p.release_target),
            ("publish.snapshot_target", &p.snapshot_target),
            ("publish.release_step", &p.release_step),
            ("publish.entry_point", &p.entry_point),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be blank"));
            }
        }
        if p.release_target == p.snapshot_target {
            return Err(invalid(
                "publish.snapshot_target",
                "must differ from publish.release_target",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> PolicyError {
    PolicyError::Policy(format!("invalid configuration {}: {}", field, reason))
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
