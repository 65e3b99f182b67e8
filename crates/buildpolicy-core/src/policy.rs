//! Policy set.
//!
//! Each [`Policy`] is registered as a deferred action. Task policies only
//! mutate the options of the tasks they select, and reapplying any of them is
//! a no-op.

use crate::build::Build;
use crate::channel::decide;
use crate::config::{
    CompilerPolicyConfig, DocPolicyConfig, PolicyConfig, ResolutionPolicyConfig,
    StaticAnalysisConfig,
};
use crate::deferred::DeferredRegistry;
use crate::env::EnvSnapshot;
use crate::error::Result;
use crate::graph::TaskSelector;
use crate::obs;
use crate::publish_gate::PublishGate;
use crate::report::ConfigurationReport;
use crate::resolution::ResolutionRules;
use crate::task::{Task, TaskKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A cross-cutting behavior attached to the build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Lint flags and source encoding on compile tasks.
    CompilerDiagnostics,
    /// Static analysis flags on compile tasks.
    StaticAnalysis,
    /// Visibility, doclint and link options on documentation tasks.
    Documentation,
    /// Build-wide rule-set dependency and optional rule.
    ResolutionRules,
    /// Upload-target enablement and the publish entry point.
    PublishGate,
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::CompilerDiagnostics => "compiler-diagnostics",
            Policy::StaticAnalysis => "static-analysis",
            Policy::Documentation => "documentation",
            Policy::ResolutionRules => "resolution-rules",
            Policy::PublishGate => "publish-gate",
        }
    }
}

/// Add the configured lint flags (sorted, deduplicated) and source encoding.
pub fn apply_compiler_diagnostics(task: &mut Task, config: &CompilerPolicyConfig) {
    let flags: BTreeSet<&str> = config.lint_flags.iter().map(String::as_str).collect();
    let flags: Vec<&str> = flags.into_iter().collect();
    task.add_compiler_flags(flags.as_slice());
    if let Some(encoding) = &config.encoding {
        task.set_encoding(encoding.clone());
    }
}

pub fn apply_static_analysis(task: &mut Task, config: &StaticAnalysisConfig) {
    task.add_compiler_flags(config.flags.as_slice());
}

pub fn apply_documentation(task: &mut Task, config: &DocPolicyConfig) {
    task.set_doc_options(&config.options);
}

pub fn apply_resolution_rules(rules: &mut ResolutionRules, config: &ResolutionPolicyConfig) {
    rules.append_resolution_rule(&config.rule_set, config.optional_rule.as_deref());
}

/// The configured set of policies for one build invocation.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    config: PolicyConfig,
}

impl PolicySet {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Policies that will be registered, in registration order. The publish
    /// gate is always present.
    pub fn enabled_policies(&self) -> Vec<Policy> {
        let c = &self.config;
        let mut policies = Vec::new();
        if c.compiler.enabled {
            policies.push(Policy::CompilerDiagnostics);
        }
        if c.static_analysis.enabled {
            policies.push(Policy::StaticAnalysis);
        }
        if c.docs.enabled {
            policies.push(Policy::Documentation);
        }
        if c.resolution.enabled {
            policies.push(Policy::ResolutionRules);
        }
        policies.push(Policy::PublishGate);
        policies
    }

    /// Register every enabled policy with `registry`.
    ///
    /// The publish gate action keeps its own copy of `snapshot` and decides
    /// on it only when the deferred phase runs.
    pub fn install(&self, registry: &mut DeferredRegistry, snapshot: &EnvSnapshot) -> Result<()> {
        for policy in self.enabled_policies() {
            let label = policy.name();
            match policy {
                Policy::CompilerDiagnostics => {
                    let cfg = self.config.compiler.clone();
                    registry.on_stabilized(
                        label,
                        TaskSelector::by_kind(TaskKind::Compile),
                        move |task| {
                            apply_compiler_diagnostics(task, &cfg);
                            Ok(())
                        },
                    )?;
                }
                Policy::StaticAnalysis => {
                    let cfg = self.config.static_analysis.clone();
                    registry.on_stabilized(
                        label,
                        TaskSelector::by_kind(TaskKind::Compile),
                        move |task| {
                            apply_static_analysis(task, &cfg);
                            Ok(())
                        },
                    )?;
                }
                Policy::Documentation => {
                    let cfg = self.config.docs.clone();
                    registry.on_stabilized(
                        label,
                        TaskSelector::by_kind(TaskKind::Documentation),
                        move |task| {
                            apply_documentation(task, &cfg);
                            Ok(())
                        },
                    )?;
                }
                Policy::ResolutionRules => {
                    let cfg = self.config.resolution.clone();
                    registry.defer(label, move |build: &mut Build| {
                        apply_resolution_rules(&mut build.resolution, &cfg);
                        Ok(())
                    });
                }
                Policy::PublishGate => {
                    let mut gate = PublishGate::new(self.config.publish.clone());
                    let snapshot = snapshot.clone();
                    registry.defer(label, move |build: &mut Build| {
                        let channel = decide(&snapshot);
                        obs::emit_channel_decided(&snapshot, channel);
                        build.publish = gate.apply(channel, &mut build.tasks)?;
                        Ok(())
                    });
                }
            }
            obs::emit_policy_installed(label);
        }
        Ok(())
    }

    /// Run both phases against `build` and describe the result.
    ///
    /// Tasks must already be registered; the graph is frozen afterwards.
    pub fn configure(&self, build: &mut Build, snapshot: &EnvSnapshot) -> Result<ConfigurationReport> {
        let invocation_id = Uuid::new_v4();
        let _span = obs::InvocationSpan::enter(&invocation_id.to_string());

        let mut registry = DeferredRegistry::new();
        self.install(&mut registry, snapshot)?;
        let summary = registry.finalize(build)?;

        Ok(ConfigurationReport::new(invocation_id, build, summary))
    }
}
