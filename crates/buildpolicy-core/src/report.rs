//! Configuration report produced after the deferred phase.

use crate::build::Build;
use crate::channel::Channel;
use crate::deferred::FinalizeSummary;
use crate::publish_gate::GateState;
use crate::resolution::ResolutionRules;
use crate::task::{Task, TaskKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Resolved configuration of one build invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationReport {
    pub invocation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    /// `None` only if the publish gate never ran.
    pub channel: Option<Channel>,
    pub gate_state: GateState,
    pub summary: FinalizeSummary,
    pub tasks: Vec<Task>,
    pub resolution: ResolutionRules,
    /// SHA-256 over the resolved tasks and resolution rules.
    pub config_digest: String,
}

impl ConfigurationReport {
    pub fn new(invocation_id: Uuid, build: &Build, summary: FinalizeSummary) -> Self {
        let tasks: Vec<Task> = build.tasks.tasks().cloned().collect();
        let config_digest = compute_config_digest(&tasks, &build.resolution);
        Self {
            invocation_id,
            evaluated_at: Utc::now(),
            channel: build.publish.channel(),
            gate_state: build.publish,
            summary,
            tasks,
            resolution: build.resolution.clone(),
            config_digest,
        }
    }

    /// Names of the enabled upload tasks.
    pub fn enabled_uploads(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| t.kind() == &TaskKind::Upload && t.is_enabled())
            .map(|t| t.name())
            .collect()
    }
}

/// Deterministic digest of the resolved configuration. Independent of the
/// invocation id and timestamp.
pub fn compute_config_digest(tasks: &[Task], resolution: &ResolutionRules) -> String {
    let mut hasher = Sha256::new();
    for task in tasks {
        hash_task(&mut hasher, task);
    }
    hash_list(&mut hasher, "rule_set", &resolution.dependencies);
    hash_list(&mut hasher, "optional_rule", &resolution.optional);
    hex::encode(hasher.finalize())
}

fn hash_task(hasher: &mut Sha256, task: &Task) {
    let options = task.options();
    hash_field(hasher, "task", task.name());
    hash_field(hasher, "kind", &task.kind().to_string());
    hash_field(hasher, "group", task.group().unwrap_or(""));
    hash_field(hasher, "enabled", if task.is_enabled() { "1" } else { "0" });
    hash_list(hasher, "depends_on", task.depends_on());
    hash_list(hasher, "compiler_arg", &options.compiler_args);
    hash_field(hasher, "encoding", options.encoding.as_deref().unwrap_or(""));
    let visibility = options
        .doc
        .visibility
        .map(|v| format!("{:?}", v))
        .unwrap_or_default();
    hash_field(hasher, "visibility", &visibility);
    hash_list(hasher, "suppressed", &options.doc.suppressed_warnings);
    hash_list(hasher, "link", &options.doc.links);
}

fn hash_list(hasher: &mut Sha256, label: &str, values: &[String]) {
    for value in values {
        hash_field(hasher, label, value);
    }
}

fn hash_field(hasher: &mut Sha256, label: &str, value: &str) {
    hasher.update(label.as_bytes());
    hasher.update(b"=");
    hasher.update(value.as_bytes());
    hasher.update(b"\0");
}
