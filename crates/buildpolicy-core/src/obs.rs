//! Structured log events for one configuration cycle.
//!
//! Every event carries an `event` field (`channel.decided`, `gate.applied`,
//! `deferred.*`) so log pipelines can filter on it.

use crate::channel::Channel;
use crate::deferred::FinalizeSummary;
use crate::env::EnvSnapshot;
use crate::publish_gate::GateState;
use tracing::{info, warn};

/// RAII guard entering a span tagged with the build invocation id.
pub struct InvocationSpan {
    _span: tracing::span::EnteredSpan,
}

impl InvocationSpan {
    pub fn enter(invocation_id: &str) -> Self {
        let span = tracing::info_span!("buildpolicy.invocation", invocation_id = %invocation_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_policy_installed(policy: &str) {
    tracing::debug!(event = "policy.installed", policy = %policy);
}

pub fn emit_channel_decided(snapshot: &EnvSnapshot, channel: Channel) {
    info!(
        event = "channel.decided",
        release_tag = snapshot.release_tag().unwrap_or(""),
        branch = snapshot.branch_name().unwrap_or(""),
        pull_request = snapshot.is_pull_request().as_str(),
        channel = %channel,
    );
}

pub fn emit_gate_applied(state: GateState, release_target: &str, snapshot_target: &str) {
    info!(
        event = "gate.applied",
        state = %state,
        release_target = %release_target,
        snapshot_target = %snapshot_target,
    );
}

pub fn emit_phase_started(actions: usize, tasks: usize) {
    info!(event = "deferred.started", actions = actions, tasks = tasks);
}

pub fn emit_phase_finished(summary: &FinalizeSummary) {
    info!(
        event = "deferred.finished",
        actions = summary.actions,
        applications = summary.applications,
        tasks = summary.tasks,
    );
}

pub fn emit_phase_failed(error: &dyn std::fmt::Display) {
    warn!(event = "deferred.failed", error = %error);
}
