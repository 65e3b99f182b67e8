//! Deferred action registry.
//!
//! Actions are recorded during the immediate phase and run once by
//! [`DeferredRegistry::finalize`], after every task has been registered.
//! Finalizing consumes the registry, so nothing can be registered late.

use crate::build::Build;
use crate::error::{PolicyError, Result};
use crate::graph::{TaskCallback, TaskSelector};
use crate::obs;
use crate::task::Task;
use serde::Serialize;

/// Build-level action; may add tasks to the graph.
pub type BuildAction = Box<dyn FnOnce(&mut Build) -> Result<()>>;

struct TaskAction {
    label: String,
    selector: TaskSelector,
    callback: TaskCallback,
}

struct PendingBuildAction {
    label: String,
    action: BuildAction,
}

/// Outcome of a successful deferred phase.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FinalizeSummary {
    /// Registered actions that ran.
    pub actions: usize,
    /// Per-task callback invocations.
    pub applications: usize,
    /// Tasks in the graph once frozen.
    pub tasks: usize,
}

/// Pending configuration actions for one build invocation.
#[derive(Default)]
pub struct DeferredRegistry {
    task_actions: Vec<TaskAction>,
    build_actions: Vec<PendingBuildAction>,
}

impl DeferredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` on every task matching `selector` once the graph is
    /// stable, including tasks added while the deferred phase runs.
    ///
    /// The selector is validated immediately.
    pub fn on_stabilized<F>(
        &mut self,
        label: impl Into<String>,
        selector: TaskSelector,
        callback: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Task) -> Result<()> + 'static,
    {
        selector.validate()?;
        self.task_actions.push(TaskAction {
            label: label.into(),
            selector,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Run `action` against the whole build during the deferred phase.
    pub fn defer<F>(&mut self, label: impl Into<String>, action: F)
    where
        F: FnOnce(&mut Build) -> Result<()> + 'static,
    {
        self.build_actions.push(PendingBuildAction {
            label: label.into(),
            action: Box::new(action),
        });
    }

    pub fn len(&self) -> usize {
        self.task_actions.len() + self.build_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the deferred phase.
    ///
    /// Per-task actions are installed first so that tasks created by
    /// build-level actions still receive them. The first failure aborts the
    /// phase and leaves the graph in the failed state.
    pub fn finalize(self, build: &mut Build) -> Result<FinalizeSummary> {
        let phase = build.tasks.phase();
        if phase.is_frozen() {
            return Err(PolicyError::PhaseAlreadyRun {
                phase: format!("{:?}", phase),
            });
        }

        let actions = self.len();
        obs::emit_phase_started(actions, build.tasks.len());
        build.tasks.begin_stabilizing();

        match self.run(build) {
            Ok(()) => {
                build.tasks.freeze();
                let summary = FinalizeSummary {
                    actions,
                    applications: build.tasks.applications(),
                    tasks: build.tasks.len(),
                };
                obs::emit_phase_finished(&summary);
                Ok(summary)
            }
            Err(e) => {
                build.tasks.fail();
                obs::emit_phase_failed(&e);
                Err(e)
            }
        }
    }

    fn run(self, build: &mut Build) -> Result<()> {
        for action in self.task_actions {
            let applied = build
                .tasks
                .subscribe(action.label.clone(), action.selector.clone(), action.callback)?;
            tracing::debug!(
                event = "deferred.installed",
                action = %action.label,
                selector = %action.selector,
                applied = applied,
            );
        }

        for pending in self.build_actions {
            let label = pending.label;
            (pending.action)(build).map_err(|e| match e {
                PolicyError::DeferredActionFailed { .. } => e,
                other => PolicyError::DeferredActionFailed {
                    action: label.clone(),
                    target: "build".to_string(),
                    source: Box::new(other),
                },
            })?;
            tracing::debug!(event = "deferred.build_action", action = %label);
        }

        Ok(())
    }
}
