//! Task graph arena with subscribe-on-add observers.
//!
//! Tasks live in an arena indexed by name. Observers installed with
//! [`TaskGraph::subscribe`] are applied to every current match and to each
//! matching task added later, exactly once per task, until the graph is
//! frozen.

use crate::error::{PolicyError, Result};
use crate::task::{Task, TaskKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Index of a task in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

/// Query over the task graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum TaskSelector {
    Kind(TaskKind),
    Name(String),
}

impl TaskSelector {
    pub fn by_kind(kind: TaskKind) -> Self {
        TaskSelector::Kind(kind)
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        TaskSelector::Name(name.into())
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskSelector::Kind(kind) => task.kind() == kind,
            TaskSelector::Name(name) => task.name() == name,
        }
    }

    /// Reject selectors that can never match anything meaningful.
    pub fn validate(&self) -> Result<()> {
        match self {
            TaskSelector::Name(name) if name.trim().is_empty() => {
                Err(PolicyError::InvalidSelector {
                    reason: "task name must not be empty".to_string(),
                })
            }
            TaskSelector::Kind(TaskKind::Custom(kind)) if kind.trim().is_empty() => {
                Err(PolicyError::InvalidSelector {
                    reason: "custom task kind must not be empty".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TaskSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSelector::Kind(kind) => write!(f, "kind={}", kind),
            TaskSelector::Name(name) => write!(f, "name={}", name),
        }
    }
}

/// Lifecycle of the graph within one build invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GraphPhase {
    /// Immediate phase: tasks are being registered.
    Configuring,
    /// Deferred actions are running.
    Stabilizing,
    Finalized,
    Failed,
}

impl GraphPhase {
    pub fn is_frozen(&self) -> bool {
        matches!(self, GraphPhase::Finalized | GraphPhase::Failed)
    }
}

/// Per-task mutation callback.
pub type TaskCallback = Box<dyn FnMut(&mut Task) -> Result<()>>;

struct Observer {
    label: String,
    selector: TaskSelector,
    callback: TaskCallback,
    applied: HashSet<TaskId>,
}

impl Observer {
    fn apply(&mut self, id: TaskId, task: &mut Task) -> Result<bool> {
        if !self.selector.matches(task) || !self.applied.insert(id) {
            return Ok(false);
        }
        (self.callback)(task).map_err(|e| PolicyError::DeferredActionFailed {
            action: self.label.clone(),
            target: task.name().to_string(),
            source: Box::new(e),
        })?;
        tracing::debug!(
            event = "deferred.applied",
            action = %self.label,
            task = %task.name(),
        );
        Ok(true)
    }
}

/// Arena of tasks plus a name index.
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<String, TaskId>,
    observers: Vec<Observer>,
    phase: GraphPhase,
    applications: usize,
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.tasks)
            .field("observers", &self.observers.len())
            .field("phase", &self.phase)
            .finish()
    }
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            index: HashMap::new(),
            observers: Vec::new(),
            phase: GraphPhase::Configuring,
            applications: 0,
        }
    }

    pub fn phase(&self) -> GraphPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Total observer invocations so far.
    pub fn applications(&self) -> usize {
        self.applications
    }

    /// Register a task and run every installed observer that matches it.
    pub fn add_task(&mut self, task: Task) -> Result<TaskId> {
        if self.phase.is_frozen() {
            return Err(PolicyError::GraphFrozen {
                name: task.name().to_string(),
            });
        }
        if self.index.contains_key(task.name()) {
            return Err(PolicyError::DuplicateTask {
                name: task.name().to_string(),
            });
        }

        let id = TaskId(self.tasks.len());
        self.index.insert(task.name().to_string(), id);
        self.tasks.push(task);

        let task = &mut self.tasks[id.0];
        for observer in self.observers.iter_mut() {
            if observer.apply(id, task)? {
                self.applications += 1;
            }
        }
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Result<TaskId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| PolicyError::TaskNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look up a single task by exact name.
    pub fn select_by_name(&self, name: &str) -> Result<&Task> {
        let id = self.id_of(name)?;
        Ok(&self.tasks[id.0])
    }

    pub fn select_by_name_mut(&mut self, name: &str) -> Result<&mut Task> {
        let id = self.id_of(name)?;
        Ok(&mut self.tasks[id.0])
    }

    /// Current members of a kind. Later additions are only seen by
    /// observers.
    pub fn select_by_kind(&self, kind: &TaskKind) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.kind() == kind).collect()
    }

    /// Install an observer and apply it to every current match.
    ///
    /// Returns the number of tasks the callback ran on.
    pub(crate) fn subscribe(
        &mut self,
        label: impl Into<String>,
        selector: TaskSelector,
        callback: TaskCallback,
    ) -> Result<usize> {
        selector.validate()?;

        let mut observer = Observer {
            label: label.into(),
            selector,
            callback,
            applied: HashSet::new(),
        };

        let mut count = 0;
        for (i, task) in self.tasks.iter_mut().enumerate() {
            if observer.apply(TaskId(i), task)? {
                count += 1;
            }
        }
        self.applications += count;
        self.observers.push(observer);
        Ok(count)
    }

    pub(crate) fn begin_stabilizing(&mut self) {
        self.phase = GraphPhase::Stabilizing;
    }

    /// Stop accepting tasks and release every observer.
    pub(crate) fn freeze(&mut self) {
        self.observers.clear();
        self.phase = GraphPhase::Finalized;
    }

    pub(crate) fn fail(&mut self) {
        self.observers.clear();
        self.phase = GraphPhase::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting(counter: &Rc<RefCell<Vec<String>>>) -> TaskCallback {
        let counter = Rc::clone(counter);
        Box::new(move |task: &mut Task| {
            counter.borrow_mut().push(task.name().to_string());
            Ok(())
        })
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::new("compileJava", TaskKind::Compile)).unwrap();
        let err = graph
            .add_task(Task::new("compileJava", TaskKind::Compile))
            .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateTask { name } if name == "compileJava"));
    }

    #[test]
    fn test_select_by_name_missing() {
        let graph = TaskGraph::new();
        let err = graph.select_by_name("targetA").unwrap_err();
        assert!(err.to_string().contains("targetA"));
    }

    #[test]
    fn test_select_by_kind() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::new("compileJava", TaskKind::Compile)).unwrap();
        graph.add_task(Task::new("javadoc", TaskKind::Documentation)).unwrap();
        graph.add_task(Task::new("compileTestJava", TaskKind::Compile)).unwrap();

        let names: Vec<&str> = graph
            .select_by_kind(&TaskKind::Compile)
            .iter()
            .map(|t| t.name())
            .collect();
        assert_eq!(names, vec!["compileJava", "compileTestJava"]);
    }

    #[test]
    fn test_observer_sees_existing_and_later_tasks_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut graph = TaskGraph::new();
        graph.add_task(Task::new("compileJava", TaskKind::Compile)).unwrap();

        let applied = graph
            .subscribe("count", TaskSelector::by_kind(TaskKind::Compile), counting(&seen))
            .unwrap();
        assert_eq!(applied, 1);

        graph.add_task(Task::new("javadoc", TaskKind::Documentation)).unwrap();
        graph.add_task(Task::new("compileTestJava", TaskKind::Compile)).unwrap();

        assert_eq!(*seen.borrow(), vec!["compileJava", "compileTestJava"]);
        assert_eq!(graph.applications(), 2);
    }

    #[test]
    fn test_empty_name_selector_rejected() {
        let mut graph = TaskGraph::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let err = graph
            .subscribe("bad", TaskSelector::by_name(""), counting(&seen))
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidSelector { .. }));
    }

    #[test]
    fn test_frozen_graph_rejects_tasks() {
        let mut graph = TaskGraph::new();
        graph.freeze();
        let err = graph
            .add_task(Task::new("late", TaskKind::Lifecycle))
            .unwrap_err();
        assert!(matches!(err, PolicyError::GraphFrozen { name } if name == "late"));
    }
}
