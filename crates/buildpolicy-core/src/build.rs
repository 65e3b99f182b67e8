//! Build model: the task graph plus build-wide configuration structs, and the
//! JSON manifest it is loaded from.

use crate::error::Result;
use crate::graph::TaskGraph;
use crate::publish_gate::GateState;
use crate::resolution::ResolutionRules;
use crate::task::{Task, TaskKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One task declaration in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDecl {
    pub name: String,
    pub kind: TaskKind,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl TaskDecl {
    pub fn into_task(self) -> Task {
        let mut task = Task::new(self.name, self.kind);
        if let Some(group) = self.group {
            task = task.with_group(group);
        }
        for dep in self.depends_on {
            task.add_dependency(dep);
        }
        task
    }
}

/// Declarative list of tasks known before policies are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildManifest {
    #[serde(default)]
    pub tasks: Vec<TaskDecl>,
}

impl BuildManifest {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// Everything the deferred phase may mutate.
#[derive(Debug, Default)]
pub struct Build {
    pub tasks: TaskGraph,
    pub resolution: ResolutionRules,
    /// Set by the publish gate during the deferred phase.
    pub publish: GateState,
}

impl Build {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every task of the manifest in declaration order.
    pub fn from_manifest(manifest: BuildManifest) -> Result<Self> {
        let mut build = Self::new();
        for decl in manifest.tasks {
            build.tasks.add_task(decl.into_task())?;
        }
        Ok(build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyError;
    use std::io::Write;

    const MANIFEST: &str = r#"{
        "tasks": [
            { "name": "compileJava", "kind": "compile" },
            { "name": "javadoc", "kind": "documentation", "depends_on": ["compileJava"] },
            { "name": "spotless", "kind": { "custom": "format" }, "group": "verification" }
        ]
    }"#;

    #[test]
    fn test_manifest_parse() {
        let manifest = BuildManifest::from_json(MANIFEST).expect("parse failed");
        assert_eq!(manifest.tasks.len(), 3);
        assert_eq!(manifest.tasks[2].kind, TaskKind::Custom("format".to_string()));
    }

    #[test]
    fn test_build_from_manifest() {
        let manifest = BuildManifest::from_json(MANIFEST).unwrap();
        let build = Build::from_manifest(manifest).expect("build failed");
        assert_eq!(build.tasks.len(), 3);
        let javadoc = build.tasks.select_by_name("javadoc").unwrap();
        assert_eq!(javadoc.depends_on(), &["compileJava".to_string()]);
        assert_eq!(
            build.tasks.select_by_name("spotless").unwrap().group(),
            Some("verification")
        );
    }

    #[test]
    fn test_manifest_duplicate_task_fails() {
        let manifest = BuildManifest::from_json(
            r#"{ "tasks": [ { "name": "a", "kind": "compile" }, { "name": "a", "kind": "upload" } ] }"#,
        )
        .unwrap();
        let err = Build::from_manifest(manifest).unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateTask { .. }));
    }

    #[test]
    fn test_manifest_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let manifest = BuildManifest::load(file.path()).expect("load failed");
        assert_eq!(manifest.tasks[0].name, "compileJava");
    }

    #[test]
    fn test_manifest_malformed_json() {
        let err = BuildManifest::from_json("{ not json").unwrap_err();
        assert!(matches!(err, PolicyError::Serialization(_)));
    }
}
