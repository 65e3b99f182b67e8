//! Task definitions and the mutation interface exposed to policies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a task, used by kind selectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Source compilation.
    Compile,
    /// API documentation generation.
    Documentation,
    /// Artifact upload to a distribution channel.
    Upload,
    /// Tags the release in version control.
    ReleaseTag,
    /// Aggregates other tasks without doing work of its own.
    Lifecycle,
    Custom(String),
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Compile => f.write_str("compile"),
            TaskKind::Documentation => f.write_str("documentation"),
            TaskKind::Upload => f.write_str("upload"),
            TaskKind::ReleaseTag => f.write_str("release_tag"),
            TaskKind::Lifecycle => f.write_str("lifecycle"),
            TaskKind::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// Lowest member visibility included in generated documentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

/// Documentation-generator options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocOptions {
    pub visibility: Option<Visibility>,
    /// Warning classes the generator should not report.
    pub suppressed_warnings: Vec<String>,
    /// External API reference links.
    pub links: Vec<String>,
}

impl DocOptions {
    /// Merge `other` into `self`. Scalar fields are overwritten when set;
    /// list fields are deduplicated by value.
    pub fn merge(&mut self, other: &DocOptions) {
        if other.visibility.is_some() {
            self.visibility = other.visibility;
        }
        push_unique(&mut self.suppressed_warnings, &other.suppressed_warnings);
        push_unique(&mut self.links, &other.links);
    }
}

/// Declared options of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskOptions {
    pub compiler_args: Vec<String>,
    pub encoding: Option<String>,
    pub doc: DocOptions,
}

/// A named unit of build work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    name: String,
    kind: TaskKind,
    group: Option<String>,
    enabled: bool,
    depends_on: Vec<String>,
    options: TaskOptions,
}

impl Task {
    pub fn new(name: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            kind,
            group: None,
            enabled: true,
            depends_on: Vec::new(),
            options: TaskOptions::default(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.add_dependency(name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    /// Append compiler flags, skipping any already present.
    pub fn add_compiler_flags<S: AsRef<str>>(&mut self, flags: &[S]) {
        for flag in flags {
            let flag = flag.as_ref();
            if !self.options.compiler_args.iter().any(|f| f == flag) {
                self.options.compiler_args.push(flag.to_string());
            }
        }
    }

    pub fn set_encoding(&mut self, encoding: impl Into<String>) {
        self.options.encoding = Some(encoding.into());
    }

    pub fn set_doc_options(&mut self, options: &DocOptions) {
        self.options.doc.merge(options);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn add_dependency(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.depends_on.contains(&name) {
            self.depends_on.push(name);
        }
    }
}

fn push_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("compileJava", TaskKind::Compile);
        assert_eq!(task.name(), "compileJava");
        assert!(task.is_enabled());
        assert!(task.depends_on().is_empty());
        assert!(task.options().compiler_args.is_empty());
    }

    #[test]
    fn test_compiler_flags_dedupe_by_value() {
        let mut task = Task::new("compileJava", TaskKind::Compile);
        task.add_compiler_flags(&["-Xlint:cast", "-Xlint:cast", "-Xlint:rawtypes"]);
        task.add_compiler_flags(&["-Xlint:rawtypes"]);
        assert_eq!(
            task.options().compiler_args,
            vec!["-Xlint:cast".to_string(), "-Xlint:rawtypes".to_string()]
        );
    }

    #[test]
    fn test_doc_options_merge() {
        let mut task = Task::new("javadoc", TaskKind::Documentation);
        let opts = DocOptions {
            visibility: Some(Visibility::Protected),
            suppressed_warnings: vec!["missing".to_string()],
            links: vec!["https://example.org/api/".to_string()],
        };
        task.set_doc_options(&opts);
        task.set_doc_options(&opts);
        assert_eq!(task.options().doc, opts);

        task.set_doc_options(&DocOptions::default());
        assert_eq!(task.options().doc.visibility, Some(Visibility::Protected));
    }

    #[test]
    fn test_dependencies_are_unique() {
        let task = Task::new("publish", TaskKind::Lifecycle)
            .with_dependency("release")
            .with_dependency("release");
        assert_eq!(task.depends_on(), &["release".to_string()]);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TaskKind::Compile.to_string(), "compile");
        assert_eq!(TaskKind::Custom("lint".to_string()).to_string(), "custom:lint");
    }
}
