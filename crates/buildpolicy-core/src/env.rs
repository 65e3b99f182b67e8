//! Environment snapshot read once per policy evaluation.

use serde::{Deserialize, Serialize};

/// Names of the environment variables carrying the CI signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SignalNames {
    pub release_tag: String,
    pub branch_name: String,
    pub is_pull_request: String,
}

impl Default for SignalNames {
    fn default() -> Self {
        Self {
            release_tag: "RELEASE_TAG".to_string(),
            branch_name: "TARGET_BRANCH".to_string(),
            is_pull_request: "IS_PULL_REQUEST".to_string(),
        }
    }
}

/// Tri-state pull-request signal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestFlag {
    Yes,
    No,
    #[default]
    Unknown,
}

impl PullRequestFlag {
    /// Only the literal strings `"true"` and `"false"` are recognised.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("true") => PullRequestFlag::Yes,
            Some("false") => PullRequestFlag::No,
            _ => PullRequestFlag::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestFlag::Yes => "true",
            PullRequestFlag::No => "false",
            PullRequestFlag::Unknown => "unknown",
        }
    }
}

/// Immutable view of the three CI signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvSnapshot {
    release_tag: Option<String>,
    branch_name: Option<String>,
    is_pull_request: PullRequestFlag,
}

impl EnvSnapshot {
    pub fn new(
        release_tag: Option<String>,
        branch_name: Option<String>,
        is_pull_request: PullRequestFlag,
    ) -> Self {
        Self {
            release_tag,
            branch_name,
            is_pull_request,
        }
    }

    /// Build a snapshot from raw signal values as they would appear in the
    /// environment.
    pub fn from_raw(
        release_tag: Option<&str>,
        branch_name: Option<&str>,
        is_pull_request: Option<&str>,
    ) -> Self {
        Self::new(
            release_tag.map(str::to_string),
            branch_name.map(str::to_string),
            PullRequestFlag::parse(is_pull_request),
        )
    }

    /// Build a snapshot using an arbitrary variable lookup.
    pub fn from_lookup<F>(names: &SignalNames, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let release_tag = lookup(&names.release_tag);
        let branch_name = lookup(&names.branch_name);
        let is_pull_request = PullRequestFlag::parse(lookup(&names.is_pull_request).as_deref());
        Self::new(release_tag, branch_name, is_pull_request)
    }

    /// Read the signals from the process environment.
    pub fn from_env(names: &SignalNames) -> Self {
        Self::from_lookup(names, |key| std::env::var(key).ok())
    }

    pub fn release_tag(&self) -> Option<&str> {
        self.release_tag.as_deref()
    }

    pub fn branch_name(&self) -> Option<&str> {
        self.branch_name.as_deref()
    }

    pub fn is_pull_request(&self) -> PullRequestFlag {
        self.is_pull_request
    }
}
