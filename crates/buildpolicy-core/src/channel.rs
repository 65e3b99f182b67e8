//! Publish channel decision.
//!
//! Maps an [`EnvSnapshot`] to at most one active distribution [`Channel`].
//! Ambiguous or missing signals always resolve to [`Channel::None`].

use crate::env::{EnvSnapshot, PullRequestFlag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch whose non-PR builds publish snapshots.
pub const SNAPSHOT_BRANCH: &str = "master";

/// Distribution channel selected for a build invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    None,
    TaggedRelease,
    ContinuousSnapshot,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::None => "NONE",
            Channel::TaggedRelease => "TAGGED_RELEASE",
            Channel::ContinuousSnapshot => "CONTINUOUS_SNAPSHOT",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide which channel is active. First match wins:
///
/// 1. non-empty release tag → [`Channel::TaggedRelease`]
/// 2. branch `master` and pull-request flag exactly `false` →
///    [`Channel::ContinuousSnapshot`]
/// 3. otherwise → [`Channel::None`]
pub fn decide(snapshot: &EnvSnapshot) -> Channel {
    if snapshot.release_tag().is_some_and(|tag| !tag.is_empty()) {
        return Channel::TaggedRelease;
    }

    if snapshot.branch_name() == Some(SNAPSHOT_BRANCH)
        && snapshot.is_pull_request() == PullRequestFlag::No
    {
        return Channel::ContinuousSnapshot;
    }

    Channel::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_wins_over_branch() {
        let s = EnvSnapshot::from_raw(Some("1.0.0"), Some("master"), Some("false"));
        assert_eq!(decide(&s), Channel::TaggedRelease);
    }

    #[test]
    fn test_empty_tag_is_ignored() {
        let s = EnvSnapshot::from_raw(Some(""), Some("master"), Some("false"));
        assert_eq!(decide(&s), Channel::ContinuousSnapshot);
    }

    #[test]
    fn test_unknown_pr_flag_is_conservative() {
        let s = EnvSnapshot::from_raw(None, Some("master"), None);
        assert_eq!(decide(&s), Channel::None);

        let s = EnvSnapshot::from_raw(None, Some("master"), Some("yes"));
        assert_eq!(decide(&s), Channel::None);
    }

    #[test]
    fn test_pull_request_on_master_is_none() {
        let s = EnvSnapshot::from_raw(None, Some("master"), Some("true"));
        assert_eq!(decide(&s), Channel::None);
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::TaggedRelease.to_string(), "TAGGED_RELEASE");
        assert_eq!(
            serde_json::to_string(&Channel::ContinuousSnapshot).unwrap(),
            "\"CONTINUOUS_SNAPSHOT\""
        );
    }
}
