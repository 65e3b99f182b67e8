use buildpolicy_core::{decide, Channel, EnvSnapshot};

fn snapshot(tag: Option<&str>, branch: Option<&str>, pr: Option<&str>) -> EnvSnapshot {
    EnvSnapshot::from_raw(tag, branch, pr)
}

const BRANCHES: &[Option<&str>] = &[
    None,
    Some(""),
    Some("master"),
    Some("main"),
    Some("feature/x"),
    Some("release/1.2"),
];
const PR_FLAGS: &[Option<&str>] = &[None, Some("true"), Some("false"), Some("maybe"), Some("")];

// ---- TaggedRelease ----

#[test]
fn non_empty_tag_always_releases() {
    for branch in BRANCHES {
        for pr in PR_FLAGS {
            let s = snapshot(Some("1.2.0"), *branch, *pr);
            assert_eq!(decide(&s), Channel::TaggedRelease, "branch={branch:?} pr={pr:?}");
        }
    }
}

// ---- ContinuousSnapshot ----

#[test]
fn master_without_pr_publishes_snapshot() {
    for tag in [None, Some("")] {
        let s = snapshot(tag, Some("master"), Some("false"));
        assert_eq!(decide(&s), Channel::ContinuousSnapshot);
    }
}

// ---- None ----

#[test]
fn everything_else_is_none() {
    for tag in [None, Some("")] {
        for branch in BRANCHES {
            for pr in PR_FLAGS {
                if *branch == Some("master") && *pr == Some("false") {
                    continue;
                }
                let s = snapshot(tag, *branch, *pr);
                assert_eq!(decide(&s), Channel::None, "branch={branch:?} pr={pr:?}");
            }
        }
    }
}

#[test]
fn branch_match_is_exact() {
    let s = snapshot(None, Some("Master"), Some("false"));
    assert_eq!(decide(&s), Channel::None);

    let s = snapshot(None, Some("master "), Some("false"));
    assert_eq!(decide(&s), Channel::None);
}

#[test]
fn decision_is_repeatable() {
    let s = snapshot(None, Some("master"), Some("false"));
    assert_eq!(decide(&s), decide(&s));
}
