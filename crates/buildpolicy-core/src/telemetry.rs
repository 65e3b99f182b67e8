//! Tracing subscriber setup for the `buildpolicy` binary.
//!
//! Log lines go to stderr so that reports printed on stdout stay
//! machine-readable. Only the first installation in a process succeeds.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events are shown at the requested level when `RUST_LOG` is
/// unset. Everything else is limited to warnings.
const OWN_TARGETS: &[&str] = &["buildpolicy_core", "buildpolicy"];

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(level: Level) -> String {
    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{}={}", target, level.as_str().to_lowercase()));
    }
    directive
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn try_init_tracing(json: bool, level: Level) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    installed.is_ok()
}

/// Install the global subscriber, keeping an existing one if present.
///
/// `RUST_LOG` takes precedence over `level`. With `json`, each line is a
/// JSON object.
pub fn init_tracing(json: bool, level: Level) {
    if !try_init_tracing(json, level) {
        tracing::debug!(event = "telemetry.already_installed");
    }
}
