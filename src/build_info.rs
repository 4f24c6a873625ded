//! Build metadata
//!
//! `build.rs` exports a local build counter and a UTC timestamp; both are
//! optional so a build without the script still reports a version.

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_number: Option<u64>,
    pub build_timestamp: Option<&'static str>,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self::from_env_values(
            option_env!("PREDICARE_BUILD_NUMBER"),
            option_env!("PREDICARE_BUILD_TIMESTAMP"),
        )
    }

    fn from_env_values(number: Option<&'static str>, timestamp: Option<&'static str>) -> Self {
        Self {
            version: VERSION,
            build_number: number.and_then(|n| n.trim().parse().ok()),
            build_timestamp: timestamp.map(str::trim).filter(|t| !t.is_empty()),
        }
    }

    /// "0.1.0 (build 42, 2025-10-23T09:00:00Z)", shortened when metadata is missing
    pub fn label(&self) -> String {
        match (self.build_number, self.build_timestamp) {
            (Some(n), Some(ts)) => format!("{} (build {}, {})", self.version, n, ts),
            (Some(n), None) => format!("{} (build {})", self.version, n),
            (None, Some(ts)) => format!("{} ({})", self.version, ts),
            (None, None) => self.version.to_string(),
        }
    }
}

/// Startup banner on stderr; stdout carries the MCP stream
pub fn print_startup_banner() {
    eprintln!("PrediCare {} - walking & carb-aware weight care", BuildInfo::current().label());
}
