use std::fmt;

use serde::Serialize;

/// Compile-time facts about this build, captured by `build.rs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub package_version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub build_target: &'static str,
    pub rust_version: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("REPO_VERSION"),
        package_version: env!("CARGO_PKG_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        build_target: env!("BUILD_TARGET"),
        rust_version: env!("RUST_VERSION"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version: {} ({})", self.package_version, self.version)?;
        writeln!(f, "profile: {}", self.build_profile)?;
        writeln!(f, "features: {}", self.build_features)?;
        writeln!(f, "built: {}", self.build_timestamp)?;
        writeln!(f, "target: {}", self.build_target)?;
        write!(f, "rustc: {}", self.rust_version)
    }
}
