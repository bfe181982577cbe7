//! Build identification captured by `build.rs`

pub const GIT_HASH: &str = env!("PATCHLOG_GIT_HASH");
pub const BUILD_TIMESTAMP: &str = env!("PATCHLOG_BUILD_TIMESTAMP");
pub const BUILD_PROFILE: &str = env!("PATCHLOG_BUILD_PROFILE");

/// Startup identification line, logged right after tracing init
///
/// `version` is the calling binary's `CARGO_PKG_VERSION`.
pub fn banner(binary: &str, version: &str) -> String {
    format!(
        "{} v{} [{}] built {} ({})",
        binary, version, GIT_HASH, BUILD_TIMESTAMP, BUILD_PROFILE
    )
}
