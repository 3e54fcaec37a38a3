//! Run configuration.

use std::path::PathBuf;

/// Platform hosts file location.
#[cfg(windows)]
pub const DEFAULT_HOST_FILE: &str = r"C:\Windows\System32\drivers\etc\hosts";

/// Platform hosts file location.
#[cfg(not(windows))]
pub const DEFAULT_HOST_FILE: &str = "/etc/hosts";

/// Settings for one run of the tool, built once at startup.
///
/// # Example
///
/// ```
/// use k8s_ingress_hosts::SyncConfig;
///
/// let config = SyncConfig::new("/tmp/hosts", "/tmp/kubeconfig")
///     .with_write(true)
///     .with_watch(true);
///
/// assert!(config.write);
/// assert!(config.watch);
/// assert_eq!(config.context, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Hosts file holding the managed block.
    pub host_file: PathBuf,

    /// Kubeconfig used to reach the cluster.
    pub kubeconfig: PathBuf,

    /// Kubeconfig context; `None` uses the current context.
    pub context: Option<String>,

    /// Commit the block to `host_file`. When `false` the block is only
    /// printed.
    pub write: bool,

    /// Stay resident and follow ingress changes after the first snapshot.
    pub watch: bool,
}

impl SyncConfig {
    /// Creates a preview-only, one-shot config.
    #[must_use]
    pub fn new(host_file: impl Into<PathBuf>, kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            host_file: host_file.into(),
            kubeconfig: kubeconfig.into(),
            context: None,
            write: false,
            watch: false,
        }
    }

    /// Enables or disables committing to disk.
    #[must_use]
    pub const fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Enables or disables watch mode.
    #[must_use]
    pub const fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Selects a kubeconfig context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_FILE, default_kubeconfig())
    }
}

/// Returns `<home>/.kube/config`, or `.kube/config` relative to the working
/// directory when no home directory is known.
#[must_use]
pub fn default_kubeconfig() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".kube")
        .join("config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_defaults() {
        let c = SyncConfig::new("/tmp/hosts", "/tmp/kc");
        assert_eq!(c.host_file, PathBuf::from("/tmp/hosts"));
        assert_eq!(c.kubeconfig, PathBuf::from("/tmp/kc"));
        assert!(!c.write);
        assert!(!c.watch);
        assert!(c.context.is_none());
    }

    #[test]
    fn builders_override() {
        let c = SyncConfig::new("h", "k")
            .with_write(true)
            .with_watch(true)
            .with_context("kind-dev");
        assert!(c.write);
        assert!(c.watch);
        assert_eq!(c.context.as_deref(), Some("kind-dev"));
    }

    #[test]
    fn default_targets_platform_hosts_file() {
        let c = SyncConfig::default();
        assert_eq!(c.host_file, PathBuf::from(DEFAULT_HOST_FILE));
        assert!(c.kubeconfig.ends_with(".kube/config"));
    }
}
