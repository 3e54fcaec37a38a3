//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by sync operations.
///
/// Every variant is fatal for the binary; nothing is retried. Messages do
/// not repeat their cause; walk [`std::error::Error::source`] for it.
#[derive(Debug, Error)]
pub enum Error {
    /// The kubeconfig file could not be read or did not yield a usable
    /// cluster configuration.
    #[error("kubeconfig {path}")]
    Kubeconfig {
        /// The kubeconfig path that was loaded.
        path: PathBuf,
        /// Underlying loader error.
        #[source]
        source: kube::config::KubeconfigError,
    },

    /// The cluster URL has no hostname component.
    #[error("invalid cluster endpoint: {0}")]
    InvalidEndpoint(String),

    /// Forward DNS lookup of the cluster hostname failed.
    #[error("k8s hostname {host} not found")]
    Resolve {
        /// The hostname that was looked up.
        host: String,
        /// Underlying resolver error.
        #[source]
        source: std::io::Error,
    },

    /// The lookup succeeded but returned no address.
    #[error("k8s hostname {host} resolved to no addresses")]
    NoAddress {
        /// The hostname that was looked up.
        host: String,
    },

    /// Kubernetes API call (client setup, list or watch) failed.
    #[error("kubernetes API error")]
    Kube(#[from] kube::Error),

    /// The API server sent an error object on the change feed.
    #[error("watch failed ({code}): {message}")]
    WatchStatus {
        /// HTTP-style status code, e.g. 410 when the resource version expired.
        code: u16,
        /// Server-provided message.
        message: String,
    },

    /// Reading or writing the hosts file failed.
    #[error("hosts file {path}")]
    HostFile {
        /// The hosts file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the rendered block to the output stream failed.
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::HostFile { source, .. } | Self::Io(source) => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}
