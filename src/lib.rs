//! # k8s-ingress-hosts
//!
//! Keep a managed block of the hosts file in sync with the hostnames
//! declared by Kubernetes Ingress rules, so cluster-internal names resolve
//! to the cluster's entry point on a developer machine.
//!
//! Every ingress rule becomes one line pointing at the address of the API
//! server the kubeconfig targets:
//!
//! ```text
//! # generated using k8s-ingress-hosts start #
//! 192.168.49.2 api.dev.local  # api
//! 192.168.49.2 web.dev.local  # web
//! # generated using k8s-ingress-hosts end #
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use k8s_ingress_hosts::{HostsSync, KubeSource, SyncConfig, kube_source, resolve_host, run};
//!
//! let config = SyncConfig::default().with_write(true);
//! let kube = kube_source::load_config(&config.kubeconfig, None).await?;
//! let address = resolve_host(&kube_source::cluster_host(&kube)?).await?;
//!
//! let source = KubeSource::from_config(kube)?;
//! let mut sync = HostsSync::new(address, &config, std::io::stdout());
//! run(&source, &mut sync, config.watch).await?;
//! ```
//!
//! ## Managed block
//!
//! Only the text between the start and end markers is touched. If the file
//! has no block one is appended; everything else is preserved verbatim.
//!
//! ## Permissions
//!
//! Writing `/etc/hosts` requires root. The caller is responsible for
//! privilege elevation (`sudo` etc.); preview mode needs none.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod endpoint;
pub mod error;
pub mod hosts_file;
pub mod kube_source;
pub mod render;
pub mod rules;
pub mod source;
pub mod sync;
pub mod util;

pub use config::SyncConfig;
pub use endpoint::resolve_host;
pub use error::{Error, Result};
pub use hosts_file::{BLOCK_END, BLOCK_START, HostsFile};
pub use kube_source::KubeSource;
pub use render::render;
pub use rules::{Rule, RuleSet};
pub use source::{EventStream, IngressEvent, IngressObject, IngressSnapshot, IngressSource};
pub use sync::{HostsSync, run};
