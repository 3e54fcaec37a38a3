//! Snapshot and change loop.
//!
//! [`HostsSync`] carries everything decided at startup (target address,
//! hosts file, commit flag) together with the live [`RuleSet`]. [`run`]
//! seeds it from a listing, publishes the first snapshot and, in watch
//! mode, republishes after every change.

use std::io::Write;
use std::net::IpAddr;

use futures::TryStreamExt;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::hosts_file::HostsFile;
use crate::render::render;
use crate::rules::{Rule, RuleSet};
use crate::source::{IngressEvent, IngressObject, IngressSource};

/// Application state for one run.
///
/// `out` receives every rendered block.
pub struct HostsSync<W> {
    address: IpAddr,
    hosts_file: HostsFile,
    write: bool,
    rules: RuleSet,
    out: W,
}

impl<W: Write> HostsSync<W> {
    /// Creates an empty sync targeting `config.host_file`, pointing every
    /// host at `address`.
    #[must_use]
    pub fn new(address: IpAddr, config: &SyncConfig, out: W) -> Self {
        Self {
            address,
            hosts_file: HostsFile::new(&config.host_file),
            write: config.write,
            rules: RuleSet::new(),
            out,
        }
    }

    /// Address every rendered line points at.
    #[must_use]
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// Current rules.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Output sink.
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Adds one rule per host of every listed object.
    pub fn seed(&mut self, objects: &[IngressObject]) {
        for obj in objects {
            self.add_object(obj);
        }
    }

    /// Applies one change to the rule set.
    ///
    /// * Added: one rule per host.
    /// * Modified: the owner's first rule takes the object's first host.
    ///   Other rules of the owner are left as they were.
    /// * Deleted: for each host, the first rule matching owner and host is
    ///   removed.
    pub fn apply(&mut self, event: &IngressEvent) {
        let obj = event.object();
        info!(
            kind = event.kind(),
            name = %obj.name,
            namespace = obj.namespace.as_deref().unwrap_or(""),
            "Ingress changed"
        );

        match event {
            IngressEvent::Added(obj) => self.add_object(obj),
            IngressEvent::Modified(obj) => {
                let Some(first) = obj.hosts.first() else {
                    warn!(name = %obj.name, "Modified ingress has no rules, keeping its entries");
                    return;
                };
                if !self.rules.update_owner_domain(&obj.name, first) {
                    debug!(name = %obj.name, "Modified ingress has no entries");
                }
            }
            IngressEvent::Deleted(obj) => {
                for host in &obj.hosts {
                    if !self.rules.remove_owner_domain(&obj.name, host) {
                        debug!(name = %obj.name, domain = %host, "No entry to remove");
                    }
                }
            }
        }
    }

    /// Renders the rules and publishes them: written to the hosts file in
    /// write mode, and printed to the output in every mode.
    ///
    /// # Errors
    ///
    /// Returns the hosts file or output error.
    pub fn flush(&mut self) -> Result<()> {
        let body = render(&self.rules, self.address);
        self.hosts_file.publish(&body, self.write, &mut self.out)
    }

    fn add_object(&mut self, obj: &IngressObject) {
        for host in &obj.hosts {
            debug!(domain = %host, owner = %obj.name, "Adding entry");
            self.rules.append(Rule::new(host.as_str(), obj.name.as_str()));
        }
    }
}

/// Lists, publishes the snapshot, then follows changes if `watch` is set.
///
/// Returns after the snapshot in one-shot mode. In watch mode it returns
/// only when the change feed ends or fails.
///
/// # Errors
///
/// Any listing, feed or publish error; nothing is retried.
pub async fn run<S, W>(source: &S, sync: &mut HostsSync<W>, watch: bool) -> Result<()>
where
    S: IngressSource + ?Sized,
    W: Write,
{
    info!("Reading ingress resources");
    let snapshot = source.list().await?;
    sync.seed(&snapshot.objects);
    sync.flush()?;

    if !watch {
        return Ok(());
    }

    info!("Watching ingress resources");
    let mut events = source.watch(&snapshot.resource_version).await?;
    while let Some(event) = events.try_next().await? {
        sync.apply(&event);
        sync.flush()?;
    }

    info!("Ingress change feed ended");
    Ok(())
}
