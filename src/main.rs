//! `k8s-ingress-hosts` — point Ingress hostnames at the cluster in the hosts file.
//!
//! # Usage
//!
//! ```text
//! k8s-ingress-hosts [--host-file <path>] [--kubeconfig <path>] [--context <name>] [--write] [--watch]
//! k8s-ingress-hosts --version
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use k8s_ingress_hosts::config::{DEFAULT_HOST_FILE, default_kubeconfig};
use k8s_ingress_hosts::{HostsSync, KubeSource, SyncConfig, kube_source, resolve_host, run};

const PROJECT_URL: &str = "https://github.com/getditto/k8s-ingress-hosts";

/// Exit status of `--version`.
const VERSION_EXIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "k8s-ingress-hosts",
    about = "Sync Kubernetes Ingress hostnames into a managed block of the hosts file",
    long_about = None,
    disable_version_flag = true,
)]
struct Cli {
    /// Hosts file location.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_HOST_FILE)]
    host_file: PathBuf,

    /// Rewrite the hosts file instead of only printing the block.
    #[arg(long)]
    write: bool,

    /// Show version and exit.
    #[arg(long)]
    version: bool,

    /// Path to the kubeconfig file [default: ~/.kube/config].
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one.
    #[arg(long, value_name = "NAME")]
    context: Option<String>,

    /// Keep running and follow ingress changes.
    #[arg(long)]
    watch: bool,
}

impl Cli {
    fn into_config(self) -> SyncConfig {
        let config = SyncConfig::new(
            self.host_file,
            self.kubeconfig.unwrap_or_else(default_kubeconfig),
        )
        .with_write(self.write)
        .with_watch(self.watch);

        match self.context {
            Some(context) => config.with_context(context),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        return print_version(&mut std::io::stdout());
    }

    init_tracing();

    match sync(cli.into_config()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn sync(config: SyncConfig) -> Result<()> {
    let kube = kube_source::load_config(&config.kubeconfig, config.context.as_deref())
        .await
        .context("failed to load kubeconfig")?;

    let host = kube_source::cluster_host(&kube)?;
    let address = resolve_host(&host)
        .await
        .context("failed to resolve cluster endpoint")?;

    let source = KubeSource::from_config(kube).context("failed to create Kubernetes client")?;

    if config.write && !k8s_ingress_hosts::util::is_privileged() {
        warn!(
            path = %config.host_file.display(),
            "Not running as root, writing the hosts file may fail"
        );
    }

    info!(address = %address, write = config.write, watch = config.watch, "Starting sync");

    let mut sync = HostsSync::new(address, &config, std::io::stdout());
    run(&source, &mut sync, config.watch)
        .await
        .context("ingress sync failed")
}

/// Prints name, project URL and version. Returns status 2.
fn print_version<W: Write>(out: &mut W) -> ExitCode {
    let _ = writeln!(
        out,
        "k8s-ingress-hosts\n url: {PROJECT_URL}\n version: {}",
        env!("CARGO_PKG_VERSION")
    );
    ExitCode::from(VERSION_EXIT)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
