//! [`IngressSource`] backed by the Kubernetes API.
//!
//! Lists and watches `networking.k8s.io/v1` Ingress objects across all
//! namespaces.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{ListParams, WatchEvent, WatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use tracing::{debug, info};

use crate::endpoint::endpoint_host;
use crate::error::{Error, Result};
use crate::source::{EventStream, IngressEvent, IngressObject, IngressSnapshot, IngressSource};

/// Loads the cluster configuration from a kubeconfig file.
///
/// `context` selects a context other than the file's current one.
///
/// # Errors
///
/// Returns [`Error::Kubeconfig`] if the file cannot be read or parsed, or
/// the selected context is incomplete.
pub async fn load_config(path: &Path, context: Option<&str>) -> Result<Config> {
    let kubeconfig_error = |source| Error::Kubeconfig {
        path: path.to_path_buf(),
        source,
    };

    let kubeconfig = Kubeconfig::read_from(path).map_err(kubeconfig_error)?;
    let options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..KubeConfigOptions::default()
    };
    let config = Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(kubeconfig_error)?;

    debug!(
        path = %path.display(),
        cluster = %config.cluster_url,
        "Loaded kubeconfig"
    );
    Ok(config)
}

/// Hostname of the API server `config` points at.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] if the cluster URL has no host.
pub fn cluster_host(config: &Config) -> Result<String> {
    endpoint_host(&config.cluster_url.to_string(), config.cluster_url.host())
}

/// Ingress access through a [`kube::Client`].
#[derive(Clone)]
pub struct KubeSource {
    api: Api<Ingress>,
}

impl KubeSource {
    /// Wraps an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Kube`] if the client cannot be constructed (e.g.
    /// unusable TLS material).
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(Self::new(Client::try_from(config)?))
    }
}

#[async_trait]
impl IngressSource for KubeSource {
    async fn list(&self) -> Result<IngressSnapshot> {
        let list = self.api.list(&ListParams::default()).await?;
        let resource_version = list.metadata.resource_version.unwrap_or_default();
        let objects: Vec<IngressObject> = list.items.iter().map(to_object).collect();

        info!(
            count = objects.len(),
            resource_version = %resource_version,
            "Listed ingress objects"
        );
        Ok(IngressSnapshot {
            objects,
            resource_version,
        })
    }

    async fn watch(&self, resource_version: &str) -> Result<EventStream> {
        Ok(resume_from(self.api.clone(), resource_version))
    }
}

/// Extracts name, namespace and rule hosts from an Ingress.
#[must_use]
pub fn to_object(ingress: &Ingress) -> IngressObject {
    let hosts = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .map(|rules| {
            rules
                .iter()
                .map(|rule| rule.host.clone().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    IngressObject {
        name: ingress.name_any(),
        namespace: ingress.namespace(),
        hosts,
    }
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

type RawWatch = BoxStream<'static, kube::Result<WatchEvent<Ingress>>>;

/// Opens one watch connection starting after `version`.
#[async_trait]
trait OpenWatch: Send + Sync + 'static {
    async fn open(&self, version: &str) -> Result<RawWatch>;
}

#[async_trait]
impl OpenWatch for Api<Ingress> {
    async fn open(&self, version: &str) -> Result<RawWatch> {
        debug!(resource_version = %version, "Opening ingress watch");
        Ok(self.watch(&WatchParams::default(), version).await?.boxed())
    }
}

/// A watch connection plus the last version seen on it.
///
/// The API server ends every watch after its request timeout; the feed is
/// re-opened from `version` so consumers see one uninterrupted stream.
struct WatchState<O> {
    opener: O,
    version: String,
    stream: Option<RawWatch>,
}

fn resume_from<O: OpenWatch>(opener: O, version: &str) -> EventStream {
    let state = WatchState {
        opener,
        version: version.to_string(),
        stream: None,
    };
    futures::stream::try_unfold(state, next_event).boxed()
}

async fn next_event<O: OpenWatch>(
    mut state: WatchState<O>,
) -> Result<Option<(IngressEvent, WatchState<O>)>> {
    loop {
        let mut stream = match state.stream.take() {
            Some(stream) => stream,
            None => state.opener.open(&state.version).await?,
        };

        let Some(raw) = stream.try_next().await? else {
            debug!(resource_version = %state.version, "Watch closed by server, resuming");
            continue;
        };
        state.stream = Some(stream);

        if let Some(event) = translate(&mut state.version, raw)? {
            return Ok(Some((event, state)));
        }
    }
}

/// Maps one raw watch event, advancing `version` past it.
///
/// Bookmarks only move the version and yield `None`. An error object from
/// the server is returned as [`Error::WatchStatus`].
fn translate(version: &mut String, event: WatchEvent<Ingress>) -> Result<Option<IngressEvent>> {
    let event = match event {
        WatchEvent::Added(ingress) => IngressEvent::Added(observe(version, &ingress)),
        WatchEvent::Modified(ingress) => IngressEvent::Modified(observe(version, &ingress)),
        WatchEvent::Deleted(ingress) => IngressEvent::Deleted(observe(version, &ingress)),
        WatchEvent::Bookmark(bookmark) => {
            *version = bookmark.metadata.resource_version;
            return Ok(None);
        }
        WatchEvent::Error(status) => {
            return Err(Error::WatchStatus {
                code: status.code,
                message: status.message,
            });
        }
    };
    Ok(Some(event))
}

fn observe(version: &mut String, ingress: &Ingress) -> IngressObject {
    if let Some(seen) = ingress.resource_version() {
        *version = seen;
    }
    to_object(ingress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use k8s_openapi::api::networking::v1::{IngressRule, IngressSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    const KUBECONFIG: &str = "\
apiVersion: v1
kind: Config
clusters:
- name: dev
  cluster:
    server: https://10.1.2.3:6443
    insecure-skip-tls-verify: true
- name: staging
  cluster:
    server: https://k8s.staging.example:443
    insecure-skip-tls-verify: true
contexts:
- name: dev
  context:
    cluster: dev
    user: dev
- name: staging
  context:
    cluster: staging
    user: dev
current-context: dev
users:
- name: dev
  user:
    token: not-a-real-token
";

    /// `id-token` is an unsigned JWT expiring in 2100.
    const OIDC_KUBECONFIG: &str = "\
apiVersion: v1
kind: Config
clusters:
- name: dev
  cluster:
    server: https://10.1.2.3:6443
    insecure-skip-tls-verify: true
contexts:
- name: dev
  context:
    cluster: dev
    user: sso
current-context: dev
users:
- name: sso
  user:
    auth-provider:
      name: oidc
      config:
        client-id: kubernetes
        idp-issuer-url: https://sso.example
        id-token: eyJhbGciOiJub25lIn0.eyJleHAiOjQxMDI0NDQ4MDB9.sig
";

    fn ingress(name: &str, hosts: &[Option<&str>]) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("apps".to_string()),
                ..ObjectMeta::default()
            },
            spec: Some(IngressSpec {
                rules: Some(
                    hosts
                        .iter()
                        .map(|h| IngressRule {
                            host: h.map(str::to_string),
                            ..IngressRule::default()
                        })
                        .collect(),
                ),
                ..IngressSpec::default()
            }),
            ..Ingress::default()
        }
    }

    #[test]
    fn to_object_keeps_rule_order_and_empty_hosts() {
        let obj = to_object(&ingress("web", &[Some("b.local"), None, Some("a.local")]));
        assert_eq!(obj.name, "web");
        assert_eq!(obj.namespace.as_deref(), Some("apps"));
        assert_eq!(obj.hosts, ["b.local", "", "a.local"]);
    }

    #[test]
    fn to_object_without_spec_has_no_hosts() {
        let ing = Ingress {
            metadata: ObjectMeta {
                name: Some("bare".to_string()),
                ..ObjectMeta::default()
            },
            ..Ingress::default()
        };
        let obj = to_object(&ing);
        assert_eq!(obj.name, "bare");
        assert!(obj.hosts.is_empty());
    }

    #[tokio::test]
    async fn load_config_uses_current_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let config = load_config(&path, None).await.unwrap();
        assert_eq!(cluster_host(&config).unwrap(), "10.1.2.3");
    }

    #[tokio::test]
    async fn load_config_honours_context_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let config = load_config(&path, Some("staging")).await.unwrap();
        assert_eq!(cluster_host(&config).unwrap(), "k8s.staging.example");
    }

    #[tokio::test]
    async fn oidc_auth_provider_builds_a_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, OIDC_KUBECONFIG).unwrap();

        let config = load_config(&path, None).await.unwrap();
        assert!(KubeSource::from_config(config).is_ok());
    }

    #[tokio::test]
    async fn load_config_missing_file_is_kubeconfig_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope"), None).await.unwrap_err();
        assert!(matches!(err, Error::Kubeconfig { .. }));
    }

    // -----------------------------------------------------------------------
    // Change feed
    // -----------------------------------------------------------------------

    fn object_event(
        kind: &str,
        name: &str,
        version: &str,
        hosts: &[&str],
    ) -> WatchEvent<Ingress> {
        let rules: Vec<_> = hosts.iter().map(|h| json!({ "host": h })).collect();
        serde_json::from_value(json!({
            "type": kind,
            "object": {
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": { "name": name, "namespace": "apps", "resourceVersion": version },
                "spec": { "rules": rules },
            },
        }))
        .unwrap()
    }

    fn bookmark(version: &str) -> WatchEvent<Ingress> {
        serde_json::from_value(json!({
            "type": "BOOKMARK",
            "object": {
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": { "resourceVersion": version },
            },
        }))
        .unwrap()
    }

    fn expired() -> WatchEvent<Ingress> {
        serde_json::from_value(json!({
            "type": "ERROR",
            "object": {
                "status": "Failure",
                "message": "too old resource version: 1 (90)",
                "reason": "Expired",
                "code": 410,
            },
        }))
        .unwrap()
    }

    /// Serves one prepared connection per `open`, recording the version each
    /// was opened at.
    #[derive(Default)]
    struct ScriptedWatch {
        connections: Mutex<VecDeque<Vec<WatchEvent<Ingress>>>>,
        opened_at: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OpenWatch for Arc<ScriptedWatch> {
        async fn open(&self, version: &str) -> Result<RawWatch> {
            self.opened_at.lock().unwrap().push(version.to_string());
            let events = self
                .connections
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::WatchStatus {
                    code: 500,
                    message: "no more connections".to_string(),
                })?;
            Ok(futures::stream::iter(events.into_iter().map(Ok)).boxed())
        }
    }

    #[test]
    fn translate_object_events_advance_version() {
        let mut version = "1".to_string();

        let added = translate(&mut version, object_event("ADDED", "web", "5", &["a.local"]));
        assert_eq!(
            added.unwrap(),
            Some(IngressEvent::Added(
                IngressObject::new("web", ["a.local"]).in_namespace("apps")
            ))
        );
        assert_eq!(version, "5");

        let modified = translate(
            &mut version,
            object_event("MODIFIED", "web", "7", &["b.local"]),
        );
        assert!(matches!(
            modified.unwrap(),
            Some(IngressEvent::Modified(obj)) if obj.hosts == ["b.local"]
        ));
        assert_eq!(version, "7");

        let deleted = translate(&mut version, object_event("DELETED", "web", "9", &["b.local"]));
        assert!(matches!(
            deleted.unwrap(),
            Some(IngressEvent::Deleted(obj)) if obj.name == "web"
        ));
        assert_eq!(version, "9");
    }

    #[test]
    fn translate_bookmark_only_moves_version() {
        let mut version = "1".to_string();
        assert_eq!(translate(&mut version, bookmark("33")).unwrap(), None);
        assert_eq!(version, "33");
    }

    #[test]
    fn translate_error_object_is_fatal() {
        let mut version = "1".to_string();
        let err = translate(&mut version, expired()).unwrap_err();
        assert!(matches!(err, Error::WatchStatus { code: 410, .. }));
        assert_eq!(version, "1");
    }

    #[tokio::test]
    async fn closed_watch_reopens_from_last_seen_version() {
        let script = Arc::new(ScriptedWatch::default());
        script.connections.lock().unwrap().extend([
            vec![object_event("ADDED", "web", "5", &["a.local"]), bookmark("9")],
            vec![object_event("MODIFIED", "web", "12", &["a2.local"])],
        ]);

        let events: Vec<_> = resume_from(script.clone(), "1").take(2).collect().await;

        assert!(matches!(
            &events[0],
            Ok(IngressEvent::Added(obj)) if obj.hosts == ["a.local"]
        ));
        assert!(matches!(
            &events[1],
            Ok(IngressEvent::Modified(obj)) if obj.hosts == ["a2.local"]
        ));
        assert_eq!(*script.opened_at.lock().unwrap(), ["1", "9"]);
    }

    #[tokio::test]
    async fn error_object_ends_the_feed() {
        let script = Arc::new(ScriptedWatch::default());
        script
            .connections
            .lock()
            .unwrap()
            .push_back(vec![object_event("ADDED", "web", "5", &["a.local"]), expired()]);

        let events: Vec<_> = resume_from(script.clone(), "1").collect().await;

        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(&events[1], Err(Error::WatchStatus { code: 410, .. })));
        assert_eq!(*script.opened_at.lock().unwrap(), ["1"]);
    }
}
