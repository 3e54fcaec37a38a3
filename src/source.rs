//! Ingress listing and change feed.
//!
//! The sync logic only needs two capabilities from the cluster: a full
//! listing and a stream of changes after it. [`IngressSource`] captures
//! them so the change loop can run against an in-memory fake in tests.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// The parts of an ingress object the hosts block is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressObject {
    /// Object name; becomes the owner of every rule.
    pub name: String,

    /// Object namespace, for logging only.
    pub namespace: Option<String>,

    /// Host of each rule, in declaration order. Rules without a host yield
    /// an empty string.
    pub hosts: Vec<String>,
}

impl IngressObject {
    /// Creates an object in no particular namespace.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            namespace: None,
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// A change to one ingress object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressEvent {
    /// The object was created.
    Added(IngressObject),
    /// The object changed; carries its new state.
    Modified(IngressObject),
    /// The object was removed; carries its last state.
    Deleted(IngressObject),
}

impl IngressEvent {
    /// The object the event is about.
    #[must_use]
    pub const fn object(&self) -> &IngressObject {
        match self {
            Self::Added(obj) | Self::Modified(obj) | Self::Deleted(obj) => obj,
        }
    }

    /// Lowercase event kind for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Modified(_) => "modified",
            Self::Deleted(_) => "deleted",
        }
    }
}

/// Result of a full listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngressSnapshot {
    /// Every ingress object across all namespaces.
    pub objects: Vec<IngressObject>,

    /// Collection version the listing was taken at; the change feed starts
    /// after it. Empty if the source has no notion of versions.
    pub resource_version: String,
}

/// Stream of changes returned by [`IngressSource::watch`].
pub type EventStream = BoxStream<'static, Result<IngressEvent>>;

/// Read access to the cluster's ingress objects.
#[async_trait]
pub trait IngressSource: Send + Sync {
    /// Lists every ingress object.
    async fn list(&self) -> Result<IngressSnapshot>;

    /// Streams changes made after `resource_version`.
    ///
    /// The stream ends only when the source gives up; items are errors when
    /// the feed breaks.
    async fn watch(&self, resource_version: &str) -> Result<EventStream>;
}
