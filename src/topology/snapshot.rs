//! Immutable topology snapshots and their shared publication point.
//!
//! Monitoring publishes a whole new [`TopologySnapshot`] on every change;
//! readers pin whichever snapshot is current via [`SharedTopology::acquire`]
//! and keep using it even while newer snapshots are published underneath
//! them (snapshot isolation, not linearizable freshness). Reference counting
//! is handle-scoped: a snapshot's storage is freed when the last `Arc`
//! pointing at it is dropped, never by manual refcount arithmetic.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

/// Network address of a cluster node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// Hostname or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ServerAddress {
    /// Create a new server address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Role of a node within the cluster, as last observed by monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerType {
    /// Single node, not part of a replicated deployment
    Standalone,
    /// Writable member of a replicated deployment
    Primary,
    /// Read-only member of a replicated deployment
    Secondary,
    /// Query router in front of a sharded deployment
    Router,
    /// Not yet observed, or last check failed
    Unknown,
}

/// Description of one cluster node.
///
/// Only the fields the authentication path needs are carried here; the
/// monitoring component owns the full picture.
#[derive(Debug, Clone)]
pub struct ServerDescription {
    /// The node's address
    pub address: ServerAddress,
    /// The node's last observed role
    pub server_type: ServerType,
    /// Highest wire protocol version the node advertised
    pub max_wire_version: i32,
    /// Last measured round-trip time, if any
    pub round_trip_time: Option<Duration>,
}

impl ServerDescription {
    /// Create a description for a node that has not been checked yet.
    pub fn new(address: ServerAddress) -> Self {
        Self {
            address,
            server_type: ServerType::Unknown,
            max_wire_version: 0,
            round_trip_time: None,
        }
    }

    /// Set the server type (builder pattern).
    pub fn with_server_type(mut self, server_type: ServerType) -> Self {
        self.server_type = server_type;
        self
    }

    /// Set the advertised wire version (builder pattern).
    pub fn with_max_wire_version(mut self, version: i32) -> Self {
        self.max_wire_version = version;
        self
    }
}

/// An immutable point-in-time view of the cluster.
///
/// Snapshots are never mutated after publication. Multiple snapshots may
/// coexist while in-flight readers still hold older ones pinned.
#[derive(Debug, Default)]
pub struct TopologySnapshot {
    servers: HashMap<ServerAddress, ServerDescription>,
    version: u64,
}

impl TopologySnapshot {
    /// Create an empty snapshot with the given version counter.
    pub fn new(version: u64) -> Self {
        Self {
            servers: HashMap::new(),
            version,
        }
    }

    /// Add a server description (builder pattern).
    pub fn with_server(mut self, description: ServerDescription) -> Self {
        self.servers.insert(description.address.clone(), description);
        self
    }

    /// Look up the node at `address`, if this snapshot knows it.
    pub fn server(&self, address: &ServerAddress) -> Option<&ServerDescription> {
        self.servers.get(address)
    }

    /// Iterate over all known nodes.
    pub fn servers(&self) -> impl Iterator<Item = &ServerDescription> {
        self.servers.values()
    }

    /// Number of known nodes.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether the snapshot knows no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Monotonic publication counter assigned by monitoring.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Shared publication point for the current topology snapshot.
///
/// Publication is a single atomic pointer swap, so a reader observes either
/// the old snapshot or the new one, never a torn mix. [`acquire`] never
/// blocks and never fails; releasing is simply dropping the returned `Arc`.
///
/// # Example
///
/// ```
/// use docdb_auth::topology::{ServerAddress, ServerDescription, SharedTopology, TopologySnapshot};
///
/// let topology = SharedTopology::default();
/// let address = ServerAddress::new("db0.example.com", 27017);
/// topology.publish(
///     TopologySnapshot::new(1).with_server(ServerDescription::new(address.clone())),
/// );
///
/// let snapshot = topology.acquire();
/// assert!(snapshot.server(&address).is_some());
/// ```
///
/// [`acquire`]: SharedTopology::acquire
#[derive(Debug)]
pub struct SharedTopology {
    current: ArcSwap<TopologySnapshot>,
}

impl SharedTopology {
    /// Create a shared topology with an initial snapshot.
    pub fn new(initial: TopologySnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Pin and return the currently published snapshot.
    ///
    /// The returned handle stays valid for as long as the caller holds it,
    /// regardless of how many newer snapshots are published meanwhile.
    pub fn acquire(&self) -> Arc<TopologySnapshot> {
        self.current.load_full()
    }

    /// Publish a new snapshot, replacing the current one atomically.
    ///
    /// Intended for the monitoring component. The previous snapshot's
    /// storage is freed once its last pinned reader releases it.
    pub fn publish(&self, snapshot: TopologySnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for SharedTopology {
    fn default() -> Self {
        Self::new(TopologySnapshot::default())
    }
}
