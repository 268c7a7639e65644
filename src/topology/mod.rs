//! Cluster topology snapshots.
//!
//! The authentication core never mutates topology state; it only pins an
//! immutable [`TopologySnapshot`] long enough to resolve the node it is
//! authenticating against. A separate monitoring component owns discovery
//! and publishes fresh snapshots through [`SharedTopology`].

mod snapshot;

pub use snapshot::{
    ServerAddress, ServerDescription, ServerType, SharedTopology, TopologySnapshot,
};
