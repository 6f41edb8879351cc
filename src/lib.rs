//! End-to-end harness for a gossip-membership cluster.
//!
//! Nodes run as containers on an isolated network ([`runtime`]), each
//! publishing a query endpoint on a distinct host port ([`node`]). The
//! [`ClusterController`] drives topologies through join, leave and
//! partition operations and checks every node's self-reported member list
//! ([`membership`]). Feature files bind to those operations through
//! [`scenario`], with teardown after every scenario.

pub mod constants;

mod cluster;
mod config;
mod errors;
mod membership;
mod node;
mod runtime;
mod scenario;

pub use cluster::*;
pub use config::*;
pub use errors::*;
pub use membership::*;
pub use node::*;
pub use runtime::*;
pub use scenario::*;
