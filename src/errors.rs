//! Harness Error Hierarchy
//!
//! Errors are grouped by the collaborator that produced them: the container
//! runtime, the membership probe, membership expectations and scenario
//! parsing. Nothing in the harness retries on any of them.

use std::fmt;
use std::time::Duration;

use config::ConfigError;

use crate::ContainerId;
use crate::NodeState;

pub type Result<T> = std::result::Result<T, Error>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Orchestration runtime failures
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Node lifecycle operation not allowed from the node's current state
    #[error("Node {node} cannot {operation} while {from}")]
    IllegalTransition {
        node: String,
        from: NodeState,
        operation: &'static str,
    },

    /// Query endpoint refused or dropped the connection
    #[error("Connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Query endpoint did not answer within the configured bound
    #[error("Membership probe to {endpoint} timed out during {phase} after {duration:?}")]
    Timeout {
        endpoint: String,
        phase: ProbePhase,
        duration: Duration,
    },

    /// Query response was not valid UTF-8
    #[error("Membership response from {endpoint} is not valid UTF-8")]
    Decode { endpoint: String },

    /// Membership expectation mismatch
    #[error(transparent)]
    Assertion(#[from] MembershipAssertionError),

    #[error("Node {0} is not part of the configured topology")]
    UnknownNode(String),

    #[error("Node {0} has no query endpoint yet, it was never created")]
    NoEndpoint(String),

    #[error("Host port range exhausted after {0}")]
    PortsExhausted(u16),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Container runtime is unavailable: {source}")]
    Unavailable {
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to get or create network {network}: {source}")]
    NetworkCreate {
        network: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to create container {name}: {source}")]
    ContainerCreate {
        name: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to start container {name}: {source}")]
    ContainerStart {
        name: String,
        #[source]
        source: BoxedSource,
    },

    /// The container exists but never started; `id` still has to be removed
    #[error("Container {name} was created as {id} but failed to start: {source}")]
    CreatedNotStarted {
        name: String,
        id: ContainerId,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to stop container {name}: {source}")]
    ContainerStop {
        name: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to remove container {name}: {source}")]
    ContainerRemove {
        name: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to inspect container {name}: {source}")]
    ContainerInspect {
        name: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to disconnect {name} from network {network}: {source}")]
    Disconnect {
        name: String,
        network: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to fetch logs of {name}: {source}")]
    Logs {
        name: String,
        #[source]
        source: BoxedSource,
    },
}

/// Where a membership probe was when its deadline expired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Connect,
    Write,
    Read,
}

impl fmt::Display for ProbePhase {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let phase = match self {
            ProbePhase::Connect => "connect",
            ProbePhase::Write => "write",
            ProbePhase::Read => "read",
        };
        f.write_str(phase)
    }
}

/// Membership expectation failures. Every variant names the offending node
/// together with the view it reported.
#[derive(Debug, thiserror::Error)]
pub enum MembershipAssertionError {
    #[error("{node} reported {actual:?}, which should include all of {expected:?}")]
    MissingMembers {
        node: String,
        actual: Vec<String>,
        expected: Vec<String>,
    },

    #[error("{node} reported {actual:?}, expected exactly {expected:?}")]
    NotIsolated {
        node: String,
        actual: Vec<String>,
        expected: Vec<String>,
    },

    #[error("{node} reported {actual:?}, which should not include {removed}")]
    StillPresent {
        node: String,
        removed: String,
        actual: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("line {line}: no binding matches step \"{text}\"")]
    UnknownStep { line: usize, text: String },

    #[error("line {line}: step \"{text}\" requires a data table")]
    MissingTable { line: usize, text: String },

    #[error("line {line}: data table has no \"{column}\" column")]
    MissingColumn { line: usize, column: String },

    #[error("line {line}: \"{value}\" is not a valid number")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}
