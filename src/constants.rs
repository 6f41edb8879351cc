// -
// Cluster protocol

/// Port suffix every node advertises in its cluster identity, independent of
/// the host port the harness publishes its query endpoint on.
pub const IDENTITY_PORT: u16 = 4445;

/// Literal line written to a node's query endpoint to request its member list.
pub const PROBE_LINE: &[u8] = b"Hello, world\n";

// -
// Container runtime defaults

pub(crate) const DEFAULT_IMAGE: &str = "cdcf";
pub(crate) const DEFAULT_NETWORK: &str = "cdcf_end2end_test";

/// Port the node serves membership queries on inside its container
pub(crate) const DEFAULT_CONTAINER_PORT: u16 = 3335;

/// First host port handed out to a created node; each later creation takes the next one.
pub(crate) const DEFAULT_FIRST_HOST_PORT: u16 = 3336;

pub(crate) const DEFAULT_QUERY_HOST: &str = "127.0.0.1";

/// Environment variables read by the node process at startup
pub const ENV_HOST: &str = "HOST";
pub const ENV_SEEDS: &str = "SEEDS";

// -
// Probe defaults

pub(crate) const DEFAULT_CONNECT_TIMEOUT_IN_MS: u64 = 5_000;
pub(crate) const DEFAULT_READ_TIMEOUT_IN_MS: u64 = 5_000;
pub(crate) const DEFAULT_PROBE_BUFFER_SIZE: usize = 1024;

// -
// Settings sources

pub(crate) const CONFIG_PATH_ENV: &str = "E2E_CONFIG_PATH";
pub(crate) const CONFIG_ENV_PREFIX: &str = "E2E";
