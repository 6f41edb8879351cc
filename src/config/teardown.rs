use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct TeardownConfig {
    /// Print every node's container output before cleanup when a scenario failed
    #[serde(default)]
    pub dump_logs_on_failure: bool,
}
