/// Failures collected while cleaning up after a scenario.
///
/// Every entry has already been logged; nothing here is ever propagated.
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub cleaned: Vec<String>,
    pub failures: Vec<TeardownFailure>,
}

#[derive(Debug)]
pub struct TeardownFailure {
    pub node: String,
    pub operation: &'static str,
    pub error: String,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
