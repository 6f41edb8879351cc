use crate::ScenarioError;

/// Every step the harness knows how to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `configure seed nodes` + `| node | seeds |` table
    ConfigureSeedNodes,
    /// `we start seed nodes`
    StartSeedNodes,
    /// `{subject} should join in one cluster`; the subject is free text
    JoinOneCluster(String),
    /// `{node} should fail to join in existing cluster`
    FailToJoin(String),
    /// `{node} should be removed from cluster`
    RemovedFromCluster(String),
    /// `{node} starts to create a new cluster`
    CreateNewCluster(String),
    /// `we start {node}`
    Start(String),
    /// `we wait {n} seconds`
    Wait(u64),
    /// `cluster with multiple seed nodes` + table, started right away
    ClusterWithSeedNodes,
    /// `{node} turns down`
    TurnsDown(String),
    /// `{node} turns unreachable`
    TurnsUnreachable(String),
    /// `we add an ordinary node and start it` + table
    AddOrdinaryNode,
}

impl Step {
    /// Bind step text (keyword already stripped) to a [`Step`]
    pub fn parse(
        text: &str,
        line: usize,
    ) -> Result<Self, ScenarioError> {
        let text = text.trim();
        let unknown = || ScenarioError::UnknownStep {
            line,
            text: text.to_string(),
        };
        // actions may be phrased with a leading "we"
        let action = text.strip_prefix("we ").unwrap_or(text).trim();

        match action {
            "configure seed nodes" => return Ok(Step::ConfigureSeedNodes),
            "start seed nodes" => return Ok(Step::StartSeedNodes),
            "cluster with multiple seed nodes" => return Ok(Step::ClusterWithSeedNodes),
            "add an ordinary node and start it" => return Ok(Step::AddOrdinaryNode),
            _ => {}
        }

        if let Some(rest) = action.strip_prefix("wait ") {
            let count = rest
                .strip_suffix(" seconds")
                .or_else(|| rest.strip_suffix(" second"))
                .ok_or_else(unknown)?
                .trim();
            let seconds = count.parse::<u64>().map_err(|_| ScenarioError::InvalidNumber {
                line,
                value: count.to_string(),
            })?;
            return Ok(Step::Wait(seconds));
        }

        if let Some(node) = action.strip_prefix("start ") {
            return subject(node).map(Step::Start).ok_or_else(unknown);
        }

        let suffixed: [(&str, fn(String) -> Step); 6] = [
            (" should join in one cluster", Step::JoinOneCluster),
            (" should fail to join in existing cluster", Step::FailToJoin),
            (" should be removed from cluster", Step::RemovedFromCluster),
            (" starts to create a new cluster", Step::CreateNewCluster),
            (" turns down", Step::TurnsDown),
            (" turns unreachable", Step::TurnsUnreachable),
        ];
        for (suffix, bind) in suffixed {
            if let Some(node) = text.strip_suffix(suffix) {
                return subject(node).map(bind).ok_or_else(unknown);
            }
        }

        Err(unknown())
    }

    /// Whether the step reads a `| node | seeds |` table
    pub fn needs_table(&self) -> bool {
        matches!(
            self,
            Step::ConfigureSeedNodes | Step::ClusterWithSeedNodes | Step::AddOrdinaryNode
        )
    }
}

fn subject(raw: &str) -> Option<String> {
    let subject = raw.trim();
    (!subject.is_empty()).then(|| subject.to_string())
}
