use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use tracing::Instrument;

use super::Feature;
use super::Scenario;
use super::ScenarioWorld;
use crate::ContainerRuntime;
use crate::PortAllocator;
use crate::Result;
use crate::Settings;
use crate::TeardownReport;

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub feature: String,
    pub scenario: String,
    /// First failing step and why, `None` when every step passed
    pub failure: Option<StepFailure>,
    pub teardown: TeardownReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub line: usize,
    pub step: String,
    pub message: String,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs scenarios one after another, each against a fresh topology.
///
/// Teardown happens after every scenario whether its steps passed, failed or
/// panicked. Ports keep increasing across scenarios.
pub struct ScenarioRunner<R>
where
    R: ContainerRuntime,
{
    runtime: Arc<R>,
    settings: Settings,
    ports: PortAllocator,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<R> ScenarioRunner<R>
where
    R: ContainerRuntime,
{
    pub fn new(
        runtime: Arc<R>,
        settings: Settings,
    ) -> Self {
        let ports = PortAllocator::new(settings.runtime.first_host_port);
        Self {
            runtime,
            settings,
            ports,
            shutdown: None,
        }
    }

    /// Stop picking up new scenarios once `shutdown` turns true. The scenario in
    /// flight still finishes and tears down.
    pub fn with_shutdown(
        mut self,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub fn ports(&self) -> &PortAllocator {
        &self.ports
    }

    /// Parse and run every `*.feature` under `path` (a file or a directory)
    pub async fn run_path(
        &mut self,
        path: &Path,
    ) -> Result<RunSummary> {
        let mut files = Vec::new();
        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                let file = entry?.path();
                if file.extension().is_some_and(|ext| ext == "feature") {
                    files.push(file);
                }
            }
            files.sort();
        } else {
            files.push(path.to_path_buf());
        }

        let mut summary = RunSummary::default();
        for file in files {
            info!(file = %file.display(), "loading feature");
            let feature = Feature::load(&file)?;
            summary.outcomes.extend(self.run_feature(&feature).await);
        }
        Ok(summary)
    }

    pub async fn run_feature(
        &mut self,
        feature: &Feature,
    ) -> Vec<ScenarioOutcome> {
        let mut outcomes = Vec::with_capacity(feature.scenarios.len());
        for scenario in &feature.scenarios {
            if self.shutdown_requested() {
                warn!(scenario = %scenario.name, "shutdown requested, skipping remaining scenarios");
                break;
            }
            outcomes.push(self.run_scenario(feature, scenario).await);
        }
        outcomes
    }

    pub async fn run_scenario(
        &mut self,
        feature: &Feature,
        scenario: &Scenario,
    ) -> ScenarioOutcome {
        let span = info_span!("scenario", name = %scenario.name);
        async {
            let mut world = ScenarioWorld::new(
                self.runtime.clone(),
                self.settings.clone(),
                self.ports.clone(),
            );

            let failure = match AssertUnwindSafe(run_steps(&mut world, feature, scenario))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => Some(StepFailure {
                    line: scenario.line,
                    step: scenario.name.clone(),
                    message: format!("panicked: {}", panic_message(&*panic)),
                }),
            };

            match &failure {
                None => info!("scenario passed"),
                Some(f) => error!(line = f.line, step = %f.step, "scenario failed: {}", f.message),
            }

            let teardown = world.teardown(failure.is_some()).await;
            self.ports = world.into_ports();

            ScenarioOutcome {
                feature: feature.name.clone(),
                scenario: scenario.name.clone(),
                failure,
                teardown,
            }
        }
        .instrument(span)
        .await
    }
}

async fn run_steps<R>(
    world: &mut ScenarioWorld<R>,
    feature: &Feature,
    scenario: &Scenario,
) -> Option<StepFailure>
where
    R: ContainerRuntime,
{
    for step in feature.steps_of(scenario) {
        info!(line = step.line, "{:?} {}", step.keyword, step.text);
        if let Err(e) = world.run_step(step).await {
            return Some(StepFailure {
                line: step.line,
                step: step.text.clone(),
                message: e.to_string(),
            });
        }
    }
    None
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
