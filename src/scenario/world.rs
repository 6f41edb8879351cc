use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::Step;
use super::StepLine;
use crate::ClusterController;
use crate::ContainerRuntime;
use crate::PortAllocator;
use crate::Result;
use crate::ScenarioError;
use crate::SeedRow;
use crate::Settings;
use crate::TeardownReport;

/// Per-scenario state: one controller, torn down when the scenario ends
pub struct ScenarioWorld<R>
where
    R: ContainerRuntime,
{
    controller: ClusterController<R>,
    settings: Settings,
}

impl<R> ScenarioWorld<R>
where
    R: ContainerRuntime,
{
    pub fn new(
        runtime: Arc<R>,
        settings: Settings,
        ports: PortAllocator,
    ) -> Self {
        Self {
            controller: ClusterController::with_ports(runtime, &settings, ports),
            settings,
        }
    }

    pub fn controller(&self) -> &ClusterController<R> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ClusterController<R> {
        &mut self.controller
    }

    /// Bind and execute one step line
    pub async fn run_step(
        &mut self,
        line: &StepLine,
    ) -> Result<()> {
        let step = Step::parse(&line.text, line.line)?;
        let rows = if step.needs_table() {
            let table = line.table.as_ref().ok_or_else(|| ScenarioError::MissingTable {
                line: line.line,
                text: line.text.clone(),
            })?;
            table.seed_rows()?
        } else {
            Vec::new()
        };
        self.apply(step, rows).await
    }

    pub async fn apply(
        &mut self,
        step: Step,
        rows: Vec<SeedRow>,
    ) -> Result<()> {
        let controller = &mut self.controller;
        match step {
            Step::ConfigureSeedNodes => {
                controller.configure_seeds(rows);
            }
            Step::StartSeedNodes => {
                controller.start_all().await;
            }
            Step::ClusterWithSeedNodes => {
                controller.configure_seeds(rows);
                controller.start_all().await;
            }
            Step::AddOrdinaryNode => {
                for name in controller.add_nodes(rows) {
                    controller.start(&name).await?;
                }
            }
            Step::CreateNewCluster(node) | Step::Start(node) => {
                controller.start(&node).await?;
            }
            Step::TurnsDown(node) => {
                controller.stop(&node).await?;
            }
            Step::TurnsUnreachable(node) => {
                controller.disconnect(&node).await?;
            }
            Step::Wait(seconds) => {
                info!(seconds, "waiting for membership to converge");
                tokio::time::sleep(Duration::from_secs(seconds)).await;
            }
            Step::JoinOneCluster(subject) => {
                // the subject is prose; every running node is checked against all of them
                debug!(%subject, "checking every running node");
                let running = controller.running_nodes().await?;
                controller.assert_all_joined_one_cluster(&running).await?;
            }
            Step::FailToJoin(node) => {
                controller.assert_failed_to_join(&node).await?;
            }
            Step::RemovedFromCluster(node) => {
                controller.assert_removed(&node).await?;
            }
        }
        Ok(())
    }

    /// Release every node; logs are dumped first when `failed` and enabled
    pub async fn teardown(
        &mut self,
        failed: bool,
    ) -> TeardownReport {
        if failed && self.settings.teardown.dump_logs_on_failure {
            self.controller.dump_logs().await;
        }
        let report = self.controller.teardown().await;
        if !report.is_clean() {
            warn!(failures = report.failures.len(), "teardown left resources behind");
        }
        report
    }

    /// Give back the port allocator for the next scenario
    pub fn into_ports(self) -> PortAllocator {
        self.controller.into_ports()
    }
}
