//! Runs against the local Docker daemon and a locally built `cdcf` image:
//! `cargo test -- --ignored docker`

use std::sync::Arc;
use std::time::Duration;

use cdcf_e2e::ClusterController;
use cdcf_e2e::DockerRuntime;
use cdcf_e2e::SeedRow;
use cdcf_e2e::Settings;

use crate::DOCKER_PORT_BASE;

const WAIT_FOR_CONVERGENCE_IN_SEC: u64 = 10;

#[tokio::test]
#[ignore = "requires a Docker daemon and the cdcf image"]
async fn test_docker_seed_nodes_join_and_leave() {
    crate::enable_logger();
    let runtime = Arc::new(DockerRuntime::connect().unwrap());
    let mut settings = Settings::load(None).unwrap();
    settings.runtime.first_host_port = DOCKER_PORT_BASE;
    let mut controller = ClusterController::new(runtime, &settings);

    controller.configure_seeds([
        SeedRow::new("a", "a"),
        SeedRow::new("b", "a"),
        SeedRow::new("c", "a"),
    ]);
    controller.start_all().await;
    tokio::time::sleep(Duration::from_secs(WAIT_FOR_CONVERGENCE_IN_SEC)).await;

    let result = async {
        let running = controller.running_nodes().await?;
        controller.assert_all_joined_one_cluster(&running).await?;

        controller.stop("c").await?;
        tokio::time::sleep(Duration::from_secs(WAIT_FOR_CONVERGENCE_IN_SEC)).await;
        controller.assert_removed("c").await
    }
    .await;

    if result.is_err() {
        controller.dump_logs().await;
    }
    let report = controller.teardown().await;
    assert!(report.is_clean(), "{:?}", report.failures);
    result.unwrap();
}
