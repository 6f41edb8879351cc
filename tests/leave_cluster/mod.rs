//! Stopped and unreachable nodes drop out of the remaining members' views.

use std::sync::Arc;

use cdcf_e2e::ClusterController;
use cdcf_e2e::Error;
use cdcf_e2e::MembershipAssertionError;
use cdcf_e2e::NodeState;
use cdcf_e2e::SeedRow;

use crate::common::identities;
use crate::common::names;
use crate::common::settings;
use crate::common::SimRuntime;
use crate::LEAVE_CLUSTER_PORT_BASE;
use crate::UNREACHABLE_PORT_BASE;

#[tokio::test]
async fn test_stopped_node_is_removed_and_can_rejoin() {
    crate::enable_logger();
    let runtime = Arc::new(SimRuntime::new());
    let mut controller =
        ClusterController::new(runtime.clone(), &settings(LEAVE_CLUSTER_PORT_BASE));

    controller.configure_seeds([
        SeedRow::new("a", "a"),
        SeedRow::new("b", "a"),
        SeedRow::new("c", "a"),
    ]);
    assert!(controller.start_all().await.is_empty());
    controller.assert_all_joined_one_cluster(&names(&["a", "b", "c"])).await.unwrap();

    match controller.assert_removed("b").await {
        Err(Error::Assertion(MembershipAssertionError::StillPresent { removed, .. })) => {
            assert_eq!(removed, "b:4445");
        }
        other => panic!("expected StillPresent, got {other:?}"),
    }

    controller.stop("b").await.unwrap();
    assert_eq!(controller.node("b").unwrap().state(), NodeState::Stopped);
    controller.assert_removed("b").await.unwrap();
    assert!(matches!(controller.query("b").await, Err(Error::Connection { .. })));

    // resumes on the same endpoint
    let endpoint = controller.node("b").unwrap().endpoint().cloned();
    controller.start("b").await.unwrap();
    assert_eq!(controller.node("b").unwrap().endpoint().cloned(), endpoint);
    controller.assert_all_joined_one_cluster(&names(&["a", "b", "c"])).await.unwrap();

    controller.teardown().await;
    assert_eq!(runtime.container_count(), 0);
}

#[tokio::test]
async fn test_unreachable_node_keeps_answering_alone() {
    crate::enable_logger();
    let runtime = Arc::new(SimRuntime::new());
    let mut controller = ClusterController::new(runtime.clone(), &settings(UNREACHABLE_PORT_BASE));

    controller.configure_seeds([SeedRow::new("a", "a"), SeedRow::new("b", "a")]);
    assert!(controller.start_all().await.is_empty());
    controller.assert_all_joined_one_cluster(&names(&["a", "b"])).await.unwrap();

    controller.disconnect("b").await.unwrap();
    assert_eq!(controller.node("b").unwrap().state(), NodeState::Disconnected);
    assert_eq!(controller.running_nodes().await.unwrap(), names(&["a", "b"]));

    controller.assert_removed("b").await.unwrap();
    controller.assert_failed_to_join("b").await.unwrap();
    assert_eq!(controller.query("a").await.unwrap().members(), identities(&["a"]).as_slice());

    // disconnecting twice is not a valid transition
    assert!(matches!(
        controller.disconnect("b").await,
        Err(Error::IllegalTransition { .. })
    ));

    controller.teardown().await;
    assert_eq!(runtime.container_count(), 0);
}

#[tokio::test]
async fn test_removed_node_restarts_on_a_fresh_endpoint() {
    crate::enable_logger();
    let runtime = Arc::new(SimRuntime::new());
    let mut controller =
        ClusterController::new(runtime.clone(), &settings(LEAVE_CLUSTER_PORT_BASE + 10));

    controller.configure_seeds([SeedRow::new("a", "a"), SeedRow::new("b", "a")]);
    assert!(controller.start_all().await.is_empty());

    controller.teardown().await;
    assert_eq!(runtime.container_count(), 0);
    assert_eq!(controller.ports().peek(), Some(LEAVE_CLUSTER_PORT_BASE + 12));

    controller.configure_seeds([SeedRow::new("a", "a"), SeedRow::new("b", "a")]);
    assert!(controller.start_all().await.is_empty());
    let port = controller.node("a").unwrap().endpoint().unwrap().port;
    assert_eq!(port, LEAVE_CLUSTER_PORT_BASE + 12);
    controller.assert_all_joined_one_cluster(&names(&["a", "b"])).await.unwrap();

    controller.teardown().await;
}
