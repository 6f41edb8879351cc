//! Seed nodes converge on one member list; a node whose seeds are not
//! running stays in a cluster of its own.

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
use crate::FAIL_TO_JOIN_PORT_BASE;
use crate::JOIN_CLUSTER_PORT_BASE;

#[tokio::test]
async fn test_seed_nodes_join_one_cluster() {
    crate::enable_logger();
    let runtime = Arc::new(SimRuntime::new());
    let mut controller = ClusterController::new(runtime.clone(), &settings(JOIN_CLUSTER_PORT_BASE));

    controller.configure_seeds([SeedRow::new("a", "a"), SeedRow::new("b", "a")]);
    assert!(controller.start_all().await.is_empty());
    assert!(runtime.has_network("cdcf_end2end_test"));

    controller.assert_all_joined_one_cluster(&names(&["a", "b"])).await.unwrap();
    for node in ["a", "b"] {
        let view = controller.query(node).await.unwrap();
        assert_eq!(view.members(), identities(&["a", "b"]).as_slice());
    }

    let report = controller.teardown().await;
    assert_eq!(report.cleaned, vec!["a", "b"]);
    assert_eq!(runtime.container_count(), 0);
}

#[tokio::test]
async fn test_node_with_absent_seed_fails_to_join() {
    crate::enable_logger();
    let runtime = Arc::new(SimRuntime::new());
    let mut controller = ClusterController::new(runtime.clone(), &settings(FAIL_TO_JOIN_PORT_BASE));

    controller.configure_seeds([
        SeedRow::new("a", "a"),
        SeedRow::new("b", "a"),
        SeedRow::new("c", "z"),
    ]);
    assert!(controller.start_all().await.is_empty());

    controller.assert_failed_to_join("c").await.unwrap();
    match controller.assert_failed_to_join("b").await {
        Err(Error::Assertion(MembershipAssertionError::NotIsolated { node, actual, .. })) => {
            assert_eq!(node, "b");
            assert_eq!(actual, identities(&["a", "b"]));
        }
        other => panic!("expected NotIsolated, got {other:?}"),
    }

    // c is running but absent from a and b
    match controller.assert_all_joined_one_cluster(&names(&["a", "b", "c"])).await {
        Err(Error::Assertion(MembershipAssertionError::MissingMembers { node, .. })) => {
            assert_eq!(node, "a");
        }
        other => panic!("expected MissingMembers, got {other:?}"),
    }

    controller.teardown().await;
    assert_eq!(runtime.container_count(), 0);
}

#[tokio::test]
async fn test_start_all_continues_past_a_failed_node() {
    crate::enable_logger();
    let runtime = Arc::new(SimRuntime::new());
    runtime.refuse_create("b");
    let mut controller =
        ClusterController::new(runtime.clone(), &settings(JOIN_CLUSTER_PORT_BASE + 10));

    controller.configure_seeds([
        SeedRow::new("a", "a"),
        SeedRow::new("b", "a"),
        SeedRow::new("c", "a"),
    ]);
    let failures = controller.start_all().await;

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "b");
    assert_eq!(controller.node("b").unwrap().state(), NodeState::Configured);
    assert_eq!(controller.running_nodes().await.unwrap(), names(&["a", "c"]));
    controller.assert_all_joined_one_cluster(&names(&["a", "c"])).await.unwrap();

    let report = controller.teardown().await;
    assert!(report.is_clean());
    assert_eq!(runtime.container_count(), 0);
}
