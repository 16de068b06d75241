//! Concurrency and cancellation behavior of the partition registry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingExecutor, GatedExecutor};
use partition_registry::partition::{
    PartitionError, PartitionNode, PartitionRegistry, PartitionStrategy, RecordingExecutor,
    RegistryConfig,
};

const RACERS: usize = 16;

fn events() -> Arc<PartitionNode> {
    PartitionNode::root("events", PartitionStrategy::range("created"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racers_share_one_attachment() {
    let executor = Arc::new(RecordingExecutor::with_delay(Duration::from_millis(20)));
    let registry = Arc::new(PartitionRegistry::new(executor.clone()));
    let table = events();

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let registry = registry.clone();
            let table = table.clone();
            tokio::spawn(async move { registry.ensure_partition(&table, "202101", None).await })
        })
        .collect();

    let mut nodes = Vec::new();
    for handle in handles {
        nodes.push(handle.await.unwrap().unwrap());
    }

    assert!(nodes.iter().all(|n| Arc::ptr_eq(n, &nodes[0])));
    assert_eq!(executor.ddl_count(), 1);
    assert_eq!(executor.instructions().len(), 2);
    assert_eq!(table.child_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_labels_attach_independently() {
    let executor = Arc::new(RecordingExecutor::with_delay(Duration::from_millis(5)));
    let registry = Arc::new(PartitionRegistry::new(executor.clone()));
    let table = events();

    let handles: Vec<_> = (1..=12u32)
        .flat_map(|month| {
            let label = format!("2021{:02}", month);
            (0..3).map(move |_| label.clone())
        })
        .map(|label| {
            let registry = registry.clone();
            let table = table.clone();
            tokio::spawn(async move { registry.ensure_partition(&table, &label, None).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(table.child_count(), 12);
    assert_eq!(executor.ddl_count(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_other_label_not_blocked_by_in_progress_one() {
    let gated = Arc::new(GatedExecutor::new());
    let registry = Arc::new(PartitionRegistry::new(gated.clone()));
    let table = events();

    let blocked = {
        let registry = registry.clone();
        let table = table.clone();
        tokio::spawn(async move { registry.ensure_partition(&table, "202101", None).await })
    };
    gated.entered.notified().await;

    // A separate table on a plain executor proceeds while 202101 is held.
    let plain = PartitionRegistry::new(Arc::new(RecordingExecutor::new()));
    let other = PartitionNode::root("audits", PartitionStrategy::range("created"));
    let node = tokio::time::timeout(
        Duration::from_secs(5),
        plain.ensure_partition(&other, "202101", None),
    )
    .await
    .expect("unrelated table blocked")
    .unwrap();
    assert_eq!(node.table_name(), "audits_202101");

    // The in-progress label is not visible as a child yet.
    assert!(table.child("202101").is_none());
    assert_eq!(table.child_count(), 0);

    gated.open();
    let attached = blocked.await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&table.child("202101").unwrap(), &attached));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancelled_owner_leaves_no_trace() {
    let gated = Arc::new(GatedExecutor::new());
    let registry = Arc::new(PartitionRegistry::new(gated.clone()));
    let table = events();

    let owner = {
        let registry = registry.clone();
        let table = table.clone();
        tokio::spawn(async move { registry.ensure_partition(&table, "202101", None).await })
    };
    gated.entered.notified().await;

    owner.abort();
    assert!(owner.await.unwrap_err().is_cancelled());

    assert!(table.child("202101").is_none());
    assert_eq!(table.child_count(), 0);
    assert_eq!(gated.ddl_count(), 0);

    gated.open();
    let node = registry.ensure_partition(&table, "202101", None).await.unwrap();
    assert_eq!(node.table_name(), "events_202101");
    assert_eq!(gated.ddl_count(), 1);
    assert_eq!(gated.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_waiter_takes_over_after_owner_cancelled() {
    let gated = Arc::new(GatedExecutor::new());
    let registry = Arc::new(PartitionRegistry::new(gated.clone()));
    let table = events();

    let owner = {
        let registry = registry.clone();
        let table = table.clone();
        tokio::spawn(async move { registry.ensure_partition(&table, "202101", None).await })
    };
    gated.entered.notified().await;

    let waiter = {
        let registry = registry.clone();
        let table = table.clone();
        tokio::spawn(async move { registry.ensure_partition(&table, "202101", None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    owner.abort();
    let _ = owner.await;
    gated.open();

    let node = waiter.await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&table.child("202101").unwrap(), &node));
    assert_eq!(gated.ddl_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_waiter_times_out() {
    let gated = Arc::new(GatedExecutor::new());
    let config = RegistryConfig {
        wait_timeout: Duration::from_millis(50),
    };
    let registry = Arc::new(PartitionRegistry::with_config(gated.clone(), config));
    let table = events();

    let owner = {
        let registry = registry.clone();
        let table = table.clone();
        tokio::spawn(async move { registry.ensure_partition(&table, "202101", None).await })
    };
    gated.entered.notified().await;

    let err = registry.ensure_partition(&table, "202101", None).await.unwrap_err();
    assert_eq!(
        err,
        PartitionError::WaitTimeout {
            table: "events".to_string(),
            label: "202101".to_string(),
            waited_ms: 50,
        }
    );
    assert!(err.is_warning());

    gated.open();
    assert!(owner.await.unwrap().is_ok());
    assert_eq!(gated.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_is_shared_and_leaves_no_entry() {
    let executor = Arc::new(FailingExecutor::with_delay(Duration::from_millis(20)));
    let registry = Arc::new(PartitionRegistry::new(executor.clone()));
    let table = events();

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let registry = registry.clone();
            let table = table.clone();
            tokio::spawn(async move { registry.ensure_partition(&table, "202101", None).await })
        })
        .collect();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, PartitionError::Executor(_)));
    }

    assert_eq!(table.child_count(), 0);
    assert!(table.child("202101").is_none());
}
