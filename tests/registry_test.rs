//! Tests for partition attachment through the registry.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;

use common::{FailingExecutor, FlakyExecutor};
use partition_registry::partition::{
    DdlEvent, ExecutorError, LabelError, PartitionBounds, PartitionError, PartitionLabel,
    PartitionNode, PartitionRange, PartitionRegistry, PartitionStrategy, RecordingExecutor,
    SchemaInstruction,
};

fn events() -> Arc<PartitionNode> {
    PartitionNode::root("events", PartitionStrategy::range("created"))
}

fn recording() -> (Arc<RecordingExecutor>, PartitionRegistry) {
    let executor = Arc::new(RecordingExecutor::new());
    let registry = PartitionRegistry::new(executor.clone());
    (executor, registry)
}

#[tokio::test]
async fn test_first_call_attaches_and_emits() {
    let (executor, registry) = recording();
    let table = events();

    let node = registry.ensure_partition(&table, "202101", None).await.unwrap();

    assert_eq!(node.table_name(), "events_202101");
    assert_eq!(node.label(), Some("202101"));
    assert_eq!(node.range(), PartitionRange::month(2021, 1));
    assert!(!node.is_partitioned());
    assert!(Arc::ptr_eq(&node.parent().unwrap(), &table));

    assert_eq!(
        executor.instructions(),
        vec![
            SchemaInstruction::Dependency {
                child: "events_202101".to_string(),
                parent: "events".to_string(),
            },
            SchemaInstruction::DeferredDdl {
                event: DdlEvent::AfterParentCreated,
                statement: "ALTER TABLE events ATTACH PARTITION events_202101\n\
                            FOR VALUES FROM ('2021-01-01') TO ('2021-02-01');"
                    .to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_second_call_is_idempotent() {
    let (executor, registry) = recording();
    let table = events();

    let first = registry.ensure_partition(&table, "202101", None).await.unwrap();
    let second = registry.ensure_partition(&table, "202101", None).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(executor.ddl_count(), 1);
    assert_eq!(executor.instructions().len(), 2);
    assert_eq!(table.child_count(), 1);
}

#[tokio::test]
async fn test_december_rolls_into_next_year() {
    let (executor, registry) = recording();
    let table = events();

    registry.ensure_partition(&table, "202112", None).await.unwrap();

    assert_eq!(
        executor.statements(),
        vec!["ALTER TABLE events ATTACH PARTITION events_202112\n\
              FOR VALUES FROM ('2021-12-01') TO ('2022-01-01');"
            .to_string()]
    );
}

#[tokio::test]
async fn test_invalid_labels_leave_table_untouched() {
    let (executor, registry) = recording();
    let table = events();

    for label in ["2021", "202113", "abcdef", "202100", "2021011"] {
        let err = registry.ensure_partition(&table, label, None).await.unwrap_err();
        assert!(
            matches!(err, PartitionError::InvalidLabel(_)),
            "{} gave {:?}",
            label,
            err
        );
        assert!(err.is_caller_error());
    }

    assert_eq!(table.child_count(), 0);
    assert!(table.child("2021").is_none());
    assert!(executor.instructions().is_empty());
}

#[tokio::test]
async fn test_invalid_label_error_carries_label() {
    let (_, registry) = recording();
    let err = registry.ensure_partition(&events(), "202113", None).await.unwrap_err();
    assert_eq!(
        err,
        PartitionError::InvalidLabel(LabelError::MonthOutOfRange {
            label: "202113".to_string(),
            month: 13,
        })
    );
}

#[tokio::test]
async fn test_unpartitioned_table_is_rejected() {
    let (executor, registry) = recording();
    let table = events();
    let leaf = registry.ensure_partition(&table, "202101", None).await.unwrap();
    executor.drain();

    let err = registry.ensure_partition(&leaf, "202102", None).await.unwrap_err();

    assert_eq!(
        err,
        PartitionError::NotPartitioned {
            table: "events_202101".to_string()
        }
    );
    assert!(executor.instructions().is_empty());
}

#[tokio::test]
async fn test_sub_partitioned_month() {
    let (executor, registry) = recording();
    let table = events();

    let month = registry
        .ensure_partition(&table, "202101", Some(PartitionStrategy::list("region")))
        .await
        .unwrap();

    assert!(month.is_partitioned());
    assert_eq!(month.partition_by_clause().as_deref(), Some("LIST (region)"));
    assert_eq!(
        executor.instructions(),
        vec![
            SchemaInstruction::Dependency {
                child: "events_202101".to_string(),
                parent: "events".to_string(),
            },
            SchemaInstruction::PartitionedBy {
                table: "events_202101".to_string(),
                partition_by: "LIST (region)".to_string(),
            },
            SchemaInstruction::DeferredDdl {
                event: DdlEvent::AfterParentCreated,
                statement: "ALTER TABLE events ATTACH PARTITION events_202101\n\
                            FOR VALUES FROM ('2021-01-01') TO ('2021-02-01');"
                    .to_string(),
            },
        ]
    );

    let emea = registry.ensure_partition(&month, "emea", None).await.unwrap();

    assert_eq!(emea.table_name(), "events_202101_emea");
    assert_eq!(
        emea.bounds(),
        Some(&PartitionBounds::List {
            values: vec!["emea".to_string()]
        })
    );
    assert!(emea.range().is_none());
    assert!(Arc::ptr_eq(&emea.parent().unwrap(), &month));
    assert_eq!(
        executor.statements().last().map(String::as_str),
        Some("ALTER TABLE events_202101 ATTACH PARTITION events_202101_emea\nFOR VALUES IN ('emea');")
    );
    assert_eq!(month.child_labels(), vec!["emea".to_string()]);
}

#[tokio::test]
async fn test_sub_strategy_ignored_for_existing_partition() {
    let (_, registry) = recording();
    let table = events();

    let plain = registry.ensure_partition(&table, "202103", None).await.unwrap();
    let again = registry
        .ensure_partition(&table, "202103", Some(PartitionStrategy::list("region")))
        .await
        .unwrap();

    assert!(Arc::ptr_eq(&plain, &again));
    assert!(!again.is_partitioned());
}

#[tokio::test]
async fn test_list_partition_rejects_unsafe_value() {
    let (executor, registry) = recording();
    let table = PartitionNode::root("orders", PartitionStrategy::list("region"));

    let err = registry
        .ensure_partition(&table, "eu'; DROP TABLE orders; --", None)
        .await
        .unwrap_err();

    assert!(matches!(err, PartitionError::InvalidLabel(LabelError::InvalidListValue { .. })));
    assert_eq!(table.child_count(), 0);
    assert!(executor.instructions().is_empty());
}

#[tokio::test]
async fn test_executor_failure_propagates_without_entry() {
    let executor = Arc::new(FailingExecutor::new());
    let registry = PartitionRegistry::new(executor.clone());
    let table = events();

    let err = registry.ensure_partition(&table, "202101", None).await.unwrap_err();

    assert_eq!(
        err,
        PartitionError::Executor(ExecutorError::DependencyUnsatisfied {
            child: "events_202101".to_string(),
            parent: "events".to_string(),
        })
    );
    assert!(err.is_warning());
    assert!(table.child("202101").is_none());
    assert_eq!(table.child_count(), 0);
}

#[tokio::test]
async fn test_retry_after_executor_failure() {
    let executor = Arc::new(FlakyExecutor::new(1));
    let registry = PartitionRegistry::new(executor.clone());
    let table = events();

    assert!(registry.ensure_partition(&table, "202104", None).await.is_err());
    let node = registry.ensure_partition(&table, "202104", None).await.unwrap();

    assert_eq!(node.table_name(), "events_202104");
    assert_eq!(executor.ddl_count(), 1);
    assert!(Arc::ptr_eq(&table.child("202104").unwrap(), &node));
}

#[tokio::test]
async fn test_ensure_for_date() {
    let (executor, registry) = recording();
    let table = events();

    let node = registry
        .ensure_for_date(&table, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        .await
        .unwrap();

    assert_eq!(node.label(), Some("202402"));
    assert_eq!(
        executor.statements(),
        vec!["ALTER TABLE events ATTACH PARTITION events_202402\n\
              FOR VALUES FROM ('2024-02-01') TO ('2024-03-01');"
            .to_string()]
    );
}

#[tokio::test]
async fn test_ensure_months_spans_year_boundary() {
    let (executor, registry) = recording();
    let table = events();
    let first = PartitionLabel::parse("202111").unwrap();
    let last = PartitionLabel::parse("202202").unwrap();

    let nodes = registry.ensure_months(&table, first, last).await.unwrap();

    let names: Vec<&str> = nodes.iter().map(|n| n.table_name()).collect();
    assert_eq!(
        names,
        vec!["events_202111", "events_202112", "events_202201", "events_202202"]
    );
    assert_eq!(executor.ddl_count(), 4);

    // Consecutive months tile without gaps.
    for pair in nodes.windows(2) {
        let (a, b) = (pair[0].range().unwrap(), pair[1].range().unwrap());
        assert_eq!(a.end, b.start);
    }
}

#[tokio::test]
async fn test_children_listed_in_label_order() {
    let (_, registry) = recording();
    let table = events();

    for label in ["202105", "202012", "202101"] {
        registry.ensure_partition(&table, label, None).await.unwrap();
    }

    assert_eq!(
        table.child_labels(),
        vec!["202012".to_string(), "202101".to_string(), "202105".to_string()]
    );
    assert_eq!(table.children().len(), 3);
}

#[tokio::test]
async fn test_tables_do_not_share_children() {
    let (_, registry) = recording();
    let events = events();
    let audits = PartitionNode::root("audits", PartitionStrategy::range("created"));

    let a = registry.ensure_partition(&events, "202101", None).await.unwrap();
    let b = registry.ensure_partition(&audits, "202101", None).await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(b.table_name(), "audits_202101");
}
