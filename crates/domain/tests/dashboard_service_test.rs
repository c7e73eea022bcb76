use std::sync::Arc;

use chrono::Duration;
use dashboard_core::{
    models::{metric, CursorBasis, ExecutionCursor, QueueState, Task},
    DashboardError, FixedClock,
};
use dashboard_domain::{
    CatalogFilter, DashboardService, ExecutionDuration, ExecutionHistoryPaginator, SectionState, PAGE_SIZE,
};
use dashboard_testing_utils::{
    base_time, broker_overview, log_entry, ExecutionRecordBuilder, MockBrokerClient, MockExecutionRepository,
    MockLogRepository, MockSchedulerClient, QueueSnapshotBuilder,
};
use uuid::Uuid;

fn service(
    broker: MockBrokerClient,
    scheduler: MockSchedulerClient,
    executions: MockExecutionRepository,
    logs: MockLogRepository,
) -> DashboardService {
    DashboardService::new(
        Arc::new(broker),
        Arc::new(scheduler),
        Arc::new(executions),
        Arc::new(logs),
        Arc::new(FixedClock::new(base_time())),
    )
}

#[tokio::test]
async fn test_overview_synchronizes_charts() {
    let executions = MockExecutionRepository::with_records(vec![
        ExecutionRecordBuilder::new("a")
            .succeeded(base_time() - Duration::hours(1), base_time())
            .build(),
        ExecutionRecordBuilder::new("a")
            .failed(base_time() - Duration::hours(2), base_time(), "boom")
            .build(),
        ExecutionRecordBuilder::new("a")
            .succeeded(base_time() - Duration::hours(30), base_time() - Duration::hours(29))
            .build(),
    ]);
    let broker = MockBrokerClient::new().with_overview(broker_overview(3, 4, 2, 90_061));
    let service = service(broker, MockSchedulerClient::new(), executions, MockLogRepository::new());

    let view = service.overview().await.unwrap();

    let broker = view.broker.data().unwrap();
    assert_eq!(broker.queues, 4);
    assert_eq!(broker.consumers, 2);
    assert_eq!(broker.uptime_label, "1d 1h 1m 1s");
    assert_eq!(broker.data_rate.len(), 3);
    assert_eq!(broker.data_rate[2].timestamp, base_time());
    assert_eq!(broker.data_rate[0].timestamp, base_time() - Duration::milliseconds(10_000));
    assert_eq!(broker.data_rate[0].value("recv_oct"), Some(1.0));
    assert_eq!(broker.data_rate[0].value("send_oct"), Some(4.0));
    assert_eq!(broker.queued_messages[1].value("ready"), Some(101.0));
    assert_eq!(broker.message_rates[0].values.len(), metric::MESSAGE_RATES.len());

    let activity = view.activity.data().unwrap();
    assert_eq!(activity.executions, 2);
    assert_eq!(activity.errors, 1);
}

#[tokio::test]
async fn test_overview_sections_degrade_independently() {
    let service = service(
        MockBrokerClient::unavailable(),
        MockSchedulerClient::new(),
        MockExecutionRepository::new(),
        MockLogRepository::new(),
    );
    let view = service.overview().await.unwrap();
    assert!(!view.broker.is_available());
    assert!(view.activity.is_available());

    let service = service_with_store_down();
    let view = service.overview().await.unwrap();
    assert!(view.broker.is_available());
    assert!(!view.activity.is_available());
}

fn service_with_store_down() -> DashboardService {
    service(
        MockBrokerClient::new().with_overview(broker_overview(2, 1, 1, 5)),
        MockSchedulerClient::new(),
        MockExecutionRepository::unavailable(),
        MockLogRepository::new(),
    )
}

#[tokio::test]
async fn test_overview_mismatched_broker_logs_fail() {
    let mut overview = broker_overview(3, 1, 1, 5);
    overview.send_oct_details.log.pop();
    let service = service(
        MockBrokerClient::new().with_overview(overview),
        MockSchedulerClient::new(),
        MockExecutionRepository::new(),
        MockLogRepository::new(),
    );

    let error = service.overview().await.unwrap_err();
    assert!(matches!(error, DashboardError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_catalog_left_join_with_missing_queue() {
    let scheduler = MockSchedulerClient::with_tasks(vec![
        Task::new("b").with_tags(["billing"]),
        Task::new("a"),
    ]);
    let broker = MockBrokerClient::new().with_queues(vec![
        QueueSnapshotBuilder::new("b")
            .vhost("jobs")
            .counts(3, 2)
            .rate(metric::ACK, 1.5, vec![])
            .rate(metric::REDELIVER, 0.2, vec![])
            .rate(metric::REJECT, 0.1, vec![])
            .build(),
        QueueSnapshotBuilder::new("unrelated").counts(100, 0).build(),
    ]);
    let service = service(broker, scheduler, MockExecutionRepository::new(), MockLogRepository::new());

    let view = service.task_catalog(&CatalogFilter::default()).await.unwrap();

    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].name, "a");
    assert_eq!(view.rows[0].pending, 0);
    assert_eq!(view.rows[0].success_rate, 0.0);
    assert_eq!(view.rows[0].error_rate, 0.0);
    assert_eq!(view.rows[0].vhost, None);
    assert_eq!(view.rows[1].pending, 5);
    assert_eq!(view.rows[1].success_rate, 1.5);
    assert_eq!(view.rows[1].error_rate, 0.2 + 0.1);
    assert_eq!(view.rows[1].vhost.as_deref(), Some("jobs"));
    assert_eq!(view.rows[1].queue_state, Some(QueueState::Running));
    assert_eq!(view.queues, SectionState::Available { data: 2 });
}

#[tokio::test]
async fn test_catalog_broker_down_uses_zero_fallback() {
    let scheduler = MockSchedulerClient::with_tasks(vec![Task::new("a"), Task::new("b")]);
    let service = service(
        MockBrokerClient::unavailable(),
        scheduler,
        MockExecutionRepository::new(),
        MockLogRepository::new(),
    );

    let view = service.task_catalog(&CatalogFilter::new("b")).await.unwrap();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].pending, 0);
    assert!(!view.queues.is_available());
}

#[tokio::test]
async fn test_catalog_scheduler_down_fails() {
    let service = service(
        MockBrokerClient::new(),
        MockSchedulerClient::unavailable(),
        MockExecutionRepository::new(),
        MockLogRepository::new(),
    );
    let error = service.task_catalog(&CatalogFilter::default()).await.unwrap_err();
    assert!(error.is_unavailable());
}

fn history(task: &str, count: usize, same_instant_every: usize) -> Vec<dashboard_core::models::ExecutionRecord> {
    (0..count)
        .map(|i| {
            ExecutionRecordBuilder::new(task)
                .with_id(Uuid::from_u128(i as u128 + 1))
                .published_secs((i / same_instant_every) as i64)
                .build()
        })
        .collect()
}

#[tokio::test]
async fn test_pages_concatenate_without_gaps_or_duplicates() {
    let mut records = history("job", 250, 7);
    records.extend(history("other", 30, 1));
    let repo = MockExecutionRepository::with_records(records.clone());
    let paginator = ExecutionHistoryPaginator::new(Arc::new(repo), CursorBasis::Published);

    let mut seen: Vec<ExecutionCursor> = Vec::new();
    let mut after = None;
    let mut pages = 0;
    loop {
        let page = paginator.page("job", after).await.unwrap();
        pages += 1;
        assert_eq!(page.has_more, page.rows.len() == PAGE_SIZE);
        assert!(page.stats.total_exec >= page.rows.len() as u64);
        assert_eq!(page.stats.total_exec, 250);
        seen.extend(page.rows.iter().map(|r| r.cursor));
        if !page.has_more {
            break;
        }
        after = page.next_after;
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 250);
    assert!(seen.windows(2).all(|w| w[0] > w[1]));

    let mut expected: Vec<ExecutionCursor> = records
        .iter()
        .filter(|r| r.task_name == "job")
        .map(|r| r.cursor)
        .collect();
    expected.sort_by(|a, b| b.cmp(a));
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_exactly_full_last_page_is_followed_by_empty_page() {
    let repo = MockExecutionRepository::with_records(history("job", PAGE_SIZE, 1));
    let paginator = ExecutionHistoryPaginator::new(Arc::new(repo), CursorBasis::Published);

    let first = paginator.page("job", None).await.unwrap();
    assert_eq!(first.rows.len(), PAGE_SIZE);
    assert!(first.has_more);
    assert_eq!(first.next_after, Some(first.rows[PAGE_SIZE - 1].cursor));

    let second = paginator.page("job", first.next_after).await.unwrap();
    assert!(second.rows.is_empty());
    assert!(!second.has_more);
    assert_eq!(second.next_after, None);
    assert_eq!(second.stats.total_exec, PAGE_SIZE as u64);
}

#[tokio::test]
async fn test_pages_stable_under_head_inserts() {
    let repo = MockExecutionRepository::with_records(history("job", 150, 1));
    let paginator = ExecutionHistoryPaginator::new(Arc::new(repo.clone()), CursorBasis::Published);

    let first = paginator.page("job", None).await.unwrap();
    assert_eq!(first.rows.len(), PAGE_SIZE);
    assert!(first.has_more);

    repo.insert(
        ExecutionRecordBuilder::new("job")
            .published_secs(10_000)
            .build(),
    );

    let second = paginator.page("job", first.next_after).await.unwrap();
    assert_eq!(second.rows.len(), 50);
    assert!(!second.has_more);
    assert_eq!(second.next_after, None);
    assert!(second.rows.iter().all(|row| row.cursor < first.rows[PAGE_SIZE - 1].cursor));
    assert_eq!(second.stats.total_exec, 151);
}

#[tokio::test]
async fn test_task_detail_renders_history_and_queue() {
    let scheduler = MockSchedulerClient::with_tasks(vec![Task::new("job")]);
    let broker = MockBrokerClient::new().with_queues(vec![
        QueueSnapshotBuilder::new("job")
            .counts(1, 1)
            .rate(metric::ACK, 2.0, vec![1.0, 2.0])
            .rate(metric::PUBLISH, 3.0, vec![3.0, 4.0])
            .build(),
    ]);
    let executions = MockExecutionRepository::with_records(vec![
        ExecutionRecordBuilder::new("job").published_secs(0).build(),
        ExecutionRecordBuilder::new("job")
            .published_secs(1)
            .running(base_time() + Duration::seconds(2))
            .build(),
        ExecutionRecordBuilder::new("job")
            .published_secs(2)
            .succeeded(base_time() + Duration::seconds(3), base_time() + Duration::milliseconds(7_500))
            .build(),
    ]);
    let service = service(broker, scheduler, executions, MockLogRepository::new());

    let view = service.task_detail("job", None, None).await.unwrap();
    assert_eq!(view.vhost, "/");

    let queue = view.queue.data().unwrap();
    assert_eq!(queue.metrics.pending, 2);
    assert_eq!(queue.message_rates.len(), 2);

    let history = view.history.data().unwrap();
    assert_eq!(history.stats.total_exec, 3);
    assert_eq!(history.stats.total_success, 1);
    assert!(!history.has_more);
    let durations: Vec<&ExecutionDuration> = history.executions.iter().map(|e| &e.duration).collect();
    assert_eq!(
        durations,
        vec![
            &ExecutionDuration::Elapsed {
                millis: 4_500,
                label: "4.5s".to_string()
            },
            &ExecutionDuration::InProgress,
            &ExecutionDuration::Planned,
        ]
    );
}

#[tokio::test]
async fn test_task_detail_unknown_vhost_gives_zero_metrics() {
    let scheduler = MockSchedulerClient::with_tasks(vec![Task::new("job")]);
    let broker = MockBrokerClient::new().with_queues(vec![QueueSnapshotBuilder::new("job").counts(9, 0).build()]);
    let service = service(broker, scheduler, MockExecutionRepository::new(), MockLogRepository::new());

    let view = service.task_detail("job", Some("elsewhere"), None).await.unwrap();
    assert_eq!(view.vhost, "elsewhere");
    let queue = view.queue.data().unwrap();
    assert!(queue.snapshot.is_none());
    assert_eq!(queue.metrics.pending, 0);
}

#[tokio::test]
async fn test_task_detail_missing_task_is_not_found() {
    let service = service(
        MockBrokerClient::new(),
        MockSchedulerClient::new(),
        MockExecutionRepository::new(),
        MockLogRepository::new(),
    );
    let error = service.task_detail("ghost", None, None).await.unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_execution_detail_and_redispatch() {
    let record = ExecutionRecordBuilder::new("job").published_secs(0).build();
    let task_id = record.task_id;
    let executions = MockExecutionRepository::new();
    executions.insert_with_parameters(record, serde_json::json!({"to": "ops@example.com"}));

    let logs = MockLogRepository::with_entries(vec![
        log_entry(task_id, "info", "started", base_time()),
        log_entry(task_id, "error", "failed", base_time() + Duration::seconds(5)),
        log_entry(Uuid::new_v4(), "info", "unrelated", base_time()),
    ]);
    let scheduler = MockSchedulerClient::with_tasks(vec![Task::new("job")]);
    let service = service(MockBrokerClient::new(), scheduler.clone(), executions, logs);

    let detail = service.execution_detail(task_id).await.unwrap();
    assert_eq!(detail.task_name, "job");
    assert_eq!(detail.logs.len(), 2);
    assert_eq!(detail.logs[0].message, "failed");
    assert_eq!(detail.parameters["to"], "ops@example.com");

    let accepted = service.redispatch(task_id).await.unwrap();
    assert_eq!(accepted.task_name, "job");
    assert_eq!(
        scheduler.dispatched(),
        vec![("job".to_string(), serde_json::json!({"to": "ops@example.com"}))]
    );
}

#[tokio::test]
async fn test_unknown_execution_is_not_found() {
    let service = service(
        MockBrokerClient::new(),
        MockSchedulerClient::new(),
        MockExecutionRepository::new(),
        MockLogRepository::new(),
    );
    assert!(service.execution_detail(Uuid::new_v4()).await.unwrap_err().is_not_found());
    assert!(service.redispatch(Uuid::new_v4()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_dispatch_requires_object_parameters() {
    let scheduler = MockSchedulerClient::with_tasks(vec![Task::new("job")]);
    let service = service(
        MockBrokerClient::new(),
        scheduler.clone(),
        MockExecutionRepository::new(),
        MockLogRepository::new(),
    );

    let error = service.dispatch("job", serde_json::json!([1, 2])).await.unwrap_err();
    assert!(matches!(error, DashboardError::Validation(_)));
    assert!(scheduler.dispatched().is_empty());

    service.dispatch("job", serde_json::json!({"n": 1})).await.unwrap();
    assert_eq!(scheduler.dispatched().len(), 1);
}
