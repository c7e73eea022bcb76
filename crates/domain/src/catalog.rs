//! 任务目录连接
//!
//! 以任务名左连接调度器任务与 Broker 队列快照。每个任务恰好出现一次，
//! 没有匹配队列的任务使用全零指标；没有对应任务的队列不展示。

use std::collections::HashMap;

use dashboard_core::models::{QueueSnapshot, Task};
use serde::{Deserialize, Serialize};

use crate::queue_metrics::{MetricRateAggregator, QueueMetrics};

/// 目录筛选条件
///
/// 对任务名或任意标签做子串匹配，默认区分大小写。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub query: Option<String>,
    #[serde(default)]
    pub ignore_case: bool,
}

impl CatalogFilter {
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: Some(query.into()),
            ignore_case: false,
        }
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };

        if self.ignore_case {
            let needle = query.to_lowercase();
            task.name.to_lowercase().contains(&needle)
                || task.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
        } else {
            task.name.contains(query) || task.tags.iter().any(|tag| tag.contains(query))
        }
    }
}

/// 连接后的目录条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub task: Task,
    pub queue: Option<QueueSnapshot>,
    pub metrics: QueueMetrics,
}

/// 连接、筛选并按任务名升序排序
///
/// 输入切片不会被修改。队列名重复时取第一个。
pub fn join_catalog(tasks: &[Task], queues: &[QueueSnapshot], filter: &CatalogFilter) -> Vec<CatalogEntry> {
    let mut index: HashMap<&str, &QueueSnapshot> = HashMap::with_capacity(queues.len());
    for queue in queues {
        index.entry(queue.name.as_str()).or_insert(queue);
    }

    let mut entries: Vec<CatalogEntry> = tasks
        .iter()
        .filter(|task| filter.matches(task))
        .map(|task| {
            let queue = index.get(task.name.as_str()).copied();
            CatalogEntry {
                task: task.clone(),
                queue: queue.cloned(),
                metrics: MetricRateAggregator::aggregate(queue),
            }
        })
        .collect();

    entries.sort_by(|a, b| a.task.name.cmp(&b.task.name));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::{metric, MessageStats, QueueState, SampleLog};

    fn queue(name: &str, ready: u64) -> QueueSnapshot {
        QueueSnapshot {
            vhost: "/".to_string(),
            name: name.to_string(),
            ready,
            unacked: 0,
            state: QueueState::Running,
            message_stats: vec![SampleLog::new(metric::ACK, 2.0, Vec::new())]
                .into_iter()
                .collect::<MessageStats>(),
        }
    }

    #[test]
    fn test_left_join_keeps_every_task() {
        let tasks = vec![Task::new("b"), Task::new("a"), Task::new("c")];
        let queues = vec![queue("b", 4), queue("orphan", 9)];

        let entries = join_catalog(&tasks, &queues, &CatalogFilter::default());
        let names: Vec<&str> = entries.iter().map(|e| e.task.name.as_str()).collect();

        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(entries[1].metrics.pending, 4);
        assert_eq!(entries[1].metrics.success_rate, 2.0);
        assert!(entries[0].queue.is_none());
        assert_eq!(entries[0].metrics, QueueMetrics::default());
    }

    #[test]
    fn test_task_without_queue_is_zero() {
        let entries = join_catalog(&[Task::new("a")], &[], &CatalogFilter::default());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].task.name, "a");
        assert_eq!(entries[0].metrics.pending, 0);
        assert_eq!(entries[0].metrics.success_rate, 0.0);
        assert_eq!(entries[0].metrics.error_rate, 0.0);
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let tasks = vec![Task::new("zeta"), Task::new("Alpha"), Task::new("alpha")];
        let before = tasks.clone();

        let first = join_catalog(&tasks, &[], &CatalogFilter::default());
        let second = join_catalog(&tasks, &[], &CatalogFilter::default());

        assert_eq!(tasks, before);
        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|e| e.task.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "zeta"]);
    }

    #[test]
    fn test_duplicate_queue_names_first_wins() {
        let entries = join_catalog(
            &[Task::new("a")],
            &[queue("a", 1), queue("a", 2)],
            &CatalogFilter::default(),
        );
        assert_eq!(entries[0].metrics.pending, 1);
    }

    #[test]
    fn test_filter_matches_name_or_tag() {
        let tasks = vec![
            Task::new("send-email").with_tags(["Notify"]),
            Task::new("resize-image").with_tags(["media"]),
            Task::new("cleanup"),
        ];

        let by_name = join_catalog(&tasks, &[], &CatalogFilter::new("email"));
        assert_eq!(by_name.len(), 1);

        let by_tag = join_catalog(&tasks, &[], &CatalogFilter::new("med"));
        assert_eq!(by_tag[0].task.name, "resize-image");

        let case_sensitive = join_catalog(&tasks, &[], &CatalogFilter::new("notify"));
        assert!(case_sensitive.is_empty());

        let case_insensitive = join_catalog(&tasks, &[], &CatalogFilter::new("notify").ignoring_case());
        assert_eq!(case_insensitive[0].task.name, "send-email");

        let empty = join_catalog(&tasks, &[], &CatalogFilter::new(""));
        assert_eq!(empty.len(), 3);
    }
}
