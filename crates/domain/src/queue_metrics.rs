use dashboard_core::models::{metric, QueueSnapshot};
use serde::{Deserialize, Serialize};

/// 队列的复合健康指标
///
/// 由 `MetricRateAggregator` 从队列快照的原始计数推导：
/// - `pending = ready + unacked`
/// - `success_rate = ack.rate`
/// - `error_rate = redeliver.rate + reject.rate`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct QueueMetrics {
    pub pending: u64,
    pub success_rate: f64,
    pub error_rate: f64,
}

/// 队列速率聚合器
pub struct MetricRateAggregator;

impl MetricRateAggregator {
    /// 快照缺失时返回全零指标
    pub fn aggregate(snapshot: Option<&QueueSnapshot>) -> QueueMetrics {
        let Some(snapshot) = snapshot else {
            return QueueMetrics::default();
        };
        let stats = &snapshot.message_stats;

        QueueMetrics {
            pending: snapshot.ready.saturating_add(snapshot.unacked),
            success_rate: stats.rate(metric::ACK),
            error_rate: stats.rate(metric::REDELIVER) + stats.rate(metric::REJECT),
        }
    }
}

impl From<Option<&QueueSnapshot>> for QueueMetrics {
    fn from(snapshot: Option<&QueueSnapshot>) -> Self {
        MetricRateAggregator::aggregate(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::{MessageStats, QueueState, SampleLog};

    fn snapshot(ready: u64, unacked: u64, rates: &[(&str, f64)]) -> QueueSnapshot {
        QueueSnapshot {
            vhost: "/".to_string(),
            name: "orders".to_string(),
            ready,
            unacked,
            state: QueueState::Running,
            message_stats: rates
                .iter()
                .map(|(name, rate)| SampleLog::new(*name, *rate, Vec::new()))
                .collect::<MessageStats>(),
        }
    }

    #[test]
    fn test_aggregate_snapshot() {
        let queue = snapshot(
            3,
            2,
            &[(metric::ACK, 1.5), (metric::REDELIVER, 0.2), (metric::REJECT, 0.1)],
        );
        let metrics = MetricRateAggregator::aggregate(Some(&queue));

        assert_eq!(metrics.pending, 5);
        assert_eq!(metrics.success_rate, 1.5);
        assert_eq!(metrics.error_rate, 0.2 + 0.1);
        assert!((metrics.error_rate - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_missing_rates_are_zero() {
        let queue = snapshot(7, 0, &[(metric::PUBLISH, 9.0)]);
        let metrics = MetricRateAggregator::aggregate(Some(&queue));

        assert_eq!(metrics.pending, 7);
        assert_eq!(metrics.success_rate, 0.0);
        assert_eq!(metrics.error_rate, 0.0);
    }

    #[test]
    fn test_absent_snapshot_is_zero() {
        assert_eq!(QueueMetrics::from(None), QueueMetrics::default());
    }
}
