//! 时间序列同步
//!
//! Broker 只返回定长采样数组而不带时间戳。同步器把多个等长序列按下标对齐，
//! 以调用方给定的 `now` 为最后一个采样点，向前按固定间隔倒推时间戳。

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use dashboard_core::{
    models::{metric, BrokerOverview, MessageStats, SampleLog, TimeSeriesPoint, SAMPLE_INTERVAL_MS},
    DashboardError, DashboardResult,
};

pub const RECV_OCT: &str = "recv_oct";
pub const SEND_OCT: &str = "send_oct";
pub const READY: &str = "ready";
pub const UNACKED: &str = "unacked";

/// 时间序列同步器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeriesSynchronizer {
    interval: Duration,
}

impl Default for TimeSeriesSynchronizer {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL_MS)
    }
}

impl TimeSeriesSynchronizer {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval: Duration::milliseconds(interval_ms),
        }
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval.num_milliseconds()
    }

    /// 对齐 k 个命名序列，返回 N 个时间升序的点
    ///
    /// 第 i 个点的时间戳为 `now - (N-1-i) * interval`，最后一个点恰好是 `now`。
    /// 序列少于两个、名称重复或长度不一致时返回 `Validation` 错误，不做截断或补齐。
    pub fn synchronize<'a, I>(&self, series: I, now: DateTime<Utc>) -> DashboardResult<Vec<TimeSeriesPoint>>
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])>,
    {
        let series: Vec<(&str, &[f64])> = series.into_iter().collect();
        if series.len() < 2 {
            return Err(DashboardError::validation(format!(
                "时间序列同步至少需要2个序列，实际为 {}",
                series.len()
            )));
        }

        let mut seen = HashSet::with_capacity(series.len());
        for (name, _) in &series {
            if !seen.insert(*name) {
                return Err(DashboardError::validation(format!("重复的序列名称: {name}")));
            }
        }

        let len = series[0].1.len();
        if let Some((name, values)) = series.iter().find(|(_, values)| values.len() != len) {
            return Err(DashboardError::validation(format!(
                "采样序列长度不一致: {} 长度为 {}，{} 长度为 {}",
                series[0].0,
                len,
                name,
                values.len()
            )));
        }

        let points = (0..len)
            .map(|i| {
                let steps_back = (len - 1 - i) as i32;
                let values: BTreeMap<String, f64> = series
                    .iter()
                    .map(|(name, values)| (name.to_string(), values[i]))
                    .collect();
                TimeSeriesPoint {
                    timestamp: now - self.interval * steps_back,
                    values,
                }
            })
            .collect();

        Ok(points)
    }

    pub fn synchronize_logs(&self, logs: &[&SampleLog], now: DateTime<Utc>) -> DashboardResult<Vec<TimeSeriesPoint>> {
        self.synchronize(logs.iter().map(|log| (log.name.as_str(), log.log.as_slice())), now)
    }

    /// 收发字节速率图表
    pub fn data_rate(&self, overview: &BrokerOverview, now: DateTime<Utc>) -> DashboardResult<Vec<TimeSeriesPoint>> {
        self.synchronize(
            [
                (RECV_OCT, overview.recv_oct_details.log.as_slice()),
                (SEND_OCT, overview.send_oct_details.log.as_slice()),
            ],
            now,
        )
    }

    /// 待投递与未确认消息数图表
    pub fn queued_messages(&self, overview: &BrokerOverview, now: DateTime<Utc>) -> DashboardResult<Vec<TimeSeriesPoint>> {
        self.synchronize(
            [
                (READY, overview.queue_totals.messages_ready_log.as_slice()),
                (UNACKED, overview.queue_totals.messages_unacknowledged_log.as_slice()),
            ],
            now,
        )
    }

    /// 消息速率图表
    ///
    /// 快照中缺失的指标不参与对齐；剩余指标不足两个时返回空图表。
    pub fn message_rates(&self, stats: &MessageStats, now: DateTime<Utc>) -> DashboardResult<Vec<TimeSeriesPoint>> {
        let logs: Vec<&SampleLog> = metric::MESSAGE_RATES
            .iter()
            .filter_map(|name| stats.get(name))
            .collect();
        if logs.len() < 2 {
            return Ok(Vec::new());
        }
        self.synchronize_logs(&logs, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dashboard_core::models::QueueTotals;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn overview(recv: Vec<f64>, send: Vec<f64>) -> BrokerOverview {
        BrokerOverview {
            object_totals: Default::default(),
            queue_totals: QueueTotals::default(),
            message_stats: MessageStats::new(),
            recv_oct_details: SampleLog::new(RECV_OCT, 0.0, recv),
            send_oct_details: SampleLog::new(SEND_OCT, 0.0, send),
            uptime: 0,
        }
    }

    #[test]
    fn test_data_rate_alignment() {
        let sync = TimeSeriesSynchronizer::new(5000);
        let points = sync
            .data_rate(&overview(vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]), now())
            .unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].timestamp, now() - Duration::milliseconds(10_000));
        assert_eq!(points[1].timestamp, now() - Duration::milliseconds(5_000));
        assert_eq!(points[2].timestamp, now());
        assert_eq!(points[0].value(RECV_OCT), Some(1.0));
        assert_eq!(points[0].value(SEND_OCT), Some(4.0));
        assert_eq!(points[1].value(RECV_OCT), Some(2.0));
        assert_eq!(points[1].value(SEND_OCT), Some(5.0));
        assert_eq!(points[2].value(RECV_OCT), Some(3.0));
        assert_eq!(points[2].value(SEND_OCT), Some(6.0));
    }

    #[test]
    fn test_timestamps_strictly_increasing() {
        let sync = TimeSeriesSynchronizer::default();
        let a: Vec<f64> = (0..60).map(f64::from).collect();
        let b = vec![0.5; 60];
        let c = vec![1.5; 60];
        let points = sync
            .synchronize([("a", a.as_slice()), ("b", b.as_slice()), ("c", c.as_slice())], now())
            .unwrap();

        assert_eq!(points.len(), 60);
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(points[59].timestamp, now());
        assert!(points.iter().all(|p| p.values.len() == 3));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let sync = TimeSeriesSynchronizer::default();
        let result = sync.data_rate(&overview(vec![1.0, 2.0, 3.0], vec![4.0, 5.0]), now());
        assert!(matches!(result, Err(DashboardError::Validation(_))));
    }

    #[test]
    fn test_arity_and_duplicates_rejected() {
        let sync = TimeSeriesSynchronizer::default();
        let values = [1.0, 2.0];

        let single = sync.synchronize([("a", &values[..])], now());
        assert!(matches!(single, Err(DashboardError::Validation(_))));

        let duplicate = sync.synchronize([("a", &values[..]), ("a", &values[..])], now());
        assert!(matches!(duplicate, Err(DashboardError::Validation(_))));
    }

    #[test]
    fn test_empty_series_produce_no_points() {
        let sync = TimeSeriesSynchronizer::default();
        let points = sync.data_rate(&overview(vec![], vec![]), now()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_message_rates_skip_missing_metrics() {
        let sync = TimeSeriesSynchronizer::default();
        let stats: MessageStats = vec![
            SampleLog::new(metric::ACK, 1.0, vec![1.0, 2.0]),
            SampleLog::new(metric::PUBLISH, 2.0, vec![3.0, 4.0]),
        ]
        .into_iter()
        .collect();

        let points = sync.message_rates(&stats, now()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].value(metric::PUBLISH), Some(4.0));
        assert_eq!(points[1].value(metric::REJECT), None);

        let sparse: MessageStats = vec![SampleLog::new(metric::ACK, 1.0, vec![1.0])]
            .into_iter()
            .collect();
        assert!(sync.message_rates(&sparse, now()).unwrap().is_empty());
    }
}
