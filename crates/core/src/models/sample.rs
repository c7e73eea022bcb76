use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broker 采样间隔（毫秒）
pub const SAMPLE_INTERVAL_MS: i64 = 5000;

/// 定长数值采样序列
///
/// 同一快照内的所有采样序列共享相同长度和采样间隔，最后一个采样对应读取时刻。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SampleLog {
    pub name: String,
    /// 当前速率
    pub rate: f64,
    pub log: Vec<f64>,
}

impl SampleLog {
    pub fn new<S: Into<String>>(name: S, rate: f64, log: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            rate,
            log,
        }
    }
    pub fn len(&self) -> usize {
        self.log.len()
    }
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

/// 对齐后的时间点，仅由时间序列同步器生成，不持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl TimeSeriesPoint {
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_series_point_serializes_flat() {
        let point = TimeSeriesPoint {
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            values: BTreeMap::from([("recv_oct".to_string(), 1.0), ("send_oct".to_string(), 4.0)]),
        };

        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"timestamp": 1_700_000_000_000i64, "recv_oct": 1.0, "send_oct": 4.0})
        );
        assert_eq!(point.value("send_oct"), Some(4.0));
        assert_eq!(point.value("ack"), None);
    }
}
