/// 把秒数格式化为 `"1d 2h 3m 4.5s"`
///
/// 高位为0的单位省略，一旦出现较高位单位则其后的单位全部保留；秒保留一位小数。
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let total = seconds.floor() as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = ((seconds % 60.0) * 10.0).round() / 10.0;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{secs}s"));

    parts.join(" ")
}

/// 毫秒版本，执行耗时以毫秒存储
pub fn format_duration_ms(millis: i64) -> String {
    format_duration(millis as f64 / 1000.0)
}
