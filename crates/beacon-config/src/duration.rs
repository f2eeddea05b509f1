use std::{fmt, time::Duration};

use serde::de::{self, Deserializer, Visitor};

use crate::error::ConfigError;

/// 单位表：别名列表与对应的纳秒倍数。
const UNITS: &[(&[&str], u128)] = &[
    (&["ns", "nano", "nanos", "nanosecond", "nanoseconds"], 1),
    (&["us", "micro", "micros", "microsecond", "microseconds"], 1_000),
    (&["ms", "milli", "millis", "millisecond", "milliseconds"], 1_000_000),
    (&["s", "sec", "secs", "second", "seconds"], NANOS_PER_SECOND),
    (&["m", "min", "mins", "minute", "minutes"], 60 * NANOS_PER_SECOND),
    (&["h", "hour", "hours"], 3_600 * NANOS_PER_SECOND),
    (&["d", "day", "days"], 86_400 * NANOS_PER_SECOND),
];

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// 解析 `"<n> <unit>"` 形式的时长；不带单位的整数按毫秒解释。
///
/// # 契约说明（What）
/// - 数字与单位之间的空白可有可无（`"30s"` 与 `"30 seconds"` 等价），首尾空白被忽略；
/// - 数字只接受非负整数，单位大小写敏感；
/// - 结果超出 [`Duration`] 可表示范围时返回错误，而不是截断。
pub fn parse_duration(text: &str) -> Result<Duration, ConfigError> {
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(ConfigError::duration(text, "expected a leading integer"));
    }
    let amount: u128 = digits
        .parse()
        .map_err(|_| ConfigError::duration(text, "integer out of range"))?;

    let unit = unit.trim_start();
    let scale = if unit.is_empty() {
        1_000_000
    } else {
        UNITS
            .iter()
            .find(|(aliases, _)| aliases.contains(&unit))
            .map(|(_, scale)| *scale)
            .ok_or_else(|| ConfigError::duration(text, format!("unknown time unit `{unit}`")))?
    };

    let nanos = amount
        .checked_mul(scale)
        .ok_or_else(|| ConfigError::duration(text, "duration overflows"))?;
    let secs = u64::try_from(nanos / NANOS_PER_SECOND)
        .map_err(|_| ConfigError::duration(text, "duration overflows"))?;
    Ok(Duration::new(secs, (nanos % NANOS_PER_SECOND) as u32))
}

/// 以能整除的最大单位渲染时长，例如 `1 hour`、`90 seconds`、`250 ms`。
pub fn format_duration(duration: Duration) -> String {
    const NAMED: &[(u128, &str, &str)] = &[
        (86_400 * NANOS_PER_SECOND, "day", "days"),
        (3_600 * NANOS_PER_SECOND, "hour", "hours"),
        (60 * NANOS_PER_SECOND, "minute", "minutes"),
        (NANOS_PER_SECOND, "second", "seconds"),
        (1_000_000, "ms", "ms"),
        (1_000, "us", "us"),
    ];

    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0 ms".to_owned();
    }
    for (scale, singular, plural) in NAMED {
        if nanos % scale == 0 {
            let count = nanos / scale;
            let unit = if count == 1 { singular } else { plural };
            return format!("{count} {unit}");
        }
    }
    format!("{nanos} ns")
}

/// `#[serde(deserialize_with = ...)]` 入口：接受字符串或整数（毫秒）。
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a duration such as \"30 seconds\" or an integer of milliseconds")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        parse_duration(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
        Ok(Duration::from_millis(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
        u64::try_from(value)
            .map(Duration::from_millis)
            .map_err(|_| E::custom(format!("duration must not be negative, got {value}")))
    }
}
