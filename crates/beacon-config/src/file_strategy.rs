use std::{fmt, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::duration::{self, format_duration};

/// 落盘文件策略：何时滚动文件、何时强制同步，以及工作/发布目录。
///
/// # 契约说明（What）
/// - 每个字段缺省时取 [`Default`] 中的值，空的 `[file_strategy]` 段等价于全默认；
/// - 时长字段接受 `"1 hour"`、`"30 seconds"` 等字符串，或表示毫秒的整数；
/// - 本结构只承载参数，不创建目录也不触碰文件系统。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileStrategyConfig {
    /// 单个文件的最长写入时长，到期后滚动。
    #[serde(deserialize_with = "duration::deserialize")]
    pub roll_every: Duration,
    /// 累计写入多少条记录后同步一次文件。
    pub sync_file_after_records: u32,
    /// 距上次同步多久后强制同步。
    #[serde(deserialize_with = "duration::deserialize")]
    pub sync_file_after_duration: Duration,
    pub working_dir: PathBuf,
    pub publish_dir: PathBuf,
}

impl Default for FileStrategyConfig {
    fn default() -> Self {
        Self {
            roll_every: Duration::from_secs(60 * 60),
            sync_file_after_records: 1_000,
            sync_file_after_duration: Duration::from_secs(30),
            working_dir: PathBuf::from("/tmp"),
            publish_dir: PathBuf::from("/tmp"),
        }
    }
}

impl fmt::Display for FileStrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FileStrategyConfig {{ roll_every: {}, sync_file_after_records: {}, \
             sync_file_after_duration: {}, working_dir: {}, publish_dir: {} }}",
            format_duration(self.roll_every),
            self.sync_file_after_records,
            format_duration(self.sync_file_after_duration),
            self.working_dir.display(),
            self.publish_dir.display(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_collector_conventions() {
        let config = FileStrategyConfig::default();
        assert_eq!(config.roll_every, Duration::from_secs(3_600));
        assert_eq!(config.sync_file_after_records, 1_000);
        assert_eq!(config.sync_file_after_duration, Duration::from_secs(30));
        assert_eq!(config.working_dir, PathBuf::from("/tmp"));
        assert_eq!(config.publish_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let config: FileStrategyConfig = toml::from_str(
            r#"
            roll_every = "15 minutes"
            sync_file_after_duration = 500
            publish_dir = "/var/beacon/published"
            "#,
        )
        .expect("合法 TOML");
        assert_eq!(config.roll_every, Duration::from_secs(900));
        assert_eq!(config.sync_file_after_duration, Duration::from_millis(500));
        assert_eq!(config.publish_dir, PathBuf::from("/var/beacon/published"));
        assert_eq!(config.sync_file_after_records, 1_000);
        assert_eq!(config.working_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn display_renders_human_durations() {
        let rendered = FileStrategyConfig::default().to_string();
        assert_eq!(
            rendered,
            "FileStrategyConfig { roll_every: 1 hour, sync_file_after_records: 1000, \
             sync_file_after_duration: 30 seconds, working_dir: /tmp, publish_dir: /tmp }"
        );
    }
}
