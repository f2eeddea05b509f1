use std::fmt;

use serde::Deserialize;

use crate::{
    error::ConfigError, file_strategy::FileStrategyConfig, javascript::JavascriptConfig,
};

/// 采集端配置根节点，对应 TOML 中的 `[file_strategy]` 与 `[javascript]` 两段。
///
/// # 设计动机（Why）
/// - 部署时往往只覆盖少数参数，缺省段与缺省字段都回落到默认值，空文件即可得到可用配置；
/// - 未识别的键被忽略，便于同一文件承载其它组件的设置。
///
/// # 执行流程（How）
/// 1. `toml::from_str` 反序列化，时长字符串在此阶段解析；
/// 2. 调用 [`validate`](Self::validate) 检查各段的取值规则；
/// 3. 以 `info` 级别记录最终生效的配置摘要。
///
/// # 契约说明（What）
/// - 语法或时长错误返回 `config.parse`，取值违规返回 `config.invalid`；
/// - 返回 `Ok` 时配置已通过全部校验。
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub file_strategy: FileStrategyConfig,
    pub javascript: JavascriptConfig,
}

impl CollectorConfig {
    /// 解析并校验 TOML 文本。
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CollectorConfig = toml::from_str(text).inspect_err(|err| {
            tracing::warn!(code = crate::codes::CONFIG_PARSE, error = %err, "collector configuration rejected");
        })?;
        config.validate().inspect_err(|err| {
            tracing::warn!(code = err.code(), error = %err, "collector configuration rejected");
        })?;
        tracing::info!(config = %config, "collector configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.javascript.validate()
    }
}

impl fmt::Display for CollectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CollectorConfig {{ file_strategy: {}, javascript: {} }}",
            self.file_strategy, self.javascript
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::*;
    use crate::codes;

    #[traced_test]
    #[test]
    fn empty_document_yields_defaults() {
        let config = CollectorConfig::from_toml_str("").expect("空配置应合法");
        assert_eq!(config, CollectorConfig::default());
        assert!(logs_contain("collector configuration loaded"));
    }

    #[test]
    fn sections_override_selected_fields() {
        let config = CollectorConfig::from_toml_str(
            r#"
            [file_strategy]
            roll_every = "2 hours"
            sync_file_after_records = 250

            [javascript]
            name = "beacon.js"
            debug = true
            "#,
        )
        .expect("合法配置");
        assert_eq!(config.file_strategy.roll_every, Duration::from_secs(7_200));
        assert_eq!(config.file_strategy.sync_file_after_records, 250);
        assert_eq!(config.javascript.name, "beacon.js");
        assert!(config.javascript.debug);
        assert!(config.javascript.auto_page_view_event);
    }

    #[traced_test]
    #[test]
    fn invalid_script_name_is_rejected_after_parsing() {
        let err = CollectorConfig::from_toml_str("[javascript]\nname = \"evil/../x.js\"\n")
            .expect_err("带路径的脚本名应被拒绝");
        assert_eq!(err.code(), codes::CONFIG_INVALID);
        assert!(logs_contain("collector configuration rejected"));
    }

    #[test]
    fn malformed_duration_is_a_parse_error() {
        let err = CollectorConfig::from_toml_str("[file_strategy]\nroll_every = \"soon\"\n")
            .expect_err("非法时长应被拒绝");
        assert_eq!(err.code(), codes::CONFIG_PARSE);
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn wrong_field_type_is_a_parse_error() {
        let err = CollectorConfig::from_toml_str("[javascript]\nlogging = \"yes\"\n")
            .expect_err("布尔字段不接受字符串");
        assert_eq!(err.code(), codes::CONFIG_PARSE);
    }

    #[test]
    fn display_nests_section_summaries() {
        let rendered = CollectorConfig::default().to_string();
        assert!(rendered.starts_with("CollectorConfig { file_strategy: FileStrategyConfig {"));
        assert!(rendered.contains("javascript: JavascriptConfig { name: divolte.js,"));
    }
}
