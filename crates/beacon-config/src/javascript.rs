use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// 下发给浏览器的采集脚本设置。
///
/// # 教案式说明
/// - **意图 (Why)**：脚本名会直接拼入对外暴露的 URL 路径，必须限定为单段、无路径分隔符的 `.js` 文件名；
/// - **契约 (What)**：`name` 需匹配 `[A-Za-z0-9_-]+\.js`，由 [`validate`](Self::validate) 检查；
///   其余开关缺省时取 [`Default`] 中的值。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JavascriptConfig {
    pub name: String,
    /// 是否在浏览器控制台输出脚本日志。
    pub logging: bool,
    /// 是否下发未压缩的调试版脚本。
    pub debug: bool,
    /// 脚本加载后是否自动上报一次页面浏览事件。
    pub auto_page_view_event: bool,
}

impl JavascriptConfig {
    pub const DEFAULT_NAME: &'static str = "divolte.js";

    /// 校验脚本名。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = self
            .name
            .strip_suffix(".js")
            .is_some_and(|stem| {
                !stem.is_empty()
                    && stem
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
            });
        if valid {
            Ok(())
        } else {
            Err(ConfigError::Invalid {
                field: "javascript.name",
                detail: format!(
                    "`{}` must be a file name made of letters, digits, `_` or `-` ending in `.js`",
                    self.name
                ),
            })
        }
    }
}

impl Default for JavascriptConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_owned(),
            logging: false,
            debug: false,
            auto_page_view_event: true,
        }
    }
}

impl fmt::Display for JavascriptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JavascriptConfig {{ name: {}, logging: {}, debug: {}, auto_page_view_event: {} }}",
            self.name, self.logging, self.debug, self.auto_page_view_event
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> JavascriptConfig {
        JavascriptConfig {
            name: name.to_owned(),
            ..JavascriptConfig::default()
        }
    }

    #[test]
    fn default_is_valid() {
        let config = JavascriptConfig::default();
        assert_eq!(config.name, "divolte.js");
        assert!(!config.logging);
        assert!(!config.debug);
        assert!(config.auto_page_view_event);
        config.validate().expect("默认脚本名必须合法");
    }

    #[test]
    fn accepts_plain_script_names() {
        for name in ["a.js", "beacon_v2.js", "track-9.js", "ABC.js"] {
            named(name).validate().expect(name);
        }
    }

    #[test]
    fn rejects_paths_and_wrong_extensions() {
        for name in ["", ".js", "evil/../x.js", "x.js.map", "x.JS", "with space.js", "dot.ted.js"] {
            let err = named(name).validate().expect_err(name);
            assert_eq!(err.code(), crate::codes::CONFIG_INVALID, "`{name}` 应被拒绝");
        }
    }
}
