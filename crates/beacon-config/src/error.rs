use thiserror::Error;

/// 配置错误的稳定错误码。
pub mod codes {
    /// TOML 文本或时长字符串无法解析。
    pub const CONFIG_PARSE: &str = "config.parse";
    /// 解析成功，但取值违反校验规则。
    pub const CONFIG_INVALID: &str = "config.invalid";
}

/// 配置加载与校验错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid duration `{input}`: {detail}")]
    Duration { input: String, detail: String },
    #[error("invalid value for `{field}`: {detail}")]
    Invalid { field: &'static str, detail: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Parse(_) | ConfigError::Duration { .. } => codes::CONFIG_PARSE,
            ConfigError::Invalid { .. } => codes::CONFIG_INVALID,
        }
    }

    pub(crate) fn duration(input: &str, detail: impl Into<String>) -> Self {
        ConfigError::Duration {
            input: input.to_owned(),
            detail: detail.into(),
        }
    }
}
