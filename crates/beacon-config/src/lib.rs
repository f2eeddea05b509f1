#![deny(unsafe_code)]

//! # beacon-config
//!
//! ## 角色定位（Why）
//! - 采集端在编码缓冲之外还需要两组运行参数：落盘文件的滚动/同步策略，以及下发给浏览器的脚本设置；
//! - 这些参数以 TOML 文件提供，缺省字段一律取默认值，使空配置即可启动。
//!
//! ## 结构（How）
//! - [`FileStrategyConfig`]：`[file_strategy]` 段；
//! - [`JavascriptConfig`]：`[javascript]` 段，脚本名需通过校验；
//! - [`CollectorConfig`]：聚合两段，[`CollectorConfig::from_toml_str`] 负责“解析 -> 校验 -> 记录日志”；
//! - [`parse_duration`]：`"<n> <unit>"` 形式的人类可读时长。
//!
//! ## 契约（What）
//! - 所有错误以 [`ConfigError`] 返回，并带有稳定错误码（见 [`codes`]）。

mod collector;
mod duration;
mod error;
mod file_strategy;
mod javascript;

pub use collector::CollectorConfig;
pub use duration::{format_duration, parse_duration};
pub use error::{ConfigError, codes};
pub use file_strategy::FileStrategyConfig;
pub use javascript::JavascriptConfig;
