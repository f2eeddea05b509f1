//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 编码缓冲只向调用方暴露一类错误：不可重试的序列化失败；
//!   容量溢出在工厂内部消化，不会出现在这里。
//!
//! ## 设计要求（What）
//! - 错误派生 `thiserror::Error`，保留底层 [`RecordError`] 作为 `source`；
//! - 提供稳定错误码，便于日志与告警聚合。

use beacon_record::RecordError;
use thiserror::Error;

use crate::encoded::OwnerId;

/// 编码缓冲的稳定错误码。
pub mod codes {
    /// 记录无法按其 Schema 序列化，属于致命、不可重试的错误。
    pub const BUFFER_SERIALIZATION: &str = "buffer.serialization";
}

/// 编码缓冲错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把“记录本身有问题”与调用方可能关心的所属标识一并返回，便于定位问题来源；
/// - **契约 (What)**：调用方收到该错误后不应重试同一条记录；容量提示在该路径上保持不变；
/// - **权衡 (Trade-offs)**：暂不区分 Schema 错误与值错误，细分信息保留在
///   [`source`](std::error::Error::source) 的 [`RecordError::code`] 中。
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("serialization error for owner `{owner}`: {source}")]
    Serialization {
        owner: OwnerId,
        #[source]
        source: RecordError,
    },
}

impl BufferError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            BufferError::Serialization { .. } => codes::BUFFER_SERIALIZATION,
        }
    }

    /// 返回底层记录错误。
    pub fn record_error(&self) -> &RecordError {
        match self {
            BufferError::Serialization { source, .. } => source,
        }
    }
}
