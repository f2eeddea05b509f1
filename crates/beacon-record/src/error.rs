//! 记录编解码的错误域。
//!
//! # 设计要求（What）
//! - 错误类型派生 `thiserror::Error`，保证与 `std::error::Error` 生态兼容；
//! - 每个变体映射到 `<领域>.<语义>` 形式的稳定错误码，便于日志检索与告警聚合；
//! - 容量溢出（[`Overflow`]）与致命错误（[`RecordError`]）在类型层面分离，
//!   调用方无需解析字符串即可决定是否重试。

use thiserror::Error;

/// 记录编解码相关的稳定错误码。
///
/// # 契约说明（What）
/// - 错误码遵循 `<领域>.<语义>` 命名约定，一经发布不得修改语义；
/// - 上层（缓冲工厂、配置加载）可在日志字段中直接携带这些字符串。
pub mod codes {
    /// 值与 Schema 不匹配。
    pub const RECORD_SCHEMA_MISMATCH: &str = "record.schema_mismatch";
    /// Schema 本身不合法，例如枚举符号为空或字段重名。
    pub const RECORD_INVALID_SCHEMA: &str = "record.invalid_schema";
    /// 字节流截断或损坏。
    pub const RECORD_DECODE: &str = "record.decode";
    /// 解码完成后仍有未消费的字节。
    pub const RECORD_TRAILING_BYTES: &str = "record.trailing_bytes";
}

/// 有界 sink 拒绝写入时返回的溢出信号。
///
/// # 教案式说明
/// - **意图 (Why)**：溢出是自适应缓冲的“预期事件”，需要携带足够信息供调用方扩容后重试；
/// - **契约 (What)**：`capacity` 为 sink 的固定上限，`required` 为本次写入若成功所需的最小总长度，
///   二者满足 `required > capacity`；
/// - **权衡 (Trade-offs)**：`required` 只是下界，后续字段仍可能继续超出，
///   调用方不应据此一次性计算最终容量。
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("sink overflow: capacity {capacity} bytes, at least {required} bytes required")]
pub struct Overflow {
    pub capacity: usize,
    pub required: usize,
}

/// 不可重试的记录错误。
///
/// # 教案式说明
/// - **意图 (Why)**：归纳 Schema 校验、编码一致性、解码完整性等失败路径，
///   为缓冲工厂提供“致命、不重试”的统一语义；
/// - **契约 (What)**：`path` 字段以 `.` 连接的字段名定位出错位置，根节点为 `$`；
///   所有变体均为 `Send + Sync + 'static`，可跨线程传播；
/// - **权衡 (Trade-offs)**：路径使用 `String` 保存，仅在失败路径上分配，热路径不受影响。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// 值的形态与 Schema 声明不一致。
    #[error("value at `{path}` does not match schema: expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// Schema 自身不合法。
    #[error("invalid schema at `{path}`: {detail}")]
    InvalidSchema { path: String, detail: String },

    /// 字节流无法按 Schema 解码。
    #[error("failed to decode `{path}`: {detail}")]
    Decode { path: String, detail: String },

    /// 完整读取一条记录后仍有剩余字节。
    #[error("{remaining} trailing bytes left after decoding")]
    TrailingBytes { remaining: usize },
}

impl RecordError {
    /// 返回该错误对应的稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            RecordError::SchemaMismatch { .. } => codes::RECORD_SCHEMA_MISMATCH,
            RecordError::InvalidSchema { .. } => codes::RECORD_INVALID_SCHEMA,
            RecordError::Decode { .. } => codes::RECORD_DECODE,
            RecordError::TrailingBytes { .. } => codes::RECORD_TRAILING_BYTES,
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        RecordError::SchemaMismatch {
            path: String::from("$"),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn invalid_schema(detail: impl Into<String>) -> Self {
        RecordError::InvalidSchema {
            path: String::from("$"),
            detail: detail.into(),
        }
    }

    pub(crate) fn decode(detail: impl Into<String>) -> Self {
        RecordError::Decode {
            path: String::from("$"),
            detail: detail.into(),
        }
    }

    /// 在错误路径前追加一级字段名，递归回溯时逐层调用。
    pub(crate) fn within(mut self, segment: &str) -> Self {
        match &mut self {
            RecordError::SchemaMismatch { path, .. }
            | RecordError::InvalidSchema { path, .. }
            | RecordError::Decode { path, .. } => {
                let rest = path.strip_prefix('$').unwrap_or(path);
                *path = format!("${segment}{rest}");
            }
            RecordError::TrailingBytes { .. } => {}
        }
        self
    }
}

/// 单次编码尝试的失败结果。
///
/// # 教案式说明
/// - **意图 (Why)**：以枚举替代异常式控制流，使“可重试的溢出”与“致命错误”在编译期即可区分；
/// - **契约 (What)**：`Overflow` 仅由 sink 产生；`Fault` 覆盖所有 Schema/值相关错误；
/// - **执行 (How)**：借助 `#[from]`，sink 与校验逻辑可直接用 `?` 向上传播。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error(transparent)]
    Overflow(#[from] Overflow),
    #[error(transparent)]
    Fault(#[from] RecordError),
}

impl EncodeError {
    /// 判断是否为可重试的容量溢出。
    pub fn is_overflow(&self) -> bool {
        matches!(self, EncodeError::Overflow(_))
    }

    pub(crate) fn within(self, segment: &str) -> Self {
        match self {
            EncodeError::Fault(err) => EncodeError::Fault(err.within(segment)),
            overflow => overflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_builds_dotted_path_from_innermost_segment() {
        let err = RecordError::mismatch("long", "string")
            .within(".user_id")
            .within(".session");
        match &err {
            RecordError::SchemaMismatch { path, .. } => assert_eq!(path, "$.session.user_id"),
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.code(), codes::RECORD_SCHEMA_MISMATCH);
    }

    #[test]
    fn overflow_is_not_rewritten_by_within() {
        let overflow = Overflow {
            capacity: 8,
            required: 12,
        };
        let err = EncodeError::from(overflow).within(".field");
        assert_eq!(err, EncodeError::Overflow(overflow));
        assert!(err.is_overflow());
    }
}
