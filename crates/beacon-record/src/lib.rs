#![deny(unsafe_code)]

//! `beacon-record` 提供自描述记录模型及其紧凑二进制编码。
//!
//! # 模块定位（Why）
//! - 自适应容量编码缓冲（`beacon-buffer`）只关心“把一条记录写进有界 sink，并区分溢出与致命错误”，
//!   本 crate 为其提供可直接使用的记录模型与 Datum 编解码实现；
//! - 记录自带 [`Schema`]，编码端无需额外的类型注册即可完成序列化，解码端以同一 Schema 还原值。
//!
//! # 设计概要（How）
//! - `schema` 模块定义 [`Schema`]/[`Value`] 以及 [`Record`] trait；
//! - `sink` 模块提供 [`EncodeSink`]、[`BoundedSink`] 与 [`LengthCounter`]：`BoundedSink` 写满即返回
//!   [`Overflow`]，绝不自行扩容；`LengthCounter` 只计长度；
//! - `datum` 模块实现 [`DatumWriter`]/[`DatumReader`]，采用 zig-zag 变长整数与长度前缀的二进制布局；
//! - `error` 模块集中定义错误类型与稳定错误码。
//!
//! # 契约说明（What）
//! - 编码结果只区分两类失败：[`EncodeError::Overflow`]（容量不足，可重试）与
//!   [`EncodeError::Fault`]（Schema 不匹配等，不可重试）；
//! - 所有公开类型均满足 `Send + Sync`，可在并发编码路径上共享 Schema。

mod datum;
mod error;
mod schema;
mod sink;

pub use datum::{DatumReader, DatumWriter, encode_to_vec};
pub use error::{EncodeError, Overflow, RecordError, codes};
pub use schema::{Field, GenericRecord, Record, RecordSchema, Schema, Value};
pub use sink::{BoundedSink, EncodeSink, LengthCounter};
