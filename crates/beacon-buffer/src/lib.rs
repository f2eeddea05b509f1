#![deny(unsafe_code)]

//! `beacon-buffer` 提供自适应容量的记录编码缓冲。
//!
//! # 模块定位（Why）
//! - 上游请求处理需要把结构化记录编码成紧凑字节，交给下游的文件写入或传输组件；
//! - 单条记录的编码长度事先未知，固定上限要么浪费内存、要么频繁失败，
//!   因此以进程级“容量提示”记录已观测到的记录规模，让绝大多数编码一次成功。
//!
//! # 设计概要（How）
//! - `hint` 模块实现 [`CapacityHint`]：单个原子整数，只增不减，增长通过 CAS 完成，不持有任何锁；
//! - `factory` 模块实现 [`RecordBufferFactory`]：读取提示 → 分配同等大小的暂存区 → 直写编码 →
//!   溢出则提议增长并重试，致命错误立即返回；
//! - `encoded` 模块实现 [`EncodedRecordBuffer`] 与 [`RecordSlice`]：编码成功后冻结为 `bytes::Bytes`，
//!   每次 `slice()` 都返回独立游标的只读视图。
//!
//! # 契约说明（What）
//! - 所有公开类型均满足 `Send + Sync`，可在多线程间共享；
//! - 溢出从不暴露给调用方，只有序列化错误以 [`BufferError`] 形式返回；
//! - 容量提示不跨进程持久化，进程启动时恢复为 [`CapacityHint::DEFAULT_CAPACITY`]。

mod encoded;
mod error;
mod factory;
mod hint;

pub use encoded::{EncodedRecordBuffer, OwnerId, RecordSlice};
pub use error::{BufferError, codes};
pub use factory::{AttemptOutcome, EncodeReport, RecordBufferFactory};
pub use hint::{CapacityHint, next_capacity};
