use beacon_record::{
    BoundedSink, DatumWriter, EncodeError, LengthCounter, Overflow, Record, RecordError,
};
use bytes::Bytes;

use crate::{
    encoded::{EncodedRecordBuffer, OwnerId},
    error::BufferError,
    hint::{CapacityHint, next_capacity},
};

/// 单次编码尝试的结果。
///
/// - `Encoded`：暂存区已冻结为只读字节；
/// - `Overflow`：暂存区容量不足，且记录本身可以完整编码，可在更大的容量下重试；
///   `required` 为记录的确切编码长度；
/// - `Fault`：记录无法序列化，不可重试。
#[derive(Debug)]
pub enum AttemptOutcome {
    Encoded(Bytes),
    Overflow(Overflow),
    Fault(RecordError),
}

/// 一次成功编码的诊断信息。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeReport {
    /// 含最后一次成功在内的尝试次数。
    pub attempts: u32,
    /// 成功那次尝试使用的暂存区容量。
    pub capacity: usize,
    /// 编码后的字节数。
    pub encoded_len: usize,
}

/// `RecordBufferFactory` 负责把记录编码为 [`EncodedRecordBuffer`]。
///
/// # 设计动机（Why）
/// - 记录长度事先未知，工厂以共享的 [`CapacityHint`] 作为暂存区大小，溢出时协作扩大提示并重试，
///   使绝大多数调用一次成功，又不必预设浪费的上限；
/// - 编码路径上不持有任何锁，多个线程可以同时调用同一个工厂。
///
/// # 执行流程（How）
/// 1. 读取提示值 `h`，分配恰好 `h` 字节的 [`BoundedSink`]；
/// 2. 通过 [`DatumWriter`] 从偏移 0 直写记录；
/// 3. 溢出：先用 [`LengthCounter`] 走完剩余的编码遍历，确认记录可以完整编码；
///    遍历中发现 Schema 错误则按第 4 步处理，否则调用 `propose_growth(h)` 后回到第 1 步，
///    重试次数不设上限；
/// 4. 其它错误：立即以 [`BufferError::Serialization`] 返回，不重试；
/// 5. 成功：以写入范围为最终长度冻结暂存区，连同所属标识返回。
///
/// # 契约说明（What）
/// - **前置条件**：记录的 Schema 与值由调用方负责，类型系统保证标识与记录非空；
/// - **后置条件**：返回的字节恰为记录在其 Schema 下的编码，且之后不再被修改；
///   失败路径不会改变容量提示；
/// - **终止性**：每次增长都严格增大提示，且提示一旦不小于记录编码长度即可成功，
///   因此循环次数以对数级收敛。
///
/// # 风险与取舍（Trade-offs）
/// - 每次重试都重新分配暂存区并从头编码，换取实现简单与无锁；
///   增长后所有后续调用都受益，重试成本被摊薄；
/// - 溢出路径多一次只计长度的遍历，换来“错误记录绝不抬高共享提示”，快速路径不受影响。
#[derive(Clone, Copy, Debug)]
pub struct RecordBufferFactory<'h> {
    hint: &'h CapacityHint,
}

impl RecordBufferFactory<'static> {
    /// 使用进程级共享容量提示的工厂。
    pub fn global() -> Self {
        Self::with_hint(CapacityHint::global())
    }
}

impl Default for RecordBufferFactory<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'h> RecordBufferFactory<'h> {
    /// 使用指定容量提示的工厂，便于隔离测试或独立的编码域。
    pub fn with_hint(hint: &'h CapacityHint) -> Self {
        Self { hint }
    }

    pub fn hint(&self) -> &'h CapacityHint {
        self.hint
    }

    /// 编码一条记录。
    pub fn encode<R>(
        &self,
        owner: impl Into<OwnerId>,
        record: &R,
    ) -> Result<EncodedRecordBuffer, BufferError>
    where
        R: Record + ?Sized,
    {
        self.encode_with_report(owner, record)
            .map(|(buffer, _)| buffer)
    }

    /// 编码一条记录，并返回本次调用的尝试次数等诊断信息。
    pub fn encode_with_report<R>(
        &self,
        owner: impl Into<OwnerId>,
        record: &R,
    ) -> Result<(EncodedRecordBuffer, EncodeReport), BufferError>
    where
        R: Record + ?Sized,
    {
        let owner = owner.into();
        let mut attempts: u32 = 0;
        loop {
            let capacity = self.hint.current();
            attempts = attempts.saturating_add(1);
            match Self::attempt(capacity, record) {
                AttemptOutcome::Encoded(bytes) => {
                    let report = EncodeReport {
                        attempts,
                        capacity,
                        encoded_len: bytes.len(),
                    };
                    return Ok((EncodedRecordBuffer::new(owner, bytes), report));
                }
                AttemptOutcome::Overflow(overflow) => {
                    let committed = self.hint.propose_growth(capacity);
                    tracing::debug!(
                        owner = %owner,
                        capacity,
                        required = overflow.required,
                        proposed = next_capacity(capacity),
                        committed,
                        attempts,
                        "record overflowed scratch buffer, retrying with larger capacity hint"
                    );
                }
                AttemptOutcome::Fault(source) => {
                    tracing::warn!(
                        owner = %owner,
                        code = source.code(),
                        error = %source,
                        "record serialization failed"
                    );
                    return Err(BufferError::Serialization { owner, source });
                }
            }
        }
    }

    /// 在给定容量下执行一次编码尝试，不读取也不修改容量提示。
    ///
    /// 溢出时会以只计长度的 sink 重新遍历记录：遍历发现的 Schema 错误以 `Fault` 返回，
    /// 否则返回带确切编码长度的 `Overflow`。
    pub fn attempt<R>(capacity: usize, record: &R) -> AttemptOutcome
    where
        R: Record + ?Sized,
    {
        let writer = DatumWriter::new(record.schema());
        let mut scratch = BoundedSink::with_limit(capacity);
        match writer.write(record.value(), &mut scratch) {
            Ok(()) => AttemptOutcome::Encoded(scratch.into_inner().freeze()),
            Err(EncodeError::Fault(fault)) => AttemptOutcome::Fault(fault),
            Err(EncodeError::Overflow(_)) => {
                let mut counter = LengthCounter::default();
                match writer.write(record.value(), &mut counter) {
                    Err(EncodeError::Fault(fault)) => AttemptOutcome::Fault(fault),
                    Ok(()) | Err(EncodeError::Overflow(_)) => AttemptOutcome::Overflow(Overflow {
                        capacity,
                        required: counter.len(),
                    }),
                }
            }
        }
    }
}

impl EncodedRecordBuffer {
    /// 使用进程级容量提示编码一条记录。
    pub fn from_record<R>(owner: impl Into<OwnerId>, record: &R) -> Result<Self, BufferError>
    where
        R: Record + ?Sized,
    {
        RecordBufferFactory::global().encode(owner, record)
    }
}
