use bytes::{BufMut, BytesMut};

use crate::error::Overflow;

/// `EncodeSink` 描述 Datum 编码的直写目标。
///
/// # 设计初衷（Why）
/// - 编码器直接把字节写入目标区域，不经过中间缓冲流，避免多余拷贝；
/// - 目标是否有界由实现决定：有界实现写满即返回 [`Overflow`]，无界实现（`Vec<u8>`）永不失败。
///
/// # 契约定义（What）
/// - `put` 要么完整写入 `src`，要么一个字节也不写并返回 [`Overflow`]；
/// - 实现不得在溢出后改变已写入内容。
pub trait EncodeSink {
    /// 追加一段字节。
    fn put(&mut self, src: &[u8]) -> Result<(), Overflow>;

    /// 追加单个字节。
    fn put_u8(&mut self, byte: u8) -> Result<(), Overflow> {
        self.put(&[byte])
    }
}

impl EncodeSink for Vec<u8> {
    fn put(&mut self, src: &[u8]) -> Result<(), Overflow> {
        self.extend_from_slice(src);
        Ok(())
    }
}

/// 只累计长度、不保存内容的 sink。
///
/// 用于在不分配内存的前提下走完一次编码遍历：既能得到记录的确切编码长度，
/// 也能确认值是否与 Schema 相符。`put` 永不失败。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LengthCounter {
    len: usize,
}

impl LengthCounter {
    /// 已累计的字节数。
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl EncodeSink for LengthCounter {
    fn put(&mut self, src: &[u8]) -> Result<(), Overflow> {
        self.len = self.len.saturating_add(src.len());
        Ok(())
    }
}

/// 固定上限的直写 sink，作为单次编码尝试的暂存区。
///
/// # 设计动机（Why）
/// - `BytesMut` 在容量不足时会自动扩容，这会掩盖“容量提示过小”的信号；
///   本类型在写入前检查上限，把扩容决策交还给调用方（自适应容量提示）。
/// - 成功后可通过 [`into_inner`](Self::into_inner) 取回 `BytesMut` 并 `freeze`，
///   暂存区直接转化为最终只读缓冲的底层存储，无需再复制。
///
/// # 契约说明（What）
/// - 构造时一次性分配 `limit` 字节容量，写入过程中不再分配；
/// - `written()` 始终等于已成功写入的字节数，且不超过 `limit()`；
/// - 写入从偏移 0 开始顺序追加。
#[derive(Debug)]
pub struct BoundedSink {
    buf: BytesMut,
    limit: usize,
}

impl BoundedSink {
    /// 分配恰好 `limit` 字节容量的暂存区。
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(limit),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 已写入的字节数。
    pub fn written(&self) -> usize {
        self.buf.len()
    }

    /// 已写入的内容。
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// 交出底层 `BytesMut`，其长度即已写入范围。
    pub fn into_inner(self) -> BytesMut {
        self.buf
    }
}

impl EncodeSink for BoundedSink {
    fn put(&mut self, src: &[u8]) -> Result<(), Overflow> {
        let required = self.buf.len().saturating_add(src.len());
        if required > self.limit {
            return Err(Overflow {
                capacity: self.limit,
                required,
            });
        }
        self.buf.put_slice(src);
        Ok(())
    }
}
