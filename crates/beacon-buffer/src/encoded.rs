use std::{borrow::Borrow, fmt, sync::Arc};

use bytes::{Buf, Bytes};

/// 编码结果所属的逻辑流/分区标识。
///
/// # 契约说明（What）
/// - 值不可变，克隆成本为一次 `Arc` 引用计数递增；
/// - 内容对本 crate 不透明，空字符串同样被接受，非空约束由上游调用方决定。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(Arc<str>);

impl OwnerId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OwnerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OwnerId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Arc<str>> for OwnerId {
    fn from(value: Arc<str>) -> Self {
        Self(value)
    }
}

/// `EncodedRecordBuffer` 是编码成功后的只读结果：所属标识 + 冻结字节。
///
/// # 设计动机（Why）
/// - 下游（文件写入、传输）可能在多个线程中同时读取同一条编码结果，
///   因此字节一经冻结便不可再改，读取只能通过各自独立的视图进行；
/// - 借助 `bytes::Bytes` 的引用计数共享，`slice()` 无需复制底层内存。
///
/// # 结构关系（How）
/// - `bytes` 直接来自编码暂存区的 `BytesMut::freeze`，长度即实际写入范围；
/// - 不持有容量提示或暂存区的任何引用，生命周期完全独立。
///
/// # 契约说明（What）
/// - **不可变**：构造后字节内容不再变化；
/// - **独立视图**：每次 [`slice`](Self::slice) 返回从偏移 0 开始的新视图，推进某个视图不影响其它视图；
/// - **一致长度**：[`size`](Self::size) 恒等于任一视图的初始剩余字节数。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedRecordBuffer {
    owner_id: OwnerId,
    bytes: Bytes,
}

impl EncodedRecordBuffer {
    pub(crate) fn new(owner_id: OwnerId, bytes: Bytes) -> Self {
        Self { owner_id, bytes }
    }

    /// 返回所属标识。
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// 返回编码长度，不产生任何视图或拷贝。
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// 返回一个新的、独立定位的只读视图。
    pub fn slice(&self) -> RecordSlice {
        RecordSlice::new(self.bytes.clone())
    }

    /// 返回共享的底层字节句柄；克隆该句柄只增加引用计数。
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// 拆出所属标识与底层字节。
    pub fn into_parts(self) -> (OwnerId, Bytes) {
        (self.owner_id, self.bytes)
    }
}

/// 编码结果上的只读游标视图。
///
/// # 教案式说明
/// - **意图 (Why)**：下游按 `bytes::Buf` 语义逐段消费编码结果，每个消费者都需要自己的读位置；
/// - **执行 (How)**：持有一份 `Bytes` 克隆作为私有游标，`advance` 只收缩这份克隆，
///   `position` 由初始长度与剩余长度之差得出；
/// - **契约 (What)**：视图之间互不影响，也不影响产生它的 [`EncodedRecordBuffer`]。
#[derive(Clone, Debug)]
pub struct RecordSlice {
    view: Bytes,
    len: usize,
}

impl RecordSlice {
    fn new(view: Bytes) -> Self {
        let len = view.len();
        Self { view, len }
    }

    /// 视图的总长度（与读位置无关）。
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 当前读位置，相对视图起点。
    pub fn position(&self) -> usize {
        self.len - self.view.len()
    }

    /// 以 `Bytes` 形式返回尚未读取的部分，不复制数据。
    pub fn to_bytes(&self) -> Bytes {
        self.view.clone()
    }
}

impl Buf for RecordSlice {
    fn remaining(&self) -> usize {
        self.view.len()
    }

    fn chunk(&self) -> &[u8] {
        &self.view
    }

    fn advance(&mut self, cnt: usize) {
        self.view.advance(cnt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncodedRecordBuffer {
        EncodedRecordBuffer::new(OwnerId::from("abc"), Bytes::from_static(b"hello, world"))
    }

    #[test]
    fn size_matches_every_slice() {
        let buffer = sample();
        assert_eq!(buffer.size(), 12);
        for _ in 0..3 {
            let slice = buffer.slice();
            assert_eq!(slice.remaining(), buffer.size());
            assert_eq!(slice.len(), buffer.size());
        }
    }

    #[test]
    fn slices_advance_independently() {
        let buffer = sample();
        let mut first = buffer.slice();
        let second = buffer.slice();

        first.advance(7);
        assert_eq!(first.position(), 7);
        assert_eq!(first.chunk(), b"world");
        assert_eq!(second.position(), 0, "推进一个视图不得影响另一个");
        assert_eq!(second.chunk(), b"hello, world");
        assert_eq!(buffer.slice().remaining(), 12, "新视图总是从起点开始");
    }

    #[test]
    fn owner_id_behaves_like_a_string() {
        let owner = OwnerId::from(String::from("party-1"));
        assert_eq!(owner.as_str(), "party-1");
        assert_eq!(owner.to_string(), "party-1");
        let borrowed: &str = owner.borrow();
        assert_eq!(borrowed, "party-1");
    }

    #[test]
    fn public_types_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<EncodedRecordBuffer>();
        assert_send_sync::<RecordSlice>();
        assert_send_sync::<OwnerId>();
    }
}
