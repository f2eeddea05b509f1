//! Datum 二进制编解码。
//!
//! # 布局说明（What）
//! - `null` 不占字节；`boolean` 为单字节 0/1；
//! - `int`/`long` 采用 zig-zag 变长整数（每字节 7 位，低位在前）；
//! - `float`/`double` 为小端 IEEE 754；
//! - `bytes`/`string` 为 `long` 长度前缀 + 原始字节（字符串为 UTF-8）；
//! - `array`/`map` 以块编码：非空时写一个 `long` 计数与对应元素（map 元素为字符串键 + 值），
//!   最后以计数 0 结束；解码端同时接受负计数 + 块字节数的形式；
//! - `union` 为 `long` 分支下标 + 分支值；`enum` 为 `long` 符号下标；
//! - `fixed` 为恰好 `size` 个字节；`record` 按字段声明顺序依次编码。

use bytes::Buf;

use crate::{
    error::{EncodeError, Overflow, RecordError},
    schema::{Schema, Value},
    sink::EncodeSink,
};

/// 按 Schema 把 [`Value`] 写入 [`EncodeSink`]。
///
/// # 教案式说明
/// - **意图 (Why)**：编码缓冲需要一个“直写、可报告溢出”的序列化器，
///   每次尝试只做一次线性遍历，不引入中间缓冲；
/// - **执行 (How)**：递归匹配 `(Schema, Value)` 对，标量直接写入，复合类型逐元素下探；
///   sink 返回的 [`Overflow`] 原样上抛，值与 Schema 不符时返回 [`RecordError::SchemaMismatch`]；
/// - **契约 (What)**：写入器无状态，可在多线程间自由复制；失败时 sink 中可能残留部分字节，
///   调用方应丢弃该 sink。
#[derive(Clone, Copy, Debug)]
pub struct DatumWriter<'s> {
    schema: &'s Schema,
}

impl<'s> DatumWriter<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// 把一个值完整写入 sink。
    pub fn write<S>(&self, value: &Value, sink: &mut S) -> Result<(), EncodeError>
    where
        S: EncodeSink + ?Sized,
    {
        write_datum(self.schema, value, sink)
    }
}

/// 把值编码到新分配的 `Vec<u8>`，主要用于测试与离线工具。
///
/// # 教案式说明
/// - **意图 (Why)**：离线场景不关心容量提示，只需要“编码成功得到字节，或得到 Schema 错误”；
/// - **执行 (How)**：以 `Vec<u8>` 作为无界 sink 调用 [`DatumWriter::write`]；
/// - **契约 (What)**：`Vec<u8>` 的 [`EncodeSink::put`] 总是返回 `Ok`，写入器只会把 sink 的错误原样上抛，
///   因此 [`EncodeError::Overflow`] 在此不会出现；该分支与成功分支合并，函数本身不含任何 panic 路径，
///   返回的 `Err` 只可能是 [`RecordError`]。
pub fn encode_to_vec(schema: &Schema, value: &Value) -> Result<Vec<u8>, RecordError> {
    let mut out = Vec::new();
    match DatumWriter::new(schema).write(value, &mut out) {
        Err(EncodeError::Fault(err)) => Err(err),
        Ok(()) | Err(EncodeError::Overflow(_)) => Ok(out),
    }
}

fn write_datum<S>(schema: &Schema, value: &Value, sink: &mut S) -> Result<(), EncodeError>
where
    S: EncodeSink + ?Sized,
{
    match (schema, value) {
        (Schema::Null, Value::Null) => Ok(()),
        (Schema::Boolean, Value::Boolean(flag)) => Ok(sink.put_u8(u8::from(*flag))?),
        (Schema::Int, Value::Int(n)) => Ok(write_long(i64::from(*n), sink)?),
        (Schema::Long, Value::Long(n)) => Ok(write_long(*n, sink)?),
        (Schema::Float, Value::Float(n)) => Ok(sink.put(&n.to_le_bytes())?),
        (Schema::Double, Value::Double(n)) => Ok(sink.put(&n.to_le_bytes())?),
        (Schema::Bytes, Value::Bytes(bytes)) => Ok(write_bytes(bytes, sink)?),
        (Schema::String, Value::String(text)) => Ok(write_bytes(text.as_bytes(), sink)?),
        (Schema::Array(item), Value::Array(items)) => {
            if !items.is_empty() {
                write_len(items.len(), sink)?;
                for (index, element) in items.iter().enumerate() {
                    write_datum(item, element, sink)
                        .map_err(|err| err.within(&format!("[{index}]")))?;
                }
            }
            Ok(write_long(0, sink)?)
        }
        (Schema::Map(value_schema), Value::Map(entries)) => {
            if !entries.is_empty() {
                write_len(entries.len(), sink)?;
                for (key, element) in entries {
                    write_bytes(key.as_bytes(), sink)?;
                    write_datum(value_schema, element, sink)
                        .map_err(|err| err.within(&format!("[\"{key}\"]")))?;
                }
            }
            Ok(write_long(0, sink)?)
        }
        (Schema::Union(variants), Value::Union(index, inner)) => {
            let variant = variants.get(*index as usize).ok_or_else(|| {
                RecordError::mismatch(
                    format!("union branch below {}", variants.len()),
                    format!("branch {index}"),
                )
            })?;
            write_long(i64::from(*index), sink)?;
            write_datum(variant, inner, sink).map_err(|err| err.within(&format!("<{index}>")))
        }
        (Schema::Enum { name, symbols }, Value::Enum(index)) => {
            if *index as usize >= symbols.len() {
                return Err(RecordError::mismatch(
                    format!("symbol of enum `{name}` (0..{})", symbols.len()),
                    format!("symbol index {index}"),
                )
                .into());
            }
            Ok(write_long(i64::from(*index), sink)?)
        }
        (Schema::Fixed { name, size }, Value::Fixed(bytes)) => {
            if bytes.len() != *size {
                return Err(RecordError::mismatch(
                    format!("fixed `{name}` of {size} bytes"),
                    format!("{} bytes", bytes.len()),
                )
                .into());
            }
            Ok(sink.put(bytes)?)
        }
        (Schema::Record(record), Value::Record(values)) => {
            if record.fields.len() != values.len() {
                return Err(RecordError::mismatch(
                    format!("{} fields of record `{}`", record.fields.len(), record.name),
                    format!("{} values", values.len()),
                )
                .into());
            }
            for (field, element) in record.fields.iter().zip(values) {
                write_datum(&field.schema, element, sink)
                    .map_err(|err| err.within(&format!(".{}", field.name)))?;
            }
            Ok(())
        }
        (schema, value) => Err(RecordError::mismatch(schema.kind(), value.kind()).into()),
    }
}

fn write_long<S>(n: i64, sink: &mut S) -> Result<(), Overflow>
where
    S: EncodeSink + ?Sized,
{
    let mut zigzag = ((n << 1) ^ (n >> 63)) as u64;
    let mut scratch = [0u8; 10];
    let mut len = 0;
    loop {
        let byte = (zigzag & 0x7f) as u8;
        zigzag >>= 7;
        if zigzag == 0 {
            scratch[len] = byte;
            len += 1;
            break;
        }
        scratch[len] = byte | 0x80;
        len += 1;
    }
    sink.put(&scratch[..len])
}

fn write_len<S>(len: usize, sink: &mut S) -> Result<(), Overflow>
where
    S: EncodeSink + ?Sized,
{
    // 内存中的集合长度不会超过 isize::MAX。
    write_long(len as i64, sink)
}

fn write_bytes<S>(bytes: &[u8], sink: &mut S) -> Result<(), Overflow>
where
    S: EncodeSink + ?Sized,
{
    write_len(bytes.len(), sink)?;
    sink.put(bytes)
}

/// 按 Schema 从字节流还原 [`Value`]。
///
/// # 教案式说明
/// - **意图 (Why)**：为编码结果提供对称的校验手段，下游消费者与测试均可据此验证往返一致性；
/// - **执行 (How)**：基于 [`bytes::Buf`] 逐字段读取，任何截断、非法下标、非 UTF-8 字符串
///   均返回 [`RecordError::Decode`]；
/// - **契约 (What)**：[`read`](Self::read) 要求恰好消费全部输入，否则返回
///   [`RecordError::TrailingBytes`]；[`read_from`](Self::read_from) 只消费一条记录，剩余字节留给调用方。
#[derive(Clone, Copy, Debug)]
pub struct DatumReader<'s> {
    schema: &'s Schema,
}

impl<'s> DatumReader<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// 解码一段完整的字节序列。
    pub fn read(&self, mut bytes: &[u8]) -> Result<Value, RecordError> {
        let value = self.read_from(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(RecordError::TrailingBytes {
                remaining: bytes.len(),
            });
        }
        Ok(value)
    }

    /// 从任意 [`Buf`] 读取一条记录，并推进其读指针。
    pub fn read_from<B: Buf>(&self, buf: &mut B) -> Result<Value, RecordError> {
        read_datum(self.schema, buf)
    }
}

fn read_datum<B: Buf>(schema: &Schema, buf: &mut B) -> Result<Value, RecordError> {
    match schema {
        Schema::Null => Ok(Value::Null),
        Schema::Boolean => match read_u8(buf)? {
            0 => Ok(Value::Boolean(false)),
            1 => Ok(Value::Boolean(true)),
            other => Err(RecordError::decode(format!("invalid boolean byte {other:#04x}"))),
        },
        Schema::Int => {
            let n = read_long(buf)?;
            i32::try_from(n)
                .map(Value::Int)
                .map_err(|_| RecordError::decode(format!("int value {n} out of range")))
        }
        Schema::Long => read_long(buf).map(Value::Long),
        Schema::Float => {
            require(buf, 4)?;
            Ok(Value::Float(buf.get_f32_le()))
        }
        Schema::Double => {
            require(buf, 8)?;
            Ok(Value::Double(buf.get_f64_le()))
        }
        Schema::Bytes => read_bytes(buf).map(Value::Bytes),
        Schema::String => read_string(buf).map(Value::String),
        Schema::Array(item) => {
            let mut items = Vec::new();
            read_blocks(buf, min_encoded_len(item), |buf| {
                let index = items.len();
                let element =
                    read_datum(item, buf).map_err(|err| err.within(&format!("[{index}]")))?;
                items.push(element);
                Ok(())
            })?;
            Ok(Value::Array(items))
        }
        Schema::Map(value_schema) => {
            let mut entries = Vec::new();
            // 键至少占一个长度前缀字节。
            let entry_width = min_encoded_len(value_schema).saturating_add(1);
            read_blocks(buf, entry_width, |buf| {
                let key = read_string(buf)?;
                let element = read_datum(value_schema, buf)
                    .map_err(|err| err.within(&format!("[\"{key}\"]")))?;
                entries.push((key, element));
                Ok(())
            })?;
            Ok(Value::Map(entries))
        }
        Schema::Union(variants) => {
            let index = read_index(buf, variants.len(), "union branch")?;
            let inner = read_datum(&variants[index as usize], buf)
                .map_err(|err| err.within(&format!("<{index}>")))?;
            Ok(Value::Union(index, Box::new(inner)))
        }
        Schema::Enum { symbols, .. } => {
            read_index(buf, symbols.len(), "enum symbol").map(Value::Enum)
        }
        Schema::Fixed { size, .. } => {
            require(buf, *size)?;
            let mut out = vec![0u8; *size];
            buf.copy_to_slice(&mut out);
            Ok(Value::Fixed(out))
        }
        Schema::Record(record) => {
            let mut values = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = read_datum(&field.schema, buf)
                    .map_err(|err| err.within(&format!(".{}", field.name)))?;
                values.push(value);
            }
            Ok(Value::Record(values))
        }
    }
}

fn require<B: Buf>(buf: &B, len: usize) -> Result<(), RecordError> {
    if buf.remaining() < len {
        Err(RecordError::decode(format!(
            "truncated input: {len} bytes required, {} available",
            buf.remaining()
        )))
    } else {
        Ok(())
    }
}

fn read_u8<B: Buf>(buf: &mut B) -> Result<u8, RecordError> {
    require(buf, 1)?;
    Ok(buf.get_u8())
}

fn read_long<B: Buf>(buf: &mut B) -> Result<i64, RecordError> {
    let mut zigzag: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = read_u8(buf)?;
        if shift == 63 && byte > 1 {
            return Err(RecordError::decode("varint exceeds 64 bits"));
        }
        zigzag |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    Ok(((zigzag >> 1) as i64) ^ -((zigzag & 1) as i64))
}

fn read_len<B: Buf>(buf: &mut B) -> Result<usize, RecordError> {
    let len = read_long(buf)?;
    usize::try_from(len).map_err(|_| RecordError::decode(format!("negative length {len}")))
}

fn read_bytes<B: Buf>(buf: &mut B) -> Result<Vec<u8>, RecordError> {
    let len = read_len(buf)?;
    require(buf, len)?;
    let mut out = vec![0u8; len];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

fn read_string<B: Buf>(buf: &mut B) -> Result<String, RecordError> {
    let bytes = read_bytes(buf)?;
    String::from_utf8(bytes)
        .map_err(|err| RecordError::decode(format!("string is not valid UTF-8: {err}")))
}

fn read_index<B: Buf>(buf: &mut B, bound: usize, what: &str) -> Result<u32, RecordError> {
    let index = read_long(buf)?;
    match u32::try_from(index) {
        Ok(index) if (index as usize) < bound => Ok(index),
        _ => Err(RecordError::decode(format!(
            "{what} index {index} out of range 0..{bound}"
        ))),
    }
}

/// 单个集合内零宽元素（`null`、空 record 等）的数量上限。
const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 16;

/// 一个值在该 Schema 下编码后至少占用的字节数。
fn min_encoded_len(schema: &Schema) -> usize {
    match schema {
        Schema::Null => 0,
        Schema::Boolean
        | Schema::Int
        | Schema::Long
        | Schema::Bytes
        | Schema::String
        | Schema::Array(_)
        | Schema::Map(_)
        | Schema::Union(_)
        | Schema::Enum { .. } => 1,
        Schema::Float => 4,
        Schema::Double => 8,
        Schema::Fixed { size, .. } => *size,
        Schema::Record(record) => record
            .fields
            .iter()
            .map(|field| min_encoded_len(&field.schema))
            .fold(0, usize::saturating_add),
    }
}

/// 读取以计数 0 结尾的块序列，每个元素交给 `item` 处理。
///
/// 块计数来自输入，先与剩余字节数核对再进入循环：元素至少占 `item_width` 字节时，
/// 计数乘以宽度不得超过剩余输入；零宽元素无法据此约束，改为限制总数不超过
/// [`MAX_ZERO_WIDTH_ITEMS`]。
fn read_blocks<B, F>(buf: &mut B, item_width: usize, mut item: F) -> Result<(), RecordError>
where
    B: Buf,
    F: FnMut(&mut B) -> Result<(), RecordError>,
{
    let mut zero_width_items: usize = 0;
    loop {
        let count = read_long(buf)?;
        if count == 0 {
            return Ok(());
        }
        let count = if count < 0 {
            // 负计数后跟随块字节数，仅用于跳读，这里顺序解码即可忽略。
            let _block_size = read_long(buf)?;
            count
                .checked_neg()
                .ok_or_else(|| RecordError::decode("block count overflow"))?
        } else {
            count
        };
        let count = usize::try_from(count)
            .map_err(|_| RecordError::decode(format!("block count {count} out of range")))?;
        if item_width == 0 {
            zero_width_items = zero_width_items.saturating_add(count);
            if zero_width_items > MAX_ZERO_WIDTH_ITEMS {
                return Err(RecordError::decode(format!(
                    "collection of zero-width items exceeds {MAX_ZERO_WIDTH_ITEMS} elements"
                )));
            }
        } else if count.saturating_mul(item_width) > buf.remaining() {
            return Err(RecordError::decode(format!(
                "block count {count} exceeds remaining input of {} bytes",
                buf.remaining()
            )));
        }
        for _ in 0..count {
            item(&mut *buf)?;
        }
    }
}
