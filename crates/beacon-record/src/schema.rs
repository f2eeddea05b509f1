use std::{collections::HashSet, sync::Arc};

use crate::error::RecordError;

/// 记录字段描述。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// 记录类型的 Schema：命名 + 有序字段列表。
///
/// # 契约说明（What）
/// - 字段顺序即编码顺序，`Value::Record` 中的字段值必须与之一一对应；
/// - 字段名在同一记录内唯一，由 [`Schema::validate`] 检查。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<Field>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// 追加一个字段，便于以链式方式构造 Schema。
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.push(Field::new(name, schema));
        self
    }
}

/// 自描述记录的类型结构。
///
/// # 设计动机（Why）
/// - 编码缓冲要求记录“自带足以完成序列化的结构信息”，Schema 即承担该职责；
/// - 类型集合覆盖点击流事件常见的标量、集合、可选值与嵌套记录，足以表达完整的事件载荷。
///
/// # 逻辑解析（How）
/// - 标量：`Null`/`Boolean`/`Int`/`Long`/`Float`/`Double`/`Bytes`/`String`；
/// - 复合：`Array` 与 `Map` 描述同构集合，`Union` 描述多选一（常用于 `[null, T]` 形式的可选字段），
///   `Enum` 与 `Fixed` 分别描述命名符号与定长字节，`Record` 嵌套子记录。
///
/// # 契约说明（What）
/// - Schema 为不可变值，可通过 `Arc<Schema>` 在线程间共享；
/// - [`Schema::validate`] 负责结构合法性检查，编码过程只检查值与 Schema 的一致性。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schema {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array(Box<Schema>),
    Map(Box<Schema>),
    Union(Vec<Schema>),
    Enum { name: String, symbols: Vec<String> },
    Fixed { name: String, size: usize },
    Record(RecordSchema),
}

impl Schema {
    /// 构造 `[null, inner]` 形式的可选类型。
    pub fn optional(inner: Schema) -> Self {
        Schema::Union(vec![Schema::Null, inner])
    }

    /// 返回用于错误描述的类型名。
    pub fn kind(&self) -> &'static str {
        match self {
            Schema::Null => "null",
            Schema::Boolean => "boolean",
            Schema::Int => "int",
            Schema::Long => "long",
            Schema::Float => "float",
            Schema::Double => "double",
            Schema::Bytes => "bytes",
            Schema::String => "string",
            Schema::Array(_) => "array",
            Schema::Map(_) => "map",
            Schema::Union(_) => "union",
            Schema::Enum { .. } => "enum",
            Schema::Fixed { .. } => "fixed",
            Schema::Record(_) => "record",
        }
    }

    /// 校验 Schema 结构是否合法。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：把“Schema 写错”与“值写错”分开暴露，前者在构造记录时即可拦截；
    /// - **规则 (What)**：
    ///   - 记录、枚举、定长类型的名字不得为空；
    ///   - 记录字段名唯一且非空；
    ///   - 枚举至少包含一个符号且符号唯一；
    ///   - 联合类型至少包含一个分支，且不得直接嵌套联合类型；
    /// - **返回**：首个违规处的 [`RecordError::InvalidSchema`]，路径指向出错节点。
    pub fn validate(&self) -> Result<(), RecordError> {
        match self {
            Schema::Null
            | Schema::Boolean
            | Schema::Int
            | Schema::Long
            | Schema::Float
            | Schema::Double
            | Schema::Bytes
            | Schema::String => Ok(()),
            Schema::Array(item) => item.validate().map_err(|err| err.within("[]")),
            Schema::Map(value) => value.validate().map_err(|err| err.within("{}")),
            Schema::Union(variants) => {
                if variants.is_empty() {
                    return Err(RecordError::invalid_schema("union has no branches"));
                }
                for (index, variant) in variants.iter().enumerate() {
                    if matches!(variant, Schema::Union(_)) {
                        return Err(RecordError::invalid_schema(format!(
                            "union branch {index} is itself a union"
                        )));
                    }
                    variant
                        .validate()
                        .map_err(|err| err.within(&format!("<{index}>")))?;
                }
                Ok(())
            }
            Schema::Enum { name, symbols } => {
                require_name("enum", name)?;
                if symbols.is_empty() {
                    return Err(RecordError::invalid_schema(format!(
                        "enum `{name}` declares no symbols"
                    )));
                }
                let mut seen = HashSet::with_capacity(symbols.len());
                for symbol in symbols {
                    if !seen.insert(symbol.as_str()) {
                        return Err(RecordError::invalid_schema(format!(
                            "enum `{name}` repeats symbol `{symbol}`"
                        )));
                    }
                }
                Ok(())
            }
            Schema::Fixed { name, .. } => require_name("fixed", name),
            Schema::Record(record) => {
                require_name("record", &record.name)?;
                let mut seen = HashSet::with_capacity(record.fields.len());
                for field in &record.fields {
                    if field.name.is_empty() {
                        return Err(RecordError::invalid_schema(format!(
                            "record `{}` has a field without a name",
                            record.name
                        )));
                    }
                    if !seen.insert(field.name.as_str()) {
                        return Err(RecordError::invalid_schema(format!(
                            "record `{}` repeats field `{}`",
                            record.name, field.name
                        )));
                    }
                    field
                        .schema
                        .validate()
                        .map_err(|err| err.within(&format!(".{}", field.name)))?;
                }
                Ok(())
            }
        }
    }
}

fn require_name(kind: &str, name: &str) -> Result<(), RecordError> {
    if name.is_empty() {
        Err(RecordError::invalid_schema(format!("{kind} name is empty")))
    } else {
        Ok(())
    }
}

/// 与 [`Schema`] 对应的动态值。
///
/// # 契约说明（What）
/// - `Record` 的字段值按 Schema 声明顺序排列；
/// - `Map` 以有序键值对保存，编码与解码均保持插入顺序；
/// - `Union(index, value)` 中 `index` 指向联合类型的分支下标；
/// - `Enum(index)` 指向枚举符号下标。
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
    Union(u32, Box<Value>),
    Enum(u32),
    Fixed(Vec<u8>),
    Record(Vec<Value>),
}

impl Value {
    /// 返回用于错误描述的值类型名。
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Union(..) => "union",
            Value::Enum(_) => "enum",
            Value::Fixed(_) => "fixed",
            Value::Record(_) => "record",
        }
    }
}

/// `Record` 描述“携带自身结构”的可编码记录。
///
/// # 设计初衷（Why）
/// - 编码缓冲不应感知具体业务类型，只需要 Schema 与值两项信息即可完成一次序列化；
/// - 以 trait 暴露，允许业务侧以强类型结构体实现，内部按需组装 [`Value`]。
///
/// # 契约定义（What）
/// - `schema()` 与 `value()` 在同一实例上的多次调用必须返回一致结果；
/// - 实现需满足 `Send + Sync`，以便多个编码线程共享同一条记录的引用。
pub trait Record: Send + Sync {
    /// 返回记录的 Schema。
    fn schema(&self) -> &Schema;

    /// 返回记录的值。
    fn value(&self) -> &Value;
}

impl<R: Record + ?Sized> Record for Arc<R> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn value(&self) -> &Value {
        (**self).value()
    }
}

/// 通用记录实现：共享 Schema + 独占值。
///
/// # 契约说明（What）
/// - 构造时校验 Schema 结构合法且顶层为 `Record` 类型；
/// - 值与 Schema 的一致性不在构造期检查，留给编码阶段报告
///   [`RecordError::SchemaMismatch`]，使错误定位到具体字段路径。
#[derive(Clone, Debug, PartialEq)]
pub struct GenericRecord {
    schema: Arc<Schema>,
    value: Value,
}

impl GenericRecord {
    pub fn new(schema: Arc<Schema>, value: Value) -> Result<Self, RecordError> {
        if !matches!(schema.as_ref(), Schema::Record(_)) {
            return Err(RecordError::invalid_schema(format!(
                "top-level schema must be a record, found {}",
                schema.kind()
            )));
        }
        schema.validate()?;
        Ok(Self { schema, value })
    }

    /// 返回共享的 Schema 句柄。
    pub fn schema_handle(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Record for GenericRecord {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn value(&self) -> &Value {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn validate_rejects_duplicate_fields_with_path() {
        let schema = Schema::Record(
            RecordSchema::new("event").field(
                "location",
                Schema::Record(
                    RecordSchema::new("location")
                        .field("host", Schema::String)
                        .field("host", Schema::String),
                ),
            ),
        );
        let err = schema.validate().expect_err("重复字段应被拒绝");
        assert_eq!(err.code(), codes::RECORD_INVALID_SCHEMA);
        match err {
            RecordError::InvalidSchema { path, detail } => {
                assert_eq!(path, "$.location");
                assert!(detail.contains("repeats field `host`"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_nested_union_and_empty_enum() {
        let nested = Schema::Union(vec![Schema::Null, Schema::Union(vec![Schema::Long])]);
        assert!(nested.validate().is_err());

        let empty_enum = Schema::Enum {
            name: "kind".into(),
            symbols: Vec::new(),
        };
        assert!(empty_enum.validate().is_err());
    }

    #[test]
    fn generic_record_requires_record_schema() {
        let err = GenericRecord::new(Arc::new(Schema::Long), Value::Long(1))
            .expect_err("顶层非记录类型应被拒绝");
        assert_eq!(err.code(), codes::RECORD_INVALID_SCHEMA);
    }
}
