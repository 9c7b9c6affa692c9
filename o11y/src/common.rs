use std::borrow::Cow;
use std::fmt;

/// Boxed error type accepted from user supplied callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An arbitrary value attached to a span, log record or metric emission.
///
/// `Value` models the shapes a dynamically typed caller can hand to the
/// observability layer. It is converted into a flat string by
/// [`tags::to_tag`](crate::tags::to_tag).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The value was never set.
    Undefined,
    /// The value was explicitly empty.
    Null,
    /// bool values
    Bool(bool),
    /// i64 values
    I64(i64),
    /// f64 values
    F64(f64),
    /// String values
    String(Cow<'static, str>),
    /// Heterogeneous list of values
    Array(Vec<Value>),
    /// A structured value, represented only by the name of its type.
    Object(Cow<'static, str>),
}

impl Value {
    /// Name used for structured values without a more specific type.
    pub const PLAIN_OBJECT: &'static str = "Object";

    /// A structured value of no particular type.
    pub fn plain_object() -> Self {
        Value::Object(Cow::Borrowed(Self::PLAIN_OBJECT))
    }

    /// A structured value named after the Rust type `T`.
    ///
    /// The module path and generic arguments are dropped, so
    /// `Value::object_of::<std::collections::HashMap<u8, u8>>()` is named
    /// `HashMap`.
    ///
    /// ```
    /// use o11y::Value;
    ///
    /// struct Request;
    /// assert_eq!(Value::object_of::<Request>(), Value::Object("Request".into()));
    /// ```
    pub fn object_of<T: ?Sized>() -> Self {
        Value::Object(Cow::Borrowed(short_type_name(std::any::type_name::<T>())))
    }

    /// Returns true for values that are not arrays or objects.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rsplit("::").next() {
        Some(name) if !name.is_empty() => name,
        _ => Value::PLAIN_OBJECT,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&crate::tags::to_tag(self))
    }
}

macro_rules! from_values {
   (
        $(
            ($t:ty, $val:expr);
        )+
    ) => {
        $(
            impl From<$t> for Value {
                fn from(t: $t) -> Self {
                    $val(t)
                }
            }
        )+
    }
}

from_values!(
    (bool, Value::Bool);
    (i64, Value::I64);
    (f64, Value::F64);
    (Cow<'static, str>, Value::String);
);

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I64(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::I64(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Value::F64(n as f64), Value::I64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::from(n as u64)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::F64(n.into())
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::String(Cow::Borrowed(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::I64(i),
                None => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(Cow::Owned(s)),
            serde_json::Value::Array(values) => {
                Value::Array(values.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(_) => Value::plain_object(),
        }
    }
}
