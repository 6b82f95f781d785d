//! Runtime value model.

use vbean_schema::ValueType;

use crate::bean::BeanHandle;

/// A runtime property value.
///
/// `List` is growable (append is legal); `Array` is fixed-size, so bracket
/// writes must stay in bounds and append is rejected. Nesting is realized
/// by a value being another bean: there is no separate nested-map variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Array(Vec<Value>),
    Bean(BeanHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    List,
    Array,
    Bean,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::List => write!(f, "list"),
            Self::Array => write!(f, "array"),
            Self::Bean => write!(f, "bean"),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
            Self::Array(_) => ValueKind::Array,
            Self::Bean(_) => ValueKind::Bean,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bean(&self) -> Option<&BeanHandle> {
        match self {
            Self::Bean(bean) => Some(bean),
            _ => None,
        }
    }

    /// Elements of a list or array.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(xs) | Self::Array(xs) => Some(xs),
            _ => None,
        }
    }
}

/// Check a value against a declared type, applying the single retained
/// primitive coercion (`Int` widens to `Float`). Returns the stored
/// representation on success, or `(expected, actual)` descriptions.
pub(crate) fn coerce(value: Value, ty: &ValueType) -> Result<Value, (String, String)> {
    match (value, ty) {
        (value, ValueType::Any) => Ok(value),
        // Null is assignable to every declared type.
        (Value::Null, _) => Ok(Value::Null),
        (value @ Value::Bool(_), ValueType::Bool) => Ok(value),
        (value @ Value::Int(_), ValueType::Int) => Ok(value),
        (Value::Int(n), ValueType::Float) => Ok(Value::Float(n as f64)),
        (value @ Value::Float(_), ValueType::Float) => Ok(value),
        (value @ Value::Text(_), ValueType::Text) => Ok(value),
        (Value::Bean(bean), ValueType::Bean(interface)) => {
            if bean.schema().supports(interface) {
                Ok(Value::Bean(bean))
            } else {
                let actual = format!(
                    "bean<{}>",
                    bean.schema().capabilities.join("+")
                );
                Err((ty.to_string(), actual))
            }
        }
        (value, ty) => Err((ty.to_string(), value.kind().to_string())),
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
            Self::List(xs) | Self::Array(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "]")
            }
            Self::Bean(bean) => write!(f, "{}", bean),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::List(xs)
    }
}

impl From<BeanHandle> for Value {
    fn from(bean: BeanHandle) -> Self {
        Value::Bean(bean)
    }
}
