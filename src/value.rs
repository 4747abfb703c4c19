//!
//! Database values and conversions between them and plain Rust types.
//!
use crate::errors::StoreError;

/// A database value as it travels between the driver and entity records.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i32),
    Bigint(i64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
}

pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for i32 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Bigint(*self)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Double(*self)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Nil,
        }
    }
}

pub trait FromValue: Sized {
    fn from_value(v: &Value) -> Result<Self, StoreError>;
}

fn mismatch(expected: &str, found: &Value) -> StoreError {
    StoreError::DataError(format!("expected {}, found {:?}", expected, found))
}

impl FromValue for bool {
    fn from_value(v: &Value) -> Result<Self, StoreError> {
        match *v {
            Value::Bool(v) => Ok(v),
            // sqlite stores booleans as integers
            Value::Int(v) => Ok(v != 0),
            Value::Bigint(v) => Ok(v != 0),
            ref v => Err(mismatch("bool", v)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(v: &Value) -> Result<Self, StoreError> {
        match *v {
            Value::Int(v) => Ok(v),
            // sqlite hands every integer back as 64-bit
            Value::Bigint(v) => i32::try_from(v).map_err(|_| mismatch("i32", &Value::Bigint(v))),
            ref v => Err(mismatch("i32", v)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(v: &Value) -> Result<Self, StoreError> {
        match *v {
            Value::Int(v) => Ok(i64::from(v)),
            Value::Bigint(v) => Ok(v),
            ref v => Err(mismatch("i64", v)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(v: &Value) -> Result<Self, StoreError> {
        match *v {
            Value::Double(v) => Ok(v),
            Value::Int(v) => Ok(f64::from(v)),
            Value::Bigint(v) => Ok(v as f64),
            ref v => Err(mismatch("f64", v)),
        }
    }
}

impl FromValue for String {
    fn from_value(v: &Value) -> Result<Self, StoreError> {
        match *v {
            Value::Text(ref v) => Ok(v.clone()),
            ref v => Err(mismatch("string", v)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: &Value) -> Result<Self, StoreError> {
        match *v {
            Value::Nil => Ok(None),
            ref v => T::from_value(v).map(Some),
        }
    }
}
