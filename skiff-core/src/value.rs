use crate::{AsValue, Result};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed cell used for bound arguments, defaults and fetched rows.
///
/// The `None` payload of each variant is the prototype of a column: it carries the
/// type classification without a value.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>, /* precision: */ u8, /* scale: */ u8),
    Char(Option<char>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

/// Classification of a column by the Rust type it was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Decimal,
    String,
    Bytes,
    Date,
    Time,
    Timestamp,
    Uuid,
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::UInt8(None)
            | Value::UInt16(None)
            | Value::UInt32(None)
            | Value::UInt64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None, ..)
            | Value::Char(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::TimestampWithTimezone(None)
            | Value::Uuid(None) => true,
            _ => false,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Value::Null => PrimitiveKind::Null,
            Value::Boolean(..) => PrimitiveKind::Bool,
            Value::Int8(..) | Value::Int16(..) | Value::Int32(..) | Value::Int64(..) => {
                PrimitiveKind::Int
            }
            Value::UInt8(..) | Value::UInt16(..) | Value::UInt32(..) | Value::UInt64(..) => {
                PrimitiveKind::UInt
            }
            Value::Float32(..) | Value::Float64(..) => PrimitiveKind::Float,
            Value::Decimal(..) => PrimitiveKind::Decimal,
            Value::Char(..) | Value::Varchar(..) => PrimitiveKind::String,
            Value::Blob(..) => PrimitiveKind::Bytes,
            Value::Date(..) => PrimitiveKind::Date,
            Value::Time(..) => PrimitiveKind::Time,
            Value::Timestamp(..) | Value::TimestampWithTimezone(..) => PrimitiveKind::Timestamp,
            Value::Uuid(..) => PrimitiveKind::Uuid,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind(), PrimitiveKind::Int | PrimitiveKind::UInt)
    }

    /// Widened integer payload, if this is a non null integer.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Int8(Some(v)) => Some(v as _),
            Value::Int16(Some(v)) => Some(v as _),
            Value::Int32(Some(v)) => Some(v as _),
            Value::Int64(Some(v)) => Some(v as _),
            Value::UInt8(Some(v)) => Some(v as _),
            Value::UInt16(Some(v)) => Some(v as _),
            Value::UInt32(Some(v)) => Some(v as _),
            Value::UInt64(Some(v)) => Some(v as _),
            _ => None,
        }
    }

    /// Parse `input` into a value of the same variant as `self`.
    pub fn parse_as(&self, input: &str) -> Result<Value> {
        match self {
            Value::Null => String::parse_value(input),
            Value::Boolean(..) => bool::parse_value(input),
            Value::Int8(..) => i8::parse_value(input),
            Value::Int16(..) => i16::parse_value(input),
            Value::Int32(..) => i32::parse_value(input),
            Value::Int64(..) => i64::parse_value(input),
            Value::UInt8(..) => u8::parse_value(input),
            Value::UInt16(..) => u16::parse_value(input),
            Value::UInt32(..) => u32::parse_value(input),
            Value::UInt64(..) => u64::parse_value(input),
            Value::Float32(..) => f32::parse_value(input),
            Value::Float64(..) => f64::parse_value(input),
            Value::Decimal(_, precision, scale) => Ok(Value::Decimal(
                Some(<Decimal as AsValue>::parse(input)?),
                *precision,
                *scale,
            )),
            Value::Char(..) => char::parse_value(input),
            Value::Varchar(..) => String::parse_value(input),
            Value::Blob(..) => Box::<[u8]>::parse_value(input),
            Value::Date(..) => Date::parse_value(input),
            Value::Time(..) => Time::parse_value(input),
            Value::Timestamp(..) => PrimitiveDateTime::parse_value(input),
            Value::TimestampWithTimezone(..) => OffsetDateTime::parse_value(input),
            Value::Uuid(..) => Uuid::parse_value(input),
        }
    }
}

/// Argument bound to a statement, positional unless it carries a name (`@name`).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub value: Value,
}

impl Param {
    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Self { name: None, value }
    }
}

impl<T: AsValue> From<T> for Param {
    fn from(value: T) -> Self {
        Self {
            name: None,
            value: value.as_value(),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self {
            name: None,
            value: Value::Varchar(Some(value.into())),
        }
    }
}

/// Anything that can be turned into a list of statement arguments.
///
/// Implemented for `()`, tuples, arrays and vectors of values.
pub trait IntoParams {
    fn into_params(self) -> Vec<Param>;
}

impl IntoParams for () {
    fn into_params(self) -> Vec<Param> {
        Vec::new()
    }
}

impl<T: Into<Param>> IntoParams for Vec<T> {
    fn into_params(self) -> Vec<Param> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Param>, const N: usize> IntoParams for [T; N] {
    fn into_params(self) -> Vec<Param> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! impl_into_params {
    ($($name:ident),+) => {
        impl<$($name: Into<Param>),+> IntoParams for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_params(self) -> Vec<Param> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_params!(A);
impl_into_params!(A, B);
impl_into_params!(A, B, C);
impl_into_params!(A, B, C, D);
impl_into_params!(A, B, C, D, E);
impl_into_params!(A, B, C, D, E, F);
impl_into_params!(A, B, C, D, E, F, G);
impl_into_params!(A, B, C, D, E, F, G, H);
