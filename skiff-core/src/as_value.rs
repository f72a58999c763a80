use crate::{Error, QueryError, Result, Value, truncate_long};
use anyhow::Context;
use atoi::FromRadix10SignedChecked;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{any, borrow::Cow, sync::Arc};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// # Parsing contract
/// `parse` reads a whole literal, as written in a `default(..)` tag property or
/// returned as text by a database. Surrounding single or double quotes are
/// accepted and the input must be consumed completely: `123abc` is an error.
///
/// ```rust
/// use skiff_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Whether a column declared with this type accepts `NULL`.
    const NULLABLE: bool = false;

    /// Typed `NULL`, the prototype of a column of this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    /// Accepts the canonical variant plus lossless conversions from other widths.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    fn parse(input: &str) -> Result<Self>
    where
        Self: Sized;
    /// Parse straight into a [`Value`], this is the default value parser of a column.
    fn parse_value(input: &str) -> Result<Value>
    where
        Self: Sized,
    {
        Self::parse(input).map(Self::as_value)
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn invalid<T>(value: &Value) -> Error {
    let value = format!("{value:?}");
    QueryError::InvalidColumnType {
        value: format!("{}", truncate_long!(value)),
        target: any::type_name::<T>(),
    }
    .into()
}

fn cannot_parse<T>(input: &str) -> Error {
    Error::msg(format!(
        "Cannot parse `{}` as {}",
        truncate_long!(input),
        any::type_name::<T>()
    ))
}

fn unquote(input: &str) -> &str {
    let input = input.trim();
    for quote in ['\'', '"'] {
        if input.len() >= 2 && input.starts_with(quote) && input.ends_with(quote) {
            return &input[1..input.len() - 1];
        }
    }
    input
}

fn parse_integer<T: FromRadix10SignedChecked>(input: &str) -> Result<T> {
    let value = unquote(input);
    match T::from_radix_10_signed_checked(value.as_bytes()) {
        (Some(v), len) if len > 0 && len == value.len() => Ok(v),
        _ => Err(cannot_parse::<T>(input)),
    }
}

macro_rules! impl_as_value {
    (
        $source:ty,
        $destination:path,
        $parse:expr
        $(, $pat_rest:pat $(if $guard:expr)? => $expr_rest:expr)* $(,)?
    ) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest $(if $guard)? => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    _ => Err(invalid::<Self>(&value)),
                }
            }
            fn parse(input: &str) -> Result<Self> {
                $parse(input)
            }
        }
    };
}

macro_rules! impl_as_value_integer {
    ($($source:ty => $destination:path),+ $(,)?) => {$(
        impl_as_value!(
            $source,
            $destination,
            parse_integer::<$source>,
            ref v if v.as_integer().is_some() => v
                .as_integer()
                .and_then(|n| <$source>::try_from(n).ok())
                .ok_or_else(|| invalid::<$source>(v)),
        );
    )+};
}

impl_as_value_integer!(
    i8 => Value::Int8,
    i16 => Value::Int16,
    i32 => Value::Int32,
    i64 => Value::Int64,
    u8 => Value::UInt8,
    u16 => Value::UInt16,
    u32 => Value::UInt32,
    u64 => Value::UInt64,
);

impl_as_value!(
    bool,
    Value::Boolean,
    |input: &str| match unquote(input).to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(cannot_parse::<bool>(input)),
    },
    ref v if v.as_integer().is_some() => Ok(v.as_integer() != Some(0)),
);

impl_as_value!(
    f32,
    Value::Float32,
    |input: &str| fast_float::parse(unquote(input)).map_err(|_| cannot_parse::<f32>(input)),
    ref v if v.as_integer().is_some() => v
        .as_integer()
        .filter(|n| n.unsigned_abs() <= 1 << f32::MANTISSA_DIGITS)
        .map(|n| n as f32)
        .ok_or_else(|| invalid::<f32>(v)),
);

impl_as_value!(
    f64,
    Value::Float64,
    |input: &str| fast_float::parse(unquote(input)).map_err(|_| cannot_parse::<f64>(input)),
    Value::Float32(Some(v)) => Ok(v as f64),
    ref v if v.as_integer().is_some() => v
        .as_integer()
        .filter(|n| n.unsigned_abs() <= 1 << f64::MANTISSA_DIGITS)
        .map(|n| n as f64)
        .ok_or_else(|| invalid::<f64>(v)),
);

impl_as_value!(
    char,
    Value::Char,
    |input: &str| {
        let value = unquote(input);
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(cannot_parse::<char>(input)),
        }
    },
    Value::Varchar(Some(ref v)) if v.chars().count() == 1 => {
        v.chars().next().ok_or_else(|| cannot_parse::<char>(v))
    },
);

impl_as_value!(
    String,
    Value::Varchar,
    |input: &str| {
        let trimmed = input.trim();
        Ok(if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
            trimmed[1..trimmed.len() - 1].replace("''", "'")
        } else {
            unquote(input).to_string()
        })
    },
    Value::Char(Some(v)) => Ok(v.into()),
);

impl_as_value!(
    Box<[u8]>,
    Value::Blob,
    |input: &str| {
        let mut value = unquote(input);
        if value.len() >= 2 && value[..2].eq_ignore_ascii_case("\\x") {
            value = &value[2..];
        } else if value.len() >= 3
            && value[..2].eq_ignore_ascii_case("x'")
            && value.ends_with('\'')
        {
            value = &value[2..value.len() - 1];
        }
        hex::decode(value)
            .map(Into::into)
            .with_context(|| format!("While decoding `{}` as a blob", truncate_long!(input)))
    },
);

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
    fn parse(input: &str) -> Result<Self> {
        Box::<[u8]>::parse(input).map(Into::into)
    }
}

impl AsValue for Cow<'static, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
    fn parse(input: &str) -> Result<Self> {
        String::parse(input).map(Cow::Owned)
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, self.scale() as _)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Float32(Some(v)) => Decimal::from_f32(v).ok_or_else(|| invalid::<Self>(&value)),
            Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(|| invalid::<Self>(&value)),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            ref v => v
                .as_integer()
                .and_then(Decimal::from_i128)
                .ok_or_else(|| invalid::<Self>(v)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        unquote(input)
            .parse::<Decimal>()
            .map_err(|_| cannot_parse::<Self>(input))
    }
}

impl_as_value!(
    Uuid,
    Value::Uuid,
    |input: &str| Uuid::parse_str(unquote(input)).map_err(|_| cannot_parse::<Uuid>(input)),
);

impl_as_value!(Date, Value::Date, |input: &str| {
    Date::parse(unquote(input), format_description!("[year]-[month]-[day]"))
        .map_err(|_| cannot_parse::<Date>(input))
});

impl_as_value!(Time, Value::Time, |input: &str| {
    let value = unquote(input);
    Time::parse(
        value,
        format_description!("[hour]:[minute]:[second].[subsecond]"),
    )
    .or(Time::parse(value, format_description!("[hour]:[minute]:[second]")))
    .or(Time::parse(value, format_description!("[hour]:[minute]")))
    .map_err(|_| cannot_parse::<Time>(input))
});

impl_as_value!(PrimitiveDateTime, Value::Timestamp, |input: &str| {
    let value = unquote(input);
    PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or(PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ))
    .or(PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ))
    .or(PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ))
    .map_err(|_| cannot_parse::<PrimitiveDateTime>(input))
});

impl_as_value!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    |input: &str| {
        let value = unquote(input);
        OffsetDateTime::parse(
            value,
            format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
            ),
        )
        .or(OffsetDateTime::parse(
            value,
            format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
            ),
        ))
        .or(OffsetDateTime::parse(
            value,
            format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
            ),
        ))
        .map_err(Error::from)
        .or_else(|_| <PrimitiveDateTime as AsValue>::parse(value).map(PrimitiveDateTime::assume_utc))
        .map_err(|_| cannot_parse::<OffsetDateTime>(input))
    },
    Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
);

impl<T: AsValue> AsValue for Option<T> {
    const NULLABLE: bool = true;

    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(T::try_from_value(value)?)
        })
    }
    fn parse(input: &str) -> Result<Self> {
        if input.trim().eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        T::parse(input).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
    fn parse(input: &str) -> Result<Self> {
        T::parse(input).map(Box::new)
    }
}

impl<T: AsValue + Clone> AsValue for Arc<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        Arc::unwrap_or_clone(self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Arc::new)
    }
    fn parse(input: &str) -> Result<Self> {
        T::parse(input).map(Arc::new)
    }
}
