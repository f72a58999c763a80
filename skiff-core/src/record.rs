use crate::{AsValue, Result, RowLabeled, Value};
use std::{
    any::{self, TypeId},
    borrow::Cow,
    sync::Arc,
};

/// Default value parser of a column, turns the `default(..)` argument into a [`Value`].
pub type ParseDefault = fn(&str) -> Result<Value>;

/// One declared field of a record, in declaration order.
#[derive(Clone)]
pub enum FieldDef {
    Column {
        /// Field name, the column name unless the tag renames it.
        name: &'static str,
        /// Typed `NULL` of the field type.
        value: Value,
        nullable: bool,
        tag: &'static str,
        parse_default: Option<ParseDefault>,
    },
    /// Fields of an embedded record, flattened in place.
    Embedded(fn() -> Vec<FieldDef>),
}

impl FieldDef {
    /// Column backed by a field of type `T`.
    pub fn column<T: AsValue>(name: &'static str, tag: &'static str) -> Self {
        FieldDef::Column {
            name,
            value: T::as_empty_value(),
            nullable: T::NULLABLE,
            tag,
            parse_default: Some(T::parse_value),
        }
    }

    pub fn embedded<T: Fields>() -> Self {
        FieldDef::Embedded(T::fields)
    }
}

impl std::fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldDef::Column {
                name, value, tag, ..
            } => f
                .debug_struct("Column")
                .field("name", name)
                .field("value", value)
                .field("tag", tag)
                .finish_non_exhaustive(),
            FieldDef::Embedded(fields) => f.debug_tuple("Embedded").field(&fields()).finish(),
        }
    }
}

/// A group of mapped fields, either a whole record or a struct embedded in one.
///
/// Usually derived with `#[derive(Fields)]`.
pub trait Fields {
    fn fields() -> Vec<FieldDef>;
    /// Current field values, in the order of the compiled columns.
    fn values(&self) -> Vec<Value>;
    fn from_row(row: &RowLabeled) -> Result<Self>
    where
        Self: Sized;
}

/// A type mapped to a table or view.
///
/// Usually derived with `#[derive(Record)]`, the table name defaults to the snake
/// case type name.
pub trait Record: Fields + 'static {
    fn table_name() -> Cow<'static, str>;
    /// Table level tag: `name(..)`, `check(name, expr)` and dialect specific properties.
    fn meta() -> Option<&'static str> {
        None
    }
    /// `SELECT` statement, makes the record a view.
    fn view() -> Option<&'static str> {
        None
    }
    /// Identity of the mapped type, smart pointers resolve to the pointee.
    fn base_type() -> TypeId {
        TypeId::of::<Self>()
    }
    fn base_type_name() -> &'static str {
        any::type_name::<Self>()
    }
}

macro_rules! impl_record_pointer {
    ($($pointer:ident),+) => {$(
        impl<T: Fields> Fields for $pointer<T> {
            fn fields() -> Vec<FieldDef> {
                T::fields()
            }
            fn values(&self) -> Vec<Value> {
                (**self).values()
            }
            fn from_row(row: &RowLabeled) -> Result<Self> {
                T::from_row(row).map($pointer::new)
            }
        }

        impl<T: Record> Record for $pointer<T> {
            fn table_name() -> Cow<'static, str> {
                T::table_name()
            }
            fn meta() -> Option<&'static str> {
                T::meta()
            }
            fn view() -> Option<&'static str> {
                T::view()
            }
            fn base_type() -> TypeId {
                T::base_type()
            }
            fn base_type_name() -> &'static str {
                T::base_type_name()
            }
        }
    )+};
}

impl_record_pointer!(Box, Arc);
