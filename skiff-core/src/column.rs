use crate::{PrimitiveKind, Value};
use std::fmt::{self, Display, Formatter};

/// Referential action for foreign key updates / deletes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No special action.
    #[default]
    NoAction,
    /// Reject the operation.
    Restrict,
    /// Propagate delete/update.
    Cascade,
    /// Set referencing columns to NULL.
    SetNull,
    /// Apply column DEFAULT.
    SetDefault,
}

impl Action {
    /// Case insensitive, spaces and underscores are interchangeable: `set null`, `SET_NULL`.
    pub fn parse(value: &str) -> Option<Action> {
        let value = value.trim().to_ascii_uppercase().replace('_', " ");
        Some(match value.as_str() {
            "NO ACTION" => Action::NoAction,
            "RESTRICT" => Action::Restrict,
            "CASCADE" => Action::Cascade,
            "SET NULL" => Action::SetNull,
            "SET DEFAULT" => Action::SetDefault,
            _ => return None,
        })
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::NoAction => "NO ACTION",
            Action::Restrict => "RESTRICT",
            Action::Cascade => "CASCADE",
            Action::SetNull => "SET NULL",
            Action::SetDefault => "SET DEFAULT",
        })
    }
}

/// Compiled description of a single mapped field.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name in the database.
    pub name: String,
    /// Name of the record field it was compiled from.
    pub field_name: String,
    /// Name of the owning table, including the prefix.
    pub table: String,
    /// Typed `NULL` carrying the source type classification.
    pub value: Value,
    /// Arguments of `len(..)`: length, or precision and scale.
    pub length: Vec<i64>,
    pub nullable: bool,
    pub default: Option<Value>,
    pub auto_increment: bool,
    /// Optimistic concurrency version column.
    pub occ: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        Self {
            field_name: name.clone(),
            name,
            table: String::new(),
            value,
            length: Vec::new(),
            nullable: false,
            default: None,
            auto_increment: false,
            occ: false,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.value.kind()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}
