use std::fmt::{self, Display, Formatter};

/// Kind of a named table constraint, all kinds share the same name namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    Index,
    ForeignKey,
    Check,
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::Index => "index",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Check => "check",
        })
    }
}

/// Failures while compiling a record into a [`crate::Table`].
///
/// Carried inside [`crate::Error`], retrieve it with `error.downcast_ref::<ModelError>()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Malformed tag clause `{clause}`")]
    MalformedTag { clause: String },
    #[error("`{type_name}` is not a struct with named fields")]
    NotAStruct { type_name: String },
    #[error("Unknown property `{property}` on field `{field}`")]
    UnknownProperty { field: String, property: String },
    #[error("Property `{property}` on `{field}` expects {expected} arguments, found {found}")]
    PropertyArity {
        field: String,
        property: String,
        expected: &'static str,
        found: usize,
    },
    #[error("Invalid argument `{value}` for property `{property}` on `{field}`")]
    InvalidArgument {
        field: String,
        property: String,
        value: String,
    },
    #[error("Constraint name `{name}` is already used by a {existing} constraint")]
    ConstraintNameCollision {
        name: String,
        existing: ConstraintKind,
    },
    #[error("Auto increment column `{field}` must have an integer type")]
    InvalidAutoIncrementType { field: String },
    #[error("Optimistic concurrency column `{field}` must have an integer type")]
    InvalidOccType { field: String },
    #[error("Column `{field}` cannot be auto increment: {reason}")]
    AutoIncrementConflict { field: String, reason: &'static str },
    #[error("Column `{field}` cannot be part of the primary key: {reason}")]
    PrimaryKeyConflict { field: String, reason: &'static str },
    #[error("Column `{field}` cannot have a default value: {reason}")]
    DefaultConflict { field: String, reason: &'static str },
    #[error("Column `{field}` cannot be nullable: it is auto increment")]
    NullableConflict { field: String },
    #[error("Table `{table}` declares more than one optimistic concurrency column")]
    MultipleOcc { table: String },
    #[error("Column `{column}` is declared more than once in `{table}`")]
    DuplicateColumn { table: String, column: String },
    #[error("Foreign key `{name}` references the missing local column `{column}`")]
    MissingForeignKeyColumn { name: String, column: String },
    #[error("Table name `{name}` is already registered by another record type")]
    DuplicateModel { name: String },
}

/// Failures while building, rewriting or executing statements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("The statement has errors: {}", .0.join("; "))]
    HasErrors(Vec<String>),
    #[error("Placeholder error in `{query}`: {reason}")]
    Placeholder { query: String, reason: String },
    #[error("Cannot convert {value} to {target}")]
    InvalidColumnType { value: String, target: &'static str },
    #[error("No dialect registered with the name `{0}`")]
    UnknownDialect(String),
    #[error("Table `{0}` has no primary key")]
    NoPrimaryKey(String),
    #[error("Optimistic lock failed on `{0}`, the row was modified concurrently")]
    OptimisticLock(String),
}
