use crate::{Column, Dialect, Table, Value};
use std::{borrow::Cow, fmt::Write};

/// Native syntax of bound parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    Question,
    /// `$1`, `$2`, ..
    Dollar,
    /// `:1`, `:2`, ..
    Colon,
    /// `@p1`, `@p2`, ..
    AtP,
}

/// How `LIMIT` and `OFFSET` values reach the statement.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// Bound as arguments.
    #[default]
    Placeholder,
    /// Written inline as numbers.
    Literal,
}

/// Configurable ANSI flavoured dialect, registered as `generic`.
///
/// ```rust
/// use skiff_core::{GenericDialect, PlaceholderStyle};
/// let postgres_like = GenericDialect::new()
///     .with_name("pg")
///     .with_placeholder(PlaceholderStyle::Dollar);
/// ```
#[derive(Debug, Clone)]
pub struct GenericDialect {
    name: Cow<'static, str>,
    quotes: (char, char),
    placeholder: PlaceholderStyle,
    limit: LimitStyle,
    multi_row_insert: bool,
    auto_increment: Cow<'static, str>,
}

impl Default for GenericDialect {
    fn default() -> Self {
        Self {
            name: "generic".into(),
            quotes: ('"', '"'),
            placeholder: Default::default(),
            limit: Default::default(),
            multi_row_insert: true,
            auto_increment: "GENERATED BY DEFAULT AS IDENTITY".into(),
        }
    }
}

impl GenericDialect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_quotes(mut self, left: char, right: char) -> Self {
        self.quotes = (left, right);
        self
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn with_limit(mut self, limit: LimitStyle) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_multi_row_insert(mut self, multi_row_insert: bool) -> Self {
        self.multi_row_insert = multi_row_insert;
        self
    }

    /// Keyword written after the type of the auto increment column.
    pub fn with_auto_increment(mut self, keyword: impl Into<Cow<'static, str>>) -> Self {
        self.auto_increment = keyword.into();
        self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &str {
        &self.name
    }

    fn quotes(&self) -> (char, char) {
        self.quotes
    }

    fn write_placeholder(&self, out: &mut String, index: usize) {
        let prefix = match self.placeholder {
            PlaceholderStyle::Question => return out.push('?'),
            PlaceholderStyle::Dollar => "$",
            PlaceholderStyle::Colon => ":",
            PlaceholderStyle::AtP => "@p",
        };
        out.push_str(prefix);
        let mut buffer = itoa::Buffer::new();
        out.push_str(buffer.format(index));
    }

    fn write_limit(&self, out: &mut String, limit: u64, offset: Option<u64>) -> Vec<Value> {
        match self.limit {
            LimitStyle::Placeholder => {
                out.push_str(" LIMIT ?");
                let mut values = vec![Value::UInt64(Some(limit))];
                if let Some(offset) = offset {
                    out.push_str(" OFFSET ?");
                    values.push(Value::UInt64(Some(offset)));
                }
                values
            }
            LimitStyle::Literal => {
                let _ = write!(out, " LIMIT {limit}");
                if let Some(offset) = offset {
                    let _ = write!(out, " OFFSET {offset}");
                }
                Vec::new()
            }
        }
    }

    fn write_auto_increment_column(&self, out: &mut String, column: &Column) {
        out.push('\n');
        self.write_identifier(out, &column.name);
        out.push(' ');
        self.write_column_type(out, column);
        out.push_str(" NOT NULL");
        if !self.auto_increment.is_empty() {
            out.push(' ');
            out.push_str(&self.auto_increment);
        }
        out.push(',');
    }

    fn truncate_table_sql(&self, table: &Table) -> Vec<String> {
        let mut out = String::from("TRUNCATE TABLE ");
        self.write_identifier(&mut out, &table.name);
        if table.auto_increment.is_some() {
            out.push_str(" RESTART IDENTITY");
        }
        vec![out]
    }

    fn supports_multi_row_insert(&self) -> bool {
        self.multi_row_insert
    }
}
