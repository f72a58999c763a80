use crate::{
    Column, GenericDialect, Param, QueryError, Result, Table, Value, separated_by, trim_separator,
    write_escaped,
};
use std::{
    collections::HashMap,
    fmt::Write,
    sync::{Arc, LazyLock, RwLock},
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// Replaced by the engine with its table prefix.
pub const TABLE_PREFIX: char = '#';
/// Replaced by the engine with the dialect's opening identifier quote.
pub const QUOTE_LEFT: char = '{';
/// Replaced by the engine with the dialect's closing identifier quote.
pub const QUOTE_RIGHT: char = '}';

/// Wraps `name` in the generic quote markers: `{name}`.
pub fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(QUOTE_LEFT);
    out.push_str(name);
    out.push(QUOTE_RIGHT);
    out
}

/// Source of the argument bound to one rewritten placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSlot {
    /// The n-th positional argument (`?`), from 0.
    Position(usize),
    /// The argument named `@name`.
    Named(String),
}

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Everything database specific: quoting, placeholders, paging and DDL.
///
/// Statements are written in a generic form: identifiers between [`QUOTE_LEFT`] and
/// [`QUOTE_RIGHT`], `?` for positional and `@name` for named arguments. Only `name`
/// is required, the provided methods render portable SQL.
///
/// DDL fragment writers terminate their output with `,`, the table writer trims the
/// last one.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &str;

    /// Identifier quoting pair.
    fn quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Writes the native marker of the `index`-th placeholder, counting from 1.
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    /// Rewrites generic placeholders and resolves `params` into binding order.
    fn fix(&self, query: &str, params: Vec<Param>) -> Result<(String, Vec<Value>)> {
        let (fixed, slots) = self.prepare(query)?;
        let args = bind_arguments(query, &slots, params)?;
        Ok((fixed, args))
    }

    /// Rewrites generic placeholders, returning where each argument comes from.
    fn prepare(&self, query: &str) -> Result<(String, Vec<ArgSlot>)> {
        rewrite_placeholders(query, |out, index| self.write_placeholder(out, index))
    }

    /// Appends the paging fragment and returns the values to bind for it.
    fn write_limit(&self, out: &mut String, limit: u64, offset: Option<u64>) -> Vec<Value> {
        out.push_str(" LIMIT ?");
        let mut values = vec![Value::UInt64(Some(limit))];
        if let Some(offset) = offset {
            out.push_str(" OFFSET ?");
            values.push(Value::UInt64(Some(offset)));
        }
        values
    }

    fn write_identifier(&self, out: &mut String, name: &str) {
        out.push(QUOTE_LEFT);
        out.push_str(name);
        out.push(QUOTE_RIGHT);
    }

    fn write_column_type(&self, out: &mut String, column: &Column) {
        let length = column.length.first().copied().filter(|v| *v > 0);
        match &column.value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) | Value::Int16(..) | Value::UInt8(..) => out.push_str("SMALLINT"),
            Value::Int32(..) | Value::UInt16(..) => out.push_str("INTEGER"),
            Value::Int64(..) | Value::UInt32(..) => out.push_str("BIGINT"),
            Value::UInt64(..) => out.push_str("NUMERIC(20)"),
            Value::Float32(..) => out.push_str("REAL"),
            Value::Float64(..) => out.push_str("DOUBLE PRECISION"),
            Value::Decimal(_, precision, scale) => {
                out.push_str("DECIMAL");
                let (precision, scale) = match column.length[..] {
                    [precision, scale] => (precision, scale),
                    [precision] => (precision, 0),
                    _ => (*precision as i64, *scale as i64),
                };
                if (precision, scale) != (0, 0) {
                    let _ = write!(out, "({precision},{scale})");
                }
            }
            Value::Char(..) => {
                let _ = write!(out, "CHAR({})", length.unwrap_or(1));
            }
            Value::Varchar(..) => match length {
                Some(length) => {
                    let _ = write!(out, "VARCHAR({length})");
                }
                None => out.push_str("TEXT"),
            },
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::TimestampWithTimezone(..) => out.push_str("TIMESTAMP WITH TIME ZONE"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::Null => {
                log::error!(
                    "Column `{}` of `{}` has no type, writing TEXT",
                    column.name,
                    column.table
                );
                out.push_str("TEXT");
            }
        }
    }

    /// Renders a literal, used for column defaults.
    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => out.push_str("NULL"),
            Value::Boolean(Some(v)) => out.push_str(["false", "true"][*v as usize]),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) if v.is_finite() => {
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format(*v));
            }
            Value::Float32(Some(v)) => self.write_value_float(out, *v as f64),
            Value::Float64(Some(v)) => self.write_value_float(out, *v),
            Value::Decimal(Some(v), ..) => {
                let _ = write!(out, "{v}");
            }
            Value::Char(Some(v)) => {
                let mut buf = [0u8; 4];
                self.write_value_string(out, v.encode_utf8(&mut buf));
            }
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => {
                out.push_str("X'");
                out.push_str(&hex::encode_upper(v));
                out.push('\'');
            }
            Value::Date(Some(v)) => self.write_value_date(out, v),
            Value::Time(Some(v)) => self.write_value_time(out, v),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(out, v),
            Value::TimestampWithTimezone(Some(v)) => {
                self.write_value_timestamp_with_timezone(out, v)
            }
            Value::Uuid(Some(v)) => {
                let _ = write!(out, "'{v}'");
            }
            _ => log::error!("Cannot write {value:?}"),
        }
    }

    fn write_value_float(&self, out: &mut String, value: f64) {
        if value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            out.push_str(buffer.format(value));
        } else {
            let _ = write!(out, "CAST('{value}' AS DOUBLE PRECISION)");
        }
    }

    /// Single quoted, quotes are doubled.
    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "'{:04}-{:02}-{:02}'",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let _ = write!(
            out,
            "'{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second()
        );
        let mut subsecond = value.nanosecond();
        if subsecond != 0 {
            let mut width = 9;
            while subsecond % 10 == 0 {
                subsecond /= 10;
                width -= 1;
            }
            let _ = write!(out, ".{subsecond:0width$}");
        }
        out.push('\'');
    }

    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        self.write_value_date(out, &value.date());
        out.pop();
        out.push(' ');
        let position = out.len();
        self.write_value_time(out, &value.time());
        out.remove(position);
    }

    /// Local date and time followed by the offset: `'2024-01-01 10:00:00+02:00'`.
    fn write_value_timestamp_with_timezone(&self, out: &mut String, value: &OffsetDateTime) {
        self.write_value_timestamp(out, &PrimitiveDateTime::new(value.date(), value.time()));
        out.pop();
        let offset = value.offset();
        let (hours, minutes, seconds) = offset.as_hms();
        let sign = if offset.is_negative() { '-' } else { '+' };
        let _ = write!(
            out,
            "{sign}{:02}:{:02}",
            hours.unsigned_abs(),
            minutes.unsigned_abs()
        );
        if seconds != 0 {
            let _ = write!(out, ":{:02}", seconds.unsigned_abs());
        }
        out.push('\'');
    }

    /// Column definition of a column that is not auto increment.
    fn write_column(&self, out: &mut String, column: &Column) {
        out.push('\n');
        self.write_identifier(out, &column.name);
        out.push(' ');
        self.write_column_type(out, column);
        if !column.nullable {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            out.push_str(" DEFAULT ");
            self.write_value(out, default);
        }
        out.push(',');
    }

    fn write_auto_increment_column(&self, out: &mut String, column: &Column) {
        out.push('\n');
        self.write_identifier(out, &column.name);
        out.push(' ');
        self.write_column_type(out, column);
        out.push_str(" NOT NULL GENERATED BY DEFAULT AS IDENTITY,");
    }

    /// Primary key, unique, foreign key and check constraints.
    fn write_constraints(&self, out: &mut String, table: &Table) {
        if !table.primary_key.is_empty() {
            out.push_str("\nCONSTRAINT ");
            self.write_identifier(out, &format!("{}_pk", table.name));
            out.push_str(" PRIMARY KEY (");
            self.write_identifier_list(out, &table.column_names(&table.primary_key));
            out.push_str("),");
        }
        for (name, columns) in &table.uniques {
            out.push_str("\nCONSTRAINT ");
            self.write_identifier(out, name);
            out.push_str(" UNIQUE (");
            self.write_identifier_list(out, &table.column_names(columns));
            out.push_str("),");
        }
        for foreign_key in table.foreign_keys.values() {
            out.push_str("\nCONSTRAINT ");
            self.write_identifier(out, &foreign_key.name);
            out.push_str(" FOREIGN KEY (");
            self.write_identifier_list(out, &table.column_names(&[foreign_key.column]));
            out.push_str(") REFERENCES ");
            self.write_identifier(out, &format!("{TABLE_PREFIX}{}", foreign_key.table));
            out.push_str(" (");
            self.write_identifier(out, &foreign_key.references);
            out.push(')');
            if let Some(action) = foreign_key.on_update {
                let _ = write!(out, " ON UPDATE {action}");
            }
            if let Some(action) = foreign_key.on_delete {
                let _ = write!(out, " ON DELETE {action}");
            }
            out.push(',');
        }
        for (name, expression) in &table.checks {
            out.push_str("\nCONSTRAINT ");
            self.write_identifier(out, name);
            let _ = write!(out, " CHECK ({expression}),");
        }
    }

    fn write_identifier_list(&self, out: &mut String, names: &[&str]) {
        separated_by(out, names, |out, v| self.write_identifier(out, v), ", ");
    }

    /// Trailing table options built from the table meta, nothing by default.
    fn write_table_options(&self, _out: &mut String, _table: &Table) {}

    /// `CREATE TABLE` or `CREATE VIEW`, followed by the `CREATE INDEX` statements.
    fn create_table_sql(&self, table: &Table) -> Vec<String> {
        let mut out = String::with_capacity(64 + table.columns.len() * 48);
        if let Some(view) = &table.view {
            out.push_str("CREATE VIEW ");
            self.write_identifier(&mut out, &table.name);
            out.push_str(" AS ");
            out.push_str(view);
            return vec![out];
        }
        out.push_str("CREATE TABLE IF NOT EXISTS ");
        self.write_identifier(&mut out, &table.name);
        out.push_str(" (");
        for (i, column) in table.columns.iter().enumerate() {
            if table.auto_increment == Some(i) {
                self.write_auto_increment_column(&mut out, column);
            } else {
                self.write_column(&mut out, column);
            }
        }
        self.write_constraints(&mut out, table);
        trim_separator(&mut out, ',');
        out.push_str("\n)");
        self.write_table_options(&mut out, table);
        let mut result = vec![out];
        for (name, columns) in &table.indexes {
            let mut out = String::from("CREATE INDEX IF NOT EXISTS ");
            self.write_identifier(&mut out, name);
            out.push_str(" ON ");
            self.write_identifier(&mut out, &table.name);
            out.push_str(" (");
            self.write_identifier_list(&mut out, &table.column_names(columns));
            out.push(')');
            result.push(out);
        }
        result
    }

    fn drop_table_sql(&self, table: &Table) -> Vec<String> {
        let mut out = String::from(if table.is_view() {
            "DROP VIEW IF EXISTS "
        } else {
            "DROP TABLE IF EXISTS "
        });
        self.write_identifier(&mut out, &table.name);
        vec![out]
    }

    /// Empties the table and resets its auto increment counter.
    fn truncate_table_sql(&self, table: &Table) -> Vec<String> {
        let mut out = String::from("TRUNCATE TABLE ");
        self.write_identifier(&mut out, &table.name);
        vec![out]
    }

    /// Whether one `INSERT` may carry several `VALUES` groups.
    fn supports_multi_row_insert(&self) -> bool {
        true
    }
}

fn placeholder_error(query: &str, reason: impl Into<String>) -> crate::Error {
    let query = query.to_string();
    QueryError::Placeholder {
        query: format!("{}", crate::truncate_long!(query)),
        reason: reason.into(),
    }
    .into()
}

/// Replaces `?` and `@name` markers outside of quoted text through `placeholder`.
///
/// `placeholder` receives the 1-based index of the marker. `@@` is kept as written.
pub fn rewrite_placeholders(
    query: &str,
    mut placeholder: impl FnMut(&mut String, usize),
) -> Result<(String, Vec<ArgSlot>)> {
    let mut out = String::with_capacity(query.len() + 16);
    let mut slots = Vec::new();
    let mut positional = 0;
    let mut quoted: Option<char> = None;
    let mut chars = query.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match (quoted, c) {
            (Some(q), c) if c == q => {
                quoted = None;
                out.push(c);
            }
            (Some(..), c) => out.push(c),
            (None, '\'' | '"') => {
                quoted = Some(c);
                out.push(c);
            }
            (None, '?') => {
                slots.push(ArgSlot::Position(positional));
                positional += 1;
                placeholder(&mut out, slots.len());
            }
            (None, '@') => {
                if chars.next_if(|(_, c)| *c == '@').is_some() {
                    out.push_str("@@");
                    continue;
                }
                let start = i + 1;
                let mut end = start;
                while let Some((j, c)) =
                    chars.next_if(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
                {
                    end = j + c.len_utf8();
                }
                if start == end {
                    out.push('@');
                } else {
                    slots.push(ArgSlot::Named(query[start..end].to_string()));
                    placeholder(&mut out, slots.len());
                }
            }
            (None, c) => out.push(c),
        }
    }
    if let Some(q) = quoted {
        return Err(placeholder_error(
            query,
            format!("unterminated literal opened by {q}"),
        ));
    }
    Ok((out, slots))
}

/// Orders `params` the way `slots` asks for them.
///
/// Every positional parameter must be consumed exactly once, named parameters may
/// be referenced any number of times.
pub fn bind_arguments(query: &str, slots: &[ArgSlot], params: Vec<Param>) -> Result<Vec<Value>> {
    let mut positional = Vec::new();
    let mut named = HashMap::new();
    for param in params {
        match param.name {
            Some(name) => {
                named.insert(name, param.value);
            }
            None => positional.push(param.value),
        }
    }
    let markers = slots
        .iter()
        .filter(|v| matches!(v, ArgSlot::Position(..)))
        .count();
    if markers != positional.len() {
        return Err(placeholder_error(
            query,
            format!(
                "{markers} positional placeholders but {} positional arguments",
                positional.len()
            ),
        ));
    }
    slots
        .iter()
        .map(|slot| match slot {
            ArgSlot::Position(i) => Ok(positional[*i].clone()),
            ArgSlot::Named(name) => named
                .get(name)
                .cloned()
                .ok_or_else(|| placeholder_error(query, format!("missing argument @{name}"))),
        })
        .collect()
}

static DIALECTS: LazyLock<RwLock<HashMap<String, Arc<dyn Dialect>>>> = LazyLock::new(|| {
    let generic: Arc<dyn Dialect> = Arc::new(GenericDialect::new());
    RwLock::new(HashMap::from([("generic".to_string(), generic)]))
});

/// Makes `dialect` available to [`dialect`] lookups, returns the one it replaces.
pub fn register_dialect(
    name: impl Into<String>,
    dialect: Arc<dyn Dialect>,
) -> Option<Arc<dyn Dialect>> {
    DIALECTS
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(name.into(), dialect)
}

/// Registered dialect by name, `generic` is always available.
pub fn dialect(name: &str) -> Result<Arc<dyn Dialect>> {
    DIALECTS
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
        .cloned()
        .ok_or_else(|| QueryError::UnknownDialect(name.to_string()).into())
}
