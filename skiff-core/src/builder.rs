use crate::{Dialect, IntoParams, Param, QueryError, Result, separated_by};
use std::{
    fmt::{self, Write},
    sync::Arc,
};

const SELECT: u8 = 1 << 0;
const WHERE: u8 = 1 << 1;
const ORDER: u8 = 1 << 2;
const SET: u8 = 1 << 3;
const VALUES: u8 = 1 << 4;
const GROUP: u8 = 1 << 5;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinType {
    #[default]
    Default,
    Inner,
    Outer,
    Left,
    Right,
    Cross,
    Natural,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::Default => "JOIN",
            JoinType::Inner => "INNER JOIN",
            JoinType::Outer => "FULL OUTER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Cross => "CROSS JOIN",
            JoinType::Natural => "NATURAL JOIN",
        }
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Append-only statement buffer with its bound arguments.
///
/// Clause keywords are written once per statement: the first `where_` writes
/// `WHERE`, the following ones `AND`; the same holds for `set`, `values`,
/// `select`, `group_by` and `order_by`. Fragments are not validated. Problems are
/// collected instead of interrupting the chain and surface from [`SqlBuilder::build`].
///
/// ```rust
/// use skiff_core::{GenericDialect, SqlBuilder};
/// use std::sync::Arc;
/// let mut builder = SqlBuilder::new(Arc::new(GenericDialect::new()));
/// builder
///     .select(["a", "b"])
///     .from("t")
///     .where_("x=?", (1,))
///     .where_("y=?", (2,));
/// let (sql, params) = builder.build().unwrap();
/// assert_eq!(sql, "SELECT a,b FROM t WHERE x=? AND y=?");
/// assert_eq!(params.len(), 2);
/// ```
pub struct SqlBuilder {
    dialect: Arc<dyn Dialect>,
    buffer: String,
    params: Vec<Param>,
    opened: u8,
    keys: Option<usize>,
    errors: Vec<String>,
}

impl SqlBuilder {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            buffer: String::with_capacity(128),
            params: Vec::new(),
            opened: 0,
            keys: None,
            errors: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Returns true the first time `clause` is opened.
    fn open(&mut self, clause: u8) -> bool {
        let first = self.opened & clause == 0;
        self.opened |= clause;
        first
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn write_list<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut count = 0;
        separated_by(
            &mut self.buffer,
            items,
            |out, v| {
                count += 1;
                out.push_str(v.as_ref());
            },
            ",",
        );
        count
    }

    pub fn select<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if self.open(SELECT) {
            self.buffer.push_str("SELECT ");
        } else {
            self.buffer.push(',');
        }
        if self.write_list(columns) == 0 {
            self.error("SELECT without columns");
        }
        self
    }

    pub fn from(&mut self, table: &str) -> &mut Self {
        self.buffer.push_str(" FROM ");
        self.buffer.push_str(table);
        self
    }

    pub fn from_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.from(table);
        self.buffer.push_str(" AS ");
        self.buffer.push_str(alias);
        self
    }

    /// `on` is ignored by cross and natural joins.
    pub fn join(&mut self, join: JoinType, table: &str, on: &str) -> &mut Self {
        self.buffer.push(' ');
        self.buffer.push_str(join.keyword());
        self.buffer.push(' ');
        self.buffer.push_str(table);
        if !on.is_empty() && !matches!(join, JoinType::Cross | JoinType::Natural) {
            self.buffer.push_str(" ON ");
            self.buffer.push_str(on);
        }
        self
    }

    fn condition(&mut self, keyword: &str, condition: &str, params: Vec<Param>) {
        if condition.trim().is_empty() {
            self.error("Empty condition");
        }
        self.buffer.push_str(keyword);
        self.buffer.push_str(condition);
        self.params.extend(params);
    }

    /// `WHERE condition` the first time, `AND condition` afterwards.
    pub fn where_(&mut self, condition: &str, params: impl IntoParams) -> &mut Self {
        let keyword = if self.open(WHERE) { " WHERE " } else { " AND " };
        self.condition(keyword, condition, params.into_params());
        self
    }

    /// Same as [`SqlBuilder::where_`].
    pub fn and(&mut self, condition: &str, params: impl IntoParams) -> &mut Self {
        self.where_(condition, params)
    }

    /// `OR condition`, opening the `WHERE` clause if needed.
    pub fn or(&mut self, condition: &str, params: impl IntoParams) -> &mut Self {
        let keyword = if self.open(WHERE) { " WHERE " } else { " OR " };
        self.condition(keyword, condition, params.into_params());
        self
    }

    pub fn group_by<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let keyword = if self.open(GROUP) { " GROUP BY " } else { "," };
        self.buffer.push_str(keyword);
        if self.write_list(columns) == 0 {
            self.error("GROUP BY without columns");
        }
        self
    }

    pub fn order_by(&mut self, column: &str, order: Order) -> &mut Self {
        let keyword = if self.open(ORDER) { " ORDER BY " } else { "," };
        self.buffer.push_str(keyword);
        self.buffer.push_str(column);
        self.buffer.push_str(match order {
            Order::Asc => " ASC",
            Order::Desc => " DESC",
        });
        self
    }

    /// Paging as the dialect writes it, the dialect decides what gets bound.
    pub fn limit(&mut self, limit: u64, offset: Option<u64>) -> &mut Self {
        let values = self.dialect.write_limit(&mut self.buffer, limit, offset);
        self.params.extend(values.into_iter().map(Param::from));
        self
    }

    pub fn insert_into(&mut self, table: &str) -> &mut Self {
        self.buffer.push_str("INSERT INTO ");
        self.buffer.push_str(table);
        self
    }

    /// Column list of an insert, every [`SqlBuilder::values`] group must match its length.
    pub fn keys<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.buffer.push_str(" (");
        let count = self.write_list(columns);
        self.buffer.push(')');
        if count == 0 {
            self.error("Insert without columns");
        }
        self.keys = Some(count);
        self
    }

    /// One group of bound values: `VALUES (?,?)` the first time, `,(?,?)` afterwards.
    pub fn values(&mut self, values: impl IntoParams) -> &mut Self {
        let values = values.into_params();
        if let Some(keys) = self.keys
            && keys != values.len()
        {
            self.error(format!("{keys} columns but {} values", values.len()));
        }
        let keyword = if self.open(VALUES) { " VALUES (" } else { ",(" };
        self.buffer.push_str(keyword);
        separated_by(&mut self.buffer, &values, |out, _| out.push('?'), ",");
        self.buffer.push(')');
        self.params.extend(values);
        self
    }

    pub fn update(&mut self, table: &str) -> &mut Self {
        self.buffer.push_str("UPDATE ");
        self.buffer.push_str(table);
        self
    }

    /// `column=?` bound to `value`.
    pub fn set(&mut self, column: &str, value: impl Into<Param>) -> &mut Self {
        let param: Param = value.into();
        self.set_expr(column, "?", (param,))
    }

    /// `column=expression`, the expression may contain placeholders for `params`.
    pub fn set_expr(
        &mut self,
        column: &str,
        expression: &str,
        params: impl IntoParams,
    ) -> &mut Self {
        let keyword = if self.open(SET) { " SET " } else { "," };
        self.buffer.push_str(keyword);
        self.buffer.push_str(column);
        self.buffer.push('=');
        self.buffer.push_str(expression);
        self.params.extend(params.into_params());
        self
    }

    pub fn delete_from(&mut self, table: &str) -> &mut Self {
        self.buffer.push_str("DELETE FROM ");
        self.buffer.push_str(table);
        self
    }

    /// Appends `sql` as is.
    pub fn raw(&mut self, sql: &str, params: impl IntoParams) -> &mut Self {
        self.buffer.push_str(sql);
        self.params.extend(params.into_params());
        self
    }

    /// Appends formatted text, a failing `Display` implementation is recorded as an error.
    pub fn append(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        if let Err(e) = self.buffer.write_fmt(args) {
            self.error(format!("Formatting failed: {e}"));
        }
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The statement text and its arguments.
    pub fn build(&self) -> Result<(String, Vec<Param>)> {
        if !self.errors.is_empty() {
            return Err(QueryError::HasErrors(self.errors.clone()).into());
        }
        Ok((self.buffer.clone(), self.params.clone()))
    }

    /// Starts over, keeping the dialect.
    pub fn reset(&mut self) -> &mut Self {
        self.buffer.clear();
        self.params.clear();
        self.opened = 0;
        self.keys = None;
        self.errors.clear();
        self
    }
}

impl fmt::Debug for SqlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("dialect", &self.dialect.name())
            .field("buffer", &self.buffer)
            .field("params", &self.params)
            .field("errors", &self.errors)
            .finish()
    }
}
