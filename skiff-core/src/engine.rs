use crate::{
    ArgSlot, Connection, Dialect, Error, Executor, Fields, IntoParams, Param, Query, QueryError,
    QUOTE_LEFT, QUOTE_RIGHT, Record, Registry, Result, RowLabeled, RowsAffected, SqlBuilder,
    TABLE_PREFIX, Table, Transaction, Value, bind_arguments, dialect, quote, truncate_long,
};
use futures::{
    Stream, TryFutureExt, TryStreamExt,
    future::{Either, ready},
    stream,
};
use std::{fmt, sync::Arc};

/// Per engine settings.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Written in place of the table prefix marker and in front of every model table name.
    pub prefix: String,
    /// Log every statement to the `skiff::sql` target before it is rewritten.
    pub debug: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            debug: true,
        }
    }
}

/// A prepared statement together with the argument order of its placeholders.
#[derive(Clone)]
pub struct Statement<P> {
    prepared: P,
    slots: Vec<ArgSlot>,
    query: String,
}

impl<P> Statement<P> {
    pub fn prepared(&self) -> &P {
        &self.prepared
    }

    /// Statement text in generic form, as it was passed to [`Engine::prepare`].
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl<P> fmt::Debug for Statement<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("query", &self.query)
            .field("slots", &self.slots)
            .finish()
    }
}

/// Replaces the table prefix and generic quote markers outside of quoted text.
pub fn substitute_markers(query: &str, prefix: &str, quotes: (char, char)) -> String {
    let mut out = String::with_capacity(query.len() + prefix.len() * 2);
    let mut quoted: Option<char> = None;
    for c in query.chars() {
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
            (None, TABLE_PREFIX) => out.push_str(prefix),
            (None, QUOTE_LEFT) => out.push(quotes.0),
            (None, QUOTE_RIGHT) => out.push(quotes.1),
            (None, c) => out.push(c),
        }
    }
    out
}

fn with_query_context(error: Error, query: &str) -> Error {
    let error = error.context(format!("While executing the query:\n{}", truncate_long!(query)));
    log::error!("{:#}", error);
    error
}

/// Runs generic statements on an executor.
///
/// Every statement first goes through the dialect placeholder rewrite, then the
/// prefix and quote markers are substituted, and only then it reaches the executor.
pub struct Engine<E> {
    executor: E,
    dialect: Arc<dyn Dialect>,
    registry: Arc<Registry>,
    options: EngineOptions,
}

impl<E> Engine<E> {
    pub fn new(
        executor: E,
        dialect: Arc<dyn Dialect>,
        registry: Arc<Registry>,
        options: EngineOptions,
    ) -> Self {
        Self {
            executor,
            dialect,
            registry,
            options,
        }
    }

    /// Engine using the dialect registered as `name`.
    pub fn with_dialect_name(
        executor: E,
        name: &str,
        registry: Arc<Registry>,
        options: EngineOptions,
    ) -> Result<Self> {
        Ok(Self::new(executor, dialect(name)?, registry, options))
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// New builder session for this engine's dialect.
    pub fn builder(&self) -> SqlBuilder {
        SqlBuilder::new(self.dialect.clone())
    }

    /// Compiled table of `T` for this engine's prefix.
    pub fn model<T: Record>(&self) -> Result<Arc<Table>> {
        self.registry.compile::<T>(&self.options.prefix)
    }

    /// Final text and arguments for a generic statement.
    pub fn rewrite(&self, query: &str, params: Vec<Param>) -> Result<(String, Vec<Value>)> {
        if self.options.debug {
            log::debug!(target: "skiff::sql", "{}", truncate_long!(query));
        }
        let (fixed, args) = self.dialect.fix(query, params)?;
        Ok((self.substitute(&fixed), args))
    }

    fn substitute(&self, query: &str) -> String {
        substitute_markers(query, &self.options.prefix, self.dialect.quotes())
    }
}

impl<E: Executor> Engine<E> {
    pub async fn execute(&mut self, query: &str, params: impl IntoParams) -> Result<RowsAffected> {
        let result = match self.rewrite(query, params.into_params()) {
            Ok((sql, args)) => self.executor.execute(Query::Raw(sql), args).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| with_query_context(e, query))
    }

    /// Rows returned by `query`.
    pub fn query(
        &mut self,
        query: &str,
        params: impl IntoParams,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.fetch_rows(query.to_string(), params.into_params())
    }

    fn fetch_rows(
        &mut self,
        query: String,
        params: Vec<Param>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let rewritten = self.rewrite(&query, params);
        let executor = &mut self.executor;
        async move {
            let (sql, args) = rewritten?;
            Ok::<_, Error>(executor.fetch(Query::Raw(sql), args))
        }
        .try_flatten_stream()
        .map_err(move |e| with_query_context(e, &query))
    }

    /// First row returned by `query`, if any.
    pub async fn query_row(
        &mut self,
        query: &str,
        params: impl IntoParams,
    ) -> Result<Option<RowLabeled>> {
        let result = match self.rewrite(query, params.into_params()) {
            Ok((sql, args)) => self.executor.fetch_one(Query::Raw(sql), args).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| with_query_context(e, query))
    }

    /// Prepares `query` on the executor, arguments are supplied when it runs.
    pub async fn prepare(&mut self, query: &str) -> Result<Statement<E::Prepared>> {
        if self.options.debug {
            log::debug!(target: "skiff::sql", "Prepare {}", truncate_long!(query));
        }
        let result = match self.dialect.prepare(query) {
            Ok((fixed, slots)) => {
                let sql = self.substitute(&fixed);
                self.executor
                    .prepare(sql)
                    .await
                    .map(|prepared| (prepared, slots))
            }
            Err(e) => Err(e),
        };
        let (prepared, slots) = result.map_err(|e| with_query_context(e, query))?;
        Ok(Statement {
            prepared,
            slots,
            query: query.to_string(),
        })
    }

    pub async fn execute_statement(
        &mut self,
        statement: &Statement<E::Prepared>,
        params: impl IntoParams,
    ) -> Result<RowsAffected> {
        let result = match bind_arguments(&statement.query, &statement.slots, params.into_params())
        {
            Ok(args) => {
                self.executor
                    .execute(Query::Prepared(statement.prepared.clone()), args)
                    .await
            }
            Err(e) => Err(e),
        };
        result.map_err(|e| with_query_context(e, &statement.query))
    }

    pub fn query_statement(
        &mut self,
        statement: &Statement<E::Prepared>,
        params: impl IntoParams,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let query = statement.query.clone();
        let prepared = statement.prepared.clone();
        let args = bind_arguments(&query, &statement.slots, params.into_params());
        let executor = &mut self.executor;
        async move { Ok::<_, Error>(executor.fetch(Query::Prepared(prepared), args?)) }
            .try_flatten_stream()
            .map_err(move |e| with_query_context(e, &query))
    }

    /// Executes the statement accumulated by `builder`.
    pub async fn execute_builder(&mut self, builder: &SqlBuilder) -> Result<RowsAffected> {
        let (query, params) = builder.build()?;
        self.execute(&query, params).await
    }

    /// Rows of the statement accumulated by `builder`.
    pub fn query_builder(
        &mut self,
        builder: &SqlBuilder,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        match builder.build() {
            Ok((query, params)) => Either::Left(self.fetch_rows(query, params)),
            Err(e) => Either::Right(stream::once(ready(Err(e)))),
        }
    }

    async fn execute_all(&mut self, queries: Vec<String>) -> Result<RowsAffected> {
        let mut result = RowsAffected::default();
        for query in queries {
            result.extend([self.execute(&query, ()).await?]);
        }
        Ok(result)
    }

    /// Creates the table or view of `T` together with its indexes.
    pub async fn create_table<T: Record>(&mut self) -> Result<()> {
        let table = self.model::<T>()?;
        self.execute_all(self.dialect.create_table_sql(&table))
            .await
            .map(|_| ())
    }

    pub async fn drop_table<T: Record>(&mut self) -> Result<()> {
        let table = self.model::<T>()?;
        self.execute_all(self.dialect.drop_table_sql(&table))
            .await
            .map(|_| ())
    }

    /// Removes every row of `T` and resets its auto increment counter.
    pub async fn truncate<T: Record>(&mut self) -> Result<()> {
        let table = self.model::<T>()?;
        self.execute_all(self.dialect.truncate_table_sql(&table))
            .await
            .map(|_| ())
    }

    /// Inserts `records`, leaving the auto increment column to the database.
    ///
    /// A single statement carries every record when the dialect supports multi row
    /// inserts, otherwise one statement runs per record. A table whose only column is
    /// the auto increment one gets one `DEFAULT VALUES` statement per record.
    pub async fn insert<T: Record>(&mut self, records: &[T]) -> Result<RowsAffected> {
        let table = self.model::<T>()?;
        let mut result = RowsAffected::default();
        if records.is_empty() {
            return Ok(result);
        }
        let columns: Vec<usize> = (0..table.columns.len())
            .filter(|i| table.auto_increment != Some(*i))
            .collect();
        let keys: Vec<String> = columns
            .iter()
            .map(|&i| quote(&table.columns[i].name))
            .collect();
        let rows = records
            .iter()
            .map(|record| record_values(&table, record))
            .collect::<Result<Vec<_>>>()?;
        if columns.is_empty() {
            for _ in &rows {
                let mut builder = self.builder();
                builder
                    .insert_into(&quote(&table.name))
                    .raw(" DEFAULT VALUES", ());
                result.extend([self.execute_builder(&builder).await?]);
            }
            return Ok(result);
        }
        let batch = if self.dialect.supports_multi_row_insert() {
            rows.len()
        } else {
            1
        };
        for rows in rows.chunks(batch) {
            let mut builder = self.builder();
            builder.insert_into(&quote(&table.name)).keys(&keys);
            for row in rows {
                builder.values(columns.iter().map(|&i| row[i].clone()).collect::<Vec<_>>());
            }
            result.extend([self.execute_builder(&builder).await?]);
        }
        Ok(result)
    }

    /// Updates the row of `record` identified by its primary key.
    ///
    /// With a version column the stored version must still equal the one in `record`,
    /// the statement increments it. Zero affected rows then fail with
    /// [`QueryError::OptimisticLock`].
    pub async fn update<T: Record>(&mut self, record: &T) -> Result<RowsAffected> {
        let table = self.model::<T>()?;
        if table.primary_key.is_empty() {
            return Err(QueryError::NoPrimaryKey(table.name.clone()).into());
        }
        let values = record_values(&table, record)?;
        let mut builder = self.builder();
        builder.update(&quote(&table.name));
        let mut assigned = false;
        for (i, column) in table.columns.iter().enumerate() {
            if table.primary_key.contains(&i) || table.occ == Some(i) {
                continue;
            }
            builder.set(&quote(&column.name), values[i].clone());
            assigned = true;
        }
        if let Some(occ) = table.occ {
            let name = quote(&table.columns[occ].name);
            builder.set_expr(&name, &format!("{name}+1"), ());
            assigned = true;
        }
        if !assigned {
            return Err(Error::msg(format!(
                "Table `{}` has no column to update",
                table.name
            )));
        }
        where_primary_key(&mut builder, &table, &values);
        if let Some(occ) = table.occ {
            let name = quote(&table.columns[occ].name);
            builder.where_(&format!("{name}=?"), (values[occ].clone(),));
        }
        let result = self.execute_builder(&builder).await?;
        if table.occ.is_some() && result.rows_affected == 0 {
            let error = Error::new(QueryError::OptimisticLock(table.name.clone()));
            log::warn!("{:#}", error);
            return Err(error);
        }
        Ok(result)
    }

    /// Deletes the row of `record` identified by its primary key.
    pub async fn delete<T: Record>(&mut self, record: &T) -> Result<RowsAffected> {
        let table = self.model::<T>()?;
        if table.primary_key.is_empty() {
            return Err(QueryError::NoPrimaryKey(table.name.clone()).into());
        }
        let values = record_values(&table, record)?;
        let mut builder = self.builder();
        builder.delete_from(&quote(&table.name));
        where_primary_key(&mut builder, &table, &values);
        self.execute_builder(&builder).await
    }

    /// Record of `T` whose primary key equals `key`, one value per key column.
    pub async fn find<T: Record>(&mut self, key: impl IntoParams) -> Result<Option<T>> {
        let table = self.model::<T>()?;
        if table.primary_key.is_empty() {
            return Err(QueryError::NoPrimaryKey(table.name.clone()).into());
        }
        let key = key.into_params();
        if key.len() != table.primary_key.len() {
            return Err(Error::msg(format!(
                "Table `{}` has {} primary key columns but {} key values were given",
                table.name,
                table.primary_key.len(),
                key.len()
            )));
        }
        let mut builder = select_all(self.builder(), &table);
        for (&i, value) in table.primary_key.iter().zip(key) {
            builder.where_(&format!("{}=?", quote(&table.columns[i].name)), (value,));
        }
        let (query, params) = builder.build()?;
        match self.query_row(&query, params).await? {
            Some(row) => T::from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    /// Records of `T` matching `condition`, every record when it is empty.
    pub async fn find_many<T: Record>(
        &mut self,
        condition: &str,
        params: impl IntoParams,
    ) -> Result<Vec<T>> {
        let table = self.model::<T>()?;
        let mut builder = select_all(self.builder(), &table);
        if !condition.trim().is_empty() {
            builder.where_(condition, params);
        }
        self.query_builder(&builder)
            .and_then(|row| async move { T::from_row(&row) })
            .try_collect()
            .await
    }
}

impl<C: Connection> Engine<C> {
    /// Opens a transaction sharing dialect, registry and options with this engine.
    pub async fn begin(&mut self) -> Result<Engine<C::Transaction<'_>>> {
        let transaction = self
            .executor
            .begin()
            .await
            .map_err(|e| with_query_context(e, "BEGIN"))?;
        Ok(Engine {
            executor: transaction,
            dialect: self.dialect.clone(),
            registry: self.registry.clone(),
            options: self.options.clone(),
        })
    }
}

impl<'c, T: Transaction<'c>> Engine<T> {
    pub async fn commit(self) -> Result<()> {
        self.executor
            .commit()
            .await
            .map_err(|e| with_query_context(e, "COMMIT"))
    }

    pub async fn rollback(self) -> Result<()> {
        self.executor
            .rollback()
            .await
            .map_err(|e| with_query_context(e, "ROLLBACK"))
    }
}

impl<E> fmt::Debug for Engine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("dialect", &self.dialect.name())
            .field("options", &self.options)
            .finish()
    }
}

fn record_values<T: Fields>(table: &Table, record: &T) -> Result<Vec<Value>> {
    let values = record.values();
    if values.len() != table.columns.len() {
        return Err(Error::msg(format!(
            "Record produced {} values but table `{}` has {} columns",
            values.len(),
            table.name,
            table.columns.len()
        )));
    }
    Ok(values)
}

fn select_all(mut builder: SqlBuilder, table: &Table) -> SqlBuilder {
    builder
        .select(table.columns.iter().map(|v| quote(&v.name)))
        .from(&quote(&table.name));
    builder
}

fn where_primary_key(builder: &mut SqlBuilder, table: &Table, values: &[Value]) {
    for &i in &table.primary_key {
        builder.where_(
            &format!("{}=?", quote(&table.columns[i].name)),
            (values[i].clone(),),
        );
    }
}
