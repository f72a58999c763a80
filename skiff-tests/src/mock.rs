use async_stream::stream;
use skiff_core::{
    Connection, Error, Executor, Prepared, Query, QueryResult, Result, RowLabeled, RowsAffected,
    Transaction, Value, stream::Stream,
};
use std::{collections::VecDeque, fmt};

/// Canned outcome of the next statement run by a [`MockConnection`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows(Vec<RowLabeled>),
    Affected(RowsAffected),
    Error(String),
}

impl Default for MockResponse {
    fn default() -> Self {
        MockResponse::Affected(RowsAffected::default())
    }
}

/// Builds a row from column labels and values.
pub fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
    RowLabeled::new(
        labels.iter().map(ToString::to_string).collect(),
        values.into(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPrepared(pub String);

impl fmt::Display for MockPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Prepared for MockPrepared {}

/// In memory executor: records the final text and arguments of every statement and
/// answers with the queued responses, zero affected rows once the queue is empty.
#[derive(Debug, Default)]
pub struct MockConnection {
    statements: Vec<(String, Vec<Value>)>,
    prepared: Vec<String>,
    responses: VecDeque<MockResponse>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, response: MockResponse) -> &mut Self {
        self.responses.push_back(response);
        self
    }

    pub fn respond_rows(&mut self, rows: Vec<RowLabeled>) -> &mut Self {
        self.respond(MockResponse::Rows(rows))
    }

    pub fn respond_affected(&mut self, rows_affected: u64) -> &mut Self {
        self.respond(MockResponse::Affected(RowsAffected::new(rows_affected)))
    }

    pub fn respond_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.respond(MockResponse::Error(message.into()))
    }

    /// Statements run so far, with their arguments.
    pub fn statements(&self) -> &[(String, Vec<Value>)] {
        &self.statements
    }

    /// Text of the statements run so far.
    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|(v, _)| v.as_str()).collect()
    }

    /// Text of the statements prepared so far.
    pub fn prepared(&self) -> &[String] {
        &self.prepared
    }

    pub fn clear(&mut self) {
        self.statements.clear();
        self.prepared.clear();
        self.responses.clear();
    }

    fn record(&mut self, query: String, args: Vec<Value>) -> MockResponse {
        log::trace!("Mock statement: {query}");
        self.statements.push((query, args));
        self.responses.pop_front().unwrap_or_default()
    }
}

impl Executor for MockConnection {
    type Prepared = MockPrepared;

    async fn prepare(&mut self, query: String) -> Result<MockPrepared> {
        self.prepared.push(query.clone());
        Ok(MockPrepared(query))
    }

    fn run(
        &mut self,
        query: Query<MockPrepared>,
        args: Vec<Value>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        let query = match query {
            Query::Raw(v) => v,
            Query::Prepared(v) => v.0,
        };
        let response = self.record(query, args);
        stream! {
            match response {
                MockResponse::Rows(rows) => {
                    for row in rows {
                        yield Ok(QueryResult::Row(row));
                    }
                }
                MockResponse::Affected(v) => yield Ok(QueryResult::Affected(v)),
                MockResponse::Error(message) => yield Err(Error::msg(message)),
            }
        }
    }
}

impl Connection for MockConnection {
    type Transaction<'c> = MockTransaction<'c>;

    async fn begin(&mut self) -> Result<MockTransaction<'_>> {
        self.statements.push(("BEGIN".into(), Vec::new()));
        Ok(MockTransaction { connection: self })
    }
}

/// Transaction over a [`MockConnection`], statements land in the connection log.
#[derive(Debug)]
pub struct MockTransaction<'c> {
    connection: &'c mut MockConnection,
}

impl Executor for MockTransaction<'_> {
    type Prepared = MockPrepared;

    async fn prepare(&mut self, query: String) -> Result<MockPrepared> {
        self.connection.prepare(query).await
    }

    fn run(
        &mut self,
        query: Query<MockPrepared>,
        args: Vec<Value>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query, args)
    }
}

impl<'c> Transaction<'c> for MockTransaction<'c> {
    async fn commit(self) -> Result<()> {
        self.connection
            .statements
            .push(("COMMIT".into(), Vec::new()));
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.connection
            .statements
            .push(("ROLLBACK".into(), Vec::new()));
        Ok(())
    }
}
