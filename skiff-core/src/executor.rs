use crate::{Query, QueryResult, Result, RowLabeled, RowsAffected, Value};
use futures::{Stream, StreamExt, TryStreamExt};
use std::{fmt::Display, future::Future, pin::pin};

/// A backend prepared statement handle.
///
/// Arguments are bound when the statement runs, in the dialect's placeholder order.
pub trait Prepared: Clone + Send + Sync + Display {}

/// Runs final SQL against a backend.
///
/// Queries reaching an executor are already rewritten for its dialect: placeholders
/// use the dialect's syntax and `args` are in binding order.
pub trait Executor: Send + Sized {
    type Prepared: Prepared;

    fn prepare(&mut self, query: String) -> impl Future<Output = Result<Self::Prepared>> + Send;

    /// General method to send any query and return any result type (either row or count)
    fn run(
        &mut self,
        query: Query<Self::Prepared>,
        args: Vec<Value>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the query and returns the rows.
    fn fetch(
        &mut self,
        query: Query<Self::Prepared>,
        args: Vec<Value>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query, args).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// First row of the result, if any.
    fn fetch_one(
        &mut self,
        query: Query<Self::Prepared>,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Option<RowLabeled>>> + Send {
        let stream = self.fetch(query, args);
        async move { pin!(stream).try_next().await }
    }

    /// Execute the query and return the total number of rows affected.
    fn execute(
        &mut self,
        query: Query<Self::Prepared>,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query, args)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}

/// Executor owning a session that can open transactions.
pub trait Connection: Executor {
    type Transaction<'c>: Transaction<'c>
    where
        Self: 'c;

    fn begin(&mut self) -> impl Future<Output = Result<Self::Transaction<'_>>> + Send;
}

pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
