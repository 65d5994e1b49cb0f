#![allow(dead_code)]

use piecesql::{Executor, QueryResult, Scalar, Statement};
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory executor that records every statement and replays canned results.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    statements: Mutex<Vec<Statement>>,
    rows: Mutex<VecDeque<Vec<Vec<Scalar>>>>,
    scalars: Mutex<VecDeque<Scalar>>,
    affected: u64,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_affected(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    /// Queue the rows returned by the next `fetch_all`.
    pub fn push_rows(&self, rows: Vec<Vec<Scalar>>) -> &Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    /// Queue the value returned by the next `fetch_scalar`.
    pub fn push_scalar(&self, value: impl Into<Scalar>) -> &Self {
        self.scalars.lock().unwrap().push_back(value.into());
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, statement: &Statement) {
        self.statements.lock().unwrap().push(statement.clone());
    }
}

impl Executor for RecordingExecutor {
    type Row = Vec<Scalar>;

    async fn fetch_all(&self, statement: &Statement) -> QueryResult<Vec<Self::Row>> {
        self.record(statement);
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn fetch_scalar(&self, statement: &Statement) -> QueryResult<Scalar> {
        self.record(statement);
        Ok(self
            .scalars
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scalar::Null))
    }

    async fn execute(&self, statement: &Statement) -> QueryResult<u64> {
        self.record(statement);
        Ok(self.affected)
    }
}

/// Connect to `DATABASE_URL`, or `None` when it is not configured.
pub async fn try_connect() -> Option<tokio_postgres::Client> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}
