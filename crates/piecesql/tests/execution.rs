mod common;

use common::RecordingExecutor;
use piecesql::{Expr, LiteralConnection, Query, QueryError, QueryResult, Scalar, StatementKind};

fn pg() -> Query {
    Query::new(LiteralConnection::postgres().into_shared())
}

#[tokio::test]
async fn fetch_all_sends_one_prepared_statement() -> QueryResult<()> {
    let executor = RecordingExecutor::new();
    executor.push_rows(vec![vec![Scalar::Int(1), Scalar::Text("alice".into())]]);

    let mut q = pg();
    q.select(["id", "name"]).from("users").where_("id", 1);
    let rows = q.fetch_all(&executor).await?;

    assert_eq!(rows, vec![vec![Scalar::Int(1), Scalar::Text("alice".into())]]);
    let statements = executor.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].sql, q.to_sql());
    assert_eq!(statements[0].kind, StatementKind::Prepared);
    assert_eq!(statements[0].params.len(), 1);

    let (positional, values) = statements[0].postgres_positional();
    assert_eq!(
        positional,
        r#"select "id", "name" from "users" where "id" = $1"#
    );
    assert_eq!(values, vec![&Scalar::Int(1)]);
    Ok(())
}

#[tokio::test]
async fn fetch_one_without_rows_is_not_found() {
    let executor = RecordingExecutor::new();
    let q = Query::table(LiteralConnection::postgres().into_shared(), "users");
    let err = q.fetch_one(&executor).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn exists_wraps_the_query() -> QueryResult<()> {
    let executor = RecordingExecutor::new();
    executor.push_scalar(true);

    let mut q = pg();
    q.select_all().from("users").where_("email", "a@example.com");
    assert!(q.exists(&executor).await?);

    let statement = &executor.statements()[0];
    assert_eq!(
        statement.sql,
        format!(
            r#"select exists (select * from "users" where "email" = :{})"#,
            q.params()[0].name
        )
    );
    assert_eq!(statement.params.len(), 1);
    Ok(())
}

#[tokio::test]
async fn result_count_reads_the_scalar() -> QueryResult<()> {
    let executor = RecordingExecutor::new();
    executor.push_scalar(7_i64);

    let mut q = pg();
    q.select(["id"]).from("users").limit(2);
    assert_eq!(q.result_count(&executor).await?, 7);
    assert_eq!(executor.statements()[0].sql, r#"select count(*) from "users""#);
    Ok(())
}

#[tokio::test]
async fn non_numeric_count_is_a_decode_error() {
    let executor = RecordingExecutor::new();
    executor.push_scalar("many");

    let mut q = pg();
    q.select_all().from("users");
    let err = q.total_count(&executor).await.unwrap_err();
    assert!(matches!(err, QueryError::Decode { .. }));
}

#[tokio::test]
async fn fetch_page_counts_then_fetches() -> QueryResult<()> {
    let executor = RecordingExecutor::new();
    executor.push_scalar(42_i64);
    executor.push_rows(vec![vec![Scalar::Int(11)], vec![Scalar::Int(12)]]);

    let mut q = pg();
    q.select(["id", "name"])
        .from("items")
        .where_cmp("qty", ">", 3)
        .order_by(["id"]);
    let page = q.fetch_page(&executor, 2, 10).await?;

    assert_eq!(page.total, 42);
    assert_eq!(page.page, 2);
    assert_eq!(page.per_page, 10);
    assert_eq!(page.last_page, 5);
    assert!(page.has_more());
    assert_eq!(page.items.len(), 2);

    let statements = executor.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0]
        .sql
        .starts_with(r#"select count(*) from (select 1 from "items" where "qty" > "#));
    assert_eq!(statements[0].params[0].value, Scalar::Int(3));
    assert!(statements[1]
        .sql
        .ends_with(r#"order by "id" limit 10 offset 10"#));
    Ok(())
}

#[tokio::test]
async fn execute_returns_affected_rows() -> QueryResult<()> {
    let executor = RecordingExecutor::with_affected(3);
    let mut q = pg();
    q.update("users").set("active", false).where_cmp("age", "<", 18);
    assert_eq!(q.execute(&executor).await?, 3);
    assert_eq!(executor.statements()[0].params.len(), 2);
    Ok(())
}

#[tokio::test]
async fn deferred_errors_block_execution() {
    let executor = RecordingExecutor::new();

    let mut q = Query::new(LiteralConnection::postgres().unprepared().into_shared());
    q.select_all().from("users").where_("name", "a\0b");
    let err = q.fetch_all(&executor).await.unwrap_err();
    assert!(matches!(err, QueryError::ConnectionQuote(_)));

    let mut sub = pg();
    sub.select_raw("max(id)").from("users");
    let mut q = pg();
    q.select([Expr::variable("top", sub)]);
    assert!(q.fetch_scalar(&executor).await.unwrap_err().is_unsupported());

    assert!(executor.statements().is_empty());
}

#[tokio::test]
async fn unprepared_statements_are_raw() -> QueryResult<()> {
    let executor = RecordingExecutor::new();
    let mut q = Query::new(LiteralConnection::postgres().unprepared().into_shared());
    q.select_all().from("users").where_("name", "bob");
    q.fetch_all(&executor).await?;

    let statement = &executor.statements()[0];
    assert_eq!(statement.kind, StatementKind::Raw);
    assert_eq!(
        statement.sql,
        r#"select * from "users" where "name" = 'bob'"#
    );
    assert!(statement.params.is_empty());
    Ok(())
}
