//! Round trips against a live PostgreSQL; skipped unless `DATABASE_URL` is set.

mod common;

use piecesql::{LiteralConnection, ModelMeta, Query, QueryResult, Scalar, Value};
use std::sync::Arc;

fn items(conn: &Arc<dyn piecesql::Connection>) -> Query {
    Query::for_model(
        Arc::clone(conn),
        ModelMeta::new("piecesql_items", ["id"]),
    )
}

#[tokio::test]
async fn builder_round_trip() -> QueryResult<()> {
    let Some(client) = common::try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };

    client
        .batch_execute(
            "create temp table piecesql_items (
                id bigserial primary key,
                name text not null,
                qty int4 not null,
                note text
            )",
        )
        .await?;

    let conn = LiteralConnection::postgres().into_shared();

    let mut insert = Query::new(Arc::clone(&conn));
    insert
        .insert_into("piecesql_items", ["name", "qty", "note"])?
        .values([Value::from("apple"), Value::from(3), Value::from(None::<&str>)])?
        .values([Value::from("pear"), Value::from(7), Value::from("ripe")])?
        .values([Value::from("plum"), Value::from(12), Value::from("it's :p1_0")])?;
    assert_eq!(insert.execute(&client).await?, 3);

    let mut q = items(&conn);
    q.select(["name"])
        .from("piecesql_items")
        .where_cmp("qty", ">", 5)
        .order_by(["name"]);
    let rows = q.fetch_all(&client).await?;
    let names: Vec<String> = rows.iter().map(|r| r.get::<_, String>(0)).collect();
    assert_eq!(names, vec!["pear".to_string(), "plum".to_string()]);

    assert_eq!(q.result_count(&client).await?, 2);
    assert_eq!(q.total_count(&client).await?, 2);
    assert!(q.exists(&client).await?);

    let mut note = items(&conn);
    note.select(["note"]).from("piecesql_items").where_("name", "plum");
    assert_eq!(
        note.fetch_scalar(&client).await?,
        Scalar::Text("it's :p1_0".into())
    );

    let mut missing = items(&conn);
    missing
        .select_all()
        .from("piecesql_items")
        .where_null("note");
    assert_eq!(missing.result_count(&client).await?, 1);

    let mut update = Query::new(Arc::clone(&conn));
    update
        .update("piecesql_items")
        .set("qty", 0)
        .where_in("name", ["apple", "pear"]);
    assert_eq!(update.execute(&client).await?, 2);

    let mut page = items(&conn);
    page.select(["name"]).from("piecesql_items").order_by(["id"]);
    let first = page.fetch_page(&client, 1, 2).await?;
    assert_eq!(first.total, 3);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.last_page, 2);

    let mut delete = Query::new(Arc::clone(&conn));
    delete
        .delete_from("piecesql_items")
        .where_("qty", 0)
        .returning(["name"])?;
    let deleted = delete.fetch_all(&client).await?;
    assert_eq!(deleted.len(), 2);
    Ok(())
}

#[tokio::test]
async fn unprepared_statements_run_inline() -> QueryResult<()> {
    let Some(client) = common::try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };

    let conn = LiteralConnection::postgres().unprepared().into_shared();
    let mut q = Query::new(conn);
    q.select_raw("1").where_raw("'a''b' = 'a''b'");
    assert_eq!(q.fetch_scalar(&client).await?, Scalar::Int(1));
    Ok(())
}
