#![cfg(feature = "test-utils-postgres")]

use sql_executor::prelude::*;
use sql_executor::test_utils::{setup_postgres_embedded, stop_postgres_embedded};

#[test]
fn postgres_round_trip_and_batched_commit() -> Result<(), Box<dyn std::error::Error>> {
    let pg = setup_postgres_embedded("executor_test")?;
    let mut db = QueryExecutor::new();
    db.connect(&pg.params)?;

    db.execute(
        "CREATE TABLE items \
         (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, qty INTEGER, meta JSONB)",
        &Attributes::new(),
    )?;

    db.execute(
        "INSERT INTO items (name, qty, meta) VALUES (:name, :qty, :meta)",
        &attributes! {
            "name" => "a:b=c",
            "qty" => 3,
            "meta" => serde_json::json!({ "tag": "x" }),
        },
    )?;
    assert_eq!(db.last_insert_id()?, "1");

    let row = db
        .query_row(
            "SELECT name, qty::text AS qty_text, meta FROM items WHERE id = :id",
            &attributes! { "id" => 1 },
            FetchShape::Associative,
        )?
        .expect("row");
    assert_eq!(row.get("name"), Some(&RowValues::Text("a:b=c".into())));
    assert_eq!(row.get("qty_text"), Some(&RowValues::Text("3".into())));
    assert_eq!(
        row.get("meta"),
        Some(&RowValues::JSON(serde_json::json!({ "tag": "x" })))
    );

    db.begin_transaction()?;
    db.execute("CREATE TABLE tags (item_id BIGINT, tag TEXT)", &Attributes::new())?;
    db.execute(
        "INSERT INTO tags (item_id, tag) VALUES (:id, :tag)",
        &attributes! { "id" => 1, "tag" => "batched" },
    )?;
    db.execute("INSERT INTO items (name) VALUES (:n)", &attributes! { "n" => "two" })?;
    db.execute("INSERT INTO items (name) VALUES (:n)", &attributes! { "n" => RowValues::Null })?;
    let err = db.commit().unwrap_err();
    assert_eq!(err.code(), Some("23502"));
    assert!(!db.in_transaction());

    let count = db.query_one("SELECT COUNT(*) FROM items", &Attributes::new())?;
    assert_eq!(count, Some(RowValues::Int(1)));
    let tags = db.query_one("SELECT to_regclass('tags')::text", &Attributes::new())?;
    assert_eq!(tags, Some(RowValues::Null));

    db.transaction(|tx| {
        tx.execute("CREATE TABLE tags (item_id BIGINT, tag TEXT)", &Attributes::new())?;
        tx.execute(
            "INSERT INTO tags (item_id, tag) VALUES (:id, :tag)",
            &attributes! { "id" => 1, "tag" => "kept" },
        )
    })?;
    let tag = db.query_one("SELECT tag FROM tags", &Attributes::new())?;
    assert_eq!(tag, Some(RowValues::Text("kept".into())));

    db.close_connection();
    stop_postgres_embedded(pg);
    Ok(())
}
