#![cfg(feature = "sqlite")]

//! End-to-end coverage against an in-memory SQLite database: DDL through the
//! dispatcher, catalog-filtered inserts and updates, fetch shapes, and the
//! DELETE guard.

use rusqlite::Connection;
use sql_facade::prelude::*;
use sql_facade::{Bindings, RunOutcome};
use tempfile::tempdir;

const FRUITS_DDL: &str = "CREATE TABLE fruits (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    qty INTEGER NOT NULL,
    ripe INTEGER
)";

async fn fruit_db() -> SqlFacade<SqliteDriver> {
    let conn = Connection::open_in_memory().expect("in-memory database");
    let mut db = SqlFacade::new(SqliteDriver::new(conn));
    let outcome = db
        .run(&Statement::new(FRUITS_DDL, Bindings::none()))
        .await
        .expect("create table");
    assert!(matches!(outcome, RunOutcome::Done(true)));
    db
}

#[tokio::test]
async fn insert_select_update_delete_full_cycle() {
    let mut db = fruit_db().await;

    // id is the rowid alias and gets filtered; color is unknown and dropped.
    let values = ValueMap::new()
        .set("id", 42i64)
        .set("name", "mango")
        .set("qty", 7i64)
        .set("ripe", true)
        .set("color", "green");
    let affected = db.insert("fruits", values, Bindings::none()).await.unwrap();
    assert_eq!(affected, 1);

    let values = ValueMap::new().set("name", "kiwi").set("qty", 2i64);
    db.insert("fruits", values, Bindings::none()).await.unwrap();

    let rows = db
        .select("SELECT id, name, qty FROM fruits ORDER BY name", Bindings::none())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.rows[0].get("name"), Some(&SqlValue::Text("kiwi".into())));
    // rowid auto-assigned from 1, proving the caller's id never reached SQL
    assert_eq!(rows.rows[1].get("id"), Some(&SqlValue::Int(1)));

    let affected = db
        .update(
            "fruits",
            ValueMap::new().set("qty", 9i64),
            vec!["name = ?"],
            Bindings::positional([SqlValue::Text("mango".into())]),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let qty = db
        .select_cell(
            "SELECT qty FROM fruits WHERE name = :name",
            Bindings::named([("name", SqlValue::Text("mango".into()))]),
        )
        .await
        .unwrap();
    assert_eq!(qty, Some(SqlValue::Int(9)));

    let err = db.delete("DELETE FROM fruits", Bindings::none()).await.unwrap_err();
    assert!(matches!(err, SqlFacadeError::MissingWhereClause(_)));

    let affected = db
        .delete(
            "DELETE FROM fruits WHERE name = :name",
            Bindings::named([("name", SqlValue::Text("kiwi".into()))]),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let count = db
        .select_cell("SELECT COUNT(*) AS cnt FROM fruits", Bindings::none())
        .await
        .unwrap();
    assert_eq!(count, Some(SqlValue::Int(1)));
}

#[tokio::test]
async fn insert_with_caller_supplied_markers_passes_through() {
    let mut db = fruit_db().await;

    let values = ValueMap::new().set("name", "?").set("qty", ":qty");
    let bindings = Bindings::positional([SqlValue::Text("papaya".into())])
        .bind("qty", SqlValue::Int(4));
    let affected = db.insert("fruits", values, bindings).await.unwrap();
    assert_eq!(affected, 1);

    let (sql, _) = db.last_statement().unwrap();
    assert_eq!(sql, "INSERT INTO fruits (name, qty) VALUES (?, :qty)");

    let qty = db
        .select_cell(
            "SELECT qty FROM fruits WHERE name = 'papaya'",
            Bindings::none(),
        )
        .await
        .unwrap();
    assert_eq!(qty, Some(SqlValue::Int(4)));
}

#[tokio::test]
async fn update_with_literal_where_and_quoted_value() {
    let mut db = fruit_db().await;
    db.insert(
        "fruits",
        ValueMap::new().set("name", "o'henry peach").set("qty", 1i64),
        Bindings::none(),
    )
    .await
    .unwrap();

    let affected = db
        .update(
            "fruits",
            ValueMap::new().set("qty", 6i64),
            "WHERE name = 'o''henry peach'",
            Bindings::none(),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let qty = db
        .select_cell(
            "SELECT qty FROM fruits WHERE name = ?",
            Bindings::positional([SqlValue::Text("o'henry peach".into())]),
        )
        .await
        .unwrap();
    assert_eq!(qty, Some(SqlValue::Int(6)));
}

#[tokio::test]
async fn select_cell_on_empty_result_is_none() {
    let mut db = fruit_db().await;
    let cell = db
        .select_cell("SELECT name FROM fruits WHERE qty > 100", Bindings::none())
        .await
        .unwrap();
    assert_eq!(cell, None);
}

#[tokio::test]
async fn select_as_column_projection() {
    let mut db = fruit_db().await;
    for (name, qty) in [("mango", 7i64), ("kiwi", 2i64)] {
        db.insert(
            "fruits",
            ValueMap::new().set("name", name).set("qty", qty),
            Bindings::none(),
        )
        .await
        .unwrap();
    }

    let names = db
        .select_as(
            "SELECT name, qty FROM fruits ORDER BY qty",
            Bindings::none(),
            FetchMode::Column(0),
        )
        .await
        .unwrap();
    assert_eq!(names.column_names().unwrap().as_slice(), ["name".to_string()]);
    assert_eq!(names.rows[0].get_by_index(0), Some(&SqlValue::Text("kiwi".into())));
    assert_eq!(names.rows[1].get_by_index(0), Some(&SqlValue::Text("mango".into())));
}

#[tokio::test]
async fn native_placeholders_pass_through_unchanged() {
    let mut db = fruit_db().await;
    db.insert(
        "fruits",
        ValueMap::new().set("name", "fig").set("qty", 3i64),
        Bindings::none(),
    )
    .await
    .unwrap();

    let qty = db
        .select_cell(
            "SELECT qty FROM fruits WHERE name = ?1",
            Bindings::positional([SqlValue::Text("fig".into())]),
        )
        .await
        .unwrap();
    assert_eq!(qty, Some(SqlValue::Int(3)));
}

#[tokio::test]
async fn alter_table_dispatches_as_ddl() {
    let mut db = fruit_db().await;
    let outcome = db
        .run(&Statement::new(
            "ALTER TABLE fruits ADD COLUMN origin TEXT",
            Bindings::none(),
        ))
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Done(true)));

    let columns = db
        .select("SELECT origin FROM fruits", Bindings::none())
        .await
        .unwrap();
    assert!(columns.is_empty());
}

#[tokio::test]
async fn file_backed_database_persists_between_connections() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("fruits.db");

    {
        let conn = Connection::open(&path).expect("open file database");
        let mut db = SqlFacade::new(SqliteDriver::new(conn));
        db.run(&Statement::new(FRUITS_DDL, Bindings::none()))
            .await
            .unwrap();
        db.insert(
            "fruits",
            ValueMap::new().set("name", "durian").set("qty", 1i64),
            Bindings::none(),
        )
        .await
        .unwrap();
    }

    let conn = Connection::open(&path).expect("reopen file database");
    let mut db = SqlFacade::new(SqliteDriver::new(conn));
    let name = db
        .select_cell("SELECT name FROM fruits", Bindings::none())
        .await
        .unwrap();
    assert_eq!(name, Some(SqlValue::Text("durian".into())));
}
