//! Facade orchestration against the mock driver: catalog filtering, builder
//! output, fetch modes, and reporter invocation on failure paths.

use sql_facade::test_utils::{
    DriverCall, MockDriver, MockResponse, RecordingReporter, result_set,
};
use sql_facade::{
    BindingMap, Bindings, FetchMode, SqlFacade, SqlFacadeError, SqlValue, ValueMap,
};

fn fruit_driver() -> MockDriver {
    MockDriver::new().table("fruits", ["id", "name", "qty"], ["id"])
}

#[tokio::test]
async fn insert_filters_columns_and_binds_literals() {
    let driver = fruit_driver().respond(MockResponse::Affected(1));
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let values = ValueMap::new()
        .set("id", 99i64) // auto-increment, dropped
        .set("name", "mango")
        .set("qty", 7i64)
        .set("color", "green"); // unknown column, dropped
    let affected = db.insert("fruits", values, Bindings::none()).await.unwrap();
    assert_eq!(affected, 1);

    let expected_bindings: BindingMap = Bindings::positional([
        SqlValue::Text("mango".into()),
        SqlValue::Int(7),
    ])
    .into();
    assert_eq!(
        db.driver().calls,
        vec![
            DriverCall::Prepare("INSERT INTO fruits (name, qty) VALUES (?, ?)".into()),
            DriverCall::Execute {
                sql: "INSERT INTO fruits (name, qty) VALUES (?, ?)".into(),
                bindings: expected_bindings,
            },
        ]
    );
    assert!(db.reporter().reports.is_empty());
}

#[tokio::test]
async fn insert_with_nothing_left_after_filtering_reports_and_fails() {
    let driver = fruit_driver();
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let values = ValueMap::new().set("id", 1i64).set("color", "green");
    let err = db.insert("fruits", values, Bindings::none()).await.unwrap_err();
    assert!(matches!(err, SqlFacadeError::ParameterError(_)));
    assert_eq!(db.driver().executions(), 0);

    let report = &db.reporter().reports[0];
    assert_eq!(report.call_site, "insert");
    assert!(report.sql.is_none());
}

#[tokio::test]
async fn update_round_trips_positional_where_into_named_marker() {
    let driver = fruit_driver().respond(MockResponse::Affected(2));
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let values = ValueMap::new().set("qty", 0i64);
    let affected = db
        .update(
            "fruits",
            values,
            vec!["name = ?"],
            Bindings::positional([SqlValue::Text("mango".into())]),
        )
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let (sql, bindings) = db.last_statement().unwrap();
    assert_eq!(sql, "UPDATE fruits SET qty = :qty WHERE name = :where_name");
    assert_eq!(bindings.get_named("qty"), Some(&SqlValue::Int(0)));
    assert_eq!(
        bindings.get_named("where_name"),
        Some(&SqlValue::Text("mango".into()))
    );
}

#[tokio::test]
async fn malformed_where_fragment_reports_and_fails() {
    let driver = fruit_driver();
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let values = ValueMap::new().set("qty", 0i64);
    let err = db
        .update("fruits", values, vec!["id IN (1,2)"], Bindings::none())
        .await
        .unwrap_err();
    assert!(matches!(err, SqlFacadeError::MalformedCondition(_)));
    assert_eq!(db.driver().executions(), 0);
    assert_eq!(db.reporter().reports[0].call_site, "update");
}

#[tokio::test]
async fn delete_guard_failure_reaches_the_reporter_with_context() {
    let driver = fruit_driver();
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let err = db.delete("DELETE FROM fruits", Bindings::none()).await.unwrap_err();
    assert!(matches!(err, SqlFacadeError::MissingWhereClause(_)));

    let report = &db.reporter().reports[0];
    assert_eq!(report.call_site, "delete");
    assert_eq!(report.sql.as_deref(), Some("DELETE FROM fruits"));
    assert!(report.error.contains("WHERE"));
}

#[tokio::test]
async fn select_cell_returns_first_cell_then_none_when_empty() {
    let rows = result_set(["qty"], [vec![SqlValue::Int(7)]]);
    let driver = fruit_driver()
        .respond(MockResponse::Rows(rows))
        .respond(MockResponse::Rows(result_set(
            ["qty"],
            Vec::<Vec<SqlValue>>::new(),
        )));
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let cell = db
        .select_cell("SELECT qty FROM fruits WHERE name = :name", Bindings::named([
            ("name", SqlValue::Text("mango".into())),
        ]))
        .await
        .unwrap();
    assert_eq!(cell, Some(SqlValue::Int(7)));

    let cell = db
        .select_cell("SELECT qty FROM fruits WHERE name = :name", Bindings::named([
            ("name", SqlValue::Text("durian".into())),
        ]))
        .await
        .unwrap();
    assert_eq!(cell, None);
}

#[tokio::test]
async fn select_as_projects_one_column() {
    let rows = result_set(
        ["name", "qty"],
        [
            vec![SqlValue::Text("mango".into()), SqlValue::Int(7)],
            vec![SqlValue::Text("kiwi".into()), SqlValue::Int(2)],
        ],
    );
    let driver = fruit_driver().respond(MockResponse::Rows(rows));
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let projected = db
        .select_as("SELECT name, qty FROM fruits", Bindings::none(), FetchMode::Column(1))
        .await
        .unwrap();
    assert_eq!(projected.column_names().unwrap().as_slice(), ["qty".to_string()]);
    assert_eq!(projected.rows[0].get_by_index(0), Some(&SqlValue::Int(7)));
    assert_eq!(projected.rows[1].get_by_index(0), Some(&SqlValue::Int(2)));
}

#[tokio::test]
async fn execution_failure_reports_with_statement_context() {
    let driver = fruit_driver().respond(MockResponse::Fail("duplicate key".into()));
    let mut db = SqlFacade::with_reporter(driver, RecordingReporter::default());

    let values = ValueMap::new().set("name", "mango");
    let err = db.insert("fruits", values, Bindings::none()).await.unwrap_err();
    assert!(matches!(err, SqlFacadeError::ExecutionError(_)));

    let report = &db.reporter().reports[0];
    assert_eq!(report.call_site, "insert");
    assert_eq!(
        report.sql.as_deref(),
        Some("INSERT INTO fruits (name) VALUES (?)")
    );
    assert!(report.error.contains("duplicate key"));
}
