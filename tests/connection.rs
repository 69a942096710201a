mod common;

use cipherlite::{Connection, Error, StatementOptions};
use std::path::Path;

#[test]
fn create_database() {
    common::init_logs();
    let path = common::db_path("creation");
    assert!(
        !Path::new(&path).exists(),
        "Database file should not exist before the test"
    );
    Connection::open(&path).expect("Could not open the database");
    assert!(
        Path::new(&path).exists(),
        "Database file should be created after connection"
    );
}

#[test]
fn encrypted_database_requires_the_key() {
    common::init_logs();
    let path = common::db_path("encrypted");
    {
        let connection =
            Connection::open_with_key(&path, "it's a secret").expect("Could not open the database");
        connection
            .execute_batch("CREATE TABLE note (body TEXT); INSERT INTO note VALUES ('hello');")
            .expect("Could not populate the database");
    }
    assert!(
        Connection::open_with_key(&path, "wrong").is_err(),
        "A wrong key should not unlock the database"
    );
    {
        // without a key the file must not even read as a database
        let connection = Connection::open(&path).expect("Could not open the database");
        assert!(
            connection
                .prepare("SELECT body FROM note", StatementOptions::new())
                .is_err()
        );
    }
    let connection =
        Connection::open_with_key(&path, "it's a secret").expect("Could not open the database");
    let mut statement = connection
        .prepare("SELECT body FROM note", StatementOptions::new())
        .expect("Could not prepare the statement");
    let rows = statement
        .execute_query()
        .expect("Could not run the query");
    let row = rows
        .next_row()
        .expect("Could not read the row")
        .expect("The row should exist");
    assert_eq!(row.get_column("body"), Some(&"hello".into()));
}

#[test]
fn malformed_sql_fails_at_prepare() {
    common::init_logs();
    let connection =
        Connection::open(common::db_path("malformed")).expect("Could not open the database");
    assert!(
        connection
            .prepare("SELECT FROM WHERE", StatementOptions::new())
            .is_err()
    );
}

#[test]
fn trailing_statement_is_rejected() {
    common::init_logs();
    let connection =
        Connection::open(common::db_path("trailing")).expect("Could not open the database");
    let error = connection
        .prepare("SELECT 1; SELECT 2", StatementOptions::new())
        .err()
        .expect("A second statement should be rejected");
    assert!(matches!(error, Error::Input(..)));
}

#[test]
fn empty_statement_is_rejected() {
    common::init_logs();
    let connection =
        Connection::open(common::db_path("empty")).expect("Could not open the database");
    assert!(matches!(
        connection.prepare("  -- nothing here", StatementOptions::new()),
        Err(Error::Input(..))
    ));
}

#[test]
fn batch_runs_every_statement() {
    common::init_logs();
    let connection =
        Connection::open(common::db_path("batch")).expect("Could not open the database");
    connection
        .execute_batch(
            "CREATE TABLE item (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO item VALUES (1, 'one');
             INSERT INTO item VALUES (2, 'two');",
        )
        .expect("Could not run the batch");
    let mut cursor = connection
        .raw_query("SELECT count(*) FROM item", &[])
        .expect("Could not run the query");
    let row = cursor
        .next_row()
        .expect("Could not read the row")
        .expect("The row should exist");
    assert_eq!(row.get(0), Some(&2i64.into()));
}

#[test]
fn raw_query_binds_positionally() {
    common::init_logs();
    let connection =
        Connection::open(common::db_path("raw-query")).expect("Could not open the database");
    connection
        .execute_batch(
            "CREATE TABLE item (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO item VALUES (1, 'one');
             INSERT INTO item VALUES (2, 'two');",
        )
        .expect("Could not run the batch");
    let mut cursor = connection
        .raw_query(
            "SELECT name FROM item WHERE id = ?",
            &[Some("2".to_string())],
        )
        .expect("Could not run the query");
    let row = cursor
        .next_row()
        .expect("Could not read the row")
        .expect("The row should exist");
    assert_eq!(row.get_column("name"), Some(&"two".into()));
    assert!(cursor.next_row().expect("The cursor should finish").is_none());
}
