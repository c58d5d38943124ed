pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod thread;

#[cfg(test)]
mod testutil;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Params};
use tracing::info;

pub use error::{DbError, DbResult};
pub use models::{Question, QuestionFollower, QuestionLike, Reply, User};
pub use queries::FromRow;
pub use rusqlite::types::Value;
pub use thread::ReplyThread;

/// One result row keyed by column name, holding SQLite's native value types.
pub type Record = BTreeMap<String, Value>;

/// Owner of the single connection to the question store.
///
/// Entities never open their own connection: every finder and `save` takes a
/// `&Database`, and the connection is closed when this value is dropped.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|source| DbError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Question store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fresh store that lives only as long as the returned value.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?;
        f(&conn)
    }

    /// Execute a parameterized statement and return every row as a
    /// column-name keyed record.
    pub fn run<P: Params>(&self, sql: &str, params: P) -> DbResult<Vec<Record>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            let rows = stmt
                .query_map(params, |row| {
                    let mut record = Record::new();
                    for (idx, name) in names.iter().enumerate() {
                        record.insert(name.clone(), row.get::<_, Value>(idx)?);
                    }
                    Ok(record)
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn last_inserted_id(&self) -> DbResult<i64> {
        self.with_conn(|conn| Ok(conn.last_insert_rowid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn run_returns_rows_keyed_by_column() {
        let db = testutil::db();
        testutil::user(&db, "Ada", "Lovelace");

        let rows = db
            .run("SELECT id, fname, lname FROM users WHERE fname = ?1", ["Ada"])
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["fname"], Value::Text("Ada".into()));
        assert_eq!(rows[0]["lname"], Value::Text("Lovelace".into()));
        assert!(matches!(rows[0]["id"], Value::Integer(_)));
    }

    #[test]
    fn run_executes_writes() {
        let db = testutil::db();

        let rows = db
            .run(
                "INSERT INTO users (fname, lname) VALUES (?1, ?2)",
                ["Grace", "Hopper"],
            )
            .unwrap();
        assert!(rows.is_empty());

        let id = db.last_inserted_id().unwrap();
        let user = User::find_by_id(&db, id).unwrap();
        assert_eq!(user.fname, "Grace");
    }

    #[test]
    fn run_surfaces_malformed_sql() {
        let db = testutil::db();
        let err = db.run("SELEC nonsense", []).unwrap_err();
        assert!(matches!(err, DbError::Query(_)));
    }

    #[test]
    fn open_creates_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.db");

        {
            let db = Database::open(&path).unwrap();
            testutil::user(&db, "Ada", "Lovelace");
        }

        let db = Database::open(&path).unwrap();
        let user = User::find_by_name(&db, "Ada", "Lovelace").unwrap();
        assert_eq!(user.lname, "Lovelace");
    }

    #[test]
    fn open_reports_unavailable_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("questions.db");

        let err = Database::open(&path).err().unwrap();
        assert!(matches!(err, DbError::Unavailable { .. }));
    }
}
