//! Finders, associations, aggregations and persistence for each entity.
//!
//! Every public operation takes the `Database` explicitly and runs one or a
//! few fixed, parameterized statements. Nothing is cached between calls.

mod followers;
mod likes;
mod questions;
mod replies;
mod users;

use qa_types::QuestionSummary;
use rusqlite::{Connection, OptionalExtension, Params, Row};

use crate::{DbError, DbResult};

/// Hydration of an entity from a `SELECT {COLUMNS} FROM {TABLE}` row.
pub trait FromRow: Sized {
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

pub(crate) fn query_by_id<T: FromRow>(conn: &Connection, id: i64) -> DbResult<T> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", T::COLUMNS, T::TABLE);
    query_one(conn, &sql, [id], id)
}

/// Single-row query; zero rows is `NotFound` for `T`, reported under `key`.
pub(crate) fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    key: impl ToString,
) -> DbResult<T> {
    conn.query_row(sql, params, T::from_row)
        .optional()?
        .ok_or_else(|| DbError::not_found(T::ENTITY, key))
}

pub(crate) fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, f: F) -> DbResult<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, f)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Fails with `NotFound` when an UPDATE touched no row.
pub(crate) fn ensure_updated(changed: usize, entity: &'static str, id: i64) -> DbResult<()> {
    if changed == 0 {
        return Err(DbError::not_found(entity, id));
    }
    Ok(())
}

/// Maps `SELECT q.id, q.title, q.body` rows.
pub(crate) fn question_summary(row: &Row<'_>) -> rusqlite::Result<QuestionSummary> {
    Ok(QuestionSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
    })
}
