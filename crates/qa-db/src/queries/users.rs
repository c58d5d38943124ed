use qa_types::{PersonName, QuestionSummary};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use super::{FromRow, ensure_updated, query_by_id, query_one};
use crate::{Database, DbError, DbResult, Question, QuestionFollower, QuestionLike, Reply, User};

impl User {
    pub fn find_by_id(db: &Database, id: i64) -> DbResult<User> {
        db.with_conn(|conn| query_by_id(conn, id))
    }

    /// Exact match on both names. Names are not unique; the lowest id wins.
    pub fn find_by_name(db: &Database, fname: &str, lname: &str) -> DbResult<User> {
        db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users WHERE fname = ?1 AND lname = ?2 ORDER BY id LIMIT 1",
                User::COLUMNS
            );
            query_one(conn, &sql, [fname, lname], format!("{} {}", fname, lname))
        })
    }

    /// Display name of the user with `id`.
    pub fn author_name(db: &Database, id: i64) -> DbResult<String> {
        db.with_conn(|conn| {
            let sql = "SELECT fname, lname FROM users WHERE id = ?1";
            let name = conn
                .query_row(sql, [id], |row| {
                    Ok(PersonName {
                        fname: row.get(0)?,
                        lname: row.get(1)?,
                    })
                })
                .optional()?
                .ok_or_else(|| DbError::not_found(User::ENTITY, id))?;
            Ok(name.to_string())
        })
    }

    pub fn save(&mut self, db: &Database) -> DbResult<()> {
        db.with_conn(|conn| {
            match self.id {
                None => {
                    conn.execute(
                        "INSERT INTO users (fname, lname) VALUES (?1, ?2)",
                        params![self.fname, self.lname],
                    )?;
                    let id = conn.last_insert_rowid();
                    debug!(user_id = id, "inserted user");
                    self.id = Some(id);
                }
                Some(id) => {
                    let changed = conn.execute(
                        "UPDATE users SET fname = ?1, lname = ?2 WHERE id = ?3",
                        params![self.fname, self.lname, id],
                    )?;
                    ensure_updated(changed, User::ENTITY, id)?;
                    debug!(user_id = id, "updated user");
                }
            }
            Ok(())
        })
    }

    pub fn authored_questions(&self, db: &Database) -> DbResult<Vec<Question>> {
        Question::find_by_user_id(db, self.saved_id()?)
    }

    pub fn authored_replies(&self, db: &Database) -> DbResult<Vec<Reply>> {
        Reply::find_by_user_id(db, self.saved_id()?)
    }

    pub fn followed_questions(&self, db: &Database) -> DbResult<Vec<QuestionSummary>> {
        QuestionFollower::followed_questions_for_user_id(db, self.saved_id()?)
    }

    pub fn liked_questions(&self, db: &Database) -> DbResult<Vec<QuestionSummary>> {
        QuestionLike::liked_questions_for_user_id(db, self.saved_id()?)
    }

    /// Likes received across this user's questions divided by the number of
    /// those questions, rounded half away from zero. No questions gives 0.
    pub fn average_karma(&self, db: &Database) -> DbResult<f64> {
        let id = self.saved_id()?;
        let (questions, likes): (i64, i64) = db.with_conn(|conn| {
            let counts = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM questions WHERE user_id = ?1),
                    (SELECT COUNT(ql.id)
                     FROM question_likes ql
                     JOIN questions q ON ql.question_id = q.id
                     WHERE q.user_id = ?1 AND ql.liked = 1)",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(counts)
        })?;

        if questions == 0 {
            return Ok(0.0);
        }
        Ok((likes as f64 / questions as f64).round())
    }
}
