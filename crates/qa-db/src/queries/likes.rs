use qa_types::{PersonName, QuestionSummary};
use rusqlite::params;
use tracing::debug;

use super::{FromRow, ensure_updated, query_all, query_by_id, question_summary};
use crate::{Database, DbResult, QuestionLike};

impl QuestionLike {
    pub fn find_by_id(db: &Database, id: i64) -> DbResult<QuestionLike> {
        db.with_conn(|conn| query_by_id(conn, id))
    }

    /// All like and unlike rows for a question, oldest first.
    pub fn find_by_question_id(db: &Database, question_id: i64) -> DbResult<Vec<QuestionLike>> {
        db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM question_likes WHERE question_id = ?1 ORDER BY id",
                QuestionLike::COLUMNS
            );
            query_all(conn, &sql, [question_id], QuestionLike::from_row)
        })
    }

    pub fn save(&mut self, db: &Database) -> DbResult<()> {
        db.with_conn(|conn| {
            match self.id {
                None => {
                    conn.execute(
                        "INSERT INTO question_likes (question_id, user_id, liked) VALUES (?1, ?2, ?3)",
                        params![self.question_id, self.user_id, self.liked],
                    )?;
                    let id = conn.last_insert_rowid();
                    debug!(
                        like_id = id,
                        question_id = self.question_id,
                        liked = self.liked,
                        "inserted question like"
                    );
                    self.id = Some(id);
                }
                Some(id) => {
                    let changed = conn.execute(
                        "UPDATE question_likes SET question_id = ?1, user_id = ?2, liked = ?3 WHERE id = ?4",
                        params![self.question_id, self.user_id, self.liked, id],
                    )?;
                    ensure_updated(changed, QuestionLike::ENTITY, id)?;
                    debug!(like_id = id, liked = self.liked, "updated question like");
                }
            }
            Ok(())
        })
    }

    pub fn num_liked_for_question_id(db: &Database, question_id: i64) -> DbResult<i64> {
        db.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(id) FROM question_likes WHERE question_id = ?1 AND liked = 1",
                [question_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn likers_for_question_id(db: &Database, question_id: i64) -> DbResult<Vec<PersonName>> {
        db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT u.fname, u.lname
                 FROM question_likes ql
                 JOIN users u ON ql.user_id = u.id
                 WHERE ql.question_id = ?1 AND ql.liked = 1
                 ORDER BY ql.id",
                [question_id],
                |row| {
                    Ok(PersonName {
                        fname: row.get(0)?,
                        lname: row.get(1)?,
                    })
                },
            )
        })
    }

    pub fn liked_questions_for_user_id(
        db: &Database,
        user_id: i64,
    ) -> DbResult<Vec<QuestionSummary>> {
        db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT q.id, q.title, q.body
                 FROM question_likes ql
                 JOIN questions q ON ql.question_id = q.id
                 WHERE ql.user_id = ?1 AND ql.liked = 1
                 GROUP BY q.id
                 ORDER BY q.id",
                [user_id],
                question_summary,
            )
        })
    }

    /// The `n` questions with the most likes, most liked first. Ties go to
    /// the lower question id. Questions without likes never appear.
    pub fn most_liked_questions(db: &Database, n: u32) -> DbResult<Vec<QuestionSummary>> {
        db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT q.id, q.title, q.body
                 FROM questions q
                 JOIN (
                     SELECT question_id, COUNT(id) AS num_likes
                     FROM question_likes
                     WHERE liked = 1
                     GROUP BY question_id
                 ) ql ON ql.question_id = q.id
                 ORDER BY ql.num_likes DESC, q.id ASC
                 LIMIT ?1",
                [n],
                question_summary,
            )
        })
    }
}
