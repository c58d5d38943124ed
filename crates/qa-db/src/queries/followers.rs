use qa_types::{PersonName, QuestionCount, QuestionSummary};
use rusqlite::params;
use tracing::debug;

use super::{FromRow, ensure_updated, query_all, query_by_id, question_summary};
use crate::{Database, DbResult, QuestionFollower};

impl QuestionFollower {
    pub fn find_by_id(db: &Database, id: i64) -> DbResult<QuestionFollower> {
        db.with_conn(|conn| query_by_id(conn, id))
    }

    pub fn find_by_question_id(db: &Database, question_id: i64) -> DbResult<Vec<QuestionFollower>> {
        db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM question_followers WHERE question_id = ?1 ORDER BY id",
                QuestionFollower::COLUMNS
            );
            query_all(conn, &sql, [question_id], QuestionFollower::from_row)
        })
    }

    pub fn save(&mut self, db: &Database) -> DbResult<()> {
        db.with_conn(|conn| {
            match self.id {
                None => {
                    conn.execute(
                        "INSERT INTO question_followers (question_id, user_id) VALUES (?1, ?2)",
                        params![self.question_id, self.user_id],
                    )?;
                    let id = conn.last_insert_rowid();
                    debug!(
                        follower_id = id,
                        question_id = self.question_id,
                        user_id = self.user_id,
                        "inserted question follower"
                    );
                    self.id = Some(id);
                }
                Some(id) => {
                    let changed = conn.execute(
                        "UPDATE question_followers SET question_id = ?1, user_id = ?2 WHERE id = ?3",
                        params![self.question_id, self.user_id, id],
                    )?;
                    ensure_updated(changed, QuestionFollower::ENTITY, id)?;
                    debug!(follower_id = id, "updated question follower");
                }
            }
            Ok(())
        })
    }

    /// The `n` questions with the most follow rows, most followed first.
    /// Ties go to the lower question id.
    pub fn most_followed_questions(db: &Database, n: u32) -> DbResult<Vec<QuestionCount>> {
        db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT question_id, COUNT(id) AS num_followers
                 FROM question_followers
                 GROUP BY question_id
                 ORDER BY num_followers DESC, question_id ASC
                 LIMIT ?1",
                [n],
                |row| {
                    Ok(QuestionCount {
                        question_id: row.get(0)?,
                        count: row.get(1)?,
                    })
                },
            )
        })
    }

    /// Display names of everyone following the question, in follow order.
    pub fn followers_for_question_id(db: &Database, question_id: i64) -> DbResult<Vec<String>> {
        let names = db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT u.fname, u.lname
                 FROM question_followers qf
                 JOIN users u ON qf.user_id = u.id
                 WHERE qf.question_id = ?1
                 ORDER BY qf.id",
                [question_id],
                |row| {
                    Ok(PersonName {
                        fname: row.get(0)?,
                        lname: row.get(1)?,
                    })
                },
            )
        })?;

        Ok(names.iter().map(ToString::to_string).collect())
    }

    /// Each question the user follows, once, in question id order.
    pub fn followed_questions_for_user_id(
        db: &Database,
        user_id: i64,
    ) -> DbResult<Vec<QuestionSummary>> {
        db.with_conn(|conn| {
            query_all(
                conn,
                "SELECT q.id, q.title, q.body
                 FROM question_followers qf
                 JOIN questions q ON qf.question_id = q.id
                 WHERE qf.user_id = ?1
                 GROUP BY q.id
                 ORDER BY q.id",
                [user_id],
                question_summary,
            )
        })
    }
}
