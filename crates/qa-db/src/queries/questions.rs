use qa_types::{PersonName, QuestionCount, QuestionSummary};
use rusqlite::params;
use tracing::debug;

use super::{FromRow, ensure_updated, query_all, query_by_id};
use crate::{
    Database, DbResult, Question, QuestionFollower, QuestionLike, Reply, ReplyThread, User,
};

impl Question {
    pub fn find_by_id(db: &Database, id: i64) -> DbResult<Question> {
        db.with_conn(|conn| query_by_id(conn, id))
    }

    pub fn find_by_user_id(db: &Database, user_id: i64) -> DbResult<Vec<Question>> {
        db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM questions WHERE user_id = ?1 ORDER BY id",
                Question::COLUMNS
            );
            query_all(conn, &sql, [user_id], Question::from_row)
        })
    }

    pub fn most_followed(db: &Database, n: u32) -> DbResult<Vec<QuestionCount>> {
        QuestionFollower::most_followed_questions(db, n)
    }

    pub fn most_liked(db: &Database, n: u32) -> DbResult<Vec<QuestionSummary>> {
        QuestionLike::most_liked_questions(db, n)
    }

    pub fn save(&mut self, db: &Database) -> DbResult<()> {
        db.with_conn(|conn| {
            match self.id {
                None => {
                    conn.execute(
                        "INSERT INTO questions (title, body, user_id) VALUES (?1, ?2, ?3)",
                        params![self.title, self.body, self.user_id],
                    )?;
                    let id = conn.last_insert_rowid();
                    debug!(question_id = id, user_id = self.user_id, "inserted question");
                    self.id = Some(id);
                }
                Some(id) => {
                    let changed = conn.execute(
                        "UPDATE questions SET title = ?1, body = ?2, user_id = ?3 WHERE id = ?4",
                        params![self.title, self.body, self.user_id, id],
                    )?;
                    ensure_updated(changed, Question::ENTITY, id)?;
                    debug!(question_id = id, "updated question");
                }
            }
            Ok(())
        })
    }

    /// Display name of the author.
    pub fn author(&self, db: &Database) -> DbResult<String> {
        User::author_name(db, self.user_id)
    }

    /// Every reply on this question in id order, regardless of nesting.
    pub fn replies(&self, db: &Database) -> DbResult<Vec<Reply>> {
        Reply::get_replies_by_question(db, self.saved_id()?)
    }

    pub fn thread(&self, db: &Database) -> DbResult<ReplyThread> {
        ReplyThread::for_question(db, self.saved_id()?)
    }

    pub fn question_followers(&self, db: &Database) -> DbResult<Vec<String>> {
        QuestionFollower::followers_for_question_id(db, self.saved_id()?)
    }

    pub fn likers(&self, db: &Database) -> DbResult<Vec<PersonName>> {
        QuestionLike::likers_for_question_id(db, self.saved_id()?)
    }

    pub fn num_likes(&self, db: &Database) -> DbResult<i64> {
        QuestionLike::num_liked_for_question_id(db, self.saved_id()?)
    }
}
