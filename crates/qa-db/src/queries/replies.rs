use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{FromRow, ensure_updated, query_all, query_by_id};
use crate::{Database, DbError, DbResult, Reply, User};

impl Reply {
    pub fn find_by_id(db: &Database, id: i64) -> DbResult<Reply> {
        db.with_conn(|conn| query_by_id(conn, id))
    }

    pub fn find_by_user_id(db: &Database, user_id: i64) -> DbResult<Vec<Reply>> {
        db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM replies WHERE user_id = ?1 ORDER BY id",
                Reply::COLUMNS
            );
            query_all(conn, &sql, [user_id], Reply::from_row)
        })
    }

    /// Flat list of every reply on the question, any depth, in id order.
    /// See `ReplyThread` for the assembled tree.
    pub fn get_replies_by_question(db: &Database, question_id: i64) -> DbResult<Vec<Reply>> {
        db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM replies WHERE question_id = ?1 ORDER BY id",
                Reply::COLUMNS
            );
            query_all(conn, &sql, [question_id], Reply::from_row)
        })
    }

    /// Insert or update. A parent, when set, must be an existing reply on the
    /// same question and must not have this reply among its ancestors. An
    /// update may not move a reply away from the question its children are on.
    pub fn save(&mut self, db: &Database) -> DbResult<()> {
        db.with_conn(|conn| {
            if let Some(parent_id) = self.parent_id {
                validate_parent(conn, self, parent_id)?;
            }
            if let Some(id) = self.id {
                validate_children(conn, id, self.question_id)?;
            }

            match self.id {
                None => {
                    conn.execute(
                        "INSERT INTO replies (question_id, user_id, parent_id, body) VALUES (?1, ?2, ?3, ?4)",
                        params![self.question_id, self.user_id, self.parent_id, self.body],
                    )?;
                    let id = conn.last_insert_rowid();
                    debug!(
                        reply_id = id,
                        question_id = self.question_id,
                        parent_id = ?self.parent_id,
                        "inserted reply"
                    );
                    self.id = Some(id);
                }
                Some(id) => {
                    let changed = conn.execute(
                        "UPDATE replies SET question_id = ?1, user_id = ?2, parent_id = ?3, body = ?4 WHERE id = ?5",
                        params![self.question_id, self.user_id, self.parent_id, self.body, id],
                    )?;
                    ensure_updated(changed, Reply::ENTITY, id)?;
                    debug!(reply_id = id, "updated reply");
                }
            }
            Ok(())
        })
    }

    /// Display name of the author.
    pub fn author(&self, db: &Database) -> DbResult<String> {
        User::author_name(db, self.user_id)
    }

    /// The reply this one answers. Root replies fail with `DbError::NoParent`.
    pub fn parent_reply(&self, db: &Database) -> DbResult<Reply> {
        let parent_id = self.parent_id.ok_or(DbError::NoParent)?;
        Reply::find_by_id(db, parent_id)
    }

    pub fn parent_author(&self, db: &Database) -> DbResult<String> {
        self.parent_reply(db)?.author(db)
    }

    /// Direct children only; grandchildren are not included.
    pub fn child_replies(&self, db: &Database) -> DbResult<Vec<Reply>> {
        let id = self.saved_id()?;
        db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM replies WHERE parent_id = ?1 ORDER BY id",
                Reply::COLUMNS
            );
            query_all(conn, &sql, [id], Reply::from_row)
        })
    }
}

fn validate_children(conn: &Connection, id: i64, question_id: i64) -> DbResult<()> {
    let stranded: i64 = conn.query_row(
        "SELECT COUNT(*) FROM replies WHERE parent_id = ?1 AND question_id != ?2",
        [id, question_id],
        |row| row.get(0),
    )?;
    if stranded > 0 {
        return Err(DbError::InvalidParent(format!(
            "reply {} has {} replies that would be left on another question",
            id, stranded
        )));
    }
    Ok(())
}

fn validate_parent(conn: &Connection, reply: &Reply, parent_id: i64) -> DbResult<()> {
    if reply.id == Some(parent_id) {
        return Err(DbError::InvalidParent(format!(
            "reply {} cannot be its own parent",
            parent_id
        )));
    }

    let (parent_question, mut cursor): (i64, Option<i64>) = conn
        .query_row(
            "SELECT question_id, parent_id FROM replies WHERE id = ?1",
            [parent_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| DbError::InvalidParent(format!("reply {} does not exist", parent_id)))?;

    if parent_question != reply.question_id {
        return Err(DbError::InvalidParent(format!(
            "reply {} belongs to question {}, not {}",
            parent_id, parent_question, reply.question_id
        )));
    }

    // A reply without an id has no descendants yet.
    let Some(id) = reply.id else {
        return Ok(());
    };

    let mut seen = HashSet::from([parent_id]);
    while let Some(ancestor) = cursor {
        if ancestor == id {
            return Err(DbError::InvalidParent(format!(
                "reply {} descends from reply {}",
                parent_id, id
            )));
        }
        // Stop on a cycle already in the store that does not involve us.
        if !seen.insert(ancestor) {
            break;
        }
        cursor = conn
            .query_row(
                "SELECT parent_id FROM replies WHERE id = ?1",
                [ancestor],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn save_then_find_round_trips() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let mut reply = Reply::new(question.id().unwrap(), ada.id().unwrap(), None, "first");

        reply.save(&db).unwrap();

        let id = reply.id().unwrap();
        assert_eq!(id, db.last_inserted_id().unwrap());
        assert_eq!(Reply::find_by_id(&db, id).unwrap(), reply);
        assert!(reply.is_root());
    }

    #[test]
    fn save_with_id_updates_body() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let mut reply = testutil::reply(&db, &question, &ada, None, "frist");
        let id = reply.id();

        reply.body = "first".into();
        reply.save(&db).unwrap();

        assert_eq!(reply.id(), id);
        assert_eq!(Reply::find_by_id(&db, id.unwrap()).unwrap().body, "first");
    }

    #[test]
    fn find_by_user_and_question() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let b = testutil::user(&db, "Charles", "Babbage");
        let q1 = testutil::question(&db, &ada, "Q1", "B1");
        let q2 = testutil::question(&db, &ada, "Q2", "B2");
        let r1 = testutil::reply(&db, &q1, &b, None, "one");
        let r2 = testutil::reply(&db, &q1, &ada, Some(&r1), "two");
        let r3 = testutil::reply(&db, &q1, &b, Some(&r2), "three");
        let r4 = testutil::reply(&db, &q2, &b, None, "four");

        assert_eq!(
            Reply::find_by_user_id(&db, b.id().unwrap()).unwrap(),
            vec![r1.clone(), r3.clone(), r4]
        );
        assert_eq!(
            Reply::get_replies_by_question(&db, q1.id().unwrap()).unwrap(),
            vec![r1, r2, r3]
        );
    }

    #[test]
    fn parent_of_root_reply_is_invalid() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let root = testutil::reply(&db, &question, &ada, None, "first");

        assert!(matches!(root.parent_reply(&db).unwrap_err(), DbError::NoParent));
        assert!(matches!(root.parent_author(&db).unwrap_err(), DbError::NoParent));
    }

    #[test]
    fn parent_and_children_scenario() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let b = testutil::user(&db, "Charles", "Babbage");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let r1 = testutil::reply(&db, &question, &ada, None, "first");
        let r2 = testutil::reply(&db, &question, &b, Some(&r1), "second");

        assert_eq!(r2.parent_reply(&db).unwrap(), r1);
        assert_eq!(r2.parent_author(&db).unwrap(), "Ada Lovelace");
        assert_eq!(r2.author(&db).unwrap(), "Charles Babbage");
        assert_eq!(r1.child_replies(&db).unwrap(), vec![r2]);
    }

    #[test]
    fn child_replies_exclude_grandchildren() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let root = testutil::reply(&db, &question, &ada, None, "root");
        let a = testutil::reply(&db, &question, &ada, Some(&root), "a");
        let b = testutil::reply(&db, &question, &ada, Some(&root), "b");
        let grandchild = testutil::reply(&db, &question, &ada, Some(&a), "a.1");

        assert_eq!(root.child_replies(&db).unwrap(), vec![a.clone(), b]);
        assert_eq!(a.child_replies(&db).unwrap(), vec![grandchild.clone()]);
        assert!(grandchild.child_replies(&db).unwrap().is_empty());
    }

    #[test]
    fn parent_must_exist() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let mut reply = Reply::new(question.id().unwrap(), ada.id().unwrap(), Some(99), "orphan");

        let err = reply.save(&db).unwrap_err();
        assert!(matches!(err, DbError::InvalidParent(_)));
        assert_eq!(reply.id(), None);
    }

    #[test]
    fn parent_must_be_on_the_same_question() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let q1 = testutil::question(&db, &ada, "Q1", "B1");
        let q2 = testutil::question(&db, &ada, "Q2", "B2");
        let other = testutil::reply(&db, &q2, &ada, None, "elsewhere");
        let mut reply = Reply::new(q1.id().unwrap(), ada.id().unwrap(), other.id(), "cross");

        let err = reply.save(&db).unwrap_err();
        assert!(matches!(err, DbError::InvalidParent(_)));
    }

    #[test]
    fn update_rejects_cycles() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let mut r1 = testutil::reply(&db, &question, &ada, None, "one");
        let r2 = testutil::reply(&db, &question, &ada, Some(&r1), "two");
        let r3 = testutil::reply(&db, &question, &ada, Some(&r2), "three");

        r1.parent_id = r3.id();
        assert!(matches!(r1.save(&db).unwrap_err(), DbError::InvalidParent(_)));

        r1.parent_id = r1.id();
        assert!(matches!(r1.save(&db).unwrap_err(), DbError::InvalidParent(_)));

        let stored = Reply::find_by_id(&db, r1.id().unwrap()).unwrap();
        assert!(stored.is_root());
    }

    #[test]
    fn update_cannot_move_a_reply_away_from_its_children() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let q1 = testutil::question(&db, &ada, "Q1", "B1");
        let q2 = testutil::question(&db, &ada, "Q2", "B2");
        let mut root = testutil::reply(&db, &q1, &ada, None, "root");
        let child = testutil::reply(&db, &q1, &ada, Some(&root), "child");

        root.question_id = q2.id().unwrap();
        assert!(matches!(root.save(&db).unwrap_err(), DbError::InvalidParent(_)));

        let stored = Reply::find_by_id(&db, root.id().unwrap()).unwrap();
        assert_eq!(stored.question_id, q1.id().unwrap());
        let child = Reply::find_by_id(&db, child.id().unwrap()).unwrap();
        assert_eq!(child.question_id, q1.id().unwrap());
    }

    #[test]
    fn childless_reply_may_move_to_another_question() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let q1 = testutil::question(&db, &ada, "Q1", "B1");
        let q2 = testutil::question(&db, &ada, "Q2", "B2");
        let mut reply = testutil::reply(&db, &q1, &ada, None, "misplaced");

        reply.question_id = q2.id().unwrap();
        reply.save(&db).unwrap();

        assert_eq!(
            Reply::get_replies_by_question(&db, q2.id().unwrap()).unwrap(),
            vec![reply]
        );
    }

    #[test]
    fn update_may_reparent_within_the_question() {
        let db = testutil::db();
        let ada = testutil::user(&db, "Ada", "Lovelace");
        let question = testutil::question(&db, &ada, "Title", "Body");
        let r1 = testutil::reply(&db, &question, &ada, None, "one");
        let r2 = testutil::reply(&db, &question, &ada, None, "two");
        let mut r3 = testutil::reply(&db, &question, &ada, Some(&r1), "three");

        r3.parent_id = r2.id();
        r3.save(&db).unwrap();

        assert!(r1.child_replies(&db).unwrap().is_empty());
        assert_eq!(r2.child_replies(&db).unwrap(), vec![r3]);
    }
}
