use rusqlite::Connection;
use tracing::{info, warn};

use crate::DbResult;

pub fn run(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Question store: running migration v1 (initial schema)");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id      INTEGER PRIMARY KEY,
                fname   TEXT NOT NULL,
                lname   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS questions (
                id      INTEGER PRIMARY KEY,
                title   TEXT NOT NULL,
                body    TEXT NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS replies (
                id          INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL REFERENCES questions(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                parent_id   INTEGER REFERENCES replies(id),
                body        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS question_followers (
                id          INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL REFERENCES questions(id),
                user_id     INTEGER NOT NULL REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS question_likes (
                id          INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL REFERENCES questions(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                liked       INTEGER NOT NULL DEFAULT 1 CHECK (liked IN (0, 1))
            );

            CREATE INDEX IF NOT EXISTS idx_questions_user ON questions(user_id);
            CREATE INDEX IF NOT EXISTS idx_replies_question ON replies(question_id);
            CREATE INDEX IF NOT EXISTS idx_replies_user ON replies(user_id);
            CREATE INDEX IF NOT EXISTS idx_replies_parent ON replies(parent_id);
            CREATE INDEX IF NOT EXISTS idx_question_followers_question ON question_followers(question_id);
            CREATE INDEX IF NOT EXISTS idx_question_followers_user ON question_followers(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    if version < 2 {
        // Older stores kept `liked` as the text 'true'/'false'. Rebuild the
        // table with an integer flag and convert whatever is there.
        info!("Question store: running migration v2 (boolean like flag)");

        // foreign_keys cannot change inside a transaction, and legacy stores
        // were written without enforcement, so rows may point nowhere.
        let enforced: bool = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
        conn.pragma_update(None, "foreign_keys", "OFF")?;
        let rebuilt = rebuild_question_likes(conn);
        if enforced {
            conn.pragma_update(None, "foreign_keys", "ON")?;
        }
        rebuilt?;
    }

    Ok(())
}

fn rebuild_question_likes(conn: &Connection) -> DbResult<()> {
    let (orphaned, unkeyed): (i64, i64) = conn.query_row(
        "SELECT
            COUNT(*) FILTER (
                WHERE question_id NOT IN (SELECT id FROM questions)
                   OR user_id NOT IN (SELECT id FROM users)
            ),
            COUNT(*) FILTER (WHERE question_id IS NULL OR user_id IS NULL)
         FROM question_likes",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    if orphaned > 0 {
        warn!(orphaned, "keeping like rows whose question or user no longer exists");
    }
    if unkeyed > 0 {
        warn!(unkeyed, "dropping like rows without a question or user id");
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "
        CREATE TABLE question_likes_v2 (
            id          INTEGER PRIMARY KEY,
            question_id INTEGER NOT NULL REFERENCES questions(id),
            user_id     INTEGER NOT NULL REFERENCES users(id),
            liked       INTEGER NOT NULL DEFAULT 1 CHECK (liked IN (0, 1))
        );

        INSERT INTO question_likes_v2 (id, question_id, user_id, liked)
            SELECT id, question_id, user_id,
                   CASE WHEN liked IN ('true', '1', 1) THEN 1 ELSE 0 END
            FROM question_likes
            WHERE question_id IS NOT NULL AND user_id IS NOT NULL;

        DROP TABLE question_likes;
        ALTER TABLE question_likes_v2 RENAME TO question_likes;

        CREATE INDEX idx_question_likes_question ON question_likes(question_id);
        CREATE INDEX idx_question_likes_user ON question_likes(user_id);

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )?;
    tx.commit()?;
    Ok(())
}
