//! Entity types. Each one mirrors a row of its table; `id` is `None` until
//! the entity has been saved and never changes afterwards.
//!
//! Finders, associations and `save` live in `crate::queries`.

use rusqlite::Row;
use serde::Serialize;

use crate::queries::FromRow;
use crate::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub(crate) id: Option<i64>,
    pub fname: String,
    pub lname: String,
}

impl User {
    pub fn new(fname: impl Into<String>, lname: impl Into<String>) -> Self {
        Self {
            id: None,
            fname: fname.into(),
            lname: lname.into(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// "first last"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.fname, self.lname)
    }

    pub(crate) fn saved_id(&self) -> DbResult<i64> {
        self.id.ok_or(DbError::Unsaved("user"))
    }
}

impl FromRow for User {
    const ENTITY: &'static str = "user";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, fname, lname";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            fname: row.get(1)?,
            lname: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub(crate) id: Option<i64>,
    pub title: String,
    pub body: String,
    pub user_id: i64,
}

impl Question {
    pub fn new(title: impl Into<String>, body: impl Into<String>, user_id: i64) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            user_id,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub(crate) fn saved_id(&self) -> DbResult<i64> {
        self.id.ok_or(DbError::Unsaved("question"))
    }
}

impl FromRow for Question {
    const ENTITY: &'static str = "question";
    const TABLE: &'static str = "questions";
    const COLUMNS: &'static str = "id, title, body, user_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            body: row.get(2)?,
            user_id: row.get(3)?,
        })
    }
}

/// A reply on a question. Root replies have no `parent_id`; child replies
/// point at another reply on the same question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub(crate) id: Option<i64>,
    pub question_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub body: String,
}

impl Reply {
    pub fn new(
        question_id: i64,
        user_id: i64,
        parent_id: Option<i64>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            question_id,
            user_id,
            parent_id,
            body: body.into(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub(crate) fn saved_id(&self) -> DbResult<i64> {
        self.id.ok_or(DbError::Unsaved("reply"))
    }
}

impl FromRow for Reply {
    const ENTITY: &'static str = "reply";
    const TABLE: &'static str = "replies";
    const COLUMNS: &'static str = "id, question_id, user_id, parent_id, body";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            question_id: row.get(1)?,
            user_id: row.get(2)?,
            parent_id: row.get(3)?,
            body: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionFollower {
    pub(crate) id: Option<i64>,
    pub question_id: i64,
    pub user_id: i64,
}

impl QuestionFollower {
    pub fn new(question_id: i64, user_id: i64) -> Self {
        Self {
            id: None,
            question_id,
            user_id,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }
}

impl FromRow for QuestionFollower {
    const ENTITY: &'static str = "question follower";
    const TABLE: &'static str = "question_followers";
    const COLUMNS: &'static str = "id, question_id, user_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            question_id: row.get(1)?,
            user_id: row.get(2)?,
        })
    }
}

/// A point-in-time like (`liked = true`) or unlike (`liked = false`) of a
/// question. Only liked rows count toward aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionLike {
    pub(crate) id: Option<i64>,
    pub question_id: i64,
    pub user_id: i64,
    pub liked: bool,
}

impl QuestionLike {
    pub fn new(question_id: i64, user_id: i64, liked: bool) -> Self {
        Self {
            id: None,
            question_id,
            user_id,
            liked,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }
}

impl FromRow for QuestionLike {
    const ENTITY: &'static str = "question like";
    const TABLE: &'static str = "question_likes";
    const COLUMNS: &'static str = "id, question_id, user_id, liked";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            question_id: row.get(1)?,
            user_id: row.get(2)?,
            liked: row.get(3)?,
        })
    }
}
