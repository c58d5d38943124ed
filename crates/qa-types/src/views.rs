use std::fmt;

use serde::{Deserialize, Serialize};

// -- Questions --

/// Display fields of a question, as returned by the follow/like joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// A question paired with how many relation rows point at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCount {
    pub question_id: i64,
    pub count: i64,
}

// -- Users --

/// First/last name pair of a user, without the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub fname: String,
    pub lname: String,
}

impl PersonName {
    pub fn new(fname: impl Into<String>, lname: impl Into<String>) -> Self {
        Self {
            fname: fname.into(),
            lname: lname.into(),
        }
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.fname, self.lname)
    }
}
