use std::fmt;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::debug;

use qa_db::{Database, Question, QuestionFollower, QuestionLike, Reply, User, Value};

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub questions: usize,
    pub replies: usize,
    pub follows: usize,
    pub likes: usize,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} users, {} questions, {} replies, {} follows, {} likes",
            self.users, self.questions, self.replies, self.follows, self.likes
        )
    }
}

/// Populate an empty store with a small forum. Refuses to touch a store that
/// already has users.
pub fn run(db: &Database) -> Result<SeedSummary> {
    let rows = db.run("SELECT COUNT(*) AS n FROM users", [])?;
    if let Some(Value::Integer(n)) = rows.first().and_then(|row| row.get("n"))
        && *n > 0
    {
        bail!("Store already has {} users; refusing to seed", n);
    }

    let mut summary = SeedSummary::default();

    let mut users = Vec::new();
    for (fname, lname) in [("Ada", "Lovelace"), ("Charles", "Babbage"), ("Mary", "Somerville")] {
        let mut user = User::new(fname, lname);
        user.save(db)?;
        users.push(saved(user.id())?);
    }
    summary.users = users.len();
    let [ada, charles, mary] = [users[0], users[1], users[2]];

    let mut questions = Vec::new();
    for (title, body, author) in [
        (
            "Can an engine compose music?",
            "If notes obey rules of harmony, could the engine weave them?",
            ada,
        ),
        (
            "Computing Bernoulli numbers",
            "Note G lays out the steps. Is the loop correct?",
            ada,
        ),
        (
            "Funding the Difference Engine",
            "How do we convince Parliament a second time?",
            charles,
        ),
    ] {
        let mut question = Question::new(title, body, author);
        question.save(db)?;
        questions.push(saved(question.id())?);
    }
    summary.questions = questions.len();

    let engine = questions[0];
    let mut root = Reply::new(
        engine,
        charles,
        None,
        "Only if we can encode the rules precisely.",
    );
    root.save(db)?;
    let mut answer = Reply::new(
        engine,
        ada,
        root.id(),
        "The rules are symbols; the engine handles symbols.",
    );
    answer.save(db)?;
    let mut follow_up = Reply::new(
        engine,
        charles,
        answer.id(),
        "Then the mill need not care what the symbols mean.",
    );
    follow_up.save(db)?;
    let mut aside = Reply::new(
        engine,
        mary,
        None,
        "Worth writing up for the Taylor translation.",
    );
    aside.save(db)?;
    summary.replies = 4;

    for (question, user) in [
        (questions[0], charles),
        (questions[0], mary),
        (questions[0], ada),
        (questions[2], ada),
    ] {
        QuestionFollower::new(question, user).save(db)?;
        summary.follows += 1;
    }

    for (question, user, liked) in [
        (questions[0], charles, true),
        (questions[0], mary, true),
        (questions[1], charles, true),
        (questions[2], mary, false),
    ] {
        QuestionLike::new(question, user, liked).save(db)?;
        summary.likes += 1;
    }

    debug!(?summary, "seed complete");
    Ok(summary)
}

fn saved(id: Option<i64>) -> Result<i64> {
    match id {
        Some(id) => Ok(id),
        None => bail!("save did not assign an id"),
    }
}
