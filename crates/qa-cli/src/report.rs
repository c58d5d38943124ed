//! Text and JSON views over the question store. All formatting lives here;
//! `qa-db` only returns structured values.

use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;

use qa_db::{Database, Question, Reply, User};
use qa_types::{PersonName, QuestionSummary};

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserReport {
    pub user: User,
    pub average_karma: f64,
    pub authored_questions: Vec<Question>,
    pub authored_replies: Vec<Reply>,
    pub followed_questions: Vec<QuestionSummary>,
    pub liked_questions: Vec<QuestionSummary>,
}

impl UserReport {
    pub fn load(db: &Database, fname: &str, lname: &str) -> Result<Self> {
        let user = User::find_by_name(db, fname, lname)
            .with_context(|| format!("No user named {} {}", fname, lname))?;

        Ok(Self {
            average_karma: user.average_karma(db)?,
            authored_questions: user.authored_questions(db)?,
            authored_replies: user.authored_replies(db)?,
            followed_questions: user.followed_questions(db)?,
            liked_questions: user.liked_questions(db)?,
            user,
        })
    }
}

impl fmt::Display for UserReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.user.display_name())?;
        writeln!(f, "Average karma: {}", self.average_karma)?;

        writeln!(f, "\nQuestions asked ({}):", self.authored_questions.len())?;
        for q in &self.authored_questions {
            writeln!(f, "  #{} {}", q.id().unwrap_or_default(), q.title)?;
        }
        write_none(f, self.authored_questions.is_empty())?;

        writeln!(f, "\nReplies written ({}):", self.authored_replies.len())?;
        for r in &self.authored_replies {
            writeln!(f, "  on question #{}: {}", r.question_id, r.body)?;
        }
        write_none(f, self.authored_replies.is_empty())?;

        writeln!(f, "\nFollowing ({}):", self.followed_questions.len())?;
        write_summaries(f, &self.followed_questions)?;

        writeln!(f, "\nLiked ({}):", self.liked_questions.len())?;
        write_summaries(f, &self.liked_questions)
    }
}

// -- Questions --

#[derive(Debug, Serialize)]
pub struct ThreadLine {
    pub depth: usize,
    pub author: String,
    pub reply: Reply,
}

#[derive(Debug, Serialize)]
pub struct QuestionReport {
    pub question: Question,
    pub author: String,
    pub num_likes: i64,
    pub likers: Vec<PersonName>,
    pub followers: Vec<String>,
    pub replies: Vec<ThreadLine>,
}

impl QuestionReport {
    pub fn load(db: &Database, id: i64) -> Result<Self> {
        let question =
            Question::find_by_id(db, id).with_context(|| format!("No question #{}", id))?;

        let thread = question.thread(db)?;
        let replies = thread
            .walk()
            .map(|(depth, reply)| -> Result<ThreadLine> {
                Ok(ThreadLine {
                    depth,
                    author: reply.author(db)?,
                    reply: reply.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            author: question.author(db)?,
            num_likes: question.num_likes(db)?,
            likers: question.likers(db)?,
            followers: question.question_followers(db)?,
            replies,
            question,
        })
    }
}

impl fmt::Display for QuestionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = &self.question;
        writeln!(f, "#{} {}", q.id().unwrap_or_default(), q.title)?;
        writeln!(f, "asked by {}", self.author)?;
        writeln!(f, "\n{}\n", q.body)?;

        let likers: Vec<String> = self.likers.iter().map(ToString::to_string).collect();
        if likers.is_empty() {
            writeln!(f, "Likes: {}", self.num_likes)?;
        } else {
            writeln!(f, "Likes: {} ({})", self.num_likes, likers.join(", "))?;
        }

        if self.followers.is_empty() {
            writeln!(f, "Followers: none")?;
        } else {
            writeln!(f, "Followers: {}", self.followers.join(", "))?;
        }

        writeln!(f, "\nReplies ({}):", self.replies.len())?;
        for line in &self.replies {
            let indent = "  ".repeat(line.depth + 1);
            writeln!(f, "{}[{}] {}", indent, line.author, line.reply.body)?;
        }
        write_none(f, self.replies.is_empty())
    }
}

// -- Rankings --

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct TopLiked(pub Vec<QuestionSummary>);

impl TopLiked {
    pub fn load(db: &Database, n: u32) -> Result<Self> {
        Ok(Self(Question::most_liked(db, n)?))
    }
}

impl fmt::Display for TopLiked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, q) in self.0.iter().enumerate() {
            writeln!(f, "{}. #{} {}", rank + 1, q.id, q.title)?;
        }
        write_none(f, self.0.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct FollowedLine {
    pub question: Question,
    pub followers: i64,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct TopFollowed(pub Vec<FollowedLine>);

impl TopFollowed {
    pub fn load(db: &Database, n: u32) -> Result<Self> {
        let lines = Question::most_followed(db, n)?
            .into_iter()
            .map(|count| -> Result<FollowedLine> {
                Ok(FollowedLine {
                    question: Question::find_by_id(db, count.question_id)?,
                    followers: count.count,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(lines))
    }
}

impl fmt::Display for TopFollowed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, line) in self.0.iter().enumerate() {
            let noun = if line.followers == 1 { "follower" } else { "followers" };
            writeln!(
                f,
                "{}. #{} {} ({} {})",
                rank + 1,
                line.question.id().unwrap_or_default(),
                line.question.title,
                line.followers,
                noun
            )?;
        }
        write_none(f, self.0.is_empty())
    }
}

fn write_summaries(f: &mut fmt::Formatter<'_>, summaries: &[QuestionSummary]) -> fmt::Result {
    for q in summaries {
        writeln!(f, "  #{} {}", q.id, q.title)?;
    }
    write_none(f, summaries.is_empty())
}

fn write_none(f: &mut fmt::Formatter<'_>, empty: bool) -> fmt::Result {
    if empty {
        writeln!(f, "  (none)")?;
    }
    Ok(())
}
