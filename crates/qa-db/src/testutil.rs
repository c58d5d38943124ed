//! Fixtures shared by the unit tests: a fresh in-memory store and helpers
//! that save one entity each.

use crate::{Database, Question, QuestionFollower, QuestionLike, Reply, User};

pub fn db() -> Database {
    Database::open_in_memory().unwrap()
}

pub fn user(db: &Database, fname: &str, lname: &str) -> User {
    let mut user = User::new(fname, lname);
    user.save(db).unwrap();
    user
}

pub fn question(db: &Database, author: &User, title: &str, body: &str) -> Question {
    let mut question = Question::new(title, body, author.id().unwrap());
    question.save(db).unwrap();
    question
}

pub fn reply(
    db: &Database,
    question: &Question,
    author: &User,
    parent: Option<&Reply>,
    body: &str,
) -> Reply {
    let mut reply = Reply::new(
        question.id().unwrap(),
        author.id().unwrap(),
        parent.map(|p| p.id().unwrap()),
        body,
    );
    reply.save(db).unwrap();
    reply
}

pub fn follow(db: &Database, question: &Question, user: &User) -> QuestionFollower {
    let mut follow = QuestionFollower::new(question.id().unwrap(), user.id().unwrap());
    follow.save(db).unwrap();
    follow
}

pub fn like(db: &Database, question: &Question, user: &User, liked: bool) -> QuestionLike {
    let mut like = QuestionLike::new(question.id().unwrap(), user.id().unwrap(), liked);
    like.save(db).unwrap();
    like
}
