pub mod views;

pub use views::{PersonName, QuestionCount, QuestionSummary};
