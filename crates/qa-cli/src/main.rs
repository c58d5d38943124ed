use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qa_db::Database;

mod report;
mod seed;

#[derive(Parser, Debug)]
#[command(
    name = "questions",
    version,
    about = "Browse a Q&A forum store: users, questions, threaded replies, follows and likes"
)]
struct Cli {
    /// SQLite file holding the forum
    #[arg(long, env = "QA_DB_PATH", default_value = "questions.db", global = true)]
    db: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a small demo forum
    Seed,

    /// Show what a user asked, answered, follows and likes
    User { fname: String, lname: String },

    /// Show a question with its likes, followers and reply thread
    Question { id: i64 },

    /// Most liked questions
    TopLiked {
        #[arg(short, long, env = "QA_TOP_N", default_value_t = 5)]
        n: u32,
    },

    /// Most followed questions
    TopFollowed {
        #[arg(short, long, env = "QA_TOP_N", default_value_t = 5)]
        n: u32,
    },
}

fn main() -> Result<()> {
    // Load .env before parsing so it can supply QA_DB_PATH / QA_TOP_N
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "qa=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let db = Database::open(&cli.db)
        .with_context(|| format!("Failed to open {}", cli.db.display()))?;

    match cli.command {
        Commands::Seed => {
            let summary = seed::run(&db).context("Failed to seed demo data")?;
            info!(
                users = summary.users,
                questions = summary.questions,
                "Seeded demo forum"
            );
            emit(&summary, cli.json)?;
        }
        Commands::User { fname, lname } => {
            let report = report::UserReport::load(&db, &fname, &lname)?;
            emit(&report, cli.json)?;
        }
        Commands::Question { id } => {
            let report = report::QuestionReport::load(&db, id)?;
            emit(&report, cli.json)?;
        }
        Commands::TopLiked { n } => {
            let report = report::TopLiked::load(&db, n)?;
            emit(&report, cli.json)?;
        }
        Commands::TopFollowed { n } => {
            let report = report::TopFollowed::load(&db, n)?;
            emit(&report, cli.json)?;
        }
    }

    Ok(())
}

fn emit<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", value);
    }
    Ok(())
}
