//! # wikiquiz
//!
//! A TUI application that turns Wikipedia articles into short multiple-choice quizzes.
//!
//! ## Features
//!
//! - **Article Resolution**: accepts plain titles or Wikipedia links in any language edition
//! - **Heuristic Questions**: blanks out notable words in prose sentences, no NLP involved
//! - **Local History**: past results kept in a sled database

pub mod article;
pub mod config;
pub mod history;
pub mod quiz;
pub mod session;
pub mod ui;

pub use article::{ArticleContent, ArticleResolver};
pub use config::Config;
pub use history::{HistoryRecord, HistoryStore};
pub use quiz::QuizQuestion;
pub use session::{QuizError, QuizSession};
