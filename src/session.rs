//! Quiz session state and orchestration.
//!
//! Ties the resolver and generator together and tracks progress through a
//! single quiz.

use crate::article::{ArticleContent, ArticleError, ArticleResolver};
use crate::history::HistoryRecord;
use crate::quiz::{self, QuizQuestion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("the quiz is already complete")]
    AlreadyComplete,
    #[error("choice {index} is out of range ({options} options)")]
    InvalidChoice { index: usize, options: usize },
}

/// Why a quiz could not be started
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("no article title or link given")]
    NoInput,
    #[error("article not found: {0}")]
    NotFound(String),
    #[error("no quizzable sentences in '{0}'")]
    Empty(String),
    #[error(transparent)]
    Fetch(ArticleError),
}

impl QuizError {
    /// Short message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            QuizError::NoInput => "Enter a Wikipedia article title or link".to_string(),
            QuizError::NotFound(title) => format!("No Wikipedia article named '{}'", title),
            QuizError::Empty(title) => {
                format!("'{}' doesn't have enough text to build a quiz", title)
            }
            QuizError::Fetch(_) => "Couldn't extract content from that link".to_string(),
        }
    }
}

impl From<ArticleError> for QuizError {
    fn from(err: ArticleError) -> Self {
        match err {
            ArticleError::NotFound(title) => QuizError::NotFound(title),
            other => QuizError::Fetch(other),
        }
    }
}

/// The player's answer to one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    pub answer: String,
    pub selected: String,
    pub correct: bool,
}

/// Progress through one quiz
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub topic: String,
    pub url: String,
    questions: Vec<QuizQuestion>,
    current: usize,
    score: usize,
    results: Vec<QuestionResult>,
}

impl QuizSession {
    pub fn new(topic: String, url: String, questions: Vec<QuizQuestion>) -> Self {
        Self {
            topic,
            url,
            questions,
            current: 0,
            score: 0,
            results: Vec::new(),
        }
    }

    /// Generate questions for an article, failing when none can be built
    pub fn from_article(article: ArticleContent, limit: usize) -> Result<Self, QuizError> {
        let questions =
            quiz::generate_with_rng(&article.title, &article.extract, limit, &mut rand::thread_rng());
        if questions.is_empty() {
            return Err(QuizError::Empty(article.title));
        }
        Ok(Self::new(article.title, article.url, questions))
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    /// Zero-based index of the question being asked
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.questions.len()
    }

    /// Answer the current question with the option at `choice` and advance
    pub fn submit(&mut self, choice: usize) -> Result<QuestionResult, SessionError> {
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::AlreadyComplete)?;
        let selected = question
            .options
            .get(choice)
            .ok_or(SessionError::InvalidChoice {
                index: choice,
                options: question.options.len(),
            })?;

        let result = QuestionResult {
            question: question.question.clone(),
            answer: question.answer.clone(),
            selected: selected.clone(),
            correct: question.is_correct(selected),
        };
        if result.correct {
            self.score += 1;
        }
        self.current += 1;
        self.results.push(result.clone());
        Ok(result)
    }

    pub fn to_history_record(&self, timestamp: DateTime<Utc>) -> HistoryRecord {
        HistoryRecord {
            url: self.url.clone(),
            topic: self.topic.clone(),
            score: self.score,
            total: self.total(),
            timestamp,
            results: self.results.clone(),
        }
    }
}

/// Screen-level state of the quiz flow
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Loading {
        input: String,
    },
    InProgress(QuizSession),
    Completed(QuizSession),
}

/// Resolve `input`, fetch the article and build a quiz from it
pub async fn start_quiz(
    resolver: &ArticleResolver,
    input: &str,
    limit: usize,
) -> Result<QuizSession, QuizError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(QuizError::NoInput);
    }

    let article = resolver.fetch_article(input).await?;
    log::info!(
        "fetched '{}' ({} characters of text)",
        article.title,
        article.extract.len()
    );
    QuizSession::from_article(article, limit)
}
