//! wikiquiz CLI - Multiple-choice quizzes from Wikipedia articles
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::path::PathBuf;
use wikiquiz::session::start_quiz;
use wikiquiz::{ui, ArticleResolver, Config, HistoryStore};

#[derive(Parser)]
#[command(name = "wikiquiz")]
#[command(author, version, about = "TUI for multiple-choice quizzes from Wikipedia articles", long_about = None)]
struct Cli {
    /// Path to a wikiquiz.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz in the terminal without the full-screen UI
    Play {
        /// Article title or Wikipedia URL
        input: String,
    },
    /// Show the plain-text extract a quiz would be built from
    Extract {
        /// Article title or Wikipedia URL
        input: String,
    },
    /// List past quiz results
    History {
        /// Maximum number of results to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Delete all stored results
        #[arg(long)]
        clear: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Play { input }) => {
            let store = HistoryStore::open(config.history_path())?;
            play(&input, &config, &store).await?;
        }
        Some(Commands::Extract { input }) => {
            println!("Fetching: {}", input);
            let resolver = ArticleResolver::new(&config.api)?;
            let article = resolver.fetch_article(&input).await?;

            println!("\n=== {} ===", article.title);
            println!("{}\n", article.url.dimmed());
            println!("{}", article.extract);
            println!("\n--- Extracted {} characters ---", article.extract.len());
        }
        Some(Commands::History { limit, clear }) => {
            let store = HistoryStore::open(config.history_path())?;
            if clear {
                let removed = store.clear()?;
                println!("Removed {} stored results.", removed);
                return Ok(());
            }

            let records = store.recent(limit)?;
            if records.is_empty() {
                println!("No quizzes taken yet.");
            } else {
                println!("Past quizzes ({}):\n", records.len());
                for record in records {
                    let score = format!("{}/{}", record.score, record.total);
                    let score = if record.percent() >= 60 {
                        score.green()
                    } else {
                        score.red()
                    };
                    println!(
                        "📄 {} {} ({})",
                        record.topic.bold(),
                        score,
                        record.timestamp.format("%Y-%m-%d %H:%M")
                    );
                    println!("   {}\n", record.url);
                }
            }
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "wikiquiz", &mut std::io::stdout());
        }
        None => {
            // Default: Launch the TUI
            let store = HistoryStore::open(config.history_path())?;
            ui::run(&config, &store).await?;
        }
    }

    Ok(())
}

/// Run a quiz with line-based prompts and store the result
async fn play(input: &str, config: &Config, store: &HistoryStore) -> anyhow::Result<()> {
    println!("Fetching: {}", input);
    let resolver = ArticleResolver::new(&config.api)?;
    let mut session = start_quiz(&resolver, input, config.question_count())
        .await
        .map_err(|e| {
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        })?;

    println!("\n=== {} ===\n", session.topic.bold());
    let theme = ColorfulTheme::default();

    while let Some(question) = session.current_question() {
        println!(
            "{} {}",
            format!("Q{}/{}:", session.position() + 1, session.total()).cyan(),
            question.question
        );
        let choice = Select::with_theme(&theme)
            .with_prompt("Your answer")
            .items(&question.options)
            .default(0)
            .interact()?;

        let result = session.submit(choice)?;
        if result.correct {
            println!("{}\n", "✓ Correct!".green());
        } else {
            println!("{} {}\n", "✗ The answer was".red(), result.answer.bold());
        }
    }

    println!(
        "You scored {} on {}",
        format!("{}/{}", session.score(), session.total()).bold(),
        session.topic
    );
    println!("   {}", session.url.dimmed());

    store.append(session.to_history_record(Utc::now()))?;
    Ok(())
}
