//! CLI interface for teachbot

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use std::path::PathBuf;

use crate::config::{self, Config, StoragePaths};
use crate::engine::ConversationEngine;
use crate::personality::Personality;
use crate::report::{self, SessionStats};
use crate::types::{flatten_line, AnswerResult};

#[derive(Parser)]
#[command(name = "teachbot")]
#[command(about = "Keyword question-answering bot that learns the answers it does not know", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the data files (overrides the config file)
    #[arg(long, global = true, env = "TEACHBOT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default when no command given)
    Chat {
        /// Personality: formal, humorous (engracado) or rude
        #[arg(short, long)]
        personality: Option<String>,
    },
    /// Ask a single question
    Ask {
        question: String,
        #[arg(short, long)]
        personality: Option<String>,
    },
    /// Teach the answer to a question the bot does not know yet
    Teach {
        question: String,
        answer: String,
        #[arg(short, long)]
        personality: Option<String>,
    },
    /// Show the latest persisted interactions
    History {
        /// Number of interactions to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show accumulated personality usage
    Counters,
    /// Write the summary report of persisted counters and history, and print it
    Report,
    /// Show or reset the configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Everything a command needs
struct Session {
    config: Config,
    paths: StoragePaths,
    engine: ConversationEngine,
    stats: SessionStats,
    personality: Personality,
}

impl Session {
    fn open(config: Config, data_dir: Option<&std::path::Path>, personality: Option<&str>) -> Result<Self> {
        let paths = config.storage_paths(data_dir)?;
        let engine = ConversationEngine::open(&paths, config.engine_options())
            .with_context(|| format!("Failed to open data files in {}", paths.qa.parent().unwrap_or(paths.qa.as_path()).display()))?;
        let personality = personality
            .map(Personality::parse)
            .unwrap_or(config.behavior.default_personality);
        Ok(Self {
            config,
            paths,
            engine,
            stats: SessionStats::new(),
            personality,
        })
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        None => run_chat(Session::open(config, data_dir, None)?)?,
        Some(Commands::Chat { personality }) => {
            run_chat(Session::open(config, data_dir, personality.as_deref())?)?
        }
        Some(Commands::Ask { question, personality }) => {
            let mut session = Session::open(config, data_dir, personality.as_deref())?;
            let result = session.engine.submit(&question, session.personality)?;
            print_result(&result);
            if let AnswerResult::NeedsTeaching { question } = &result {
                println!("Teach me with: teachbot teach \"{}\" \"<answer>\"", question);
            }
        }
        Some(Commands::Teach { question, answer, personality }) => {
            let mut session = Session::open(config, data_dir, personality.as_deref())?;
            match teach(&mut session.engine, &question, &answer, session.personality)? {
                Some(result) => {
                    println!("Thanks! I learned that answer.");
                    print_result(&result);
                }
                None => println!("I already know an answer for that; nothing was learned."),
            }
        }
        Some(Commands::History { limit }) => {
            let session = Session::open(config, data_dir, None)?;
            let n = limit.unwrap_or(session.config.behavior.history_tail);
            print_history(&session.engine, n)?;
        }
        Some(Commands::Counters) => {
            let session = Session::open(config, data_dir, None)?;
            print_counters(&session.engine);
        }
        Some(Commands::Report) => {
            let session = Session::open(config, data_dir, None)?;
            let text = report::write_report(&session.engine, None, &session.paths.summary)?;
            println!("{}", text);
            println!("\nReport saved to {}", session.paths.summary.display());
        }
        Some(Commands::Config { show, reset }) => {
            if reset {
                Config::default().save()?;
                println!("Configuration reset to defaults.");
            } else if show {
                println!("# {}", config::config_path()?.display());
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                println!("{}", config::default_config_toml());
            }
        }
    }

    Ok(())
}

fn run_chat(mut session: Session) -> Result<()> {
    println!("teachbot v{} - ask me something. /help for commands.", crate::VERSION);
    println!("Personality: {}", session.personality);
    println!();

    let mut rl = rustyline::DefaultEditor::new()?;

    loop {
        let prompt = if session.engine.is_awaiting_answer() { "teach> " } else { "> " };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        if input.starts_with('/') || input == "exit" || input == "quit" {
            if !handle_command(input, &mut session)? {
                break;
            }
            continue;
        }

        if session.engine.is_awaiting_answer() {
            match session.engine.provide_answer(input) {
                Ok(result) => {
                    println!("Thanks! I learned that answer.");
                    print_result(&result);
                }
                Err(e) => println!("Could not save: {}. Try again or /cancel.", e),
            }
            continue;
        }

        session.stats.record(input);
        match session.engine.submit(input, session.personality) {
            Ok(result) => {
                print_result(&result);
                if !result.matched() {
                    println!("Type the answer to teach me, or /cancel.");
                }
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    session.engine.flush()?;
    println!("Goodbye!");
    Ok(())
}

/// Handle a slash command; returns false when the session should end
fn handle_command(input: &str, session: &mut Session) -> Result<bool> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();

    match command {
        "/quit" | "/exit" | "exit" | "quit" => return Ok(false),
        "/help" => {
            println!("/history [n]        latest persisted interactions");
            println!("/counters           personality usage");
            println!("/personality <p>    switch to formal, humorous or rude");
            println!("/report             write the summary report");
            println!("/stats              questions asked this session");
            println!("/cancel             stop teaching the pending question");
            println!("/quit               leave");
        }
        "/history" => {
            let n = arg
                .and_then(|a| a.parse().ok())
                .unwrap_or(session.config.behavior.history_tail);
            if let Err(e) = print_history(&session.engine, n) {
                println!("Could not read history: {}", e);
            }
        }
        "/counters" => print_counters(&session.engine),
        "/personality" => match arg {
            Some(name) => {
                session.personality = Personality::parse(name);
                println!("Personality: {}", session.personality);
            }
            None => println!("Personality: {}", session.personality),
        },
        "/report" => match report::write_report(&session.engine, Some(&session.stats), &session.paths.summary) {
            Ok(text) => {
                println!("{}", text);
                println!("\nReport saved to {}", session.paths.summary.display());
            }
            Err(e) => println!("Could not write report: {}", e),
        },
        "/stats" => {
            println!("Interactions this session: {}", session.stats.interactions());
            for (question, count) in session.stats.most_common(3) {
                println!("  {} (x{})", question, count);
            }
        }
        "/cancel" => match session.engine.cancel_teaching() {
            Some(question) => println!("Forgot about '{}'.", question),
            None => println!("Nothing to cancel."),
        },
        other => println!("Unknown command '{}'. /help lists commands.", other),
    }
    Ok(true)
}

/// Teach `answer` for `question` unless a stored key already matches it.
///
/// Returns `None` without touching any file when the question is known.
fn teach(
    engine: &mut ConversationEngine,
    question: &str,
    answer: &str,
    personality: Personality,
) -> Result<Option<AnswerResult>> {
    if engine.qa().find(&flatten_line(question)).is_some() {
        return Ok(None);
    }
    match engine.submit(question, personality)? {
        AnswerResult::NeedsTeaching { .. } => {
            let result = engine.provide_answer(answer).context("Could not save the answer")?;
            Ok(Some(result))
        }
        _ => Ok(None),
    }
}

fn print_result(result: &AnswerResult) {
    match result {
        AnswerResult::Answered { text, .. } => println!("{}", text),
        AnswerResult::NeedsTeaching { question } => {
            println!("I don't know how to answer '{}' yet.", question);
        }
        AnswerResult::FinishTeachingFirst { pending } => {
            println!("Teach me the answer to '{}' first, or /cancel.", pending);
        }
    }
}

fn print_history(engine: &ConversationEngine, n: usize) -> Result<()> {
    let entries = engine.recent_history(n)?;
    if entries.is_empty() {
        println!("No previous interactions found.");
    }
    for entry in entries {
        println!("Q: {} -> A: {}", entry.question, entry.answer);
    }
    Ok(())
}

fn print_counters(engine: &ConversationEngine) {
    let counters = engine.current_counters();
    for (personality, count) in counters.iter() {
        println!("{:<10} {}", personality.to_string(), count);
    }
    println!("{:<10} {}", "total", counters.total());
}
