use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use backend::store::Backend;
use services::auth::AuthSession;
use services::module_service::ModuleService;
use services::study::{StudyFlowService, StudyOptions};
use services::Clock;
use study_core::flashcards::{FlashcardDeck, hint};
use study_core::generator::{Question, StudyMode};
use study_core::model::{Credentials, ModuleId, Term};
use study_core::session::{Answer, StudySession};

const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMode { raw: String },
    MissingModuleId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (flashcards, quiz, or test)")
            }
            ArgsError::MissingModuleId => {
                write!(f, "study requires --module-id (or STUDY_MODULE_ID)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- modules [--community] [--query <text>]");
    eprintln!("  cargo run -p app -- study --module-id <id> [--mode <mode>] [--starred]");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --api-url <url>     backend base url (default {DEFAULT_API_URL})");
    eprintln!("  --email <email>     sign in before running the command");
    eprintln!("  --password <pass>");
    eprintln!();
    eprintln!("Modes: flashcards, quiz, test (default: test)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_API_URL, STUDY_MODULE_ID, STUDY_EMAIL, STUDY_PASSWORD");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Modules,
    Study,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "modules" => Some(Self::Modules),
            "study" => Some(Self::Study),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    api_url: String,
    module_id: Option<ModuleId>,
    mode: StudyMode,
    starred: bool,
    community: bool,
    query: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            api_url: std::env::var("STUDY_API_URL")
                .ok()
                .unwrap_or_else(|| DEFAULT_API_URL.into()),
            module_id: std::env::var("STUDY_MODULE_ID").ok().map(ModuleId::new),
            mode: StudyMode::Test,
            starred: false,
            community: false,
            query: None,
            email: std::env::var("STUDY_EMAIL").ok(),
            password: std::env::var("STUDY_PASSWORD").ok(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api-url" => parsed.api_url = require_value(args, "--api-url")?,
                "--module-id" => {
                    parsed.module_id = Some(ModuleId::new(require_value(args, "--module-id")?));
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    parsed.mode = StudyMode::parse(&value)
                        .ok_or(ArgsError::InvalidMode { raw: value })?;
                }
                "--starred" => parsed.starred = true,
                "--community" => parsed.community = true,
                "--query" => parsed.query = Some(require_value(args, "--query")?),
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--password" => parsed.password = Some(require_value(args, "--password")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: study when only flags are provided.
    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Study,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default_clock();
    let backend = Backend::http(&args.api_url)?;

    // Sign in up front when credentials are available; otherwise let the
    // backend's 401 surface on the first protected call.
    let auth = AuthSession::new(clock, backend.auth.clone());
    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        let profile = auth
            .login(&Credentials {
                email: email.clone(),
                password: password.clone(),
            })
            .await?;
        println!("signed in as {}", profile.username);
    }

    match cmd {
        Command::Modules => run_modules(&backend, &args).await,
        Command::Study => run_study(clock, &backend, &args).await,
    }
}

async fn run_modules(backend: &Backend, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let modules = ModuleService::new(backend.modules.clone());

    let list = if args.community {
        modules.community(args.query.as_deref()).await?
    } else {
        modules.my_modules().await?
    };

    if list.is_empty() {
        println!("no modules found");
        return Ok(());
    }
    for module in &list {
        let privacy = if module.is_private { " (private)" } else { "" };
        println!(
            "{}  {} — {} terms{}",
            module.id.as_str(),
            module.title,
            module.terms_count,
            privacy
        );
        if let Some(description) = &module.description {
            println!("    {description}");
        }
    }
    Ok(())
}

async fn run_study(
    clock: Clock,
    backend: &Backend,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let module_id = args.module_id.clone().ok_or(ArgsError::MissingModuleId)?;
    let study = StudyFlowService::from_backend(clock, backend);
    let options = StudyOptions {
        starred_only: args.starred,
    };

    let overview = study.module_overview(&module_id).await?;
    println!("{} — {} terms", overview.title, overview.terms_count);
    if let Some(counts) = &overview.progress {
        println!("progress: {}% complete", counts.percent_complete());
    }
    println!();

    match args.mode {
        StudyMode::Flashcards => {
            let deck = study.start_flashcards(&module_id, options).await?;
            run_flashcards(&study, deck).await
        }
        StudyMode::Quiz | StudyMode::Test => {
            let session = study.start(&module_id, args.mode, options).await?;
            run_session(&study, session).await
        }
    }
}

//
// ─── SESSION LOOP ──────────────────────────────────────────────────────────────
//

async fn run_session(
    study: &StudyFlowService,
    mut session: StudySession,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Some(question) = session.current_question().cloned() {
            let progress = session.progress();
            println!("question {}/{}", progress.answered + 1, progress.total);

            let answer = prompt_answer(&question)?;
            let result = study.answer_current(&mut session, &answer).await?;

            if result.outcome.correct_units == result.outcome.total_units {
                println!("correct!");
            } else if result.outcome.total_units > 1 {
                println!(
                    "{} of {} pairs correct",
                    result.outcome.correct_units, result.outcome.total_units
                );
            } else {
                println!("incorrect");
            }
            println!();

            if let Some(flush) = result.flush
                && !flush.is_clean()
            {
                eprintln!("warning: {} progress updates failed", flush.failed);
            }
        }

        println!("session complete: {}/{}", session.score(), session.max_score());
        let again = read_line("retry? [y/N] ")?;
        if !again.trim().eq_ignore_ascii_case("y") {
            return Ok(());
        }
        study.retry(&mut session);
        println!();
    }
}

fn prompt_answer(question: &Question) -> io::Result<Answer> {
    match question {
        Question::Written { term, .. } => {
            println!("definition of \"{}\"?  (? for a hint)", term.term);
            prompt_written(&term.definition)
        }
        Question::WrittenReverse { term, .. } => {
            println!("which term means \"{}\"?  (? for a hint)", term.definition);
            prompt_written(&term.term)
        }
        Question::MultipleChoice { term, options, .. } => {
            println!("definition of \"{}\"?", term.term);
            for (i, option) in options.iter().enumerate() {
                println!("  {}. {option}", i + 1);
            }
            loop {
                let input = read_line("> ")?;
                if let Some(choice) = parse_index(&input, options.len()) {
                    return Ok(Answer::Choice(options[choice].clone()));
                }
                println!("enter a number between 1 and {}", options.len());
            }
        }
        Question::Matching { pairs, .. } => prompt_matching(pairs),
    }
}

fn prompt_written(expected: &str) -> io::Result<Answer> {
    loop {
        let input = read_line("> ")?;
        if input.trim() == "?" {
            println!("hint: {}", hint(expected));
            continue;
        }
        return Ok(Answer::Text(input));
    }
}

fn prompt_matching(pairs: &[Term]) -> io::Result<Answer> {
    println!("match each term to a definition:");

    // A stable presentation order that doesn't mirror the pair order.
    let mut definitions: Vec<&str> = pairs.iter().map(|p| p.definition.as_str()).collect();
    definitions.sort_unstable();
    for (i, definition) in definitions.iter().enumerate() {
        println!("  {}. {definition}", i + 1);
    }

    let mut given = Vec::with_capacity(pairs.len());
    for pair in pairs {
        loop {
            let input = read_line(&format!("{} = ", pair.term))?;
            if input.trim().is_empty() {
                // Skipping a term scores that pair as incorrect.
                break;
            }
            if let Some(choice) = parse_index(&input, definitions.len()) {
                given.push((pair.term.clone(), definitions[choice].to_owned()));
                break;
            }
            println!("enter a number between 1 and {}, or blank to skip", definitions.len());
        }
    }
    Ok(Answer::Pairs(given))
}

fn parse_index(input: &str, len: usize) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

//
// ─── FLASHCARD LOOP ────────────────────────────────────────────────────────────
//

async fn run_flashcards(
    study: &StudyFlowService,
    mut deck: FlashcardDeck,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("flashcards: enter = flip, n = next, p = previous, s = star, f = starred filter, q = quit");
    loop {
        match deck.face() {
            Some(face) => {
                let star = deck.current().map(|t| t.is_starred).unwrap_or(false);
                println!(
                    "[{}/{}]{} {face}",
                    deck.position() + 1,
                    deck.len(),
                    if star { " ★" } else { "" }
                );
            }
            None => println!("no cards to show"),
        }

        match read_line("> ")?.trim() {
            "" => deck.flip(),
            "n" => deck.next(),
            "p" => deck.prev(),
            "f" => deck.set_starred_only(!deck.starred_only()),
            "s" => {
                if let Some(id) = deck.current().map(|t| t.id.clone()) {
                    match study.toggle_deck_star(&mut deck, &id).await {
                        Ok(starred) => {
                            println!("{}", if starred { "starred" } else { "unstarred" });
                        }
                        Err(err) => eprintln!("star failed: {err}"),
                    }
                }
            }
            "q" => return Ok(()),
            other => println!("unknown command: {other}"),
        }
    }
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
