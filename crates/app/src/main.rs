mod terminal;

use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;

use exam_core::format_countdown;
use exam_core::model::{
    AuthContext, ExamVariant, Question, QuestionId, Section, SectionKind, SessionPhase, VariantId,
};
use services::{
    ExamRunner, ExamSession, QuestionBank, RunOutcome, RunnerCommand, RunnerEvent, SessionConfig,
    SessionReport, Transition,
};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use terminal::AlternateScreen;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidVariant { origin: &'static str, raw: String },
    InvalidSectionSecs { origin: &'static str, raw: String },
    InvalidSectionMinutes { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidVariant { origin, raw }
            | ArgsError::InvalidSectionSecs { origin, raw } => {
                write!(f, "invalid {origin} value: {raw}")
            }
            ArgsError::InvalidSectionMinutes { raw } => {
                write!(f, "invalid --section value: {raw} (expected <kind>=<minutes>)")
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

// Flags and their environment fallbacks go through the same parsers, so a bad
// value is rejected wherever it comes from.
fn parse_variant(origin: &'static str, raw: String) -> Result<VariantId, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidVariant { origin, raw })
}

fn parse_section_secs(origin: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSectionSecs { origin, raw })
}

/// `writing=40` -> (Writing, 40)
fn parse_section_minutes(raw: String) -> Result<(SectionKind, u32), ArgsError> {
    let parsed = raw.split_once('=').and_then(|(kind, minutes)| {
        let kind = kind.parse::<SectionKind>().ok()?;
        let minutes = minutes.trim().parse::<u32>().ok()?;
        Some((kind, minutes))
    });
    parsed.ok_or(ArgsError::InvalidSectionMinutes { raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- run      [--variant <id>] [--section-secs <n>] [--section <kind>=<min>]... [--bank <path>] [--user <name>] [--json] [--no-fullscreen]"
    );
    eprintln!(
        "  cargo run -p app -- simulate [--variant <id>] [--section-secs <n>] [--section <kind>=<min>]... [--bank <path>] [--user <name>] [--idle]"
    );
    eprintln!("  cargo run -p app -- variants");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --variant ielts-academic, built-in sample bank, official section durations");
    eprintln!("  --section-secs sets every section to <n> seconds; 0 keeps the official durations");
    eprintln!("  --section writing=40 changes one section of the variant, in minutes");
    eprintln!();
    eprintln!("While an exam runs:");
    eprintln!("  type an answer and press Enter, :next for the next question, :quit to abandon");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_VARIANT, EXAM_SECTION_SECS, EXAM_BANK, EXAM_USER, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Simulate,
    Variants,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "simulate" | "sim" => Some(Self::Simulate),
            "variants" => Some(Self::Variants),
            _ => None,
        }
    }
}

struct Args {
    variant: VariantId,
    section_secs: Option<u32>,
    section_minutes: Vec<(SectionKind, u32)>,
    bank: Option<PathBuf>,
    user: Option<String>,
    json: bool,
    fullscreen: bool,
    idle: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut variant = match std::env::var("EXAM_VARIANT") {
            Ok(value) => parse_variant("EXAM_VARIANT", value)?,
            Err(_) => VariantId::IeltsAcademic,
        };
        let mut section_secs = match std::env::var("EXAM_SECTION_SECS") {
            Ok(value) => Some(parse_section_secs("EXAM_SECTION_SECS", value)?),
            Err(_) => None,
        };
        let mut section_minutes = Vec::new();
        let mut bank = std::env::var_os("EXAM_BANK").map(PathBuf::from);
        let mut user = std::env::var("EXAM_USER")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut json = false;
        let mut fullscreen = true;
        let mut idle = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--variant" => {
                    variant = parse_variant("--variant", require_value(args, "--variant")?)?;
                }
                "--section-secs" => {
                    let value = require_value(args, "--section-secs")?;
                    section_secs = Some(parse_section_secs("--section-secs", value)?);
                }
                "--section" => {
                    let value = require_value(args, "--section")?;
                    section_minutes.push(parse_section_minutes(value)?);
                }
                "--bank" => bank = Some(PathBuf::from(require_value(args, "--bank")?)),
                "--user" => user = Some(require_value(args, "--user")?),
                "--json" => json = true,
                "--no-fullscreen" => fullscreen = false,
                "--idle" => idle = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            variant,
            section_secs,
            section_minutes,
            bank,
            user,
            json,
            fullscreen,
            idle,
        })
    }

    fn candidate(&self) -> AuthContext {
        match self.user.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => AuthContext::signed_in(name, name),
            _ => AuthContext::guest(),
        }
    }

    fn load_bank(&self) -> Result<QuestionBank, services::BankError> {
        match &self.bank {
            Some(path) => {
                let bank = QuestionBank::load(path)?;
                info!(path = %path.display(), questions = bank.len(), "question bank loaded");
                Ok(bank)
            }
            None => Ok(QuestionBank::sample()),
        }
    }

    fn session_config(&self) -> Result<SessionConfig, Box<dyn std::error::Error>> {
        let mut config = SessionConfig::new(ExamVariant::builtin(self.variant), self.load_bank()?)
            .with_candidate(self.candidate());
        for &(section, minutes) in &self.section_minutes {
            config = config.with_section_minutes(section, minutes)?;
        }
        if let Some(secs) = self.section_secs {
            config = config.with_uniform_duration_secs(secs);
        }
        Ok(config)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: interactive run when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    match cmd {
        Command::Variants => {
            list_variants();
            Ok(())
        }
        Command::Run => run_interactive(&parsed).await,
        Command::Simulate => simulate(&parsed).await,
    }
}

fn list_variants() {
    for variant in ExamVariant::catalog() {
        println!("{} ({})", variant.id(), variant.id().exam_name());
        for &section in variant.sections() {
            println!(
                "  {:<30} {:>8}  {}",
                variant.display_title(section),
                format_countdown(variant.duration_secs(section)),
                variant.description(section)
            );
        }
        for rule in variant.rules() {
            println!("  - {rule}");
        }
        println!();
    }
}

/// Stdin is read on a plain thread so a pending read never holds up shutdown.
fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_interactive(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = args.session_config()?;
    if args.fullscreen {
        config = config.with_presentation(AlternateScreen);
    }
    let mut session = ExamSession::start(config)?;
    let mut lines = spawn_line_reader();

    print_rules(session.variant());
    loop {
        println!("[Enter] start   [s] structure   [r] rules   [:quit] leave");
        let Some(line) = lines.recv().await else {
            return Ok(());
        };
        match line.trim() {
            "" => break,
            "s" => {
                if session.phase() == SessionPhase::RulesShown {
                    session.show_structure()?;
                }
                print_structure(&session);
            }
            "r" => {
                session.show_rules()?;
                print_rules(session.variant());
            }
            ":quit" | ":q" => return Ok(()),
            other => println!("unknown choice: {other}"),
        }
    }

    let sections = session.sections().to_vec();
    session.begin()?;
    show_section(&sections[0]);

    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let translator = tokio::spawn(translate_input(lines, command_tx));
    let display = tokio::spawn(render_events(sections, event_rx));

    let outcome = ExamRunner::new()
        .run(&mut session, command_rx, Some(event_tx))
        .await?;
    translator.abort();
    // Ends once the runner has dropped its event sender.
    let _ = display.await;

    match outcome {
        RunOutcome::Completed(report) => print_report(&report, args.json)?,
        RunOutcome::Abandoned => println!("Attempt abandoned; nothing was scored."),
    }
    Ok(())
}

/// Plain lines answer whatever question the runner has current when it reads
/// them, so typing ahead of the screen never lands on a stale question.
async fn translate_input(
    mut lines: mpsc::Receiver<String>,
    commands: mpsc::Sender<RunnerCommand>,
) {
    while let Some(line) = lines.recv().await {
        let command = match line.trim() {
            "" => continue,
            ":next" | ":n" => RunnerCommand::Next,
            ":quit" | ":q" => RunnerCommand::Quit,
            _ => RunnerCommand::AnswerCurrent(line),
        };
        if commands.send(command).await.is_err() {
            break;
        }
    }
    debug!("input closed");
}

async fn render_events(
    sections: Vec<Section>,
    mut events: mpsc::UnboundedReceiver<RunnerEvent>,
) {
    let mut section = 0;
    while let Some(event) = events.recv().await {
        match event {
            RunnerEvent::Tick { remaining_secs } => {
                if remaining_secs > 0 && (remaining_secs % 300 == 0 || remaining_secs <= 10) {
                    println!("  [{} left]", format_countdown(remaining_secs));
                }
            }
            RunnerEvent::Answered { question_id, words } => match words.limit {
                Some(limit) if words.is_over_limit() => println!(
                    "  saved {question_id}: {} words, over the {limit}-word guidance",
                    words.words
                ),
                Some(limit) => println!("  saved {question_id}: {}/{limit} words", words.words),
                None => println!("  saved {question_id}"),
            },
            RunnerEvent::Transition(Transition::NextQuestion(index)) => {
                if let Some(question) = sections[section].question(index) {
                    show_question(question, index, sections[section].question_count());
                }
            }
            RunnerEvent::Transition(Transition::NextSection(kind)) => {
                section = sections
                    .iter()
                    .position(|s| s.kind() == kind)
                    .unwrap_or(section);
                show_section(&sections[section]);
            }
            RunnerEvent::Transition(Transition::Completed(_)) => {
                println!("All sections finished.");
            }
        }
    }
}

fn print_rules(variant: &ExamVariant) {
    println!("{} rules", variant.id().exam_name());
    for rule in variant.rules() {
        println!("  - {rule}");
    }
}

fn print_structure(session: &ExamSession) {
    println!("{} structure", session.variant().id().exam_name());
    for section in session.sections() {
        println!(
            "  {:<30} {:>8}  {} questions",
            section.display_title(),
            format_countdown(section.duration_secs()),
            section.question_count()
        );
    }
}

fn show_section(section: &Section) {
    println!();
    println!(
        "== {} ({}) ==",
        section.display_title(),
        format_countdown(section.duration_secs())
    );
    if let Some(question) = section.question(0) {
        show_question(question, 0, section.question_count());
    }
}

fn show_question(question: &Question, index: usize, total: usize) {
    println!();
    println!("Question {} of {total}: {}", index + 1, question.text());
    for option in question.options() {
        println!("  {}) {}", option.id, option.text);
    }
    if let Some(limit) = question.max_words() {
        println!("  (about {limit} words)");
    }
}

fn print_report(report: &SessionReport, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }
    println!(
        "{} results for {}",
        report.variant.exam_name(),
        report.candidate.display_name()
    );
    for section in &report.sections {
        println!(
            "  {:<30} {:>4.1}   {}/{} answered",
            section.title, section.score, section.answered, section.total
        );
    }
    if let Some(band) = report.overall_band() {
        println!("  {:<30} {:>4.1}", "Overall", band);
    }
    Ok(())
}

fn simulated_answer(question: &Question) -> String {
    match question.options().first() {
        Some(option) => option.id.clone(),
        None => format!("Simulated response to question {}.", question.id()),
    }
}

async fn simulate(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ExamSession::start(args.session_config()?)?;
    let answers: Vec<(QuestionId, String)> = session
        .sections()
        .iter()
        .flat_map(Section::questions)
        .map(|question| (question.id(), simulated_answer(question)))
        .collect();
    let idle = args.idle;

    let (tx, rx) = mpsc::channel(16);
    let feeder = tokio::spawn(async move {
        if !idle {
            for (question_id, value) in answers {
                let answer = RunnerCommand::Answer { question_id, value };
                if tx.send(answer).await.is_err() || tx.send(RunnerCommand::Next).await.is_err()
                {
                    return;
                }
            }
        }
        // Stay connected so only completion ends the run.
        tx.closed().await;
    });

    let outcome = ExamRunner::new().run(&mut session, rx, None).await?;
    feeder.abort();

    match outcome {
        RunOutcome::Completed(report) => {
            println!("{}", report.to_json()?);
            Ok(())
        }
        RunOutcome::Abandoned => Err("simulated session was abandoned".into()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_values_name_where_they_came_from() {
        let err = parse_variant("EXAM_VARIANT", "toeic".into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid EXAM_VARIANT value: toeic");
        let err = parse_variant("--variant", "toeic".into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid --variant value: toeic");

        let err = parse_section_secs("EXAM_SECTION_SECS", "soon".into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid EXAM_SECTION_SECS value: soon");
        assert_eq!(parse_section_secs("--section-secs", " 90 ".into()).unwrap(), 90);
    }

    #[test]
    fn section_minutes_take_kind_and_count() {
        assert_eq!(
            parse_section_minutes("writing=40".into()).unwrap(),
            (SectionKind::Writing, 40)
        );
        for raw in ["writing", "essay=40", "writing=forty"] {
            assert!(parse_section_minutes(raw.into()).is_err(), "{raw}");
        }
    }

    #[test]
    fn section_minutes_outside_the_variant_are_rejected() {
        let args = Args {
            variant: VariantId::Gre,
            section_secs: None,
            section_minutes: vec![(SectionKind::Speaking, 10)],
            bank: None,
            user: None,
            json: false,
            fullscreen: false,
            idle: false,
        };
        let err = args.session_config().unwrap_err();
        assert_eq!(err.to_string(), "speaking is not part of gre");
    }
}
