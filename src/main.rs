mod debug_report;

use chrono::NaiveDate;
use civicroute::{Corpus, CorpusError, FactError, Options, Planner, UserContext};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Plan government-service journeys for life events and check eligibility.
///
/// Exit codes: 0 success, 1 corpus/IO error or lint findings, 2 invalid arguments.
#[derive(Parser, Debug)]
#[command(name = "civicroute")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Corpus JSON file. Defaults to the bundled sample corpus.
    #[arg(long, global = true, env = "CIVICROUTE_CORPUS")]
    corpus: Option<PathBuf>,

    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true, value_parser = parse_today)]
    today: Option<NaiveDate>,

    /// Print JSON instead of the terminal report.
    #[arg(long, global = true)]
    json: bool,

    /// Force ANSI color output.
    #[arg(long, global = true, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known life events
    Events,

    /// Plan the journey for one or more life events
    Journey {
        #[arg(required = true, value_name = "EVENT")]
        events: Vec<String>,
    },

    /// Check eligibility for a single service
    Check {
        service: String,
        #[command(flatten)]
        facts: FactArgs,
    },

    /// Plan a journey and check every service on it
    Assess {
        #[arg(required = true, value_name = "EVENT")]
        events: Vec<String>,
        #[command(flatten)]
        facts: FactArgs,
    },

    /// Report structural problems in the corpus
    Lint,
}

#[derive(Args, Debug)]
struct FactArgs {
    /// JSON file with the user's facts
    #[arg(long)]
    facts: Option<PathBuf>,

    /// A single fact, e.g. `age=34` or `trigger_dates.death=2026-05-01`. Repeatable.
    #[arg(long = "fact", value_name = "PATH=VALUE")]
    assignments: Vec<String>,
}

impl FactArgs {
    fn load(&self) -> Result<UserContext, FactError> {
        let base = match &self.facts {
            Some(path) => UserContext::from_json_file(path)?,
            None => UserContext::default(),
        };
        base.with_assignments(&self.assignments)
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Facts(#[from] FactError),
    #[error("failed to write JSON: {0}")]
    Output(#[from] serde_json::Error),
    #[error("unknown service '{0}'")]
    UnknownService(String),
    #[error("no known life events among: {}", .0.join(", "))]
    UnknownEvents(Vec<String>),
    #[error("corpus has {0} lint finding(s)")]
    Findings(usize),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::UnknownService(_) | CliError::UnknownEvents(_) => ExitCode::from(2),
            _ => ExitCode::from(1),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CIVICROUTE_LOG").unwrap_or_else(|_| EnvFilter::new("civicroute=warn"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(io::stderr)).init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let corpus = match &cli.corpus {
        Some(path) => Corpus::from_path(path)?,
        None => Corpus::builtin()?,
    };
    let planner = Planner::new(corpus);
    let options = cli.today.map(Options::on).unwrap_or_default();
    let color = if cli.no_color { false } else { cli.color || io::stdout().is_terminal() };

    match &cli.command {
        Command::Events => {
            if cli.json {
                print_json(&planner.life_events().collect::<Vec<_>>())?;
            } else {
                debug_report::print_events(planner.life_events(), color);
            }
        }
        Command::Journey { events } => {
            check_events(&planner, events)?;
            let run = planner.build_journey_verbose(events);
            if cli.json {
                print_json(&run.journey)?;
            } else {
                debug_report::print_journey(&run, color);
            }
        }
        Command::Check { service, facts } => {
            let context = facts.load()?;
            let result = planner
                .evaluate_service_by_id(service, &context, &options)
                .ok_or_else(|| CliError::UnknownService(service.clone()))?;
            if cli.json {
                print_json(&result)?;
            } else {
                debug_report::print_service(&result, color);
            }
        }
        Command::Assess { events, facts } => {
            check_events(&planner, events)?;
            let context = facts.load()?;
            let assessment = planner.assess(events, &context, &options);
            if cli.json {
                print_json(&assessment)?;
            } else {
                debug_report::print_assessment(&assessment, color);
            }
        }
        Command::Lint => {
            let findings = planner.lint();
            if cli.json {
                print_json(&findings)?;
            } else {
                debug_report::print_findings(&findings, color);
            }
            if !findings.is_empty() {
                return Err(CliError::Findings(findings.len()));
            }
        }
    }
    Ok(())
}

/// The core ignores unknown life events; the CLI warns about them and
/// refuses a request where none are known.
fn check_events(planner: &Planner, events: &[String]) -> Result<(), CliError> {
    let unknown: Vec<String> = events.iter().filter(|id| planner.corpus().life_event(id).is_none()).cloned().collect();
    if unknown.len() == events.len() {
        return Err(CliError::UnknownEvents(unknown));
    }
    for id in &unknown {
        eprintln!("warning: unknown life event '{id}' ignored");
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_today(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| format!("invalid date '{value}' (expected YYYY-MM-DD)"))
}
