mod demo;
mod telemetry;
mod terminal;

use std::fmt;
use std::path::PathBuf;

use backend::GenerationRequest;
use quiz_core::model::{QuestionSetId, QuestionType, SelectionCriteria, TypeFilter};
use services::{AppConfig, AppServices, Clock};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidValue { flag: &'static str, raw: String },
    MissingPath { command: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::MissingPath { command } => write!(f, "{command} requires a file path"),
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

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidValue { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [--api <url> | --demo] sets");
    eprintln!("  app [--api <url> | --demo] count [filters]");
    eprintln!("  app [--api <url> | --demo] quiz  [filters] [--limit <n>]");
    eprintln!("  app [--api <url>] upload <file.pdf|file.docx>");
    eprintln!("  app [--api <url>] generate --file <notes.txt> [--questions <n>] [--type <t>] [--name <set>]");
    eprintln!();
    eprintln!("Filters:");
    eprintln!("  --set <id> (repeatable), --all-sets, --type <multiple_choice|short_answer|essay|any>");
    eprintln!("  --bookmarked, --wrong, --no-shuffle, --keep-choice-order");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_TIMEOUT_SECS, QUIZ_COUNT_TICK_MS, QUIZ_HYDRATE_BOOKMARKS");
    eprintln!("  QUIZ_LOG, QUIZ_LOG_FORMAT=json");
}

#[derive(Debug, Clone, Default)]
struct Filters {
    sets: Vec<QuestionSetId>,
    all_sets: bool,
    type_filter: TypeFilter,
    bookmarked_only: bool,
    frequently_wrong_only: bool,
    shuffle_questions: bool,
    shuffle_choices: bool,
    limit: Option<u32>,
}

impl Filters {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut filters = Self {
            shuffle_questions: true,
            shuffle_choices: true,
            ..Self::default()
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--set" => {
                    let raw = require_value(args, "--set")?;
                    let id = raw
                        .parse::<QuestionSetId>()
                        .map_err(|_| ArgsError::InvalidValue { flag: "--set", raw })?;
                    filters.sets.push(id);
                }
                "--all-sets" => filters.all_sets = true,
                "--type" => {
                    let raw = require_value(args, "--type")?;
                    filters.type_filter = if raw == "any" {
                        TypeFilter::Any
                    } else {
                        let kind = raw
                            .parse::<QuestionType>()
                            .map_err(|_| ArgsError::InvalidValue { flag: "--type", raw })?;
                        TypeFilter::Only(kind)
                    };
                }
                "--limit" => {
                    let raw = require_value(args, "--limit")?;
                    filters.limit = Some(parse_number("--limit", raw)?);
                }
                "--bookmarked" => filters.bookmarked_only = true,
                "--wrong" => filters.frequently_wrong_only = true,
                "--no-shuffle" => filters.shuffle_questions = false,
                "--keep-choice-order" => filters.shuffle_choices = false,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(filters)
    }

    /// Build the criteria from the parsed flags. No `--set` means an empty pool.
    fn to_criteria(&self) -> Result<SelectionCriteria, Box<dyn std::error::Error>> {
        let mut criteria = SelectionCriteria::new()
            .with_sets(self.sets.iter().copied())
            .with_type_filter(self.type_filter)
            .with_bookmarked_only(self.bookmarked_only)
            .with_frequently_wrong_only(self.frequently_wrong_only)
            .with_shuffle_questions(self.shuffle_questions)
            .with_shuffle_choices(self.shuffle_choices);
        if let Some(limit) = self.limit {
            criteria = criteria.with_limit(limit)?;
        }
        Ok(criteria)
    }
}

#[derive(Debug)]
enum Command {
    Sets,
    Count(Filters),
    Quiz(Filters),
    Upload(PathBuf),
    Generate {
        file: PathBuf,
        questions: Option<u32>,
        kind: Option<QuestionType>,
        name: Option<String>,
    },
}

impl Command {
    fn parse(name: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        match name {
            "sets" => match args.next() {
                None => Ok(Self::Sets),
                Some(extra) => Err(ArgsError::UnknownArg(extra)),
            },
            "count" => Ok(Self::Count(Filters::parse(args)?)),
            "quiz" => Ok(Self::Quiz(Filters::parse(args)?)),
            "upload" => {
                let path = args
                    .next()
                    .ok_or(ArgsError::MissingPath { command: "upload" })?;
                match args.next() {
                    None => Ok(Self::Upload(PathBuf::from(path))),
                    Some(extra) => Err(ArgsError::UnknownArg(extra)),
                }
            }
            "generate" => Self::parse_generate(args),
            other => Err(ArgsError::UnknownCommand(other.to_string())),
        }
    }

    fn parse_generate(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut file = None;
        let mut questions = None;
        let mut kind = None;
        let mut name = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => file = Some(PathBuf::from(require_value(args, "--file")?)),
                "--questions" => {
                    let raw = require_value(args, "--questions")?;
                    questions = Some(parse_number("--questions", raw)?);
                }
                "--type" => {
                    let raw = require_value(args, "--type")?;
                    kind = Some(
                        raw.parse::<QuestionType>()
                            .map_err(|_| ArgsError::InvalidValue { flag: "--type", raw })?,
                    );
                }
                "--name" => name = Some(require_value(args, "--name")?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        let file = file.ok_or(ArgsError::MissingPath {
            command: "generate",
        })?;
        Ok(Self::Generate {
            file,
            questions,
            kind,
            name,
        })
    }
}

struct Args {
    api: Option<String>,
    demo: bool,
    command: Command,
}

impl Args {
    fn parse(argv: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = argv.into_iter();
        let mut api = None;
        let mut demo = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api = Some(require_value(&mut args, "--api")?),
                "--demo" => demo = true,
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                command => {
                    let command = Command::parse(command, &mut args)?;
                    return Ok(Some(Self { api, demo, command }));
                }
            }
        }
        Ok(None)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Some(args) = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    let mut config = AppConfig::from_env()?;
    if let Some(api) = args.api {
        config = config.with_base_url(api);
    }

    let clock = Clock::system();
    let services = if args.demo {
        tracing::info!("using in-memory demo backend");
        AppServices::in_memory(demo::seeded_backend()?, config, clock)
    } else {
        AppServices::http(config, clock)?
    };

    match args.command {
        Command::Sets => {
            let sets = services.catalog().list_sets().await?;
            if sets.is_empty() {
                println!("No question sets yet. Upload a document or generate questions first.");
            }
            for set in sets {
                let questions = services.catalog().count_questions(set.id).await?;
                println!(
                    "{:>4}  {:<32} {:>3} questions  {}",
                    set.id,
                    set.name,
                    questions,
                    set.created_at.format("%Y-%m-%d")
                );
            }
        }
        Command::Count(filters) => {
            let criteria = resolve_sets(&services, filters).await?.to_criteria()?;
            terminal::show_count(&services.count_estimator(), &criteria).await?;
        }
        Command::Quiz(filters) => {
            let criteria = resolve_sets(&services, filters).await?.to_criteria()?;
            terminal::run_quiz(&services, &criteria).await?;
        }
        Command::Upload(path) => match services.uploads().upload_file(&path).await {
            Ok(outcome) => println!(
                "Extracted {} questions into set {}.",
                outcome.questions_extracted, outcome.question_set_id
            ),
            Err(err) => {
                println!("{}", err.user_message());
                return Err(err.into());
            }
        },
        Command::Generate {
            file,
            questions,
            kind,
            name,
        } => {
            let content = tokio::fs::read_to_string(&file).await?;
            let mut request = GenerationRequest::new(content);
            if let Some(questions) = questions {
                request.num_questions = questions;
            }
            if let Some(kind) = kind {
                request.question_type = kind;
            }
            if let Some(name) = name {
                request.set_name = name;
            }
            match services.uploads().generate(&request).await {
                Ok(outcome) => println!(
                    "Generated {} questions into set {}.",
                    outcome.questions_generated, outcome.question_set_id
                ),
                Err(err) => {
                    println!("{}", err.user_message());
                    return Err(err.into());
                }
            }
        }
    }
    Ok(())
}

/// Expand `--all-sets` into the catalog's current set ids.
async fn resolve_sets(
    services: &AppServices,
    mut filters: Filters,
) -> Result<Filters, Box<dyn std::error::Error>> {
    if filters.all_sets {
        let sets = services.catalog().list_sets().await?;
        filters.sets.extend(sets.into_iter().map(|set| set.id));
    }
    Ok(filters)
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(args.iter().map(|a| (*a).to_string()))
    }

    #[test]
    fn parses_quiz_filters() {
        let args = parse(&[
            "--demo", "quiz", "--set", "7", "--type", "multiple_choice", "--wrong", "--limit", "5",
        ])
        .unwrap()
        .unwrap();
        assert!(args.demo);
        let Command::Quiz(filters) = args.command else {
            panic!("expected quiz command");
        };
        let criteria = filters.to_criteria().unwrap();
        assert_eq!(
            criteria.set_ids().iter().copied().collect::<Vec<_>>(),
            vec![QuestionSetId::new(7)]
        );
        assert_eq!(
            criteria.type_filter(),
            TypeFilter::Only(QuestionType::MultipleChoice)
        );
        assert!(criteria.frequently_wrong_only());
        assert!(criteria.shuffle_questions());
        assert_eq!(criteria.limit(), 5);
    }

    #[test]
    fn no_set_flag_selects_an_empty_pool() {
        let args = parse(&["count"]).unwrap().unwrap();
        let Command::Count(filters) = args.command else {
            panic!("expected count command");
        };
        assert!(!filters.all_sets);
        let criteria = filters.to_criteria().unwrap();
        assert!(criteria.set_ids().is_empty());
        assert!(!criteria.has_pool());
    }

    #[test]
    fn all_sets_must_be_requested_explicitly() {
        let args = parse(&["quiz", "--all-sets"]).unwrap().unwrap();
        let Command::Quiz(filters) = args.command else {
            panic!("expected quiz command");
        };
        assert!(filters.all_sets);
    }

    #[tokio::test]
    async fn all_sets_flag_expands_to_the_catalog() {
        let services = AppServices::in_memory(
            demo::seeded_backend().unwrap(),
            AppConfig::default(),
            Clock::fixed(quiz_core::time::fixed_now()),
        );
        let filters = Filters {
            all_sets: true,
            ..Filters::default()
        };
        let criteria = resolve_sets(&services, filters)
            .await
            .unwrap()
            .to_criteria()
            .unwrap();
        assert_eq!(criteria.set_ids().len(), 2);

        let plain = resolve_sets(&services, Filters::default())
            .await
            .unwrap()
            .to_criteria()
            .unwrap();
        assert!(!plain.has_pool());
    }

    #[test]
    fn out_of_range_limit_is_rejected() {
        let filters = Filters {
            limit: Some(0),
            ..Filters::default()
        };
        assert!(filters.to_criteria().is_err());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            parse(&["quiz", "--set"]),
            Err(ArgsError::MissingValue { flag: "--set" })
        ));
        assert!(matches!(
            parse(&["quiz", "--type", "poem"]),
            Err(ArgsError::InvalidValue { flag: "--type", .. })
        ));
        assert!(matches!(
            parse(&["explode"]),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse(&["generate"]),
            Err(ArgsError::MissingPath { .. })
        ));
        assert!(parse(&[]).unwrap().is_none());
    }

    #[test]
    fn parses_generate_options() {
        let args = parse(&[
            "--api", "http://quiz.test", "generate", "--file", "notes.txt", "--questions", "3",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(args.api.as_deref(), Some("http://quiz.test"));
        let Command::Generate { file, questions, .. } = args.command else {
            panic!("expected generate command");
        };
        assert_eq!(file, PathBuf::from("notes.txt"));
        assert_eq!(questions, Some(3));
    }
}
