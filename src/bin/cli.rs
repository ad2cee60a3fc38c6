//! Binary entry point for the estante dashboard CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use estante::{
    dashboard::{self, DashboardOptions},
    query::{Extremes, QueryEngine, QueryError},
    store::{Store, StoreOptions, Summary, TableStatus, UserId},
};
use serde::Serialize;

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use config::CliConfig;
use ui::{Theme, Ui};

const DEFAULT_BOOKS_PATH: &str = "data/books.csv";
const DEFAULT_RATINGS_PATH: &str = "data/recommendations.csv";
const DEFAULT_TOP_N: usize = 5;
const MAX_TOP_N: usize = 10;

#[derive(Parser, Debug)]
#[command(
    name = "cli",
    version,
    about = "Book recommendation dashboard over precomputed rating tables",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[arg(long, global = true, value_name = "FILE", help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = ThemeArg::Auto,
        help = "Terminal color theme"
    )]
    theme: ThemeArg,

    #[arg(long, global = true, help = "Suppress decorations and progress output")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct DataArgs {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "ESTANTE_BOOKS",
        help = "Catalog CSV file"
    )]
    books: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "ESTANTE_RATINGS",
        help = "Predicted-ratings CSV file"
    )]
    ratings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Print table counters and load status")]
    Summary,

    #[command(about = "List distinct user ids present in the ratings table")]
    Users {
        #[arg(long, value_name = "K", help = "Show at most K user ids")]
        limit: Option<usize>,
    },

    #[command(about = "Show the top-rated recommendations for one user")]
    Top {
        #[arg(long, value_name = "ID")]
        user: u32,

        #[arg(
            short,
            long,
            value_name = "N",
            default_value_t = DEFAULT_TOP_N,
            help = "Number of recommendations (clamped to 1-10)"
        )]
        n: usize,
    },

    #[command(about = "Show the best and worst rated rows, globally or for one user")]
    Extremes {
        #[arg(long, value_name = "ID", help = "Restrict to this user's Top-N subset")]
        user: Option<u32>,

        #[arg(
            short,
            long,
            value_name = "N",
            default_value_t = DEFAULT_TOP_N,
            help = "Subset size when --user is given (clamped to 1-10)"
        )]
        n: usize,
    },

    #[command(about = "Serve the web dashboard")]
    Serve {
        #[arg(long, value_name = "HOST", help = "Bind address host")]
        host: Option<IpAddr>,

        #[arg(long, value_name = "PORT", help = "Bind port")]
        port: Option<u16>,

        #[arg(long, value_name = "DIR", help = "Directory of dashboard assets overriding the bundled UI")]
        assets: Option<PathBuf>,

        #[arg(
            long = "allow-origin",
            value_name = "ORIGIN",
            action = ArgAction::Append,
            help = "Additional CORS origin to allow (repeatable)"
        )]
        allow_origins: Vec<String>,
    },

    #[command(about = "Generate a shell completion script")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ThemeArg {
    Auto,
    Light,
    Dark,
    Plain,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Plain => Theme::Plain,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    if let Command::Completions { shell } = cli.command {
        let mut command = Cli::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let config = CliConfig::load(cli.config.clone())?;
    let ui = Ui::new(cli.theme.into(), cli.quiet);
    let store = load_store(&cli, &config, &ui)?;

    match cli.command {
        Command::Completions { .. } => unreachable!("handled before store load"),
        Command::Summary => {
            let report = SummaryReport {
                summary: store.summary(),
                degraded: store.is_degraded(),
                books: store.report().books.clone(),
                ratings: store.report().ratings.clone(),
                invalid_ratings: store.report().invalid_ratings,
            };
            emit(cli.format, &report, || print_summary_text(&ui, &report))?;
        }
        Command::Users { limit } => {
            let users: Vec<UserId> = match limit {
                Some(limit) => store.user_ids().take(limit).collect(),
                None => store.user_ids().collect(),
            };
            let report = UserListReport {
                total: store.summary().total_users,
                users,
            };
            emit(cli.format, &report, || {
                ui.list(
                    &format!("Users ({} total)", report.total),
                    report.users.iter().map(|user| user.to_string()),
                );
            })?;
        }
        Command::Top { user, n } => {
            let user = UserId(user);
            let rows = QueryEngine::new(&store).top_n(user, clamp_n(n));
            let report = TopReport {
                user_id: user,
                count: rows.len(),
                cards: rows.iter().map(|row| row.to_card()).collect(),
            };
            emit(cli.format, &report, || {
                if report.cards.is_empty() {
                    ui.warn(&format!("no recommendations for user {user}"));
                } else {
                    ui.cards(&format!("Top {} for user {user}", report.count), &report.cards);
                }
            })?;
        }
        Command::Extremes { user, n } => {
            let engine = QueryEngine::new(&store);
            let extremes = match user {
                Some(id) => {
                    let rows = engine.top_n(UserId(id), clamp_n(n));
                    Extremes::of(&rows)
                }
                None => engine.extremes_global(),
            };
            let extremes = match extremes {
                Ok(extremes) => extremes,
                Err(QueryError::EmptyDataset) => {
                    ui.warn("no recommendation rows to rank");
                    return Ok(ExitCode::FAILURE);
                }
            };
            let report = ExtremesReport {
                user_id: user.map(UserId),
                best: extremes.best.to_card(),
                worst: extremes.worst.to_card(),
            };
            emit(cli.format, &report, || {
                let title = match report.user_id {
                    Some(user) => format!("Extremes for user {user}"),
                    None => "Global extremes".to_string(),
                };
                ui.heading(&title);
                ui.extreme("best ", &report.best);
                ui.extreme("worst", &report.worst);
            })?;
        }
        Command::Serve {
            host,
            port,
            assets,
            allow_origins,
        } => {
            let options = DashboardOptions {
                host: host
                    .or_else(|| config.server_host())
                    .unwrap_or_else(|| IpAddr::from([127, 0, 0, 1])),
                port: port.or_else(|| config.server_port()).unwrap_or(7654),
                assets_dir: assets,
                allow_origins,
            };
            if store.is_degraded() {
                ui.warn("serving with one or more source tables missing");
            }
            dashboard::serve(Arc::new(store), options).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_store(cli: &Cli, config: &CliConfig, ui: &Ui) -> Result<Store, Box<dyn Error>> {
    let options = StoreOptions::new(
        cli.data
            .books
            .clone()
            .or_else(|| config.books_path().cloned())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOOKS_PATH)),
        cli.data
            .ratings
            .clone()
            .or_else(|| config.ratings_path().cloned())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RATINGS_PATH)),
    );
    let task = ui.task("loading tables");
    let store = Store::open(&options)?;
    task.finish();
    Ok(store)
}

fn clamp_n(n: usize) -> usize {
    n.clamp(1, MAX_TOP_N)
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_summary_text(ui: &Ui, report: &SummaryReport) {
    ui.section(
        "Summary",
        [
            ("books", report.summary.total_books.to_string()),
            ("users", report.summary.total_users.to_string()),
            (
                "recommendations",
                report.summary.total_recommendations.to_string(),
            ),
        ],
    );
    ui.spacer();
    ui.section(
        "Tables",
        [
            ("catalog", table_status_line(&report.books)),
            ("ratings", table_status_line(&report.ratings)),
            ("invalid ratings", report.invalid_ratings.to_string()),
        ],
    );
    if report.degraded {
        ui.spacer();
        ui.warn("one or more source tables are missing; counters reflect empty tables");
    }
}

fn table_status_line(status: &TableStatus) -> String {
    match status {
        TableStatus::Loaded { rows } => format!("loaded ({rows} rows)"),
        TableStatus::Missing { path } => format!("missing ({})", path.display()),
    }
}

#[derive(Debug, Serialize)]
struct SummaryReport {
    #[serde(flatten)]
    summary: Summary,
    degraded: bool,
    books: TableStatus,
    ratings: TableStatus,
    invalid_ratings: u64,
}

#[derive(Debug, Serialize)]
struct UserListReport {
    total: usize,
    users: Vec<UserId>,
}

#[derive(Debug, Serialize)]
struct TopReport {
    user_id: UserId,
    count: usize,
    cards: Vec<estante::query::BookCard>,
}

#[derive(Debug, Serialize)]
struct ExtremesReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    best: estante::query::BookCard,
    worst: estante::query::BookCard,
}
