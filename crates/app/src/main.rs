mod demo;

use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppServices, Clock};
use storage::{HttpConfig, repository::Storage};
use testcraft_core::model::TestId;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

const DEFAULT_FILTER: &str = "testcraft=info,services=info,storage=info";

#[derive(Debug, Error, PartialEq, Eq)]
enum ArgsError {
    #[error("{flag} requires a value")]
    MissingValue { flag: &'static str },

    #[error("unknown argument: {0}")]
    UnknownArg(String),

    #[error("unknown subcommand: {0}")]
    UnknownCommand(String),

    #[error("invalid --test-id value: {raw}")]
    InvalidTestId { raw: String },

    #[error("invalid --api value: {raw}")]
    InvalidApiUrl { raw: String },
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  testcraft [ui] [--api <url>] [--test-id <id>] [--preview]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  no --api: offline demo data (access code {})", demo::DEMO_ACCESS_CODE);
    eprintln!("  --test-id 1");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TESTCRAFT_API_URL, TESTCRAFT_TEST_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    api_url: Option<String>,
    test_id: TestId,
    preview: bool,
}

impl Args {
    /// Flags win over environment values; `env` is injected so parsing stays testable.
    fn parse_ui(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut api_url = env("TESTCRAFT_API_URL").filter(|v| !v.trim().is_empty());
        let mut test_id = match env("TESTCRAFT_TEST_ID") {
            Some(raw) => parse_test_id(raw)?,
            None => TestId::new(1),
        };
        let mut preview = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    api_url = Some(value);
                }
                "--test-id" => test_id = parse_test_id(require_value(args, "--test-id")?)?,
                "--preview" => preview = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            api_url,
            test_id,
            preview,
        })
    }
}

fn parse_test_id(raw: String) -> Result<TestId, ArgsError> {
    raw.trim()
        .parse::<u64>()
        .map(TestId::new)
        .map_err(|_| ArgsError::InvalidTestId { raw })
}

/// Splits off the optional subcommand; anything starting with `--` means `ui`.
fn parse_command(argv: &mut Vec<String>) -> Result<Command, ArgsError> {
    if argv.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Command::Help);
    }
    match argv.first().map(String::as_str) {
        None => Ok(Command::Ui),
        Some(first) if first.starts_with("--") => Ok(Command::Ui),
        Some("ui") => {
            argv.remove(0);
            Ok(Command::Ui)
        }
        Some(other) => Err(ArgsError::UnknownCommand(other.to_string())),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_services(args: &Args) -> Result<AppServices, Box<dyn std::error::Error>> {
    let clock = Clock::system();
    let app = match args.api_url.as_deref() {
        Some(url) => {
            let config = HttpConfig::new(url).map_err(|_| ArgsError::InvalidApiUrl {
                raw: url.to_string(),
            })?;
            info!(base_url = %config.base_url, test_id = %args.test_id, "using HTTP backend");
            AppServices::new_http(config, clock, args.test_id)?
        }
        None => {
            let repo = demo::demo_repository(args.test_id, &clock)?;
            info!(
                test_id = %args.test_id,
                access_code = demo::DEMO_ACCESS_CODE,
                "using offline demo data"
            );
            AppServices::new(&Storage::from_in_memory(&repo), clock, args.test_id)
        }
    };
    Ok(app.with_preview(args.preview))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = parse_command(&mut argv).and_then(|cmd| match cmd {
        Command::Help => Ok(None),
        Command::Ui => Args::parse_ui(&mut argv.into_iter(), |key| std::env::var(key).ok()).map(Some),
    });
    let args = match parsed {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    init_tracing();
    let app: Arc<dyn UiApp> = Arc::new(build_services(&args)?);
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Testcraft")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
