use anyhow::{bail, Context, Result};
use queryvault::config::{self, AppSettings};
use queryvault::render::render_page;
use queryvault::studio::NoticeLevel;
use queryvault::{analyze_schema, logging, AppState, ConnectionForm, PageKind, StudioPage};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const MASTER_PASS_ENV: &str = "QUERYVAULT_MASTER_PASS";

const USAGE: &str = "usage:
  queryvault analyze <form.toml>
  queryvault schema <form.toml>
  queryvault vault save <form.toml>
  queryvault vault load [--list] [<form.toml>]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Analyze(PathBuf),
    Schema(PathBuf),
    VaultSave(PathBuf),
    VaultLoad { list: bool, form: Option<PathBuf> },
}

fn parse_args(args: &[String]) -> Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let command = match args.as_slice() {
        ["analyze", form] => Command::Analyze(PathBuf::from(form)),
        ["schema", form] => Command::Schema(PathBuf::from(form)),
        ["vault", "save", form] => Command::VaultSave(PathBuf::from(form)),
        ["vault", "load", rest @ ..] => {
            let list = rest.contains(&"--list");
            let forms: Vec<&&str> = rest.iter().filter(|a| **a != "--list").collect();
            if forms.len() > 1 {
                bail!("{}", USAGE);
            }
            Command::VaultLoad {
                list,
                form: forms.first().map(|f| PathBuf::from(**f)),
            }
        }
        _ => bail!("{}", USAGE),
    };
    Ok(command)
}

/// Form fields plus the page inputs that are not part of the connection
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FormInput {
    sql: String,
    sandbox: bool,
    master_pass: String,
    #[serde(flatten)]
    form: ConnectionForm,
}

fn read_form(path: &Path) -> Result<FormInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid form file {}", path.display()))
}

fn build_page(kind: PageKind, input: FormInput, settings: &AppSettings) -> StudioPage {
    let mut page = StudioPage::new(kind, &settings.server);
    page.form = input.form;
    page.form.refresh_visibility();
    page.sql = input.sql;
    page.sandbox = input.sandbox;
    page.master_pass = if input.master_pass.is_empty() {
        std::env::var(MASTER_PASS_ENV).unwrap_or_default()
    } else {
        input.master_pass
    };
    page
}

async fn run(command: Command, state: &AppState) -> Result<StudioPage> {
    let page = match command {
        Command::Analyze(path) => {
            let mut page = build_page(PageKind::Studio, read_form(&path)?, &state.settings);
            page.run_analysis(&state.client).await;
            page
        }
        Command::Schema(path) => {
            let mut page = build_page(PageKind::Studio, read_form(&path)?, &state.settings);
            analyze_schema(&mut page, &state.client).await;
            page
        }
        Command::VaultSave(path) => {
            let mut page = build_page(PageKind::Studio, read_form(&path)?, &state.settings);
            page.save_vault(&state.vault);
            page
        }
        Command::VaultLoad { list, form } => {
            let input = match form {
                Some(path) => read_form(&path)?,
                None => FormInput::default(),
            };
            let kind = if list { PageKind::Vault } else { PageKind::Studio };
            let mut page = build_page(kind, input, &state.settings);
            page.load_vault(&state.vault);
            page
        }
    };
    Ok(page)
}

fn failed(page: &StudioPage) -> bool {
    [&page.message, &page.alert]
        .into_iter()
        .flatten()
        .any(|notice| notice.level == NoticeLevel::Error)
}

fn main() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let log_filter = logging::init_tracing(logging::DEFAULT_FILTER);

    let config_dir = config::get_config_dir()?;
    tracing::debug!("Config dir: {:?}", config_dir);
    let settings = AppSettings::load(&config_dir)?;
    if let Some(handle) = &log_filter {
        handle.apply(&settings.logging.filter);
    }
    let state = AppState::from_settings(settings, &config_dir)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let page = runtime.block_on(run(command, &state))?;

    if let Some(location) = &page.redirect {
        println!("Location: {}", location);
        return Ok(ExitCode::FAILURE);
    }

    print!("{}", render_page(&page));
    Ok(if failed(&page) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
