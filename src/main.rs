#![forbid(unsafe_code)]

mod backend;
mod config;
mod constants;
mod editor;
mod gui;
mod page;
mod params;
mod scheduler;
mod types;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use backend::{CatalogService, HttpBackend, PersistenceService};
use config::EditorConfig;
use editor::{EditorSession, StartPage};
use page::PageModel;
use types::Side;

#[derive(Parser, Debug)]
#[command(name = "vs-offset-editor", version, about = "Per-character offset editor for VS thumbnails")]
struct Cli {
    /// Config file (default: <config dir>/vs-offset-editor/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Editor server base URL, overrides the config file
    #[arg(long, global = true)]
    server: Option<String>,

    /// Character shown on pages 0 and 1, overrides the config file
    #[arg(long, global = true)]
    anchor: Option<String>,

    /// trace | debug | info | warn | error (beats LOG_LEVEL and the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the editor window (default)
    Edit(EditArgs),
    /// Print every page with its character and side
    Pages,
    /// Flush staged edits on the server
    Save,
    /// Discard staged edits on the server
    Reset,
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
struct EditArgs {
    /// Page index to open (wraps)
    #[arg(long, allow_negative_numbers = true, conflicts_with = "character")]
    page: Option<i64>,

    /// Open the first page showing this character
    #[arg(long)]
    character: Option<String>,

    /// Side used with --character
    #[arg(long, value_enum, default_value_t = Side::Right)]
    side: Side,
}

impl EditArgs {
    fn start_page(self) -> StartPage {
        match (self.character, self.page) {
            (Some(character), _) => StartPage::Character {
                character,
                side: self.side,
            },
            (None, Some(index)) => StartPage::Index(index),
            (None, None) => StartPage::default(),
        }
    }
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

/// Flag beats LOG_LEVEL, which beats the config file
fn init_logging(flag: Option<&str>, config_level: &str) -> Result<()> {
    let level = match flag {
        Some(level) => level.to_string(),
        None => std::env::var("LOG_LEVEL").unwrap_or_else(|_| config_level.to_string()),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level))
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn build_backend(config: &EditorConfig) -> Result<Arc<HttpBackend>> {
    Ok(Arc::new(HttpBackend::new(&config.server_url, config.request_timeout())?))
}

fn run_editor(config: EditorConfig, args: EditArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let backend = build_backend(&config)?;
    let (session, handle) = runtime.block_on(EditorSession::start(
        backend,
        &config.anchor_character,
        config.timings(),
        args.start_page(),
    ))?;
    let session = runtime.spawn(session.run());

    gui::run_gui(&config, handle, session, runtime.handle().clone())
}

fn print_pages(config: &EditorConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let backend = build_backend(config)?;
    let catalog = runtime
        .block_on(backend.characters())
        .context("Failed to fetch character catalog")?;
    let pages = PageModel::new(config.anchor_character.as_str(), catalog);

    println!("{:>5}  {:<24}  side", "page", "character");
    for index in 0..pages.total_pages() {
        let page = pages.page(index);
        println!("{:>5}  {:<24}  {}", page.index, page.character, page.side);
    }
    Ok(())
}

fn flush_or_discard(config: &EditorConfig, save: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let backend = build_backend(config)?;

    if save {
        let outcome = runtime.block_on(backend.save())?;
        if !outcome.ok {
            return Err(anyhow!(
                "Server refused to save: {}",
                outcome.message.as_deref().unwrap_or("no reason given")
            ));
        }
        println!("{}", outcome.message.as_deref().unwrap_or("Saved"));
    } else {
        runtime.block_on(backend.reset())?;
        println!("Staged changes discarded");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(EditorConfig::default_path);

    if let Some(Command::InitConfig { force }) = cli.command {
        init_logging(cli.log_level.as_deref(), constants::config::DEFAULT_LOG_LEVEL)?;
        if config_path.exists() && !force {
            return Err(format!("{} already exists (use --force to overwrite)", config_path.display()).into());
        }
        EditorConfig::default().save_to(&config_path)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    let mut config = EditorConfig::load_from(&config_path)?;
    init_logging(cli.log_level.as_deref(), &config.log_level)?;
    config.apply_overrides(cli.server, cli.anchor);
    info!(path = %config_path.display(), server = %config.server_url, anchor = %config.anchor_character, "Configuration ready");

    match cli.command.unwrap_or(Command::Edit(EditArgs::default())) {
        Command::Edit(args) => run_editor(config, args)?,
        Command::Pages => print_pages(&config)?,
        Command::Save => flush_or_discard(&config, true)?,
        Command::Reset => flush_or_discard(&config, false)?,
        Command::InitConfig { .. } => {}
    }
    Ok(())
}
