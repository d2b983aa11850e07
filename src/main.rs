mod backend;
mod config;
mod models;
mod services;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use backend::{HttpBackend, LabBackend};
use config::{AppConfig, DEFAULT_BASE_URL};
use services::{
    answer, ChatError, ChatSession, Database, ImageStore, SettingsService, SlideViewer, Theme,
    TranscriptView,
};
use ui::{console, input, Palette, TerminalTranscript};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the lab server
    #[arg(long, env = "LISA_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Directory for settings and saved images
    #[arg(long, env = "LISA_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Timeout in seconds for non-streaming requests
    #[arg(long, default_value = "30", global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with the assistant (default)
    Chat,
    /// Ask the retrieval backend a single question
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Page through the narrated slide deck
    Slides,
    /// Show or change the display theme
    Theme {
        #[arg(value_enum, default_value = "toggle")]
        mode: ThemeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lisa=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::new(args.base_url, args.data_dir, args.timeout_secs)?;
    let db = Database::open(&config.database_path())?;
    let theme = SettingsService::load_theme(&db).await;

    let backend: Arc<dyn LabBackend> =
        Arc::new(HttpBackend::new(&config.base_url, config.request_timeout)?);
    tracing::debug!("Using lab server at {}", config.base_url);

    match args.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(backend, &db, &config, theme).await,
        Command::Ask { query } => run_ask(backend, &query.join(" "), theme).await,
        Command::Slides => run_slides(backend, &config, theme).await,
        Command::Theme { mode } => run_theme(&db, mode).await,
    }
}

/// Cancels `token` on Ctrl+C until the returned handle is aborted.
fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

/// Next input line, or `None` on end of input or Ctrl+C.
async fn next_line(lines: &mut mpsc::Receiver<String>) -> Option<String> {
    tokio::select! {
        line = lines.recv() => line,
        _ = tokio::signal::ctrl_c() => None,
    }
}

async fn run_chat(
    backend: Arc<dyn LabBackend>,
    db: &Database,
    config: &AppConfig,
    mut theme: Theme,
) -> Result<()> {
    let mut palette = Palette::for_theme(theme);
    let mut view = TerminalTranscript::stdout(palette)
        .with_greeting()
        .with_image_store(ImageStore::new(config.image_dir()));
    let mut session = ChatSession::new(backend);
    let mut lines = input::spawn_line_reader();

    view.clear();
    console::print_notice(&palette, "Type /help for commands.");

    loop {
        console::print_prompt(&palette);
        let Some(line) = next_line(&mut lines).await else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/help" => console::print_chat_help(&palette),
            "/delete" => {
                console::print_notice(
                    &palette,
                    "Are you sure you want to delete the conversation? [y/N]",
                );
                console::print_prompt(&palette);
                let answer = next_line(&mut lines).await.unwrap_or_default();
                if matches!(answer.trim(), "y" | "Y" | "yes") {
                    session.delete_conversation(&mut view);
                }
            }
            "/theme" => {
                theme = match SettingsService::toggle_theme(db).await {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!("Failed to save theme: {:#}", e);
                        theme.toggled()
                    }
                };
                palette = Palette::for_theme(theme);
                view.set_palette(palette);
                console::print_notice(&palette, &format!("Theme: {}", theme.as_str()));
            }
            text => {
                let cancel = CancellationToken::new();
                let watcher = cancel_on_ctrl_c(cancel.clone());
                match session.submit(text, &mut view, cancel).await {
                    Ok(outcome) => tracing::debug!("Reply finished: {:?}", outcome),
                    Err(ChatError::EmptyInput) => {}
                }
                watcher.abort();
            }
        }
    }

    Ok(())
}

async fn run_ask(backend: Arc<dyn LabBackend>, query: &str, theme: Theme) -> Result<()> {
    let palette = Palette::for_theme(theme);
    let mut view = TerminalTranscript::stdout(palette);

    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());
    let outcome = answer::ask(backend.as_ref(), query, &mut view, &cancel).await;
    watcher.abort();

    match outcome {
        Some(outcome) => tracing::debug!("Answer finished: {:?}", outcome),
        None => console::print_notice(&palette, "Nothing to ask."),
    }
    Ok(())
}

async fn run_slides(backend: Arc<dyn LabBackend>, config: &AppConfig, theme: Theme) -> Result<()> {
    let palette = Palette::for_theme(theme);

    let mut viewer = match SlideViewer::open(backend).await {
        Ok(viewer) => viewer,
        Err(e) => {
            console::print_alert(&palette, &e.to_string());
            return Ok(());
        }
    };

    if viewer.is_empty() {
        console::print_notice(&palette, "No slides available.");
        return Ok(());
    }

    let mut lines = input::spawn_line_reader();
    show_slide(&viewer, config, &palette).await;

    loop {
        let mut keys = Vec::new();
        if viewer.can_prev() {
            keys.push("[p]rev");
        }
        if viewer.can_next() {
            keys.push("[n]ext");
        }
        keys.push("[q]uit");
        console::print_notice(&palette, &keys.join("  "));
        console::print_prompt(&palette);

        let Some(line) = next_line(&mut lines).await else {
            break;
        };

        let moved = match line.trim() {
            "n" | "next" => viewer.next(),
            "p" | "prev" => viewer.prev(),
            "q" | "quit" | "/exit" => break,
            _ => false,
        };

        if moved {
            show_slide(&viewer, config, &palette).await;
        }
    }

    Ok(())
}

async fn show_slide(viewer: &SlideViewer, config: &AppConfig, palette: &Palette) {
    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());
    let loaded = viewer
        .load(&cancel, |visible| console::print_overlay(palette, visible))
        .await;
    watcher.abort();

    match loaded {
        Ok(Some(slide)) => console::print_slide(palette, &config.base_url, &slide, viewer.count()),
        Ok(None) => console::print_notice(palette, "Slide loading stopped."),
        Err(e) => console::print_alert(palette, &e.to_string()),
    }
}

async fn run_theme(db: &Database, mode: ThemeArg) -> Result<()> {
    let theme = match mode {
        ThemeArg::Toggle => SettingsService::toggle_theme(db).await?,
        ThemeArg::Light | ThemeArg::Dark => {
            let theme = if matches!(mode, ThemeArg::Light) {
                Theme::Light
            } else {
                Theme::Dark
            };
            SettingsService::save_theme(db, theme).await?;
            theme
        }
    };
    console::print_notice(&Palette::for_theme(theme), &format!("Theme: {}", theme.as_str()));
    Ok(())
}
