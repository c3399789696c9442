mod app;
mod clipboard;
mod handler;
mod markdown;
mod tui;
mod ui;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use agentchat_core::config::BASE_URL_ENV;
use agentchat_core::{Agent, ChatApiClient, Config, Overrides};
use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::clipboard::SystemClipboard;
use crate::tui::{EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "agentchat", version)]
#[command(about = "Chat with AgentFramework agents from the terminal")]
struct Cli {
    /// Backend base URL (overrides AGENTCHAT_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,
    /// Agent for new chats, e.g. CodingWizard
    #[arg(short, long)]
    agent: Option<String>,
    /// Seconds to wait for an agent reply
    #[arg(long)]
    timeout: Option<u64>,
    /// Where to write logs
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            agent: self.agent.clone(),
            timeout_secs: self.timeout,
        }
    }
}

fn default_log_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_local_dir().ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("agentchat").join("agentchat.log"))
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => default_log_path()?,
    };
    init_logging(&log_path)?;

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("could not load config, using defaults: {:#}", e);
        Config::default()
    });
    let settings = config.resolve(&cli.overrides(), std::env::var(BASE_URL_ENV).ok());
    tracing::info!(
        base_url = %settings.base_url,
        agent = settings.default_agent.as_str(),
        timeout_secs = settings.request_timeout.as_secs(),
        "starting agentchat"
    );

    let client = ChatApiClient::new(&settings.base_url).with_send_timeout(settings.request_timeout);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, client, settings.default_agent).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!("exiting with error: {:#}", e);
    }
    result
}

async fn run(terminal: &mut Tui, client: ChatApiClient, agent: Agent) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(client, agent, events.sender(), Box::new(SystemClipboard::new()));
    app.mount();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event)?,
            None => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "agentchat",
            "--base-url",
            "http://agents:9000",
            "-a",
            "CodingWizard",
            "--timeout",
            "60",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.base_url.as_deref(), Some("http://agents:9000"));
        assert_eq!(overrides.agent.as_deref(), Some("CodingWizard"));
        assert_eq!(overrides.timeout_secs, Some(60));
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn test_cli_defaults_to_no_overrides() {
        let cli = Cli::try_parse_from(["agentchat"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.base_url.is_none());
        assert!(overrides.agent.is_none());
        assert!(overrides.timeout_secs.is_none());
    }
}
