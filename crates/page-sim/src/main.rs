//! Headless page host for the Account Planner page agent.
//!
//! Simulates one browser tab: the page starts at `--url`, the agent is
//! injected, and commands read from stdin drive navigation, messages and
//! unload.  Extension storage is persisted under `--state-dir`.
//!
//! Usage:
//!   ap-page-sim --url https://docs.google.com/spreadsheets/d/1A2B3C/edit <<EOF
//!   send {"action":"getCurrentSpreadsheetInfo"}
//!   navigate https://docs.google.com/spreadsheets/d/9Z8Y/edit
//!   sleep 1500
//!   get currentSpreadsheetId
//!   unload
//!   EOF
//!
//! Every command that produces a result prints one JSON line on stdout.
//! Logs go to stderr (`RUST_LOG`, default `info`).

mod script;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ap_domain::config::{Config, ConfigSeverity};
use ap_page_agent::{
    AgentHandle, ExtensionStorage, JsonFileStorage, Lifecycle, LocalMessageBus, PageSyncAgent,
    StaticPage,
};
use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::script::{parse_line, Command};

/// Drive a page sync agent from a line-oriented script on stdin.
#[derive(Debug, Parser)]
#[command(name = "ap-page-sim", version, about)]
struct Cli {
    /// TOML config overriding the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the persisted extension storage.
    #[arg(long, default_value = "./data/state")]
    state_dir: PathBuf,
    /// Initial page URL.
    #[arg(long, default_value = "about:blank")]
    url: String,
    /// Initial page title.
    #[arg(long, default_value = "")]
    title: String,
    /// How long `send` waits for a reply.
    #[arg(long, default_value_t = 1_000)]
    response_timeout_ms: u64,
    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

struct Tab {
    page: Arc<StaticPage>,
    storage: Arc<JsonFileStorage>,
    bus: Arc<LocalMessageBus>,
    lifecycle: Lifecycle,
    handle: Option<AgentHandle>,
}

impl Tab {
    fn agent(&self, config: &Config) -> anyhow::Result<PageSyncAgent> {
        Ok(PageSyncAgent::builder()
            .config(config)
            .host(self.page.clone())
            .navigation(self.page.clone())
            .storage(self.storage.clone())
            .bus(self.bus.clone())
            .build()?)
    }

    async fn unload(&mut self) {
        self.lifecycle.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.join().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    check_config(&config)?;
    if ap_domain::config::install(config.clone()).is_err() {
        tracing::warn!("config registry already initialized");
    }

    let storage = JsonFileStorage::open(&cli.state_dir)
        .with_context(|| format!("failed to open storage in {}", cli.state_dir.display()))?;

    let storage = Arc::new(storage);

    let mut tab = Tab {
        page: Arc::new(StaticPage::new(cli.url.clone(), cli.title.clone())),
        storage: storage.clone(),
        bus: Arc::new(LocalMessageBus::new()),
        lifecycle: Lifecycle::new(),
        handle: None,
    };

    tracing::info!(
        url = %cli.url,
        storage = %storage.path().display(),
        "page loaded, injecting agent"
    );
    tab.handle = tab.agent(&config)?.inject(&tab.lifecycle).await;

    let timeout = Duration::from_millis(cli.response_timeout_ms);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(line = %line, error = %e, "skipping command");
                continue;
            }
        };

        match command {
            Command::Navigate(url) => tab.page.navigate(url),
            Command::Title(title) => tab.page.set_title(title),
            Command::Mutate => tab.page.mutate(),
            Command::Send(message) => {
                let reply = match tab.bus.request(message, timeout).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::info!(error = %e, "no reply");
                        serde_json::Value::Null
                    }
                };
                println!("{reply}");
            }
            Command::Get(key) => {
                let value = match tab.storage.get(&key).await {
                    Ok(value) => json!(value),
                    Err(e) => json!({ "error": e.to_string() }),
                };
                println!("{}", json!({ "key": key, "value": value }));
            }
            Command::Sleep(d) => tokio::time::sleep(d).await,
            Command::Inject => {
                let handle = tab.agent(&config)?.inject(&tab.lifecycle).await;
                let injected = handle.is_some();
                if let Some(handle) = handle {
                    tab.handle = Some(handle);
                }
                println!("{}", json!({ "injected": injected }));
            }
            Command::Unload => {
                tab.unload().await;
                println!("{}", json!({ "unloaded": true }));
            }
        }
    }

    tab.unload().await;
    Ok(())
}

/// Print validation issues; refuse to start on errors.
fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        tracing::warn!("{issue}");
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config has {errors} error(s)");
    }
    Ok(())
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
