use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Text};
use std::{path::PathBuf, sync::Arc};
use tracing::info;
use weatherbot_core::{
    MemoryPreferenceStore, PreferenceStore, ServerConfig, TomlPreferenceStore, WeatherBot,
};

use crate::chat;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Weather chat bot")]
pub struct Cli {
    /// Server config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Chat user the messages are sent as.
    #[arg(long, global = true, default_value = "@local")]
    pub user: String,

    /// Directory to save weather images into.
    #[arg(long, global = true)]
    pub image_dir: Option<PathBuf>,

    /// Keep preferences in memory only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the server defaults.
    Configure,

    /// Run one `weather` command, e.g. `weather Chicago u:m` or `weather pref`.
    Weather {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show the current moon phase.
    Moon,

    /// Read chat messages from the terminal until interrupted.
    Chat,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match &self.command {
            Command::Configure => {
                let path = match &self.config {
                    Some(path) => path.clone(),
                    None => ServerConfig::config_file_path()?,
                };
                crate::configure::configure(&path)
            }
            Command::Weather { args } => {
                let bot = self.load_bot()?;
                let prefix = &bot.config().command_prefix;
                let text = format!("{prefix}weather {}", args.join(" "));
                self.handle(&bot, prefix, &text).await
            }
            Command::Moon => {
                let bot = self.load_bot()?;
                let prefix = &bot.config().command_prefix;
                self.handle(&bot, prefix, &format!("{prefix}moon")).await
            }
            Command::Chat => {
                let bot = self.load_bot()?;
                self.chat_loop(&bot, &bot.config().command_prefix).await
            }
        }
    }

    /// `--config` must exist when given; otherwise the platform config is
    /// optional.
    fn load_bot(&self) -> Result<WeatherBot> {
        let config = match &self.config {
            Some(path) => ServerConfig::load_from(path)?,
            None => ServerConfig::load()?,
        };
        self.build_bot(config)
    }

    fn build_bot(&self, config: ServerConfig) -> Result<WeatherBot> {
        let store: Arc<dyn PreferenceStore> = if self.ephemeral {
            Arc::new(MemoryPreferenceStore::new())
        } else {
            let path = config.preferences_file_path()?;
            info!(path = %path.display(), "using preferences file");
            Arc::new(TomlPreferenceStore::new(path))
        };

        WeatherBot::from_config(config, store).context("Failed to set up weather providers")
    }

    async fn handle(&self, bot: &WeatherBot, prefix: &str, text: &str) -> Result<()> {
        match chat::route(prefix, text) {
            Some(invocation) => {
                let replies = chat::dispatch(bot, &self.user, invocation).await;
                chat::deliver(&replies, self.image_dir.as_deref())
            }
            None => {
                println!("Commands: {prefix}weather [...], {prefix}weather help, {prefix}moon");
                Ok(())
            }
        }
    }

    async fn chat_loop(&self, bot: &WeatherBot, prefix: &str) -> Result<()> {
        println!("Chatting as {}. Try `{prefix}weather help`; Ctrl-C to quit.", self.user);
        loop {
            let line = match Text::new(">").prompt() {
                Ok(line) => line,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(e).context("Failed to read chat message"),
            };
            if line.trim().is_empty() {
                continue;
            }
            self.handle(bot, prefix, &line).await?;
        }
    }
}
