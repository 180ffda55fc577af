use crate::app_config::AppConfig;
use crate::commands::common::Command;
use crate::core::error::EventResult;
use crate::core::event_system::EventSystem;
use crate::core::file_system::FileSystem;
use crate::lock::StateLock;
use crate::services::notifier::{spawn_notification_dispatcher, webhook_notifiers, Notifier, TelegramNotifier};
use crate::services::telegram::{spawn_command_executor, TelegramBot};
use dotenvy::dotenv;
use log::{info, warn};
use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub mod core;
pub mod services;
pub mod commands;
pub mod app_config;
pub mod lock;

const LOCK_POLL: Duration = Duration::from_secs(3);

pub fn initialize_environment() {
    if dotenv().is_err() {
        eprintln!("No .env file found; using the process environment");
    }
    pretty_env_logger::init();
}

/// Loads the saved event, or starts a fresh one when there is no state file.
pub fn open_event_system(config: AppConfig) -> EventResult<EventSystem> {
    let state = FileSystem::try_load_state(&config.state_file)?;
    Ok(EventSystem::new(config, state))
}

pub fn initialize_system() -> Result<(EventSystem, AppConfig), Box<dyn Error>> {
    let config = AppConfig::new()?;
    Ok((open_event_system(config.clone())?, config))
}

/// Runs one command while holding the state lock, then saves.
pub fn run_command_with_config<W: Write>(
    config: AppConfig,
    command: Command,
    output: &mut W,
) -> Result<(), Box<dyn Error>> {
    let _lock = StateLock::acquire(&config.lock_file)?;
    let mut event_system = open_event_system(config.clone())?;

    let result = commands::cli::execute_command(&mut event_system, command, &config, output);
    event_system.save_state()?;
    result
}

pub fn run_script_commands(command: Command) -> Result<(), Box<dyn Error>> {
    let config = AppConfig::new()?;
    let mut stdout = std::io::stdout();
    run_command_with_config(config, command, &mut stdout)
}

pub async fn run_telegram_bot() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::new()?;
    if config.telegram.token.trim().is_empty() {
        return Err("telegram.token is not set (HACKHUB_TELEGRAM__TOKEN)".into());
    }

    lock::wait_for_release(Path::new(&config.lock_file), LOCK_POLL).await;
    let event_system = open_event_system(config.clone())?;

    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    match TelegramNotifier::from_config(&config.telegram) {
        Some(notifier) => notifiers.push(Arc::new(notifier)),
        None => warn!("No Telegram chat configured; chat notifications disabled"),
    }
    notifiers.extend(webhook_notifiers(&event_system.active_webhooks()));
    spawn_notification_dispatcher(event_system.feed().stream(), notifiers);

    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(100);
    spawn_command_executor(event_system, command_receiver);

    info!("Starting Telegram bot for {}", config.state_file);
    let bot = teloxide::Bot::new(&config.telegram.token);
    TelegramBot::new(bot, command_sender).run().await;
    Ok(())
}

/// Escapes text for Telegram MarkdownV2.
pub fn escape_markdown(text: &str) -> String {
    const SPECIAL: [char; 18] = ['_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!'];
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::registration::sample_input;
    use crate::core::models::Track;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> AppConfig {
        AppConfig {
            state_file: temp_dir.path().join("state.json").to_str().unwrap().to_string(),
            lock_file: temp_dir.path().join("hackhub.lock").to_str().unwrap().to_string(),
            script_file: temp_dir.path().join("script.json").to_str().unwrap().to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_run_command_saves_and_releases_lock() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut output = Vec::new();
        run_command_with_config(config.clone(), Command::Register(sample_input("Ada", "ada@example.com", Track::Buildathon)), &mut output).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("Registered Ada"));
        assert!(!Path::new(&config.lock_file).exists());

        let reopened = open_event_system(config).unwrap();
        assert_eq!(reopened.registration_count(), 1);
    }

    #[test]
    fn test_run_command_refuses_while_locked() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let _held = StateLock::acquire(&config.lock_file).unwrap();

        let mut output = Vec::new();
        let result = run_command_with_config(config.clone(), Command::PrintRegistrationCount, &mut output);
        assert!(result.is_err());
        assert!(!Path::new(&config.state_file).exists());
    }

    #[test]
    fn test_failed_command_still_saves_state() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut output = Vec::new();
        let result = run_command_with_config(config.clone(), Command::DeleteTeam { team_name: "Ghosts".to_string() }, &mut output);
        assert!(result.is_err());
        assert!(Path::new(&config.state_file).exists());
        assert!(!Path::new(&config.lock_file).exists());
    }

    #[test]
    fn test_unreadable_state_is_left_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut output = Vec::new();
        run_command_with_config(config.clone(), Command::Register(sample_input("Ada", "ada@example.com", Track::Buildathon)), &mut output).unwrap();
        let saved = std::fs::read_to_string(&config.state_file).unwrap();
        let truncated = &saved[..saved.len() - 2];
        std::fs::write(&config.state_file, truncated).unwrap();

        let result = run_command_with_config(config.clone(), Command::PrintRegistrationCount, &mut output);
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&config.state_file).unwrap(), truncated);
        assert!(!Path::new(&config.lock_file).exists());
        assert!(open_event_system(config).is_err());
    }

    #[test]
    fn test_escape_markdown_with_special_characters() {
        let input = "Team_Alpha! scored 8.50 (Buildathon) #1";
        let expected = "Team\\_Alpha\\! scored 8\\.50 \\(Buildathon\\) \\#1";
        assert_eq!(escape_markdown(input), expected);
    }

    #[test]
    fn test_escape_markdown_without_special_characters() {
        assert_eq!(escape_markdown("Atlas wins Best Overall"), "Atlas wins Best Overall");
    }

    #[test]
    fn test_escape_markdown_table_row() {
        let input = "| 🥇 1 | Atlas | 8.50 |";
        let expected = "\\| 🥇 1 \\| Atlas \\| 8\\.50 \\|";
        assert_eq!(escape_markdown(input), expected);
    }
}
