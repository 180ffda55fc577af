use std::error::Error;
use teloxide::utils::command::BotCommands;
use uuid::Uuid;

use crate::commands::common::{Command, CommandExecutor};
use crate::core::event_system::EventSystem;
use crate::core::models::{split_tags, Track};
use crate::escape_markdown;

/// These commands are supported:
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case")]
pub enum TelegramCommand {
    /// Display this text.
    Help,

    /// Registration counter and capacity.
    Count,

    /// Registrations, teams, submissions, and recent activity.
    Dashboard,

    /// Event health metrics and warnings.
    Health,

    /// Time left in the current event phase.
    Countdown,

    /// Judging leaderboard. Usage: /leaderboard [track]
    Leaderboard { track: String },

    /// People looking for a team. Usage: /queue [search]
    Queue { search: String },

    /// Team detail. Usage: /team "Team Name"
    Team { args: String },

    /// Submission detail. Usage: /submission "Project Name"
    Submission { args: String },

    /// Add a judge. Usage: /add_judge "Judge Name"
    AddJudge { args: String },

    /// Score a submission. Usage: /score "Judge" "Project" innovation quality impact platform
    Score { args: String },

    /// Give an award. Usage: /award "Project" "Award"
    Award { args: String },

    /// Form a team from seekers. Usage: /form_team email1,email2
    FormTeam { seekers: String },

    /// Move the event to its next phase.
    AdvancePhase,

    /// Unread notifications.
    Notifications,

    /// Mark one notification read. Usage: /read_notification <id>
    ReadNotification { id: String },

    /// Mark every notification read.
    MarkRead,
}

impl TelegramCommand {
    /// Replies for these are sent as MarkdownV2.
    pub fn uses_markdown(&self) -> bool {
        matches!(self, TelegramCommand::Leaderboard { .. } | TelegramCommand::Team { .. })
    }

    /// Splits on spaces, keeping double-quoted runs together.
    fn split_quoted(input: &str) -> Result<Vec<String>, String> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut quoted = false;

        for c in input.chars() {
            match (c, quoted) {
                ('"', false) if !current.is_empty() => {
                    return Err("Unexpected quote in middle of argument".to_string());
                }
                ('"', _) => {
                    if quoted && !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                    quoted = !quoted;
                }
                (' ', false) => {
                    if !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            }
        }

        if quoted {
            return Err("Unclosed quote".to_string());
        }
        if !current.is_empty() {
            args.push(current);
        }
        Ok(args)
    }

    fn expect_args(args: &str, count: usize, usage: &str) -> Result<Vec<String>, String> {
        let parsed = Self::split_quoted(args)?;
        if parsed.len() != count {
            return Err(format!("Usage: {}", usage));
        }
        Ok(parsed)
    }

    fn parse_tracks(track: &str) -> Result<Vec<Track>, String> {
        split_tags(track).iter().map(|t| t.parse()).collect()
    }

    fn parse_score(value: &str) -> Result<u8, String> {
        value.parse::<u8>().map_err(|e| format!("Invalid score {}: {}", value, e))
    }

    /// Translates a bot command into an admin command. `None` for commands
    /// the bot answers on its own.
    pub fn into_command(self) -> Result<Option<Command>, String> {
        let command = match self {
            TelegramCommand::Help => return Ok(None),
            TelegramCommand::Count => Command::PrintRegistrationCount,
            TelegramCommand::Dashboard => Command::PrintDashboard,
            TelegramCommand::Health => Command::PrintEventHealth,
            TelegramCommand::Countdown => Command::PrintCountdown,
            TelegramCommand::Leaderboard { track } => Command::PrintLeaderboard { tracks: Self::parse_tracks(&track)? },
            TelegramCommand::Queue { search } => Command::PrintMatchingQueue {
                search: Some(search).filter(|s| !s.trim().is_empty()),
                tracks: Vec::new(),
            },
            TelegramCommand::Team { args } => {
                let mut parsed = Self::expect_args(&args, 1, "/team \"Team Name\"")?;
                Command::PrintTeam { team_name: parsed.remove(0) }
            }
            TelegramCommand::Submission { args } => {
                let mut parsed = Self::expect_args(&args, 1, "/submission \"Project Name\"")?;
                Command::PrintSubmission { project_name: parsed.remove(0) }
            }
            TelegramCommand::AddJudge { args } => {
                let mut parsed = Self::expect_args(&args, 1, "/add_judge \"Judge Name\"")?;
                Command::AddJudge { name: parsed.remove(0) }
            }
            TelegramCommand::Score { args } => {
                let parsed = Self::expect_args(
                    &args,
                    6,
                    "/score \"Judge\" \"Project\" innovation quality impact platform",
                )?;
                Command::ScoreSubmission {
                    judge: parsed[0].clone(),
                    project_name: parsed[1].clone(),
                    innovation: Self::parse_score(&parsed[2])?,
                    quality: Self::parse_score(&parsed[3])?,
                    impact: Self::parse_score(&parsed[4])?,
                    platform: Self::parse_score(&parsed[5])?,
                    comments: None,
                }
            }
            TelegramCommand::Award { args } => {
                let parsed = Self::expect_args(&args, 2, "/award \"Project\" \"Award\"")?;
                Command::AddAward { project_name: parsed[0].clone(), award_type: parsed[1].clone() }
            }
            TelegramCommand::FormTeam { seekers } => Command::CreateTeamFromSeekers { seekers: split_tags(&seekers) },
            TelegramCommand::AdvancePhase => Command::AdvancePhase,
            TelegramCommand::Notifications => Command::PrintNotifications,
            TelegramCommand::ReadNotification { id } => Command::MarkNotificationRead {
                id: Uuid::parse_str(id.trim()).map_err(|e| format!("Invalid notification id {}: {}", id.trim(), e))?,
            },
            TelegramCommand::MarkRead => Command::MarkNotificationsRead,
        };
        Ok(Some(command))
    }
}

pub fn parse_command(text: &str) -> Option<TelegramCommand> {
    TelegramCommand::parse(text, "").ok()
}

pub fn handle_command(
    telegram_cmd: TelegramCommand,
    event_system: &mut EventSystem,
) -> Result<String, Box<dyn Error>> {
    let markdown = telegram_cmd.uses_markdown();
    match telegram_cmd.into_command()? {
        None => Ok(TelegramCommand::descriptions().to_string()),
        Some(command) => {
            let output = event_system.execute_command(command)?;
            if markdown {
                Ok(escape_markdown(&output))
            } else {
                Ok(output)
            }
        }
    }
}
