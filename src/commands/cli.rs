// src/commands/cli.rs
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use uuid::Uuid;

use crate::app_config::AppConfig;
use crate::core::event_system::EventSystem;
use crate::core::file_system::FileSystem;
use crate::core::models::{
    split_tags, ChallengeInput, IntegrationType, ParticipantTeamStatus, RegistrationInput, SeekerInput,
    SettingsUpdate, SubmissionInput, SubmissionStatus, TeamStatus, TemplateType, Track,
};
use crate::core::participants::RegistrationFilter;
use super::common::{Command, CommandExecutor};

#[derive(Parser, Debug)]
#[command(name = "hackhub_cli", about = "Run admin commands against the hackathon state")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    role: String,
    #[arg(long)]
    track: Track,
    /// Comma-separated challenge names
    #[arg(long, default_value = "")]
    challenges: String,
    #[arg(long, default_value = "looking")]
    team_status: ParticipantTeamStatus,
    #[arg(long, default_value = "intermediate")]
    experience: String,
    #[arg(long, default_value = "")]
    how_heard: String,
    /// Confirms the participant accepted the code of conduct
    #[arg(long)]
    agree: bool,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_delimiter = ',')]
    track: Vec<Track>,
    #[arg(long, value_delimiter = ',')]
    team_status: Vec<ParticipantTeamStatus>,
    #[arg(long, value_delimiter = ',')]
    challenge: Vec<String>,
}

impl From<FilterArgs> for RegistrationFilter {
    fn from(args: FilterArgs) -> Self {
        RegistrationFilter {
            search: args.search,
            tracks: args.track,
            team_statuses: args.team_status,
            challenges: args.challenge,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Register a participant
    Register(RegisterArgs),
    DeleteRegistration { registration: String },
    ListRegistrations(FilterArgs),
    Count,
    ShareLinks { registration: String },
    CreateTeam {
        name: String,
        #[arg(long)]
        track: Track,
        #[arg(long)]
        challenge: Option<String>,
        #[arg(long)]
        max_members: Option<u32>,
    },
    AddMember {
        team: String,
        registration: String,
        #[arg(long)]
        role: Option<String>,
    },
    RemoveMember { team: String, registration: String },
    DeleteTeam { team: String },
    TeamStatus { team: String, status: TeamStatus },
    AddNote {
        team: String,
        note: String,
        #[arg(long)]
        by: Option<String>,
    },
    Team { team: String },
    Teams {
        #[arg(long, value_delimiter = ',')]
        track: Vec<Track>,
    },
    /// Post to the team matching board
    PostSeeker {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        track: Track,
        #[arg(long, default_value = "")]
        offers: String,
        #[arg(long, default_value = "")]
        needs: String,
    },
    RemoveSeeker { seeker: String },
    Queue {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_delimiter = ',')]
        track: Vec<Track>,
    },
    Suggest { seeker: String },
    /// Form a team from comma-separated seeker names or emails
    FormTeam { seekers: String },
    Submit {
        team: String,
        project: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        demo: Option<String>,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        video: Option<String>,
        #[arg(long)]
        slides: Option<String>,
    },
    SubmissionStatus { project: String, status: SubmissionStatus },
    DeleteSubmission { project: String },
    Submission { project: String },
    AddJudge { name: String },
    AssignJudge { judge: String, project: String },
    Score {
        judge: String,
        project: String,
        innovation: u8,
        quality: u8,
        impact: u8,
        platform: u8,
        #[arg(long)]
        comments: Option<String>,
    },
    Award { project: String, award: String },
    RemoveAward { project: String, award: String },
    Leaderboard {
        #[arg(long, value_delimiter = ',')]
        track: Vec<Track>,
    },
    Dashboard,
    Analytics,
    Health,
    Countdown,
    Report,
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Raw analytics export with an ID column
        #[arg(long)]
        analytics: bool,
    },
    Settings {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        #[arg(long)]
        registration_deadline: Option<DateTime<Utc>>,
        #[arg(long)]
        submission_deadline: Option<DateTime<Utc>>,
        #[arg(long)]
        next_phase_at: Option<DateTime<Utc>>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        by: Option<String>,
    },
    PrintSettings,
    AdvancePhase,
    Archive,
    /// Delete every registration, team, and submission
    Reset {
        #[arg(long)]
        confirm: bool,
    },
    AddChallenge {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        sponsor: Option<String>,
        #[arg(long)]
        prize: Option<u64>,
        #[arg(long)]
        track: Option<Track>,
    },
    DeleteChallenge { name: String },
    Challenges,
    AddPrize {
        prize_type: String,
        amount: u64,
        #[arg(long)]
        description: Option<String>,
    },
    UpdatePrize { prize_type: String, amount: u64 },
    DeletePrize { prize_type: String },
    Prizes,
    Integration {
        integration_type: IntegrationType,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        disabled: bool,
    },
    Templates,
    UpdateTemplate {
        template_type: TemplateType,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
    /// Render a template with key=value pairs
    RenderTemplate {
        template_type: TemplateType,
        values: Vec<String>,
    },
    Notifications,
    /// Mark one notification read by id
    MarkNotificationRead {
        id: Uuid,
    },
    MarkRead,
    ClearNotifications,
    Audit {
        #[arg(long)]
        limit: Option<usize>,
    },
    RunScript { script_file_path: Option<String> },
    /// Run a single command given as JSON
    Json { command: String },
}

fn parse_key_values(pairs: &[String]) -> Result<HashMap<String, String>, Box<dyn Error>> {
    pairs.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| -> Box<dyn Error> { format!("Expected key=value, got {}", pair).into() })
        })
        .collect()
}

impl CliCommand {
    fn into_command(self) -> Result<Command, Box<dyn Error>> {
        let command = match self {
            CliCommand::Register(args) => Command::Register(RegistrationInput {
                full_name: args.name,
                email: args.email,
                company: args.company,
                role: args.role,
                track: args.track,
                challenges: split_tags(&args.challenges),
                team_status: args.team_status,
                experience_level: args.experience,
                how_heard: args.how_heard,
                agreed_to_code_of_conduct: args.agree,
            }),
            CliCommand::DeleteRegistration { registration } => Command::DeleteRegistration { registration },
            CliCommand::ListRegistrations(filter) => Command::ListRegistrations { filter: filter.into() },
            CliCommand::Count => Command::PrintRegistrationCount,
            CliCommand::ShareLinks { registration } => Command::PrintShareLinks { registration },
            CliCommand::CreateTeam { name, track, challenge, max_members } => Command::CreateTeam { name, track, challenge, max_members },
            CliCommand::AddMember { team, registration, role } => Command::AddMember { team_name: team, registration, role },
            CliCommand::RemoveMember { team, registration } => Command::RemoveMember { team_name: team, registration },
            CliCommand::DeleteTeam { team } => Command::DeleteTeam { team_name: team },
            CliCommand::TeamStatus { team, status } => Command::UpdateTeamStatus { team_name: team, status },
            CliCommand::AddNote { team, note, by } => Command::AddTeamNote { team_name: team, note, created_by: by },
            CliCommand::Team { team } => Command::PrintTeam { team_name: team },
            CliCommand::Teams { track } => Command::PrintTeams { tracks: track },
            CliCommand::PostSeeker { name, email, role, track, offers, needs } => Command::PostSeeker(SeekerInput {
                user_name: name,
                email,
                role,
                track,
                skills_offered: offers,
                skills_needed: needs,
            }),
            CliCommand::RemoveSeeker { seeker } => Command::RemoveSeeker { seeker },
            CliCommand::Queue { search, track } => Command::PrintMatchingQueue { search, tracks: track },
            CliCommand::Suggest { seeker } => Command::SuggestMatches { seeker },
            CliCommand::FormTeam { seekers } => Command::CreateTeamFromSeekers { seekers: split_tags(&seekers) },
            CliCommand::Submit { team, project, description, demo, repo, video, slides } => Command::CreateSubmission {
                team_name: team,
                submission: SubmissionInput {
                    project_name: project,
                    description,
                    demo_link: demo,
                    repo_link: repo,
                    video_link: video,
                    slides_link: slides,
                },
            },
            CliCommand::SubmissionStatus { project, status } => Command::UpdateSubmissionStatus { project_name: project, status },
            CliCommand::DeleteSubmission { project } => Command::DeleteSubmission { project_name: project },
            CliCommand::Submission { project } => Command::PrintSubmission { project_name: project },
            CliCommand::AddJudge { name } => Command::AddJudge { name },
            CliCommand::AssignJudge { judge, project } => Command::AssignJudge { judge, project_name: project },
            CliCommand::Score { judge, project, innovation, quality, impact, platform, comments } => Command::ScoreSubmission {
                judge,
                project_name: project,
                innovation,
                quality,
                impact,
                platform,
                comments,
            },
            CliCommand::Award { project, award } => Command::AddAward { project_name: project, award_type: award },
            CliCommand::RemoveAward { project, award } => Command::RemoveAward { project_name: project, award_type: award },
            CliCommand::Leaderboard { track } => Command::PrintLeaderboard { tracks: track },
            CliCommand::Dashboard => Command::PrintDashboard,
            CliCommand::Analytics => Command::PrintAnalytics,
            CliCommand::Health => Command::PrintEventHealth,
            CliCommand::Countdown => Command::PrintCountdown,
            CliCommand::Report => Command::GenerateEventReport,
            CliCommand::Export { filter, analytics } => Command::ExportRegistrations { filter: filter.into(), analytics },
            CliCommand::Settings { name, start, end, registration_deadline, submission_deadline, next_phase_at, limit, by } => {
                Command::UpdateSettings(SettingsUpdate {
                    event_name: name,
                    event_start_date: start,
                    event_end_date: end,
                    registration_deadline,
                    submission_deadline,
                    next_phase_at,
                    registration_limit: limit,
                    updated_by: by,
                    ..Default::default()
                })
            }
            CliCommand::PrintSettings => Command::PrintSettings,
            CliCommand::AdvancePhase => Command::AdvancePhase,
            CliCommand::Archive => Command::ArchiveEvent,
            CliCommand::Reset { confirm } => Command::ResetEvent { confirm },
            CliCommand::AddChallenge { name, description, sponsor, prize, track } => Command::AddChallenge(ChallengeInput {
                name,
                description,
                sponsor,
                prize_amount: prize,
                recommended_track: track,
            }),
            CliCommand::DeleteChallenge { name } => Command::DeleteChallenge { challenge_name: name },
            CliCommand::Challenges => Command::PrintChallenges,
            CliCommand::AddPrize { prize_type, amount, description } => Command::AddPrize { prize_type, amount, description },
            CliCommand::UpdatePrize { prize_type, amount } => Command::UpdatePrize { prize_type, amount },
            CliCommand::DeletePrize { prize_type } => Command::DeletePrize { prize_type },
            CliCommand::Prizes => Command::PrintPrizes,
            CliCommand::Integration { integration_type, url, disabled } => Command::SetIntegration {
                integration_type,
                webhook_url: url,
                enabled: !disabled,
            },
            CliCommand::Templates => Command::PrintTemplates,
            CliCommand::UpdateTemplate { template_type, subject, body } => Command::UpdateTemplate { template_type, subject, body },
            CliCommand::RenderTemplate { template_type, values } => Command::RenderTemplate {
                template_type,
                values: parse_key_values(&values)?,
            },
            CliCommand::Notifications => Command::PrintNotifications,
            CliCommand::MarkNotificationRead { id } => Command::MarkNotificationRead { id },
            CliCommand::MarkRead => Command::MarkNotificationsRead,
            CliCommand::ClearNotifications => Command::ClearNotifications,
            CliCommand::Audit { limit } => Command::PrintAuditLog { limit },
            CliCommand::RunScript { script_file_path } => Command::RunScript { script_file_path },
            CliCommand::Json { command } => serde_json::from_str(&command)?,
        };
        Ok(command)
    }
}

pub fn parse_cli_args(args: &[String]) -> Result<Command, Box<dyn Error>> {
    if args.len() < 2 {
        return Err("Not enough arguments. Usage: hackhub_cli <command> [args...]".into());
    }
    let cli = Cli::try_parse_from(args)?;
    cli.command.into_command()
}

pub fn execute_command<W: Write>(
    event_system: &mut EventSystem,
    command: Command,
    config: &AppConfig,
    output: &mut W,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::RunScript { script_file_path } => {
            let script_path = script_file_path.unwrap_or_else(|| config.script_file.clone());
            let script_commands = read_script_commands(&script_path)?;
            info!("Running {} commands from {}", script_commands.len(), script_path);
            for cmd in script_commands {
                let result = event_system.execute_command(cmd)?;
                writeln!(output, "{}", result)?;
            }
            Ok(())
        }
        _ => {
            let result = event_system.execute_command(command)?;
            writeln!(output, "{}", result)?;
            Ok(())
        }
    }
}

pub fn read_script_commands(script_file_path: &str) -> Result<Vec<Command>, Box<dyn Error>> {
    FileSystem::load_script(script_file_path)
}
