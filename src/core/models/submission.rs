use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::{EventError, EventResult};
use super::common::{names_equal, NameMatches};

pub const AWARD_TYPES: [&str; 9] = [
    "Grand Prize",
    "Track Winner - Promptathon",
    "Track Winner - Buildathon",
    "Track Winner - Vibeathon",
    "Best Innovation",
    "Best UX",
    "Best Business Impact",
    "Best Use of Platform",
    "People's Choice",
];

pub const MIN_CRITERION_SCORE: u8 = 1;
pub const MAX_CRITERION_SCORE: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    PendingReview,
    InJudging,
    Scored,
    Winner,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionStatus::PendingReview => "pending review",
            SubmissionStatus::InJudging => "in judging",
            SubmissionStatus::Scored => "scored",
            SubmissionStatus::Winner => "winner",
        };
        f.write_str(label)
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "pending_review" => Ok(SubmissionStatus::PendingReview),
            "in_judging" => Ok(SubmissionStatus::InJudging),
            "scored" => Ok(SubmissionStatus::Scored),
            "winner" => Ok(SubmissionStatus::Winner),
            other => Err(format!("Unknown submission status: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubmissionInput {
    pub project_name: String,
    pub description: Option<String>,
    pub demo_link: Option<String>,
    pub repo_link: Option<String>,
    pub video_link: Option<String>,
    pub slides_link: Option<String>,
}

fn check_link(label: &str, link: &Option<String>) -> EventResult<()> {
    if let Some(url) = link {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EventError::invalid(format!("{} must be an http(s) URL: {}", label, url)));
        }
    }
    Ok(())
}

impl SubmissionInput {
    pub fn validate(&self) -> EventResult<()> {
        if self.project_name.trim().is_empty() {
            return Err(EventError::invalid("Project name is required"));
        }
        check_link("Demo link", &self.demo_link)?;
        check_link("Repository link", &self.repo_link)?;
        check_link("Video link", &self.video_link)?;
        check_link("Slides link", &self.slides_link)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub team_id: Uuid,
    pub project_name: String,
    pub description: Option<String>,
    pub demo_link: Option<String>,
    pub repo_link: Option<String>,
    pub video_link: Option<String>,
    pub slides_link: Option<String>,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(team_id: Uuid, input: SubmissionInput) -> EventResult<Self> {
        input.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            team_id,
            project_name: input.project_name.trim().to_string(),
            description: input.description,
            demo_link: input.demo_link,
            repo_link: input.repo_link,
            video_link: input.video_link,
            slides_link: input.slides_link,
            status: SubmissionStatus::PendingReview,
            submitted_at: now,
            updated_at: now,
        })
    }

    pub fn set_status(&mut self, status: SubmissionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn links(&self) -> Vec<(&'static str, &str)> {
        [
            ("Demo", &self.demo_link),
            ("Repository", &self.repo_link),
            ("Video", &self.video_link),
            ("Slides", &self.slides_link),
        ]
        .into_iter()
        .filter_map(|(label, link)| link.as_deref().map(|l| (label, l)))
        .collect()
    }
}

impl NameMatches for Submission {
    fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.project_name, name)
    }
}

/// One judge's rating on the four judging criteria.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub innovation: u8,
    pub quality: u8,
    pub impact: u8,
    pub platform: u8,
}

impl Criteria {
    pub fn new(innovation: u8, quality: u8, impact: u8, platform: u8) -> EventResult<Self> {
        let criteria = Self { innovation, quality, impact, platform };
        criteria.validate()?;
        Ok(criteria)
    }

    pub fn validate(&self) -> EventResult<()> {
        let range = MIN_CRITERION_SCORE..=MAX_CRITERION_SCORE;
        for (name, value) in [
            ("innovation", self.innovation),
            ("quality", self.quality),
            ("impact", self.impact),
            ("platform", self.platform),
        ] {
            if !range.contains(&value) {
                return Err(EventError::invalid(format!(
                    "{} score must be between {} and {}, got {}",
                    name, MIN_CRITERION_SCORE, MAX_CRITERION_SCORE, value
                )));
            }
        }
        Ok(())
    }

    pub fn mean(&self) -> f64 {
        (self.innovation as f64 + self.quality as f64 + self.impact as f64 + self.platform as f64) / 4.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Score {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub judge_id: Uuid,
    pub criteria: Criteria,
    pub comments: Option<String>,
    pub scored_at: DateTime<Utc>,
}

impl Score {
    pub fn new(submission_id: Uuid, judge_id: Uuid, criteria: Criteria, comments: Option<String>) -> EventResult<Self> {
        criteria.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            submission_id,
            judge_id,
            criteria,
            comments: comments.filter(|c| !c.trim().is_empty()),
            scored_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Award {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub award_type: String,
    pub awarded_at: DateTime<Utc>,
}

impl Award {
    pub fn new(submission_id: Uuid, award_type: &str) -> EventResult<Self> {
        let award_type = award_type.trim();
        if award_type.is_empty() {
            return Err(EventError::invalid("Award type cannot be empty"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            submission_id,
            award_type: award_type.to_string(),
            awarded_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Judge {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Judge {
    pub fn new(name: &str) -> EventResult<Self> {
        if name.trim().is_empty() {
            return Err(EventError::invalid("Judge name cannot be empty"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        })
    }
}

impl NameMatches for Judge {
    fn name_matches(&self, name: &str) -> bool {
        names_equal(&self.name, name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JudgeAssignment {
    pub id: Uuid,
    pub judge_id: Uuid,
    pub submission_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

impl JudgeAssignment {
    pub fn new(judge_id: Uuid, submission_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            judge_id,
            submission_id,
            assigned_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_range() {
        assert!(Criteria::new(1, 10, 5, 7).is_ok());
        assert!(Criteria::new(0, 10, 5, 7).is_err());
        assert!(Criteria::new(1, 11, 5, 7).is_err());
    }

    #[test]
    fn test_criteria_mean() {
        let c = Criteria::new(8, 6, 7, 9).unwrap();
        assert!((c.mean() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_submission_links_must_be_http() {
        let input = SubmissionInput {
            project_name: "Pipeline".to_string(),
            repo_link: Some("git@github.com:x/y.git".to_string()),
            ..Default::default()
        };
        assert!(Submission::new(Uuid::new_v4(), input).is_err());

        let input = SubmissionInput {
            project_name: "Pipeline".to_string(),
            repo_link: Some("https://github.com/x/y".to_string()),
            demo_link: Some("http://demo.example.com".to_string()),
            ..Default::default()
        };
        let submission = Submission::new(Uuid::new_v4(), input).unwrap();
        assert_eq!(submission.status, SubmissionStatus::PendingReview);
        assert_eq!(submission.links().len(), 2);
    }

    #[test]
    fn test_submission_status_parsing() {
        assert_eq!("pending review".parse::<SubmissionStatus>().unwrap(), SubmissionStatus::PendingReview);
        assert_eq!("in_judging".parse::<SubmissionStatus>().unwrap(), SubmissionStatus::InJudging);
        assert_eq!(serde_json::to_string(&SubmissionStatus::InJudging).unwrap(), "\"in_judging\"");
    }
}
