// src/core/scoring.rs

use serde::Serialize;
use uuid::Uuid;

use crate::core::models::{Criteria, Submission, Track};
use crate::core::state::EventState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_rank(rank: usize) -> Option<Medal> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CriteriaAverages {
    pub innovation: f64,
    pub quality: f64,
    pub impact: f64,
    pub platform: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub medal: Option<Medal>,
    pub submission_id: Uuid,
    pub project_name: String,
    pub team_name: String,
    pub track: Option<Track>,
    pub average_score: f64,
    pub score_count: usize,
}

/// Mean of the per-score criteria means. Zero when nobody has scored yet.
pub fn average_score(state: &EventState, submission_id: Uuid) -> f64 {
    let criteria: Vec<Criteria> = state.scores_for(submission_id)
        .into_iter()
        .map(|s| s.criteria)
        .collect();
    if criteria.is_empty() {
        return 0.0;
    }
    criteria.iter().map(Criteria::mean).sum::<f64>() / criteria.len() as f64
}

pub fn criteria_averages(state: &EventState, submission_id: Uuid) -> CriteriaAverages {
    let scores = state.scores_for(submission_id);
    if scores.is_empty() {
        return CriteriaAverages::default();
    }
    let n = scores.len() as f64;
    let sum = |f: fn(&Criteria) -> u8| scores.iter().map(|s| f(&s.criteria) as f64).sum::<f64>() / n;
    CriteriaAverages {
        innovation: sum(|c| c.innovation),
        quality: sum(|c| c.quality),
        impact: sum(|c| c.impact),
        platform: sum(|c| c.platform),
    }
}

fn submission_track(state: &EventState, submission: &Submission) -> Option<Track> {
    state.get_team(&submission.team_id).map(|t| t.track)
}

/// Scored submissions ranked by average score, best first. An empty track
/// list means every track.
pub fn leaderboard(state: &EventState, tracks: &[Track]) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<(&Submission, f64)> = state.submissions().values()
        .filter(|s| tracks.is_empty()
            || submission_track(state, s).map_or(false, |t| tracks.contains(&t)))
        .map(|s| (s, average_score(state, s.id)))
        .filter(|(_, avg)| *avg > 0.0)
        .collect();

    rows.sort_by(|(a, avg_a), (b, avg_b)| {
        avg_b.partial_cmp(avg_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
    });

    rows.into_iter()
        .enumerate()
        .map(|(index, (submission, average))| {
            let rank = index + 1;
            let team = state.get_team(&submission.team_id);
            LeaderboardEntry {
                rank,
                medal: Medal::for_rank(rank),
                submission_id: submission.id,
                project_name: submission.project_name.clone(),
                team_name: team.map(|t| t.name.clone()).unwrap_or_else(|| "Unknown team".to_string()),
                track: team.map(|t| t.track),
                average_score: average,
                score_count: state.scores_for(submission.id).len(),
            }
        })
        .collect()
}
