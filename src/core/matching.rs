// src/core/matching.rs

use itertools::Itertools;
use uuid::Uuid;

use crate::core::error::{EventError, EventResult};
use crate::core::models::{contains_ignore_case, TeamSeeker, Track};
use crate::core::state::EventState;

/// What `create_team_from_seekers` will do, worked out before anything changes.
#[derive(Debug, Clone)]
pub struct TeamPlan {
    pub name: String,
    pub track: Track,
    pub seeker_ids: Vec<Uuid>,
    /// Registrations matched to seekers by email, in seeker order.
    pub registration_ids: Vec<Uuid>,
}

fn track_allowed(tracks: &[Track], track: Track) -> bool {
    tracks.is_empty() || tracks.contains(&track)
}

/// Seekers still looking for a team, newest first.
pub fn seekers<'a>(state: &'a EventState, tracks: &[Track]) -> Vec<&'a TeamSeeker> {
    state.team_seekers().values()
        .filter(|s| s.looking_for_team && track_allowed(tracks, s.track))
        .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
        .collect()
}

/// Admin matching queue: looking seekers filtered by name or email.
pub fn matching_queue<'a>(state: &'a EventState, search: Option<&str>, tracks: &[Track]) -> Vec<&'a TeamSeeker> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    seekers(state, tracks)
        .into_iter()
        .filter(|s| match search {
            Some(term) => contains_ignore_case(&s.user_name, term) || contains_ignore_case(&s.email, term),
            None => true,
        })
        .collect()
}

/// The seeker followed by other looking seekers on the same track who offer
/// at least one skill the seeker needs. Empty when nobody fits.
pub fn suggest_matches<'a>(state: &'a EventState, seeker_id: Uuid) -> EventResult<Vec<&'a TeamSeeker>> {
    let seeker = state.get_seeker(&seeker_id)
        .ok_or_else(|| EventError::not_found("Seeker", seeker_id))?;

    let suggestions: Vec<&TeamSeeker> = seekers(state, &[seeker.track])
        .into_iter()
        .filter(|other| other.id != seeker.id)
        .filter(|other| seeker.skills_needed.iter().any(|needed| other.offers(needed)))
        .collect();

    if suggestions.is_empty() {
        return Ok(Vec::new());
    }
    Ok(std::iter::once(seeker).chain(suggestions).collect())
}

/// `Team <Track>`, numbered from 2 when the plain name is taken.
pub fn next_team_name(state: &EventState, track: Track) -> String {
    let base = format!("Team {}", track.label());
    if !state.team_name_taken(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{} {}", base, n))
        .find(|candidate| !state.team_name_taken(candidate))
        .unwrap_or_else(|| base.clone())
}

pub fn plan_team_from_seekers(state: &EventState, seeker_ids: &[Uuid]) -> EventResult<TeamPlan> {
    let seeker_ids: Vec<Uuid> = seeker_ids.iter().copied().unique().collect();
    let first_id = seeker_ids.first()
        .ok_or_else(|| EventError::invalid("Select at least one seeker to form a team"))?;

    let chosen = seeker_ids.iter()
        .map(|id| state.get_seeker(id).ok_or_else(|| EventError::not_found("Seeker", *id)))
        .collect::<EventResult<Vec<&TeamSeeker>>>()?;

    let track = state.get_seeker(first_id)
        .map(|s| s.track)
        .ok_or_else(|| EventError::not_found("Seeker", *first_id))?;

    let registration_ids = chosen.iter()
        .filter_map(|s| state.find_registration_by_email(&s.email))
        .filter(|r| state.membership_of(r.id).is_none())
        .map(|r| r.id)
        .unique()
        .collect();

    Ok(TeamPlan {
        name: next_team_name(state, track),
        track,
        seeker_ids,
        registration_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{SeekerInput, Team};

    fn seeker(state: &mut EventState, name: &str, track: Track, offers: &str, needs: &str) -> Uuid {
        let s = TeamSeeker::new(SeekerInput {
            user_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: "Engineer".to_string(),
            track,
            skills_offered: offers.to_string(),
            skills_needed: needs.to_string(),
        }).unwrap();
        state.add_seeker(s)
    }

    #[test]
    fn test_suggestions_same_track_with_overlap() {
        let mut state = EventState::new();
        let ada = seeker(&mut state, "Ada", Track::Buildathon, "rust", "Design, ML");
        let grace = seeker(&mut state, "Grace", Track::Buildathon, "design", "rust");
        let _linus = seeker(&mut state, "Linus", Track::Vibeathon, "design", "");
        let _alan = seeker(&mut state, "Alan", Track::Buildathon, "cobol", "");

        let matches = suggest_matches(&state, ada).unwrap();
        let ids: Vec<Uuid> = matches.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![ada, grace]);
    }

    #[test]
    fn test_no_suggestions_is_empty() {
        let mut state = EventState::new();
        let ada = seeker(&mut state, "Ada", Track::Buildathon, "rust", "haskell");
        seeker(&mut state, "Grace", Track::Buildathon, "design", "");
        assert!(suggest_matches(&state, ada).unwrap().is_empty());
        assert!(suggest_matches(&state, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_seekers_skip_those_not_looking() {
        let mut state = EventState::new();
        let ada = seeker(&mut state, "Ada", Track::Buildathon, "rust", "");
        seeker(&mut state, "Grace", Track::Promptathon, "design", "");
        state.get_seeker_mut(&ada).unwrap().looking_for_team = false;

        assert_eq!(seekers(&state, &[]).len(), 1);
        assert!(seekers(&state, &[Track::Buildathon]).is_empty());
        assert_eq!(matching_queue(&state, Some("GRACE@"), &[]).len(), 1);
        assert!(matching_queue(&state, Some("nobody"), &[]).is_empty());
    }

    #[test]
    fn test_team_name_suffix() {
        let mut state = EventState::new();
        assert_eq!(next_team_name(&state, Track::Vibeathon), "Team Vibeathon");
        state.add_team(Team::new("Team Vibeathon".to_string(), Track::Vibeathon, None, 4).unwrap());
        assert_eq!(next_team_name(&state, Track::Vibeathon), "Team Vibeathon 2");
        state.add_team(Team::new("Team Vibeathon 2".to_string(), Track::Vibeathon, None, 4).unwrap());
        assert_eq!(next_team_name(&state, Track::Vibeathon), "Team Vibeathon 3");
    }

    #[test]
    fn test_plan_requires_seekers() {
        let state = EventState::new();
        assert!(matches!(plan_team_from_seekers(&state, &[]), Err(EventError::Validation(_))));
    }
}
