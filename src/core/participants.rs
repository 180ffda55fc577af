// src/core/participants.rs

use itertools::Itertools;
use reqwest::Url;
use serde::{Serialize, Deserialize};
use sha2::{Digest, Sha256};

use crate::core::error::{EventError, EventResult};
use crate::core::models::{contains_ignore_case, names_equal, normalize_email, ParticipantTeamStatus, Registration, Track};
use crate::core::state::EventState;

const FILLING_PERCENT: f64 = 70.0;
const ALMOST_FULL_PERCENT: f64 = 90.0;
const REFERRAL_CODE_LEN: usize = 8;

/// Admin registration filters. Empty lists match everything.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistrationFilter {
    pub search: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub team_statuses: Vec<ParticipantTeamStatus>,
    #[serde(default)]
    pub challenges: Vec<String>,
}

impl RegistrationFilter {
    pub fn matches(&self, reg: &Registration) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => contains_ignore_case(&reg.full_name, term)
                || contains_ignore_case(&reg.email, term)
                || reg.company.as_deref().map_or(false, |c| contains_ignore_case(c, term)),
            None => true,
        };

        search_ok
            && (self.tracks.is_empty() || self.tracks.contains(&reg.track))
            && (self.team_statuses.is_empty() || self.team_statuses.contains(&reg.team_status))
            && (self.challenges.is_empty()
                || reg.challenges.iter().any(|c| self.challenges.iter().any(|f| names_equal(f, c))))
    }
}

/// Matching registrations, newest first.
pub fn filter_registrations<'a>(state: &'a EventState, filter: &RegistrationFilter) -> Vec<&'a Registration> {
    state.registrations().values()
        .filter(|r| filter.matches(r))
        .sorted_by(|a, b| b.created_at.cmp(&a.created_at).then(b.registration_number.cmp(&a.registration_number)))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityLevel {
    Open,
    Filling,
    AlmostFull,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Capacity {
    pub count: usize,
    pub limit: u32,
    pub remaining: usize,
    pub percent: f64,
    pub level: CapacityLevel,
}

impl Capacity {
    pub fn new(count: usize, limit: u32) -> Self {
        let percent = if limit == 0 { 100.0 } else { count as f64 / limit as f64 * 100.0 };
        let level = if percent >= ALMOST_FULL_PERCENT {
            CapacityLevel::AlmostFull
        } else if percent >= FILLING_PERCENT {
            CapacityLevel::Filling
        } else {
            CapacityLevel::Open
        };
        Self {
            count,
            limit,
            remaining: (limit as usize).saturating_sub(count),
            percent,
            level,
        }
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.limit as usize
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ShareLinks {
    pub share_text: String,
    pub share_url: String,
    pub referral_code: String,
    pub twitter: String,
    pub linkedin: String,
    pub facebook: String,
}

/// Short stable code derived from the registrant's email.
pub fn referral_code(email: &str) -> String {
    let digest = Sha256::digest(normalize_email(email).as_bytes());
    digest.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
        .chars()
        .take(REFERRAL_CODE_LEN)
        .collect()
}

fn build_url(base: &str, params: &[(&str, &str)]) -> EventResult<String> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| EventError::invalid(format!("Invalid URL {}: {}", base, e)))
}

pub fn share_links(public_url: &str, event_name: &str, registration: &Registration) -> EventResult<ShareLinks> {
    let referral_code = referral_code(&registration.email);
    let share_url = build_url(public_url, &[("ref", referral_code.as_str())])?;
    let share_text = format!("I just registered for {}! Join me in building what matters.", event_name);

    Ok(ShareLinks {
        twitter: build_url("https://twitter.com/intent/tweet", &[("text", share_text.as_str()), ("url", share_url.as_str())])?,
        linkedin: build_url("https://www.linkedin.com/sharing/share-offsite/", &[("url", share_url.as_str())])?,
        facebook: build_url("https://www.facebook.com/sharer/sharer.php", &[("u", share_url.as_str())])?,
        share_text,
        share_url,
        referral_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::registration::sample_input;

    fn add(state: &mut EventState, name: &str, track: Track, status: ParticipantTeamStatus, company: Option<&str>) {
        let mut input = sample_input(name, &format!("{}@example.com", name.to_lowercase()), track);
        input.team_status = status;
        input.company = company.map(String::from);
        let number = state.take_registration_number();
        state.add_registration(Registration::new(input, number).unwrap());
    }

    #[test]
    fn test_capacity_levels() {
        assert_eq!(Capacity::new(0, 150).level, CapacityLevel::Open);
        assert_eq!(Capacity::new(104, 150).level, CapacityLevel::Open);
        assert_eq!(Capacity::new(105, 150).level, CapacityLevel::Filling);
        assert_eq!(Capacity::new(135, 150).level, CapacityLevel::AlmostFull);
        assert!(Capacity::new(150, 150).is_full());
        assert_eq!(Capacity::new(160, 150).remaining, 0);
    }

    #[test]
    fn test_filters_combine() {
        let mut state = EventState::new();
        add(&mut state, "Ada", Track::Buildathon, ParticipantTeamStatus::Looking, Some("Analytical Engines"));
        add(&mut state, "Grace", Track::Promptathon, ParticipantTeamStatus::Solo, None);
        add(&mut state, "Linus", Track::Buildathon, ParticipantTeamStatus::HasTeam, None);

        assert_eq!(filter_registrations(&state, &RegistrationFilter::default()).len(), 3);

        let by_company = RegistrationFilter { search: Some("engines".to_string()), ..Default::default() };
        assert_eq!(filter_registrations(&state, &by_company)[0].full_name, "Ada");

        let build_with_team = RegistrationFilter {
            tracks: vec![Track::Buildathon],
            team_statuses: vec![ParticipantTeamStatus::HasTeam],
            ..Default::default()
        };
        let found = filter_registrations(&state, &build_with_team);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_name, "Linus");

        let by_challenge = RegistrationFilter { challenges: vec!["internal tools".to_string()], ..Default::default() };
        assert_eq!(filter_registrations(&state, &by_challenge).len(), 3);
        let no_match = RegistrationFilter { challenges: vec!["Robotics".to_string()], ..Default::default() };
        assert!(filter_registrations(&state, &no_match).is_empty());
    }

    #[test]
    fn test_newest_first() {
        let mut state = EventState::new();
        add(&mut state, "First", Track::Buildathon, ParticipantTeamStatus::Solo, None);
        add(&mut state, "Second", Track::Buildathon, ParticipantTeamStatus::Solo, None);
        let all = filter_registrations(&state, &RegistrationFilter::default());
        assert_eq!(all[0].full_name, "Second");
    }

    #[test]
    fn test_share_links() {
        let reg = Registration::new(sample_input("Ada", "Ada@Example.com", Track::Buildathon), 1).unwrap();
        let links = share_links("https://jam.example.com/", "Spring Jam", &reg).unwrap();

        assert_eq!(links.referral_code.len(), REFERRAL_CODE_LEN);
        assert_eq!(links.referral_code, referral_code("ada@example.com"));
        assert_eq!(links.share_url, format!("https://jam.example.com/?ref={}", links.referral_code));
        assert!(links.twitter.starts_with("https://twitter.com/intent/tweet?text=I+just+registered+for+Spring+Jam"));
        assert!(links.linkedin.contains("url=https%3A%2F%2Fjam.example.com"));
        assert!(links.facebook.starts_with("https://www.facebook.com/sharer/sharer.php?u="));
        assert!(share_links("not a url", "Spring Jam", &reg).is_err());
    }
}
