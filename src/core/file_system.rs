// src/core/file_system.rs
use crate::commands::common::Command;
use crate::core::error::{EventError, EventResult};
use crate::core::export::ExportKind;
use crate::core::state::EventState;

use chrono::NaiveDate;
use log::{debug, error, warn};
use serde_json;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FileSystem;

impl FileSystem {
    /// Writes to a temp file first, then renames over the old state.
    pub fn save_state(state: &EventState, state_file: &str) -> EventResult<()> {
        let json = serde_json::to_string_pretty(state)?;

        if let Some(parent) = Path::new(state_file).parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_file = format!("{}.temp", state_file);
        fs::write(&temp_file, &json)?;
        fs::rename(&temp_file, state_file)?;
        debug!("Saved state to {}", state_file);

        Ok(())
    }

    pub fn load_state(path: &str) -> EventResult<EventState> {
        let json = fs::read_to_string(path)?;
        let state: EventState = serde_json::from_str(&json)?;
        Ok(state)
    }

    /// `None` only when there is no state file yet. A file that exists but
    /// can't be read or parsed is an error, so it is never overwritten.
    pub fn try_load_state(path: &str) -> EventResult<Option<EventState>> {
        match Self::load_state(path) {
            Ok(state) => Ok(Some(state)),
            Err(EventError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                warn!("No state file at {}. Starting with a new state.", path);
                Ok(None)
            }
            Err(e) => {
                error!("Failed to load state from {}: {}", path, e);
                Err(e)
            }
        }
    }

    pub fn load_script(script_file: &str) -> Result<Vec<Command>, Box<dyn std::error::Error>> {
        let script_content = fs::read_to_string(script_file)?;
        let script: Vec<Command> = serde_json::from_str(&script_content)?;
        Ok(script)
    }

    fn state_dir(state_file: &Path) -> &Path {
        state_file.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// `exports/<prefix>-YYYY-MM-DD.csv` next to the state file.
    pub fn export_file_path(state_file: &Path, kind: ExportKind, date: NaiveDate) -> PathBuf {
        let file_name = format!("{}-{}.csv", kind.file_prefix(), date.format("%Y-%m-%d"));
        Self::state_dir(state_file).join("exports").join(file_name)
    }

    /// `reports/<event>/<YYYYMMDD>-<title>.md` next to the state file.
    pub fn report_file_path(state_file: &Path, event_name: &str, title: &str, date: NaiveDate) -> PathBuf {
        let truncated_title = Self::clean_file_name(title)
            .chars()
            .take(30)
            .collect::<String>()
            .replace(' ', "_");
        let file_name = format!("{}-{}.md", date.format("%Y%m%d"), truncated_title);
        Self::state_dir(state_file)
            .join("reports")
            .join(Self::sanitize_filename(event_name))
            .join(file_name)
    }

    pub fn write_file(path: &Path, content: &[u8]) -> EventResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn clean_file_name(name: &str) -> String {
        name.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                _ => c
            })
            .collect()
    }

    pub fn sanitize_filename(name: &str) -> String {
        name.chars()
            .map(|c| match c {
                'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' => c,
                _ => '_'
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let state_file = temp_dir.path().join("nested").join("state.json");
        let state_file = state_file.to_str().unwrap();

        let mut state = EventState::new();
        state.take_registration_number();
        FileSystem::save_state(&state, state_file).unwrap();
        assert!(!Path::new(&format!("{}.temp", state_file)).exists());

        let loaded = FileSystem::load_state(state_file).unwrap();
        assert_eq!(loaded.next_registration_number(), 2);
        assert_eq!(loaded.notification_templates().len(), 4);
    }

    #[test]
    fn test_try_load_missing_or_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(FileSystem::try_load_state(missing.to_str().unwrap()).unwrap().is_none());

        let corrupt = temp_dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        let result = FileSystem::try_load_state(corrupt.to_str().unwrap());
        assert!(matches!(result, Err(EventError::Json(_))));
        assert_eq!(fs::read_to_string(&corrupt).unwrap(), "{ not json");
    }

    #[test]
    fn test_export_paths() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        let path = FileSystem::export_file_path(Path::new("/data/state.json"), ExportKind::Registrations, date);
        assert_eq!(path, PathBuf::from("/data/exports/registrations-2026-02-14.csv"));

        let path = FileSystem::export_file_path(Path::new("state.json"), ExportKind::Analytics, date);
        assert_eq!(path, PathBuf::from("./exports/analytics-export-2026-02-14.csv"));
    }

    #[test]
    fn test_report_path_is_sanitized() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        let path = FileSystem::report_file_path(Path::new("/data/state.json"), "Spring Jam!", "Event summary: final", date);
        assert_eq!(path, PathBuf::from("/data/reports/Spring_Jam_/20260214-Event_summary__final.md"));
    }

    #[test]
    fn test_file_name_helpers() {
        assert_eq!(FileSystem::clean_file_name("a/b:c"), "a_b_c");
        assert_eq!(FileSystem::sanitize_filename("a b.c"), "a_b_c");
    }
}
