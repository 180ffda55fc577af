// src/core/export.rs

use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;

use crate::core::error::EventResult;
use crate::core::models::Registration;

pub const REGISTRATION_HEADERS: [&str; 11] = [
    "Registration #",
    "Name",
    "Email",
    "Company",
    "Role",
    "Track",
    "Team Status",
    "Experience Level",
    "Challenges",
    "How Heard",
    "Registered At",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    /// Admin registrations table export.
    Registrations,
    /// Raw analytics export, which leads with the record id.
    Analytics,
}

impl ExportKind {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            ExportKind::Registrations => "registrations",
            ExportKind::Analytics => "analytics-export",
        }
    }

    fn headers(&self) -> Vec<&'static str> {
        let mut headers = Vec::with_capacity(REGISTRATION_HEADERS.len() + 1);
        if *self == ExportKind::Analytics {
            headers.push("ID");
        }
        headers.extend(REGISTRATION_HEADERS);
        headers
    }

    fn row(&self, reg: &Registration) -> Vec<String> {
        let mut row = Vec::with_capacity(REGISTRATION_HEADERS.len() + 1);
        if *self == ExportKind::Analytics {
            row.push(reg.id.to_string());
        }
        row.extend([
            reg.registration_number.to_string(),
            reg.full_name.clone(),
            reg.email.clone(),
            reg.company.clone().unwrap_or_default(),
            reg.role.clone(),
            reg.track.label().to_lowercase(),
            team_status_value(reg),
            reg.experience_level.clone(),
            reg.challenges.join("; "),
            reg.how_heard.clone(),
            reg.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ]);
        row
    }
}

fn team_status_value(reg: &Registration) -> String {
    reg.team_status.label().to_lowercase().replace(' ', "-")
}

/// Writes every cell quoted, with embedded quotes doubled.
pub fn write_registrations<W: Write>(out: W, registrations: &[&Registration], kind: ExportKind) -> EventResult<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(out);

    writer.write_record(kind.headers())?;
    for reg in registrations {
        writer.write_record(kind.row(reg))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn registrations_csv(registrations: &[&Registration], kind: ExportKind) -> EventResult<String> {
    let mut buffer = Vec::new();
    write_registrations(&mut buffer, registrations, kind)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::registration::sample_input;
    use crate::core::models::Track;

    fn registration() -> Registration {
        let mut input = sample_input("Ada \"The Countess\" Lovelace", "ada@example.com", Track::Buildathon);
        input.challenges = vec!["Internal Tools".to_string(), "Customer Support".to_string()];
        input.company = Some("Analytical, Ltd".to_string());
        Registration::new(input, 42).unwrap()
    }

    #[test]
    fn test_every_cell_quoted_and_quotes_doubled() {
        let reg = registration();
        let csv = registrations_csv(&[&reg], ExportKind::Registrations).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("\"Registration #\",\"Name\""));

        let row = lines.next().unwrap();
        assert!(row.starts_with("\"42\",\"Ada \"\"The Countess\"\" Lovelace\",\"ada@example.com\",\"Analytical, Ltd\""));
        assert!(row.contains("\"buildathon\",\"looking\""));
        assert!(row.contains("\"Internal Tools; Customer Support\""));
    }

    #[test]
    fn test_analytics_export_leads_with_id() {
        let reg = registration();
        let csv = registrations_csv(&[&reg], ExportKind::Analytics).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("\"ID\",\"Registration #\""));
        assert!(lines.next().unwrap().starts_with(&format!("\"{}\",\"42\"", reg.id)));
    }

    #[test]
    fn test_empty_export_has_only_headers() {
        let csv = registrations_csv(&[], ExportKind::Registrations).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
