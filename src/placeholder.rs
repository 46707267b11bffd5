//! # Placeholder Resolution
//!
//! Free text on a template may carry `{{TOKEN}}` markers that are filled from
//! the clinic settings and the patient record at print time. The vocabulary
//! is closed and case-sensitive; anything else between double braces is left
//! exactly as written.
//!
//! Resolution is a single left-to-right scan over the input. Substituted
//! values are never re-scanned, so a clinic literally named `{{DATE}}` prints
//! as such instead of expanding twice.
//!
//! Missing source values resolve to an empty string. Units on weight and
//! height are only attached when there is a value to attach them to.

use std::collections::HashSet;

use crate::model::PrintSettings;
use crate::patient::{non_empty, PatientRecord};

/// A recognised placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    ClinicName,
    DoctorName,
    Specialty,
    Date,
    PatientName,
    Age,
    Phones,
    Addresses,
    Weight,
    Height,
    Bp,
    Hr,
    Temp,
    O2,
}

impl Token {
    pub const ALL: [Token; 14] = [
        Token::ClinicName,
        Token::DoctorName,
        Token::Specialty,
        Token::Date,
        Token::PatientName,
        Token::Age,
        Token::Phones,
        Token::Addresses,
        Token::Weight,
        Token::Height,
        Token::Bp,
        Token::Hr,
        Token::Temp,
        Token::O2,
    ];

    /// The name between the braces.
    pub fn name(&self) -> &'static str {
        match self {
            Token::ClinicName => "CLINIC_NAME",
            Token::DoctorName => "DOCTOR_NAME",
            Token::Specialty => "SPECIALTY",
            Token::Date => "DATE",
            Token::PatientName => "PATIENT_NAME",
            Token::Age => "AGE",
            Token::Phones => "PHONES",
            Token::Addresses => "ADDRESSES",
            Token::Weight => "WEIGHT",
            Token::Height => "HEIGHT",
            Token::Bp => "BP",
            Token::Hr => "HR",
            Token::Temp => "TEMP",
            Token::O2 => "O2",
        }
    }

    /// Short label for the editor's placeholder palette.
    pub fn label(&self) -> &'static str {
        match self {
            Token::ClinicName => "Clinic name",
            Token::DoctorName => "Doctor name",
            Token::Specialty => "Specialty",
            Token::Date => "Date",
            Token::PatientName => "Patient name",
            Token::Age => "Age",
            Token::Phones => "Phone numbers",
            Token::Addresses => "Addresses",
            Token::Weight => "Weight",
            Token::Height => "Height",
            Token::Bp => "Blood pressure",
            Token::Hr => "Heart rate",
            Token::Temp => "Temperature",
            Token::O2 => "O2 / respiratory rate",
        }
    }

    pub fn from_name(name: &str) -> Option<Token> {
        Token::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// The delimited marker, e.g. `{{DATE}}`.
    pub fn placeholder(&self) -> String {
        format!("{{{{{}}}}}", self.name())
    }

    /// The text this token expands to.
    pub fn value(&self, patient: &PatientRecord, settings: &PrintSettings) -> String {
        let opt = |v: &Option<String>| non_empty(v).unwrap_or("").to_string();
        let with_unit = |v: &Option<String>, unit: &str| match non_empty(v) {
            Some(s) => format!("{} {}", s, unit),
            None => String::new(),
        };

        match self {
            Token::ClinicName => settings.clinic_name.clone(),
            Token::DoctorName => settings.doctor_name.clone(),
            Token::Specialty => settings.specialty.clone(),
            Token::Date => opt(&patient.date),
            Token::PatientName => opt(&patient.name),
            Token::Age => opt(&patient.age),
            Token::Phones => join_present(&settings.phones, " | "),
            Token::Addresses => join_present(&settings.addresses, " - "),
            Token::Weight => with_unit(&patient.weight, "kg"),
            Token::Height => with_unit(&patient.height, "cm"),
            Token::Bp => opt(&patient.vitals.bp),
            Token::Hr => opt(&patient.vitals.hr),
            Token::Temp => opt(&patient.vitals.temp),
            Token::O2 => opt(&patient.vitals.rr),
        }
    }
}

fn join_present(items: &[String], sep: &str) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// How many occurrences of each token a resolve pass expands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Substitution {
    /// Every occurrence is expanded.
    #[default]
    All,
    /// Only the first occurrence of each token is expanded; later repeats
    /// stay verbatim. Matches output produced by older template renderers.
    FirstOccurrence,
}

/// Expand every placeholder in `text`.
pub fn resolve(text: &str, patient: &PatientRecord, settings: &PrintSettings) -> String {
    resolve_with(text, patient, settings, Substitution::All)
}

pub fn resolve_with(
    text: &str,
    patient: &PatientRecord,
    settings: &PrintSettings,
    mode: Substitution,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut expanded: HashSet<Token> = HashSet::new();
    let mut rest = text;

    while let Some((before, token, raw, after)) = next_marker(rest) {
        out.push_str(before);
        match token {
            Some(t) if mode == Substitution::All || expanded.insert(t) => {
                out.push_str(&t.value(patient, settings));
            }
            _ => out.push_str(raw),
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Recognised tokens in `text`, in order of first appearance.
pub fn placeholders_in(text: &str) -> Vec<Token> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some((_, token, _, after)) = next_marker(rest) {
        if let Some(t) = token {
            if !found.contains(&t) {
                found.push(t);
            }
        }
        rest = after;
    }
    found
}

/// Find the next `{{...}}` marker. Returns the text before it, the token if
/// the name is in the vocabulary, the raw marker, and the text after it.
fn next_marker(s: &str) -> Option<(&str, Option<Token>, &str, &str)> {
    let first = s.find("{{")?;
    let close = s[first + 2..].find("}}")? + first + 2;
    // "{{ {{DATE}}": the marker begins at the opening pair nearest the close.
    let open = s[..close].rfind("{{")?;
    let name = &s[open + 2..close];
    let end = close + 2;
    Some((&s[..open], Token::from_name(name), &s[open..end], &s[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::Vitals;

    fn settings() -> PrintSettings {
        PrintSettings {
            clinic_name: "Riverside Clinic".to_string(),
            doctor_name: "Dr. Okafor".to_string(),
            specialty: "Family Medicine".to_string(),
            phones: vec!["555-0100".to_string(), "555-0101".to_string()],
            addresses: vec!["12 River Rd".to_string(), "Suite 4".to_string()],
            ..PrintSettings::default()
        }
    }

    #[test]
    fn test_clinic_name_and_phones() {
        let out = resolve("{{CLINIC_NAME}} / {{PHONES}}", &PatientRecord::default(), &settings());
        assert_eq!(out, "Riverside Clinic / 555-0100 | 555-0101");
    }

    #[test]
    fn test_addresses_joined_with_dash() {
        let out = resolve("{{ADDRESSES}}", &PatientRecord::default(), &settings());
        assert_eq!(out, "12 River Rd - Suite 4");
    }

    #[test]
    fn test_missing_weight_is_empty() {
        assert_eq!(resolve("{{WEIGHT}}", &PatientRecord::default(), &settings()), "");
    }

    #[test]
    fn test_weight_and_height_units() {
        let patient = PatientRecord {
            weight: Some("70".into()),
            height: Some("175".into()),
            ..Default::default()
        };
        assert_eq!(resolve("{{WEIGHT}}/{{HEIGHT}}", &patient, &settings()), "70 kg/175 cm");
    }

    #[test]
    fn test_vitals_and_o2_slot() {
        let patient = PatientRecord {
            vitals: Vitals {
                bp: Some("120/80".into()),
                hr: Some("72".into()),
                temp: Some("37.2".into()),
                rr: Some("18".into()),
            },
            ..Default::default()
        };
        assert_eq!(
            resolve("{{BP}} {{HR}} {{TEMP}} {{O2}}", &patient, &settings()),
            "120/80 72 37.2 18"
        );
    }

    #[test]
    fn test_unknown_tokens_left_verbatim() {
        let out = resolve("{{NOPE}} {{clinic_name}} {{CLINIC_NAME}}", &PatientRecord::default(), &settings());
        assert_eq!(out, "{{NOPE}} {{clinic_name}} Riverside Clinic");
    }

    #[test]
    fn test_unterminated_marker_left_alone() {
        let out = resolve("Hello {{PATIENT_NAME", &PatientRecord::default(), &settings());
        assert_eq!(out, "Hello {{PATIENT_NAME");
    }

    #[test]
    fn test_nested_open_braces() {
        let patient = PatientRecord {
            date: Some("01/02/2026".into()),
            ..Default::default()
        };
        assert_eq!(resolve("{{ {{DATE}}", &patient, &settings()), "{{ 01/02/2026");
    }

    #[test]
    fn test_extra_braces_around_token() {
        let patient = PatientRecord {
            age: Some("9".into()),
            ..Default::default()
        };
        assert_eq!(resolve("{{{AGE}}}", &patient, &settings()), "{9}");
    }

    #[test]
    fn test_repeated_token_replace_all() {
        let patient = PatientRecord {
            date: Some("01/02/2026".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve("{{DATE}} and again {{DATE}}", &patient, &settings()),
            "01/02/2026 and again 01/02/2026"
        );
    }

    #[test]
    fn test_repeated_token_first_occurrence_mode() {
        let patient = PatientRecord {
            date: Some("01/02/2026".into()),
            ..Default::default()
        };
        let out = resolve_with(
            "{{DATE}} and again {{DATE}}",
            &patient,
            &settings(),
            Substitution::FirstOccurrence,
        );
        assert_eq!(out, "01/02/2026 and again {{DATE}}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut s = settings();
        s.clinic_name = "{{DOCTOR_NAME}}".to_string();
        assert_eq!(resolve("{{CLINIC_NAME}}", &PatientRecord::default(), &s), "{{DOCTOR_NAME}}");
    }

    #[test]
    fn test_blank_phone_entries_skipped() {
        let mut s = settings();
        s.phones = vec!["555-0100".into(), " ".into(), "555-0199".into()];
        assert_eq!(resolve("{{PHONES}}", &PatientRecord::default(), &s), "555-0100 | 555-0199");
    }

    #[test]
    fn test_placeholders_in() {
        let found = placeholders_in("{{DATE}} {{X}} {{AGE}} {{DATE}}");
        assert_eq!(found, vec![Token::Date, Token::Age]);
    }

    #[test]
    fn test_placeholder_round_trip() {
        for t in Token::ALL {
            assert_eq!(Token::from_name(t.name()), Some(t));
            assert_eq!(placeholders_in(&t.placeholder()), vec![t]);
        }
    }
}
