//! # Patient Record
//!
//! The read-only input that fills placeholders and data blocks. Records come
//! from the clinic's session store in whatever shape it happened to save, so
//! every field is optional and scalar fields accept either JSON strings or
//! numbers (`"age": 42` and `"age": "42"` both work).

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub height: Option<String>,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub prescription: Vec<PrescriptionItem>,
    #[serde(default)]
    pub investigation_items: Vec<InvestigationItem>,
    #[serde(default)]
    pub scans: Vec<InvestigationItem>,
    #[serde(default, deserialize_with = "loose_string")]
    pub past_history: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(default, deserialize_with = "loose_string")]
    pub bp: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub hr: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub temp: Option<String>,
    /// Respiratory rate. Also printed for the `{{O2}}` placeholder.
    #[serde(default, deserialize_with = "loose_string")]
    pub rr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionItem {
    #[serde(default, deserialize_with = "loose_text")]
    pub drug: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub dose: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub frequency: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub duration: Option<String>,
}

impl PrescriptionItem {
    /// Drug name with the dose in parentheses when one is given.
    pub fn display_name(&self) -> String {
        match non_empty(&self.dose) {
            Some(dose) => format!("{} ({})", self.drug, dose),
            None => self.drug.clone(),
        }
    }

    /// Duration, or a dash when absent.
    pub fn display_duration(&self) -> &str {
        non_empty(&self.duration).unwrap_or("-")
    }
}

/// A lab test or scan request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestigationItem {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: String,
}

impl InvestigationItem {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl PatientRecord {
    /// The dummy record printed by "Download Sample".
    pub fn sample() -> Self {
        let item = |drug: &str, dose: Option<&str>, frequency: &str, duration: Option<&str>| PrescriptionItem {
            drug: drug.to_string(),
            dose: dose.map(str::to_string),
            frequency: frequency.to_string(),
            duration: duration.map(str::to_string),
        };
        Self {
            name: Some("Sample Patient".to_string()),
            date: Some(chrono::Local::now().format("%d/%m/%Y").to_string()),
            age: Some("35".to_string()),
            weight: Some("70".to_string()),
            height: Some("175".to_string()),
            vitals: Vitals {
                bp: Some("120/80".to_string()),
                hr: Some("72".to_string()),
                temp: Some("37".to_string()),
                rr: Some("16".to_string()),
            },
            prescription: vec![
                item("Amoxicillin", Some("500mg"), "Every 8 hours", Some("7 days")),
                item("Paracetamol", Some("1g"), "When needed", None),
                item("Omeprazole", Some("20mg"), "Once daily before breakfast", Some("14 days")),
            ],
            investigation_items: vec![
                InvestigationItem::new("Complete Blood Count"),
                InvestigationItem::new("Fasting Blood Sugar"),
            ],
            scans: vec![InvestigationItem::new("Chest X-Ray")],
            past_history: Some(
                "The patient presented with a three-day history of productive cough and low-grade fever. \
                 No known drug allergies. Previous episodes of bronchitis were managed conservatively."
                    .to_string(),
            ),
            diagnosis: Some("Acute bronchitis".to_string()),
        }
    }

    /// The name used in export filenames.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(&self.name)
    }
}

/// `Some(s)` only when the string is present and not blank.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// As [`loose_string`], with null read as an empty string.
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_string(deserializer)?.unwrap_or_default())
}

/// Accept a string, number, bool or null where a string is expected.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a string or number, found {}",
                other
            )))
        }
    })
}
