use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug, Deserialize)]
pub(crate) struct ContactRow {
    pub(crate) id: String,
    pub(crate) campaign: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) assigned_agent: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) next_action_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) do_not_contact: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) company: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) contact_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) mobile: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) siret: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) activity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) postcode: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) workforce: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) call_count: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) last_contact: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ContactRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<ContactRow>().collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates read as midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "oui" => Some(true),
        "0" | "false" | "no" | "non" => Some(false),
        _ => None,
    }
}
