use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct ScoreRow {
    /// 1-based line in the source file, counting the header.
    pub(crate) line: usize,
    pub(crate) player: String,
    pub(crate) exercise: String,
    pub(crate) metric: String,
    pub(crate) value: f64,
    pub(crate) scored_at: Option<String>,
    pub(crate) notes: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ScoreRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        let row = record?;
        rows.push(ScoreRow {
            line: index + 2,
            player: row.player,
            exercise: row.exercise,
            metric: row.metric,
            value: row.value,
            scored_at: row.scored_at,
            notes: row.notes,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Exercise")]
    exercise: String,
    #[serde(rename = "Metric")]
    metric: String,
    #[serde(rename = "Value")]
    value: f64,
    #[serde(rename = "Scored At", default, deserialize_with = "empty_string_as_none")]
    scored_at: Option<String>,
    #[serde(rename = "Notes", default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS` and bare dates (midnight UTC).
///
/// Blank or unrecognized input yields `None`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Lowercase and collapse whitespace so names typed by coaches match plan entries.
pub(crate) fn normalize_label(value: &str) -> String {
    value
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
