use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNKNOWN_PROJECT: &str = "Unknown Project";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordObject {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub amount: f64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub created_at: String,
    pub object: Option<RecordObject>,
}

impl Transaction {
    pub fn is_project_xp(&self) -> bool {
        self.kind == "xp"
            && self
                .object
                .as_ref()
                .and_then(|object| object.kind.as_deref())
                == Some("project")
    }

    pub fn project_name(&self) -> &str {
        self.object
            .as_ref()
            .and_then(|object| object.name.as_deref())
            .unwrap_or(UNKNOWN_PROJECT)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub grade: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillNode {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub audit_ratio: Option<f64>,
    pub total_up: Option<f64>,
    pub total_down: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub transactions: Vec<Transaction>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub skills: Vec<SkillNode>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub progresses: Vec<ResultRecord>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub results: Vec<ResultRecord>,
}

impl User {
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            self.login.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileData {
    #[serde(default, deserialize_with = "lenient_list")]
    pub user: Vec<User>,
}

impl ProfileData {
    pub fn from_data(data: Value) -> crate::error::Result<Self> {
        Ok(serde_json::from_value(data)?)
    }
}

/// Absent, null, or non-array input decodes to an empty list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Parses the timestamp shapes the data source emits.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn display_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(parsed) => parsed.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XpPoint {
    pub date: String,
    pub total_xp: f64,
    pub total_xp_mb: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillPoint {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassFailCounts {
    pub passed: usize,
    pub failed: usize,
    pub tested: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_xp: f64,
    pub project_xp: f64,
    pub average_grade: Option<f64>,
    pub audit_ratio: Option<f64>,
    pub total_up: Option<f64>,
    pub total_down: Option<f64>,
    pub pass_fail: PassFailCounts,
}
