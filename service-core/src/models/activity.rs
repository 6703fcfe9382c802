//! Play activity records exchanged between the relay and its clients.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A provider record exactly as the relay forwards it: a JSON object left
/// untouched apart from `isFavorited`.
pub type ActivityRecord = Map<String, Value>;

/// One step of an activity, with instructions in English and Chinese.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_step_chinese: Option<String>,
    #[serde(default)]
    pub instruction_english: String,
    #[serde(default)]
    pub instruction_chinese: String,
}

/// A play activity suggested for a toy and an age, as the client reads it.
///
/// Records come from a language model, so reading is lenient: missing text
/// and lists become empty, and `ageInMonths` may arrive as a number or a
/// numeric string. Fields beyond the known ones are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySpec {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_months",
        skip_serializing_if = "Option::is_none"
    )]
    pub age_in_months: Option<u32>,
    #[serde(default)]
    pub steps: Vec<ActivityStep>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub safety_tips: Vec<String>,
    #[serde(default)]
    pub is_favorited: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Successful body of `POST /generate-ideas`. The relay sends
/// [`ActivityRecord`]s; clients read them as [`ActivitySpec`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateIdeasResponse<A = ActivitySpec> {
    pub activities: Vec<A>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for id, got {}",
            other
        ))),
    }
}

/// Whole months from a number or numeric string; anything else reads as absent.
fn lenient_months<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let months = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(months
        .filter(|m| m.is_finite() && *m >= 0.0 && *m <= f64::from(u32::MAX))
        .map(|m| m.round() as u32))
}
