//! Lenient field deserializers for backend payloads.
//!
//! Several columns come back either as native JSON or as the JSON-encoded text the
//! database stored, and ids switch between integers and public UUID strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{HoldCriteria, RETENTION_PERMANENT_DELETE};

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_retention_action() -> String {
    RETENTION_PERMANENT_DELETE.to_string()
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `"abc"` or `42` and keep it as text
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {}",
            other
        ))),
    }
}

/// Accept `"a@x.com"` or `["a@x.com", "b@y.com"]`, joining lists with ", "
pub(crate) fn text_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    })
}

/// String lists stored as JSON text (`"[\"a\"]"`) or as arrays
pub(crate) fn tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => Ok(Vec::new()),
        Value::String(text) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
        value => serde_json::from_value(value).map_err(serde::de::Error::custom),
    }
}

/// Hold criteria stored as a JSON object or as JSON text
pub(crate) fn criteria<'de, D>(deserializer: D) -> Result<HoldCriteria, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(HoldCriteria::new()),
        Value::String(text) if text.trim().is_empty() => Ok(HoldCriteria::new()),
        Value::String(text) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
        value => serde_json::from_value(value).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::string_or_number")]
        id: String,
        #[serde(default, deserialize_with = "super::text_or_list")]
        to: String,
        #[serde(default, deserialize_with = "super::tags")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "super::null_as_default")]
        flagged: bool,
    }

    #[test]
    fn test_lenient_fields() {
        let probe: Probe = serde_json::from_value(json!({
            "id": 12,
            "to": ["a@x.com", "b@y.com"],
            "tags": "[\"hot\", \"privileged\"]"
        }))
        .unwrap();
        assert_eq!(probe.id, "12");
        assert_eq!(probe.to, "a@x.com, b@y.com");
        assert_eq!(probe.tags, vec!["hot", "privileged"]);

        let probe: Probe = serde_json::from_value(json!({"id": "uuid-1", "tags": null})).unwrap();
        assert_eq!(probe.id, "uuid-1");
        assert!(probe.to.is_empty());
        assert!(probe.tags.is_empty());
        assert!(!probe.flagged);

        let probe: Probe = serde_json::from_value(json!({"id": 3, "flagged": null})).unwrap();
        assert!(!probe.flagged);
        let probe: Probe = serde_json::from_value(json!({"id": 3, "flagged": true})).unwrap();
        assert!(probe.flagged);
    }
}
