//! Typed payloads for rule-evaluated events.
//!
//! Partial changesets arrive as a JSON object (`updates`). Each known key is a
//! [`FieldChange`], so "key absent", "explicit null" and "new value" are three
//! distinct states the rules can match on. Keys the notifier does not know are
//! kept in `other` only to detect that *something* changed.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A single field in a partial update.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldChange<T> {
    /// Key absent from the changeset.
    #[default]
    Unchanged,
    /// Key present with an explicit `null`.
    Cleared,
    /// Key present with a value.
    Set(T),
}

impl<T> FieldChange<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for FieldChange<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Cleared,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldChange<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Into::into)
    }
}

impl<T: Serialize> Serialize for FieldChange<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Unchanged | Self::Cleared => serializer.serialize_none(),
        }
    }
}

/// A due date. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; displays as
/// `1 Mar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DueDate(pub NaiveDate);

impl DueDate {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
            .map(Self)
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%-d %b"))
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format("%Y-%m-%d"))
    }
}

// ============================================================================
// Stories
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryCreatedPayload {
    pub story_id: Uuid,
    pub workspace_id: Uuid,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryUpdatedPayload {
    pub story_id: Uuid,
    pub workspace_id: Uuid,
    /// Assignee before the update.
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub updates: StoryUpdates,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryUpdates {
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub assignee_id: FieldChange<Uuid>,
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub status_id: FieldChange<Uuid>,
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub priority: FieldChange<String>,
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub end_date: FieldChange<DueDate>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentCreatedPayload {
    pub comment_id: Uuid,
    pub story_id: Uuid,
    pub workspace_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRepliedPayload {
    pub comment_id: Uuid,
    pub parent_comment_id: Uuid,
    pub parent_author_id: Uuid,
    pub story_id: Uuid,
    pub workspace_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMentionedPayload {
    pub comment_id: Uuid,
    pub story_id: Uuid,
    pub workspace_id: Uuid,
    pub mentioned_user_id: Uuid,
}

// ============================================================================
// OKRs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveUpdatedPayload {
    pub objective_id: Uuid,
    pub workspace_id: Uuid,
    /// Owner before the update.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub updates: ObjectiveUpdates,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveUpdates {
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub owner_id: FieldChange<Uuid>,
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub status_id: FieldChange<Uuid>,
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub due_date: FieldChange<DueDate>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResultUpdatedPayload {
    pub key_result_id: Uuid,
    pub objective_id: Uuid,
    pub workspace_id: Uuid,
    /// Owner before the update.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub updates: KeyResultUpdates,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyResultUpdates {
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub owner_id: FieldChange<Uuid>,
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub status_id: FieldChange<Uuid>,
    /// Percent complete.
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub progress: FieldChange<f64>,
    #[serde(default, skip_serializing_if = "FieldChange::is_unchanged")]
    pub due_date: FieldChange<DueDate>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn story(updates: serde_json::Value) -> StoryUpdatedPayload {
        serde_json::from_value(json!({
            "story_id": Uuid::nil(),
            "workspace_id": Uuid::nil(),
            "updates": updates,
        }))
        .unwrap()
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let id = Uuid::new_v4();

        assert_eq!(story(json!({})).updates.assignee_id, FieldChange::Unchanged);
        assert_eq!(
            story(json!({"assignee_id": null})).updates.assignee_id,
            FieldChange::Cleared
        );
        assert_eq!(
            story(json!({"assignee_id": id})).updates.assignee_id,
            FieldChange::Set(id)
        );
    }

    #[test]
    fn test_unknown_keys_are_kept_aside() {
        let payload = story(json!({"title": "New title", "priority": "High"}));
        assert_eq!(payload.updates.priority, FieldChange::Set("High".to_string()));
        assert!(payload.updates.other.contains_key("title"));
        assert!(!payload.updates.other.contains_key("priority"));
    }

    #[test]
    fn test_due_date_formats() {
        assert_eq!(DueDate::parse("2025-03-01").unwrap().to_string(), "1 Mar");
        assert_eq!(
            DueDate::parse("2025-12-24T18:30:00Z").unwrap().to_string(),
            "24 Dec"
        );
        assert!(DueDate::parse("tomorrow").is_none());
    }

    #[test]
    fn test_bad_date_fails_decode() {
        let result = serde_json::from_value::<StoryUpdatedPayload>(json!({
            "story_id": Uuid::nil(),
            "workspace_id": Uuid::nil(),
            "updates": {"end_date": "soon"},
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unchanged_fields_are_omitted_on_the_wire() {
        let updates = StoryUpdates {
            assignee_id: FieldChange::Cleared,
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&updates).unwrap(), json!({"assignee_id": null}));
    }
}
