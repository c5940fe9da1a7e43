//! The closed set of messages the rule engine emits.
//!
//! Each variant knows its template and supplies exactly the variables that
//! template references, so converting to a [`MessageTemplate`] cannot fail.

use crate::models::EntityType;
use crate::template::{MessageTemplate, Variable, VariableType};
use std::collections::BTreeMap;

/// Value shown for the assignee when actors reassign to themselves.
pub const THEMSELF: &str = "themself";

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// "{actor} assigned you a task"
    Assigned { actor: String, entity: EntityType },
    /// "{actor} reassigned the task to {assignee}"
    Reassigned {
        actor: String,
        assignee: String,
        entity: EntityType,
    },
    /// "{actor} removed your assignment"
    Unassigned { actor: String },
    /// "{actor} set the {field} to {value}"
    FieldSet {
        actor: String,
        field: &'static str,
        value: String,
        kind: VariableType,
    },
    /// "{actor} changed the {field} to {value}"
    FieldChanged {
        actor: String,
        field: &'static str,
        value: String,
    },
    /// "{actor} removed the {field}"
    FieldRemoved { actor: String, field: &'static str },
    /// "{actor} updated the task"
    Updated { actor: String, entity: EntityType },
    /// "{actor} commented: {comment}"
    Commented { actor: String, comment: String },
    /// "{actor} replied to your comment: {comment}"
    Replied { actor: String, comment: String },
    /// "{actor} mentioned you in a comment"
    Mentioned { actor: String },
}

impl Message {
    fn template(&self) -> String {
        match self {
            Self::Assigned { entity, .. } => {
                format!("{{actor}} assigned you {}", entity.indefinite())
            }
            Self::Reassigned { entity, .. } => {
                format!("{{actor}} reassigned the {} to {{assignee}}", entity.noun())
            }
            Self::Unassigned { .. } => "{actor} removed your assignment".to_string(),
            Self::FieldSet { .. } => "{actor} set the {field} to {value}".to_string(),
            Self::FieldChanged { .. } => "{actor} changed the {field} to {value}".to_string(),
            Self::FieldRemoved { .. } => "{actor} removed the {field}".to_string(),
            Self::Updated { entity, .. } => format!("{{actor}} updated the {}", entity.noun()),
            Self::Commented { .. } => "{actor} commented: {comment}".to_string(),
            Self::Replied { .. } => "{actor} replied to your comment: {comment}".to_string(),
            Self::Mentioned { .. } => "{actor} mentioned you in a comment".to_string(),
        }
    }

    fn variables(self) -> BTreeMap<String, Variable> {
        let mut vars = BTreeMap::new();
        let mut put = |name: &str, value: String, kind: VariableType| {
            vars.insert(name.to_string(), Variable::new(value, kind));
        };

        match self {
            Self::Assigned { actor, .. }
            | Self::Unassigned { actor }
            | Self::Updated { actor, .. }
            | Self::Mentioned { actor } => put("actor", actor, VariableType::Actor),
            Self::Reassigned {
                actor, assignee, ..
            } => {
                put("actor", actor, VariableType::Actor);
                put("assignee", assignee, VariableType::Assignee);
            }
            Self::FieldSet {
                actor,
                field,
                value,
                kind,
            } => {
                put("actor", actor, VariableType::Actor);
                put("field", field.to_string(), VariableType::Field);
                put("value", value, kind);
            }
            Self::FieldChanged {
                actor,
                field,
                value,
            } => {
                put("actor", actor, VariableType::Actor);
                put("field", field.to_string(), VariableType::Field);
                put("value", value, VariableType::Value);
            }
            Self::FieldRemoved { actor, field } => {
                put("actor", actor, VariableType::Actor);
                put("field", field.to_string(), VariableType::Field);
            }
            Self::Commented { actor, comment } | Self::Replied { actor, comment } => {
                put("actor", actor, VariableType::Actor);
                put("comment", comment, VariableType::Value);
            }
        }
        vars
    }
}

impl From<Message> for MessageTemplate {
    fn from(message: Message) -> Self {
        let template = message.template();
        MessageTemplate::from_parts(template, message.variables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_messages() -> Vec<Message> {
        let actor = || "Ada".to_string();
        vec![
            Message::Assigned { actor: actor(), entity: EntityType::Objective },
            Message::Reassigned {
                actor: actor(),
                assignee: THEMSELF.into(),
                entity: EntityType::Story,
            },
            Message::Unassigned { actor: actor() },
            Message::FieldSet {
                actor: actor(),
                field: "priority",
                value: "High".into(),
                kind: VariableType::Value,
            },
            Message::FieldChanged {
                actor: actor(),
                field: "status",
                value: "Done".into(),
            },
            Message::FieldRemoved { actor: actor(), field: "due date" },
            Message::Updated { actor: actor(), entity: EntityType::KeyResult },
            Message::Commented { actor: actor(), comment: "{looks} good".into() },
            Message::Replied { actor: actor(), comment: "thanks".into() },
            Message::Mentioned { actor: actor() },
        ]
    }

    #[test]
    fn test_every_variant_builds_a_valid_template() {
        for message in all_messages() {
            let expected = message.template();
            let template = MessageTemplate::from(message);
            assert_eq!(template.template(), expected);
        }
    }

    #[test]
    fn test_rendered_wording() {
        let rendered: Vec<String> = all_messages()
            .into_iter()
            .map(|m| MessageTemplate::from(m).render())
            .collect();

        assert_eq!(rendered[0], "Ada assigned you an objective");
        assert_eq!(rendered[1], "Ada reassigned the task to themself");
        assert_eq!(rendered[2], "Ada removed your assignment");
        assert_eq!(rendered[3], "Ada set the priority to High");
        assert_eq!(rendered[4], "Ada changed the status to Done");
        assert_eq!(rendered[5], "Ada removed the due date");
        assert_eq!(rendered[6], "Ada updated the key result");
        // Variable values are not re-scanned for placeholders.
        assert_eq!(rendered[7], "Ada commented: {looks} good");
    }
}
