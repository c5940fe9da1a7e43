//! Field-update notifications.
//!
//! Several fields can change in one update but the holder gets one
//! notification. Callers list the fields in precedence order; the first one
//! that changed picks the message. When none of them changed but something
//! else did, the generic "updated" message is used.

use super::{RuleEngine, Target};
use crate::lookups::{Fallback, LookupResultExt};
use crate::messages::Message;
use crate::payloads::{DueDate, FieldChange};
use crate::template::VariableType;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub(crate) enum FieldEdit<'a> {
    Priority(&'a FieldChange<String>),
    Status(&'a FieldChange<Uuid>),
    Progress(&'a FieldChange<f64>),
    DueDate(&'a FieldChange<DueDate>),
}

impl FieldEdit<'_> {
    fn is_unchanged(&self) -> bool {
        match self {
            Self::Priority(c) => c.is_unchanged(),
            Self::Status(c) => c.is_unchanged(),
            Self::Progress(c) => c.is_unchanged(),
            Self::DueDate(c) => c.is_unchanged(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Priority(_) => "priority",
            Self::Status(_) => "status",
            Self::Progress(_) => "progress",
            Self::DueDate(_) => "due date",
        }
    }
}

impl RuleEngine {
    pub(super) async fn field_message(
        &self,
        target: &Target,
        edits: &[FieldEdit<'_>],
        other_changed: bool,
    ) -> Option<Message> {
        let actor = target.actor_name.clone();

        let Some(edit) = edits.iter().find(|e| !e.is_unchanged()) else {
            return other_changed.then_some(Message::Updated {
                actor,
                entity: target.entity_type,
            });
        };
        let field = edit.label();

        let message = match *edit {
            FieldEdit::Priority(FieldChange::Set(priority)) => Message::FieldSet {
                actor,
                field,
                value: priority.clone(),
                kind: VariableType::Value,
            },
            FieldEdit::Status(FieldChange::Set(status_id)) => Message::FieldChanged {
                actor,
                field,
                value: self
                    .lookups
                    .status_name(*status_id, target.workspace_id)
                    .await
                    .or_fallback(Fallback::StatusName),
            },
            FieldEdit::Progress(FieldChange::Set(progress)) => Message::FieldSet {
                actor,
                field,
                value: format!("{progress:.0}%"),
                kind: VariableType::Value,
            },
            FieldEdit::DueDate(FieldChange::Set(date)) => Message::FieldSet {
                actor,
                field,
                value: date.to_string(),
                kind: VariableType::Date,
            },
            _ => Message::FieldRemoved { actor, field },
        };

        Some(message)
    }
}
