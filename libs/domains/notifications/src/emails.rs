//! Transactional emails composed directly from events.
//!
//! Verification, invitation and workspace-lifecycle events have fixed
//! recipients and a single template, so they skip the rule engine.

use crate::error::{NotificationError, NotificationResult};
use crate::events::{Event, EventType};
use crate::mailer::EmailTemplate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailVerificationPayload {
    pub email: String,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationEmailPayload {
    pub email: String,
    pub inviter_name: String,
    pub workspace_name: String,
    pub token: String,
}

/// Sent to whoever issued the invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationAcceptedPayload {
    pub inviter_email: String,
    pub invitee_name: String,
    pub workspace_id: Uuid,
    pub workspace_name: String,
}

/// Deletion and restore confirmations share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfirmationPayload {
    pub email: String,
    pub name: String,
    pub workspace_id: Uuid,
    pub workspace_name: String,
    pub token: String,
}

/// Deleted and restored notices go to every member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceLifecyclePayload {
    pub recipients: Vec<String>,
    pub workspace_id: Uuid,
    pub workspace_name: String,
}

/// An email ready for [`Mailer::send_templated`](crate::mailer::Mailer::send_templated).
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedEmail {
    pub recipients: Vec<String>,
    pub template: EmailTemplate,
    pub subject: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct EmailComposer {
    frontend_url: String,
    company_name: String,
}

impl EmailComposer {
    pub fn new(frontend_url: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
            company_name: company_name.into(),
        }
    }

    fn link(&self, path: &str) -> String {
        format!("{}{}", self.frontend_url, path)
    }

    pub fn compose(
        &self,
        event_type: EventType,
        event: &Event,
    ) -> NotificationResult<ComposedEmail> {
        let composed = match event_type {
            EventType::EmailVerification => {
                let p: EmailVerificationPayload = event.decode_payload()?;
                ComposedEmail {
                    recipients: vec![p.email],
                    template: EmailTemplate::EmailVerification,
                    subject: "Verify your email address".to_string(),
                    data: json!({
                        "name": p.name,
                        "action_url": self.link(&format!("/verify-email?token={}", p.token)),
                        "company_name": self.company_name,
                    }),
                }
            }
            EventType::InvitationEmail => {
                let p: InvitationEmailPayload = event.decode_payload()?;
                ComposedEmail {
                    subject: format!("{} invited you to {}", p.inviter_name, p.workspace_name),
                    recipients: vec![p.email],
                    template: EmailTemplate::InvitationEmail,
                    data: json!({
                        "inviter_name": p.inviter_name,
                        "workspace_name": p.workspace_name,
                        "action_url": self.link(&format!("/invitations/accept?token={}", p.token)),
                        "company_name": self.company_name,
                    }),
                }
            }
            EventType::InvitationAccepted => {
                let p: InvitationAcceptedPayload = event.decode_payload()?;
                ComposedEmail {
                    subject: format!("{} joined {}", p.invitee_name, p.workspace_name),
                    recipients: vec![p.inviter_email],
                    template: EmailTemplate::InvitationAccepted,
                    data: json!({
                        "invitee_name": p.invitee_name,
                        "workspace_name": p.workspace_name,
                        "action_url": self.link(&format!("/workspaces/{}", p.workspace_id)),
                        "company_name": self.company_name,
                    }),
                }
            }
            EventType::WorkspaceDeletionConfirmation | EventType::WorkspaceRestoreConfirmation => {
                let p: WorkspaceConfirmationPayload = event.decode_payload()?;
                let deletion = event_type == EventType::WorkspaceDeletionConfirmation;
                let (template, subject, action) = if deletion {
                    (
                        EmailTemplate::WorkspaceDeletionConfirmation,
                        format!("Confirm deletion of {}", p.workspace_name),
                        "delete",
                    )
                } else {
                    (
                        EmailTemplate::WorkspaceRestoreConfirmation,
                        format!("Confirm restore of {}", p.workspace_name),
                        "restore",
                    )
                };
                ComposedEmail {
                    recipients: vec![p.email],
                    template,
                    subject,
                    data: json!({
                        "name": p.name,
                        "workspace_name": p.workspace_name,
                        "action_url": self.link(&format!(
                            "/workspaces/{}/{}/confirm?token={}",
                            p.workspace_id, action, p.token
                        )),
                        "company_name": self.company_name,
                    }),
                }
            }
            EventType::WorkspaceDeleted | EventType::WorkspaceRestored => {
                let p: WorkspaceLifecyclePayload = event.decode_payload()?;
                let (template, subject, path) = if event_type == EventType::WorkspaceDeleted {
                    (
                        EmailTemplate::WorkspaceDeleted,
                        format!("{} was deleted", p.workspace_name),
                        "/workspaces".to_string(),
                    )
                } else {
                    (
                        EmailTemplate::WorkspaceRestored,
                        format!("{} has been restored", p.workspace_name),
                        format!("/workspaces/{}", p.workspace_id),
                    )
                };
                ComposedEmail {
                    recipients: p.recipients,
                    template,
                    subject,
                    data: json!({
                        "workspace_name": p.workspace_name,
                        "action_url": self.link(&path),
                        "company_name": self.company_name,
                    }),
                }
            }
            other => {
                return Err(NotificationError::invalid(other.as_ref(), "not an email event"));
            }
        };

        let recipients: Vec<String> = composed
            .recipients
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(NotificationError::invalid(event_type.as_ref(), "no recipients"));
        }

        Ok(ComposedEmail {
            recipients,
            ..composed
        })
    }
}
