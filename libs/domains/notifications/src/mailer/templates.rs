//! Email template rendering engine.
//!
//! Handlebars in strict mode: a template referencing a field the data does
//! not carry fails to render instead of producing a blank.

use crate::error::{NotificationError, NotificationResult};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

/// Rendered email content.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// HTML body content.
    pub html: String,
    /// Plain text body content.
    pub text: String,
    /// Email subject line.
    pub subject: String,
}

/// Transactional emails the notifier sends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmailTemplate {
    EmailVerification,
    InvitationEmail,
    InvitationAccepted,
    WorkspaceDeletionConfirmation,
    WorkspaceDeleted,
    WorkspaceRestoreConfirmation,
    WorkspaceRestored,
}

impl EmailTemplate {
    /// (html body, text body)
    fn sources(self) -> (&'static str, &'static str) {
        match self {
            Self::EmailVerification => (VERIFICATION_HTML, VERIFICATION_TEXT),
            Self::InvitationEmail => (INVITATION_HTML, INVITATION_TEXT),
            Self::InvitationAccepted => (INVITATION_ACCEPTED_HTML, INVITATION_ACCEPTED_TEXT),
            Self::WorkspaceDeletionConfirmation => (DELETION_CONFIRM_HTML, DELETION_CONFIRM_TEXT),
            Self::WorkspaceDeleted => (DELETED_HTML, DELETED_TEXT),
            Self::WorkspaceRestoreConfirmation => (RESTORE_CONFIRM_HTML, RESTORE_CONFIRM_TEXT),
            Self::WorkspaceRestored => (RESTORED_HTML, RESTORED_TEXT),
        }
    }

    fn html_name(self) -> String {
        format!("{}_html", self.as_ref())
    }

    fn text_name(self) -> String {
        format!("{}_text", self.as_ref())
    }
}

/// Template engine for rendering email templates.
#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        for template in EmailTemplate::iter() {
            let (html, text) = template.sources();
            let (html_name, text_name) = (template.html_name(), template.text_name());
            handlebars
                .register_template_string(&html_name, HTML_LAYOUT.replace("%BODY%", html))
                .map_err(|e| {
                    NotificationError::Config(format!("Failed to register {}: {}", html_name, e))
                })?;
            handlebars
                .register_template_string(&text_name, format!("{text}{TEXT_FOOTER}"))
                .map_err(|e| {
                    NotificationError::Config(format!("Failed to register {}: {}", text_name, e))
                })?;
        }

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    /// Render both bodies of a template with the given data.
    pub fn render<T: Serialize>(
        &self,
        template: EmailTemplate,
        subject: &str,
        data: &T,
    ) -> NotificationResult<RenderedEmail> {
        debug!(template = %template, "Rendering email");

        let html = self.handlebars.render(&template.html_name(), data)?;
        let text = self.handlebars.render(&template.text_name(), data)?;

        Ok(RenderedEmail {
            html,
            text,
            subject: subject.to_string(),
        })
    }
}

const HTML_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 40px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
%BODY%
      </td>
    </tr>
    <tr>
      <td style="padding: 24px 0; text-align: center;">
        <p style="color: #a1a1aa; font-size: 11px; margin: 0;">{{company_name}}</p>
      </td>
    </tr>
  </table>
</body>
</html>"#;

const TEXT_FOOTER: &str = "\n\n---\n{{{company_name}}}";

const VERIFICATION_HTML: &str = r#"        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">Verify your email address</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          Hi {{name}}, please click the button below to verify your email address and activate your account.
        </p>
        <p style="text-align: center;">
          <a href="{{action_url}}" style="display: inline-block; background-color: #2563eb; color: #ffffff; font-size: 16px; font-weight: 500; padding: 12px 32px; text-decoration: none; border-radius: 6px;">Verify Email Address</a>
        </p>
        <p style="color: #71717a; font-size: 12px; text-align: center; margin: 24px 0 0 0;">
          If you didn't create an account, you can safely ignore this email.
        </p>"#;

const VERIFICATION_TEXT: &str = r#"Verify your email address

Hi {{{name}}},

Please click the link below to verify your email address and activate your account:

{{{action_url}}}

If you didn't create an account, you can safely ignore this email."#;

const INVITATION_HTML: &str = r#"        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">You're invited to {{workspace_name}}</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          {{inviter_name}} invited you to join the {{workspace_name}} workspace.
        </p>
        <p style="text-align: center;">
          <a href="{{action_url}}" style="display: inline-block; background-color: #2563eb; color: #ffffff; font-size: 16px; font-weight: 500; padding: 12px 32px; text-decoration: none; border-radius: 6px;">Accept Invitation</a>
        </p>"#;

const INVITATION_TEXT: &str = r#"You're invited to {{{workspace_name}}}

{{{inviter_name}}} invited you to join the {{{workspace_name}}} workspace.

Accept the invitation:

{{{action_url}}}"#;

const INVITATION_ACCEPTED_HTML: &str = r#"        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">Invitation accepted</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          {{invitee_name}} joined {{workspace_name}}.
        </p>
        <p style="text-align: center;">
          <a href="{{action_url}}" style="color: #2563eb;">Open workspace</a>
        </p>"#;

const INVITATION_ACCEPTED_TEXT: &str = r#"Invitation accepted

{{{invitee_name}}} joined {{{workspace_name}}}.

{{{action_url}}}"#;

const DELETION_CONFIRM_HTML: &str = r#"        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">Confirm workspace deletion</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          Hi {{name}}, you asked to delete the {{workspace_name}} workspace. Confirm to continue.
        </p>
        <p style="text-align: center;">
          <a href="{{action_url}}" style="display: inline-block; background-color: #dc2626; color: #ffffff; font-size: 16px; font-weight: 500; padding: 12px 32px; text-decoration: none; border-radius: 6px;">Delete Workspace</a>
        </p>
        <p style="color: #71717a; font-size: 12px; text-align: center; margin: 24px 0 0 0;">
          If you didn't request this, you can safely ignore this email.
        </p>"#;

const DELETION_CONFIRM_TEXT: &str = r#"Confirm workspace deletion

Hi {{{name}}},

You asked to delete the {{{workspace_name}}} workspace. Confirm here:

{{{action_url}}}

If you didn't request this, you can safely ignore this email."#;

const DELETED_HTML: &str = r#"        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">{{workspace_name}} was deleted</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          The {{workspace_name}} workspace has been deleted. An owner can still restore it for a limited time.
        </p>
        <p style="text-align: center;">
          <a href="{{action_url}}" style="color: #2563eb;">Manage workspaces</a>
        </p>"#;

const DELETED_TEXT: &str = r#"{{{workspace_name}}} was deleted

The {{{workspace_name}}} workspace has been deleted. An owner can still restore it for a limited time.

{{{action_url}}}"#;

const RESTORE_CONFIRM_HTML: &str = r#"        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">Confirm workspace restore</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          Hi {{name}}, confirm to restore the {{workspace_name}} workspace.
        </p>
        <p style="text-align: center;">
          <a href="{{action_url}}" style="display: inline-block; background-color: #2563eb; color: #ffffff; font-size: 16px; font-weight: 500; padding: 12px 32px; text-decoration: none; border-radius: 6px;">Restore Workspace</a>
        </p>"#;

const RESTORE_CONFIRM_TEXT: &str = r#"Confirm workspace restore

Hi {{{name}}},

Confirm to restore the {{{workspace_name}}} workspace:

{{{action_url}}}"#;

const RESTORED_HTML: &str = r#"        <h1 style="color: #18181b; font-size: 24px; font-weight: 600; margin: 0 0 16px 0; text-align: center;">{{workspace_name}} is back</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; text-align: center;">
          The {{workspace_name}} workspace has been restored.
        </p>
        <p style="text-align: center;">
          <a href="{{action_url}}" style="color: #2563eb;">Open workspace</a>
        </p>"#;

const RESTORED_TEXT: &str = r#"{{{workspace_name}}} is back

The {{{workspace_name}}} workspace has been restored.

{{{action_url}}}"#;
