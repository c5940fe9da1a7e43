//! Structured notification messages.
//!
//! A [`MessageTemplate`] is stored unrendered: a template string with
//! `{name}` placeholders plus typed variables. Clients, the email renderer and
//! the push hub each render it at the edge.
//!
//! Every placeholder has a variable and every variable is referenced; this is
//! checked on construction and on deserialization, so a `MessageTemplate` in
//! hand always renders.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Template '{template}' references undefined variable '{name}'")]
    MissingVariable { name: String, template: String },

    #[error("Variable '{name}' is not referenced by template '{template}'")]
    UnusedVariable { name: String, template: String },
}

/// What a variable's value denotes, so renderers can style or localize it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VariableType {
    Actor,
    Assignee,
    Field,
    Value,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
}

impl Variable {
    pub fn new(value: impl Into<String>, kind: VariableType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMessageTemplate")]
pub struct MessageTemplate {
    template: String,
    variables: BTreeMap<String, Variable>,
}

#[derive(Deserialize)]
struct RawMessageTemplate {
    template: String,
    #[serde(default)]
    variables: BTreeMap<String, Variable>,
}

impl TryFrom<RawMessageTemplate> for MessageTemplate {
    type Error = TemplateError;

    fn try_from(raw: RawMessageTemplate) -> Result<Self, Self::Error> {
        Self::new(raw.template, raw.variables)
    }
}

impl MessageTemplate {
    /// Build a template, rejecting undefined or unreferenced variables.
    pub fn new(
        template: impl Into<String>,
        variables: BTreeMap<String, Variable>,
    ) -> Result<Self, TemplateError> {
        let template = template.into();
        let (missing, unused) = {
            let used = placeholders(&template);
            let missing = used
                .iter()
                .find(|name| !variables.contains_key(**name))
                .map(|name| name.to_string());
            let unused = variables
                .keys()
                .find(|name| !used.contains(&name.as_str()))
                .cloned();
            (missing, unused)
        };

        if let Some(name) = missing {
            return Err(TemplateError::MissingVariable { name, template });
        }
        if let Some(name) = unused {
            return Err(TemplateError::UnusedVariable { name, template });
        }

        Ok(Self {
            template,
            variables,
        })
    }

    /// For catalogue messages whose variables are fixed per template.
    pub(crate) fn from_parts(template: String, variables: BTreeMap<String, Variable>) -> Self {
        debug_assert!(
            Self::new(template.clone(), variables.clone()).is_ok(),
            "variables out of sync with template '{template}'"
        );
        Self {
            template,
            variables,
        }
    }

    /// Start a template and add variables one by one.
    pub fn builder(template: impl Into<String>) -> MessageTemplateBuilder {
        MessageTemplateBuilder {
            template: template.into(),
            variables: BTreeMap::new(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Placeholder names in template order, duplicates included.
    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.template)
    }

    /// Render the stored template.
    pub fn render(&self) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| {
                self.variables
                    .get(&caps[1])
                    .map(|v| v.value.clone())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Render using the catalog's translation for `lang`, falling back to the
    /// stored template. A translation that references a variable this message
    /// does not carry is an error.
    pub fn render_in(
        &self,
        lang: &str,
        catalog: &TranslationCatalog,
    ) -> Result<String, TemplateError> {
        let Some(translated) = catalog.lookup(lang, &self.template) else {
            return Ok(self.render());
        };

        if let Some(name) = placeholders(translated)
            .into_iter()
            .find(|name| !self.variables.contains_key(*name))
        {
            return Err(TemplateError::MissingVariable {
                name: name.to_string(),
                template: translated.to_string(),
            });
        }

        Ok(PLACEHOLDER
            .replace_all(translated, |caps: &Captures| {
                self.variables
                    .get(&caps[1])
                    .map(|v| v.value.clone())
                    .unwrap_or_default()
            })
            .into_owned())
    }
}

impl std::fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

pub struct MessageTemplateBuilder {
    template: String,
    variables: BTreeMap<String, Variable>,
}

impl MessageTemplateBuilder {
    pub fn var(mut self, name: &str, value: impl Into<String>, kind: VariableType) -> Self {
        self.variables
            .insert(name.to_string(), Variable::new(value, kind));
        self
    }

    pub fn build(self) -> Result<MessageTemplate, TemplateError> {
        MessageTemplate::new(self.template, self.variables)
    }
}

fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Per-language translations keyed by the source template string.
#[derive(Debug, Clone, Default)]
pub struct TranslationCatalog {
    entries: HashMap<(String, String), String>,
}

impl TranslationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, lang: &str, source: &str, translated: &str) -> Self {
        self.insert(lang, source, translated);
        self
    }

    pub fn insert(&mut self, lang: &str, source: &str, translated: &str) {
        self.entries.insert(
            (lang.to_string(), source.to_string()),
            translated.to_string(),
        );
    }

    pub fn lookup(&self, lang: &str, source: &str) -> Option<&str> {
        self.entries
            .get(&(lang.to_string(), source.to_string()))
            .map(String::as_str)
    }
}
