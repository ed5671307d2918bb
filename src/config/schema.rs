use crate::batch::EditPolicy;
use crate::hit::ReplacementOptions;
use crate::ts::{language_for_glob, language_named};
use ast_grep_language::SupportLang;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// An edit plan: a list of batch edits run in order.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditPlan {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

impl EditPlan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        for edit in &self.edits {
            let id = (!edit.id.trim().is_empty()).then(|| edit.id.clone());
            if id.is_none() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            } else if !seen.insert(edit.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId(edit.id.clone()));
            }

            for (field, value) in [("glob", &edit.glob), ("query", &edit.query)] {
                if value.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        edit_id: id.clone(),
                        field,
                    });
                }
            }

            if edit.language().is_none() {
                let message = match &edit.language {
                    Some(name) => format!("unknown language '{name}'"),
                    None => format!(
                        "cannot infer a language from glob '{}'; set `language`",
                        edit.glob
                    ),
                };
                issues.push(ValidationIssue::InvalidCombo {
                    edit_id: id.clone(),
                    message,
                });
            }

            match &edit.action {
                Action::Prepend { text } | Action::Append { text } if text.is_empty() => {
                    issues.push(ValidationIssue::MissingField {
                        edit_id: id.clone(),
                        field: "action.text",
                    });
                }
                _ => {}
            }

            if let Some(cleanup) = &edit.cleanup {
                if matches!(edit.action, Action::Prepend { .. } | Action::Append { .. }) {
                    issues.push(ValidationIssue::InvalidCombo {
                        edit_id: id.clone(),
                        message: "cleanup only applies to zap and replace actions".to_string(),
                    });
                }
                if let Err(e) = cleanup.options() {
                    issues.push(ValidationIssue::InvalidCombo {
                        edit_id: id.clone(),
                        message: format!("invalid cleanup pattern: {e}"),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub id: String,
    /// Project-relative glob selecting the files to edit.
    pub glob: String,
    /// Grammar name or extension. Inferred from `glob` when absent.
    #[serde(default)]
    pub language: Option<String>,
    pub query: String,
    #[serde(default)]
    pub engine: Engine,
    pub action: Action,
    #[serde(default)]
    pub cleanup: Option<Cleanup>,
}

impl EditDefinition {
    pub fn language(&self) -> Option<SupportLang> {
        match &self.language {
            Some(name) => language_named(name),
            None => language_for_glob(&self.glob),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Path expressions over the parsed tree
    #[default]
    Path,
    /// ast-grep code patterns
    Pattern,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Zap,
    Replace {
        #[serde(default)]
        text: String,
    },
    Prepend {
        text: String,
    },
    Append {
        text: String,
    },
}

impl Action {
    pub fn policy(&self) -> EditPolicy {
        match self {
            Action::Zap => EditPolicy::Zap,
            Action::Replace { text } => EditPolicy::Replace(text.clone()),
            Action::Prepend { text } => EditPolicy::Prepend(text.clone()),
            Action::Append { text } => EditPolicy::Append(text.clone()),
        }
    }
}

/// Text to rewrite right after each edited value.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Cleanup {
    /// Regex whose first match after the edit point is replaced.
    pub after: String,
    #[serde(default)]
    pub replacement: String,
}

impl Cleanup {
    pub fn options(&self) -> Result<ReplacementOptions, regex::Error> {
        ReplacementOptions::replace_after(&self.after, self.replacement.clone())
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut issues = self.issues.iter();
        if let Some(first) = issues.next() {
            write!(f, "  - {first}")?;
        }
        for issue in issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    DuplicateId(String),
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        edit_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit plan contains no edits"),
            ValidationIssue::DuplicateId(id) => write!(f, "edit id '{id}' is used more than once"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}' missing required field '{field}'"),
                None => write!(f, "edit missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}' is invalid: {message}"),
                None => write!(f, "invalid edit: {message}"),
            },
        }
    }
}
