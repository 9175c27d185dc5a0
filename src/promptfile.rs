//! On-disk prompt descriptions.
//!
//! A prompt file lists explicit parts (with their reduction rules) followed
//! by optional chat history. JSON and TOML are selected by extension; any
//! other file is read as a plain transcript and becomes history.
//!
//! ```toml
//! [[parts]]
//! role = "system"
//! text = "You are a patient teacher."
//! priority = 100
//!
//! [[parts]]
//! role = "system"
//! text = "So far the course has covered: ..."
//! priority = 80
//! truncate_to = 100
//!
//! [[history]]
//! role = "user"
//! content = "What is a monad?"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::PromptSettings;
use crate::error::{PromptPackError, Result};
use crate::history::{self, HistoryPolicy};
use crate::message::{self, Message, Role};
use crate::prompt::{AppendOptions, Prompt};

/// A prompt description loaded from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptFile {
    pub parts: Vec<PartEntry>,
    pub history: Vec<Message>,
}

/// One explicit part in a prompt file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartEntry {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_to: Option<usize>,
    #[serde(default)]
    pub omittable: bool,
    /// Setting a message implies `omittable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omission_message: Option<String>,
}

impl PartEntry {
    fn options(&self) -> AppendOptions {
        AppendOptions {
            priority: self.priority,
            truncate_to: self.truncate_to,
            omittable: self.omittable || self.omission_message.is_some(),
            omission_message: self.omission_message.clone(),
        }
    }
}

impl PromptFile {
    /// Build a prompt: explicit parts first, then history under `policy`.
    pub fn into_prompt(&self, settings: &PromptSettings, policy: &HistoryPolicy) -> Prompt {
        let mut prompt = Prompt::with_settings(settings);
        for entry in &self.parts {
            prompt.append(entry.text.clone(), entry.role, entry.options());
        }
        history::append_history(&mut prompt, &self.history, policy);
        prompt
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.history.is_empty()
    }

    /// Reject priorities that cannot be ordered or written back as JSON.
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.parts.iter().enumerate() {
            if entry.priority.is_some_and(|p| !p.is_finite()) {
                return Err(PromptPackError::validation(
                    format!("parts[{i}].priority"),
                    "must be finite",
                ));
            }
        }
        Ok(())
    }
}

/// Input syntax of a prompt file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Json,
    Toml,
    Transcript,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Transcript,
        }
    }
}

/// Parse prompt-file content of the given kind.
pub fn parse(content: &str, kind: InputKind, origin: &str) -> Result<PromptFile> {
    let what = format!("prompt file '{origin}'");
    let file: PromptFile = match kind {
        InputKind::Json => serde_json::from_str(content)
            .map_err(|e| PromptPackError::parse_with_source(what, e))?,
        InputKind::Toml => {
            toml::from_str(content).map_err(|e| PromptPackError::parse_with_source(what, e))?
        }
        InputKind::Transcript => PromptFile {
            parts: Vec::new(),
            history: message::parse_conversation(content),
        },
    };
    file.validate()?;
    Ok(file)
}

/// Read and parse a prompt file, choosing the syntax by extension.
pub fn load(path: &Path) -> Result<PromptFile> {
    if !path.is_file() {
        return Err(PromptPackError::invalid_path(
            path.display().to_string(),
            "prompt file does not exist",
        ));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| PromptPackError::io(format!("reading prompt file '{}'", path.display()), e))?;
    let kind = InputKind::from_path(path);
    tracing::debug!(path = %path.display(), ?kind, "loading prompt file");
    parse(&content, kind, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "parts": [
            { "role": "system", "text": "You are a patient teacher.", "priority": 100 },
            { "role": "system", "text": "Units so far: intro, lists", "priority": 80, "truncate_to": 10 },
            { "role": "system", "text": "Conversation:", "priority": 100 }
        ],
        "history": [
            { "role": "user", "content": "hi" },
            { "role": "assistant", "content": "hello!" }
        ]
    }"#;

    #[test]
    fn parses_json() {
        let file = parse(JSON, InputKind::Json, "test.json").unwrap();
        assert_eq!(file.parts.len(), 3);
        assert_eq!(file.parts[1].truncate_to, Some(10));
        assert_eq!(file.history[1], Message::new(Role::Assistant, "hello!"));
    }

    #[test]
    fn parses_toml() {
        let toml = r#"
            [[parts]]
            role = "system"
            text = "rules"
            omission_message = "[rules hidden]"

            [[history]]
            role = "user"
            content = "question"
        "#;
        let file = parse(toml, InputKind::Toml, "test.toml").unwrap();
        assert_eq!(file.parts[0].omission_message.as_deref(), Some("[rules hidden]"));
        assert_eq!(file.history.len(), 1);
    }

    #[test]
    fn transcript_becomes_history() {
        let file = parse("System: be kind\nUser: hi", InputKind::Transcript, "chat.txt").unwrap();
        assert!(file.parts.is_empty());
        assert_eq!(file.history.len(), 2);
        assert_eq!(file.history[0].role, Role::System);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse(
            r#"{"parts": [{"role": "user", "text": "x", "weight": 3}]}"#,
            InputKind::Json,
            "bad.json",
        )
        .unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(parse(
            r#"{"parts": [{"role": "narrator", "text": "x"}]}"#,
            InputKind::Json,
            "bad.json"
        )
        .is_err());
    }

    #[test]
    fn non_finite_priority_is_rejected() {
        let toml = r#"
            [[parts]]
            role = "system"
            text = "rules"

            [[parts]]
            role = "user"
            text = "x"
            priority = nan
        "#;
        let err = parse(toml, InputKind::Toml, "nan.toml").unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("parts[1].priority"));
        assert!(err.to_string().contains("must be finite"));
    }

    #[test]
    fn omission_message_implies_omittable() {
        let entry = PartEntry {
            role: Role::User,
            text: "x".into(),
            priority: None,
            truncate_to: None,
            omittable: false,
            omission_message: Some("[gone]".into()),
        };
        assert!(entry.options().omittable);
    }

    #[test]
    fn builds_prompt_in_file_order() {
        let file = parse(JSON, InputKind::Json, "test.json").unwrap();
        let prompt = file.into_prompt(&PromptSettings::default(), &HistoryPolicy::default());
        let messages = prompt.messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].content, "You are a patient teacher.");
        assert_eq!(messages[4].content, "hello!");
    }

    #[test]
    fn input_kind_by_extension() {
        assert_eq!(InputKind::from_path(Path::new("a.json")), InputKind::Json);
        assert_eq!(InputKind::from_path(Path::new("a.TOML")), InputKind::Toml);
        assert_eq!(InputKind::from_path(Path::new("chat.txt")), InputKind::Transcript);
        assert_eq!(InputKind::from_path(Path::new("chat")), InputKind::Transcript);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
