//! Conversation roles and rendered messages.
//!
//! Also handles the plain-text transcript format:
//!
//! ```text
//! System: You are a patient teacher.
//! Answer concisely.
//!
//! User: hi!
//! A: hello, what shall we study?
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PromptPackError;

/// Closed set of conversational roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PromptPackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" | "s" => Ok(Self::System),
            "user" | "u" => Ok(Self::User),
            "assistant" | "a" => Ok(Self::Assistant),
            other => Err(PromptPackError::validation(
                "role",
                format!("unknown role '{other}' (expected system, user or assistant)"),
            )),
        }
    }
}

/// One role-tagged message, ready for a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript format
// ---------------------------------------------------------------------------

/// Parse a plain-text transcript into messages.
///
/// A line of the form `Role: text` (or just `Role:`) starts a new message;
/// any other line continues the current one. Text before the first role
/// line becomes a system message. Message content is trimmed.
pub fn parse_conversation(input: &str) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut current: Option<Message> = None;

    for line in input.lines().map(str::trim) {
        if let Some((role, rest)) = split_role_line(line) {
            if let Some(done) = current.take() {
                messages.push(done);
            }
            current = Some(Message::new(role, rest));
            continue;
        }

        match current.as_mut() {
            Some(msg) => {
                msg.content.push('\n');
                msg.content.push_str(line);
            }
            None => current = Some(Message::new(Role::System, line)),
        }
    }

    if let Some(done) = current {
        messages.push(done);
    }

    messages
        .into_iter()
        .map(|m| Message::new(m.role, m.content.trim()))
        .collect()
}

/// Render messages as a transcript, one `role: content` block per message.
pub fn to_conversation_string(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn split_role_line(line: &str) -> Option<(Role, &str)> {
    let (head, rest) = line.split_once(':')?;
    let role = head.parse::<Role>().ok()?;
    Some((role, rest.trim()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
