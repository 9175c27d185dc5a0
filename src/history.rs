//! Chat history appended under a recency policy.
//!
//! The newest turns of a conversation are pinned at high priority. Older
//! turns lose priority the further back they sit, and collapse into a
//! shared placeholder when the budget runs short.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::prompt::{AppendOptions, PartId, Prompt};

/// How prior conversation turns are prioritized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryPolicy {
    /// Number of newest turns that are never omitted.
    pub keep_recent: usize,
    pub recent_priority: f64,
    /// Priority of the first older turn; each step further back is one lower.
    pub older_priority: f64,
    /// Truncation floor applied to every turn.
    pub truncate_to: Option<usize>,
    pub omission_message: String,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            keep_recent: 3,
            recent_priority: 85.0,
            older_priority: 40.0,
            truncate_to: Some(200),
            omission_message: "[Older messages hidden]".into(),
        }
    }
}

impl HistoryPolicy {
    /// Append options for a turn `distance` messages from the end (0 = newest).
    pub fn options_for(&self, distance: usize) -> AppendOptions {
        let mut options = if distance < self.keep_recent {
            AppendOptions::new().priority(self.recent_priority)
        } else {
            AppendOptions::new()
                .priority(self.older_priority - distance as f64)
                .omit_with(self.omission_message.clone())
        };
        options.truncate_to = self.truncate_to;
        options
    }
}

/// Append `messages` (oldest first) to `prompt`, returning the new part ids.
pub fn append_history(prompt: &mut Prompt, messages: &[Message], policy: &HistoryPolicy) -> Vec<PartId> {
    let count = messages.len();
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            let distance = count - 1 - index;
            prompt.append(message.content.clone(), message.role, policy.options_for(distance))
        })
        .collect()
}
