//! Deterministic, priority-driven prompt packing for LLM token budgets.
//!
//! Build a [`Prompt`] from prioritized parts, then [`Prompt::pack`] it to a
//! token budget:
//!
//! ```
//! use promptpack::{AppendOptions, Prompt, Role};
//!
//! let mut prompt = Prompt::new();
//! prompt.append("You are a patient teacher.", Role::System, AppendOptions::new().priority(100.0));
//! prompt.append(
//!     "An earlier, long-winded exchange. ".repeat(20),
//!     Role::User,
//!     AppendOptions::new().priority(10.0).omit_with("[Older messages hidden]"),
//! );
//! prompt.append("What is a monad?", Role::User, AppendOptions::new().priority(90.0));
//!
//! let messages = prompt.pack(40);
//! assert_eq!(messages.len(), 3);
//! assert_eq!(messages[1].content, "[Older messages hidden]");
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod message;
pub mod output;
pub mod prompt;
pub mod promptfile;
pub mod report;
pub mod tokens;
pub mod utils;

pub use message::{Message, Role};
pub use prompt::{AppendOptions, Part, PartId, Prompt};
pub use tokens::{CharEstimator, TokenEstimator};
