//! Prompt builder and budget packer.
//!
//! A [`Prompt`] is an ordered collection of prioritized [`Part`]s. Parts are
//! appended in conversation order, each carrying its own priority and its
//! own rules for how it may shrink. [`Prompt::pack`] reduces a working copy
//! until its token estimate fits a budget and renders the survivors, in
//! append order, as role-tagged [`Message`]s.
//!
//! Reduction works one step at a time. Each step picks the lowest-priority
//! part that can still be truncated and truncates it once; when nothing is
//! truncatable it omits the lowest-priority omittable part, either
//! replacing its text with an omission message or removing it. Adjacent
//! identical omission messages are coalesced.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::PromptSettings;
use crate::message::{Message, Role};
use crate::report::{self, PackReport};
use crate::tokens::{char_len, CharEstimator, TokenEstimator};
use crate::utils::truncate_tail;

/// Truncation never goes below this many tokens, leaving room for the ellipsis.
const MIN_TRUNCATED_TOKENS: usize = 4;
/// Character counterpart of [`MIN_TRUNCATED_TOKENS`].
const MIN_TRUNCATED_CHARS: usize = 4;
/// Slack added to every reduction request, since token counts are estimates.
const REDUCTION_SLACK: usize = 2;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Stable identifier of a part within one [`Prompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(u64);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One prioritized fragment of prompt content.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: PartId,
    pub text: String,
    pub role: Role,
    /// Lower priorities are reduced first.
    pub priority: f64,
    /// Minimum length in characters this part may be truncated to.
    /// `None` once truncated, or if the part was never truncatable.
    pub truncate_to: Option<usize>,
    pub omittable: bool,
    /// Replacement text used on omission; `None` removes the part instead.
    pub omission_message: Option<String>,
    /// Set once the text has been replaced by the omission message.
    pub dedupe_eligible: bool,
}

/// How a newly appended part may be reduced.
///
/// ```
/// use promptpack::prompt::AppendOptions;
///
/// let opts = AppendOptions::new()
///     .priority(40.0)
///     .truncate_to(200)
///     .omit_with("[Older messages hidden]");
/// assert!(opts.omittable);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppendOptions {
    /// Defaults to the number of parts already in the prompt.
    pub priority: Option<f64>,
    pub truncate_to: Option<usize>,
    pub omittable: bool,
    pub omission_message: Option<String>,
}

impl AppendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn truncate_to(mut self, chars: usize) -> Self {
        self.truncate_to = Some(chars);
        self
    }

    /// Allow the part to be removed outright.
    pub fn omittable(mut self) -> Self {
        self.omittable = true;
        self
    }

    /// Allow the part to be omitted, leaving `message` in its place.
    pub fn omit_with(mut self, message: impl Into<String>) -> Self {
        self.omittable = true;
        self.omission_message = Some(message.into());
        self
    }
}

/// An ordered, prioritized set of parts for a single LLM request.
#[derive(Debug, Clone)]
pub struct Prompt {
    estimator: CharEstimator,
    joiner: String,
    role_overhead: usize,
    parts: IndexMap<PartId, Part>,
    next_id: u64,
}

impl Default for Prompt {
    fn default() -> Self {
        Self::with_settings(&PromptSettings::default())
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

impl Prompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &PromptSettings) -> Self {
        Self {
            estimator: CharEstimator::new(settings.chars_per_token),
            joiner: settings.joiner.clone(),
            role_overhead: settings.role_overhead,
            parts: IndexMap::new(),
            next_id: 0,
        }
    }

    /// Append a part at the end of the prompt and return its id.
    pub fn append(&mut self, text: impl Into<String>, role: Role, options: AppendOptions) -> PartId {
        let id = PartId(self.next_id);
        self.next_id += 1;

        let priority = options.priority.unwrap_or(self.parts.len() as f64);
        self.parts.insert(
            id,
            Part {
                id,
                text: text.into(),
                role,
                priority,
                truncate_to: options.truncate_to,
                omittable: options.omittable,
                omission_message: options.omission_message,
                dedupe_eligible: false,
            },
        );
        id
    }

    /// Append a part with default options: appended-order priority, never reduced.
    pub fn push(&mut self, text: impl Into<String>, role: Role) -> PartId {
        self.append(text, role, AppendOptions::default())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get(&id)
    }

    /// Parts in append order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn estimator(&self) -> &CharEstimator {
        &self.estimator
    }

    /// Render every current part as a message, in append order.
    pub fn messages(&self) -> Vec<Message> {
        self.parts
            .values()
            .map(|p| Message::new(p.role, p.text.clone()))
            .collect()
    }

    /// All part texts joined with the joiner.
    pub fn text(&self) -> String {
        self.parts
            .values()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.joiner)
    }

    /// Estimated token count of the whole prompt, role tags and joiners included.
    pub fn estimate_tokens(&self) -> usize {
        // Tiny ratios push per-part estimates to usize::MAX; saturate instead of overflowing.
        let parts = self
            .parts
            .values()
            .map(|p| self.part_tokens(p))
            .fold(0, usize::saturating_add);
        let joiners = char_len(&self.joiner).saturating_mul(self.parts.len().saturating_sub(1));
        parts.saturating_add(self.estimator.chars_to_tokens(joiners))
    }

    fn part_tokens(&self, part: &Part) -> usize {
        self.estimator
            .chars_to_tokens(char_len(&part.text).saturating_add(self.role_overhead))
    }
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

impl Prompt {
    /// Reduce a copy of this prompt to `budget` tokens and render it.
    ///
    /// Always returns the best effort, which may still exceed the budget
    /// when nothing else can be truncated or omitted.
    pub fn pack(&self, budget: usize) -> Vec<Message> {
        let mut working = self.clone();
        working.reduce_to_budget(budget);
        working.messages()
    }

    /// Like [`Prompt::pack`], also describing what happened to every part.
    pub fn pack_with_report(&self, budget: usize) -> (Vec<Message>, PackReport) {
        let mut working = self.clone();
        let mut deduped = Vec::new();
        working.reduce_tracking(budget, &mut deduped);
        let report = report::build_report(self, &working, &deduped, budget);
        (working.messages(), report)
    }

    /// Shrink this prompt in place until it fits `budget`.
    ///
    /// Returns `false` if every reduction was exhausted while still over
    /// budget; the prompt is then left maximally reduced.
    pub fn reduce_to_budget(&mut self, budget: usize) -> bool {
        self.reduce_tracking(budget, &mut Vec::new())
    }

    fn reduce_tracking(&mut self, budget: usize, deduped: &mut Vec<PartId>) -> bool {
        loop {
            let estimate = self.estimate_tokens();
            if estimate <= budget {
                return true;
            }
            let wanted = (estimate - budget).saturating_add(REDUCTION_SLACK);
            trace!(estimate, budget, wanted, "reducing prompt");
            if !self.reduce_once(wanted, deduped) {
                debug!(estimate, budget, "no reducible parts left");
                return false;
            }
        }
    }

    /// Apply a single reduction step. Returns `false` when nothing can be reduced.
    fn reduce_once(&mut self, tokens_to_reduce_by: usize, deduped: &mut Vec<PartId>) -> bool {
        // Truncation first: shortened content beats missing content.
        let truncatable = self.lowest_priority(|p| {
            p.truncate_to
                .is_some_and(|floor| floor < char_len(&p.text))
        });
        if let Some(id) = truncatable {
            self.truncate_part(id, tokens_to_reduce_by);
            return true;
        }

        if let Some(id) = self.lowest_priority(|p| p.omittable) {
            self.omit_part(id, deduped);
            return true;
        }

        false
    }

    /// Lowest-priority part matching `eligible`; the earliest wins ties.
    fn lowest_priority(&self, eligible: impl Fn(&Part) -> bool) -> Option<PartId> {
        self.parts
            .values()
            .filter(|p| eligible(*p))
            .min_by(|a, b| a.priority.total_cmp(&b.priority))
            .map(|p| p.id)
    }

    fn truncate_part(&mut self, id: PartId, tokens_to_reduce_by: usize) {
        let estimator = self.estimator;
        let Some(part) = self.parts.get_mut(&id) else {
            return;
        };

        // A part is truncated at most once; afterwards it can only be omitted.
        let floor = part.truncate_to.take().unwrap_or(0);
        let old_len = char_len(&part.text);
        let new_tokens = estimator
            .chars_to_tokens(old_len)
            .saturating_sub(tokens_to_reduce_by)
            .max(estimator.chars_to_tokens(floor))
            .max(MIN_TRUNCATED_TOKENS);
        let new_len = estimator
            .tokens_to_chars(new_tokens)
            .max(floor)
            .max(MIN_TRUNCATED_CHARS);

        part.text = truncate_tail(&part.text, new_len);
        debug!(
            part = %id,
            priority = part.priority,
            from = old_len,
            to = char_len(&part.text),
            "truncated part"
        );
    }

    fn omit_part(&mut self, id: PartId, deduped: &mut Vec<PartId>) {
        let Some(part) = self.parts.get_mut(&id) else {
            return;
        };

        let Some(message) = part.omission_message.clone() else {
            debug!(part = %id, priority = part.priority, "removed part");
            self.parts.shift_remove(&id);
            return;
        };

        part.text = message;
        part.omittable = false;
        part.truncate_to = None;
        part.dedupe_eligible = true;
        debug!(part = %id, priority = part.priority, "replaced part with omission message");
        self.dedupe(deduped);
    }

    /// Drop dedupe-eligible parts that repeat the previous kept part.
    fn dedupe(&mut self, deduped: &mut Vec<PartId>) {
        let mut duplicates = Vec::new();
        let mut last_kept: Option<&Part> = None;
        for part in self.parts.values() {
            let repeats = part.dedupe_eligible
                && last_kept.is_some_and(|last| {
                    last.dedupe_eligible && last.text == part.text && last.role == part.role
                });
            if repeats {
                duplicates.push(part.id);
            } else {
                last_kept = Some(part);
            }
        }

        if duplicates.is_empty() {
            return;
        }
        debug!(count = duplicates.len(), "coalesced repeated omission messages");
        self.parts.retain(|id, _| !duplicates.contains(id));
        deduped.extend(duplicates);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
