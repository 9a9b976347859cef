//! The message store — an ordered, append-only log of turns.
//!
//! Turns are appended in submission order (insertion order = chronological
//! order = display order) and mutated in place while streaming. The only
//! mutation path after creation is [`Transcript::mutate`]; presentation
//! layers consume [`Transcript::snapshot`] copies and can never alias the
//! live store.

use crate::conversation::entities::{Turn, TurnId};
use crate::core::error::TranscriptError;

/// Ordered sequence of conversation turns with arena-style id assignment.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next turn id.
    ///
    /// Ids stay unique across [`clear`](Self::clear) so a stale snapshot can
    /// never alias a turn from a later conversation.
    fn allocate_id(&mut self) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a completed user turn; returns its id.
    pub fn append_user(&mut self, content: impl Into<String>) -> TurnId {
        let id = self.allocate_id();
        self.turns.push(Turn::user(id, content));
        id
    }

    /// Append an empty pending assistant turn; returns its id.
    pub fn append_assistant(&mut self) -> TurnId {
        let id = self.allocate_id();
        self.turns.push(Turn::assistant(id));
        id
    }

    /// Apply a patch to the identified turn.
    ///
    /// Strict: patching a turn that does not exist signals
    /// [`TranscriptError::UnknownTurn`] instead of silently doing nothing —
    /// under correct controller use this cannot happen, and silence would
    /// hide the controller bug that made it happen.
    pub fn mutate<R>(
        &mut self,
        id: TurnId,
        patch: impl FnOnce(&mut Turn) -> R,
    ) -> Result<R, TranscriptError> {
        match self.turns.iter_mut().find(|t| t.id == id) {
            Some(turn) => Ok(patch(turn)),
            None => Err(TranscriptError::UnknownTurn(id)),
        }
    }

    /// Read access to a single turn.
    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// Immutable copy of the full turn sequence, in display order.
    ///
    /// O(n) copy-on-read: mutating the returned turns never affects the
    /// live store, and the store mutating later never affects the copy.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Drop all turns. Id assignment keeps counting.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
