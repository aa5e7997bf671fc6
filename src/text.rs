use std::collections::VecDeque;

use crate::world::Serial;

/// How long an annotation stays up unless told otherwise.
pub const DEFAULT_TEXT_LIFETIME_MS: f64 = 4_000.0;

const MAX_ENTRIES: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    /// Item the text is attached to.
    pub owner: Serial,
    pub text: String,
    pub expires_at_ms: f64,
}

/// Timed text annotations shown over items in a container window.
///
/// Independent of the window's item widgets: rebuilding the items keeps the
/// annotations.
#[derive(Debug, Clone, Default)]
pub struct TextContainer {
    entries: VecDeque<TextEntry>,
}

impl TextContainer {
    pub fn add(&mut self, owner: Serial, text: impl Into<String>, now_ms: f64) {
        self.add_with_lifetime(owner, text, now_ms, DEFAULT_TEXT_LIFETIME_MS);
    }

    /// Add an entry; the oldest entry is dropped when full.
    pub fn add_with_lifetime(
        &mut self,
        owner: Serial,
        text: impl Into<String>,
        now_ms: f64,
        lifetime_ms: f64,
    ) {
        if self.entries.len() == MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(TextEntry {
            owner,
            text: text.into(),
            expires_at_ms: now_ms + lifetime_ms,
        });
    }

    /// Drop entries that expired at or before `now_ms`.
    pub fn expire(&mut self, now_ms: f64) {
        self.entries.retain(|e| e.expires_at_ms > now_ms);
    }

    pub fn entries_for(&self, owner: Serial) -> impl Iterator<Item = &TextEntry> {
        self.entries.iter().filter(move |e| e.owner == owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
