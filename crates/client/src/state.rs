use parley_api::{ChatId, ChatSummary, Message, User};

use crate::attachment::PendingAttachment;

/// Identifies one rendered message so it can be updated in place later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageSlot(pub u64);

impl MessageSlot {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub summary: ChatSummary,
    /// Filled once the chat has been opened or created locally.
    pub history: Option<Vec<Message>>,
}

/// Local copy of the user's chats, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDirectory {
    entries: Vec<ChatEntry>,
}

impl ChatDirectory {
    /// Replaces the whole list with the server's. Cached histories survive
    /// for chats that are still listed.
    pub fn replace_all(&mut self, summaries: Vec<ChatSummary>) {
        let mut previous = std::mem::take(&mut self.entries);
        self.entries = summaries
            .into_iter()
            .map(|summary| {
                let history = previous
                    .iter_mut()
                    .find(|entry| entry.summary.chat_id == summary.chat_id)
                    .and_then(|entry| entry.history.take());
                ChatEntry { summary, history }
            })
            .collect();
    }

    pub fn prepend(&mut self, summary: ChatSummary) {
        self.entries
            .retain(|entry| entry.summary.chat_id != summary.chat_id);
        self.entries.insert(
            0,
            ChatEntry {
                summary,
                history: Some(Vec::new()),
            },
        );
    }

    pub fn remove(&mut self, chat_id: &ChatId) -> Option<ChatEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.summary.chat_id == chat_id)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, chat_id: &ChatId) -> Option<&ChatEntry> {
        self.entries
            .iter()
            .find(|entry| &entry.summary.chat_id == chat_id)
    }

    pub fn contains(&self, chat_id: &ChatId) -> bool {
        self.get(chat_id).is_some()
    }

    pub fn title_of(&self, chat_id: &ChatId) -> Option<&str> {
        self.get(chat_id).map(|entry| entry.summary.title.as_str())
    }

    pub fn set_history(&mut self, chat_id: &ChatId, history: Vec<Message>) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| &entry.summary.chat_id == chat_id)
        {
            entry.history = Some(history);
        }
    }

    pub fn append_history(&mut self, chat_id: &ChatId, messages: impl IntoIterator<Item = Message>) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| &entry.summary.chat_id == chat_id)
        {
            entry.history.get_or_insert_with(Vec::new).extend(messages);
        }
    }

    pub fn ids(&self) -> Vec<ChatId> {
        self.entries
            .iter()
            .map(|entry| entry.summary.chat_id.clone())
            .collect()
    }

    pub fn summaries(&self) -> Vec<ChatSummary> {
        self.entries
            .iter()
            .map(|entry| entry.summary.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the client knows about the session between requests.
#[derive(Debug, Default)]
pub struct AppState {
    pub chats: ChatDirectory,
    pub current: Option<ChatId>,
    pub user: Option<User>,
    pub attachments: Vec<PendingAttachment>,
    next_slot: u64,
}

impl AppState {
    pub fn alloc_slot(&mut self) -> MessageSlot {
        let slot = MessageSlot::new(self.next_slot);
        self.next_slot += 1;
        slot
    }

    pub fn is_current(&self, chat_id: &ChatId) -> bool {
        self.current.as_ref() == Some(chat_id)
    }
}
