#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use super::Locale;
use super::Message;

/// An in-memory conversation. Closed messages sit in `history` in the order
/// they were written; the reply currently streaming in is held apart in
/// `open_tail` and only joins the history once its turn closes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationSession {
    history: Vec<Message>,
    open_tail: Option<Message>,
}

impl ConversationSession {
    pub fn new() -> ConversationSession {
        return ConversationSession::default();
    }

    pub fn with_greeting(locale: Locale) -> ConversationSession {
        return ConversationSession {
            history: vec![Message::assistant(locale.greeting())],
            open_tail: None,
        };
    }

    /// True exactly while a reply is streaming.
    pub fn pending(&self) -> bool {
        return self.open_tail.is_some();
    }

    pub fn history(&self) -> &[Message] {
        return &self.history;
    }

    pub fn open_tail(&self) -> Option<&Message> {
        return self.open_tail.as_ref();
    }

    /// Every message in conversational order, including the open tail.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = self.history.clone();
        if let Some(tail) = &self.open_tail {
            messages.push(tail.clone());
        }

        return messages;
    }

    pub fn last(&self) -> Option<&Message> {
        if self.open_tail.is_some() {
            return self.open_tail.as_ref();
        }

        return self.history.last();
    }

    pub fn len(&self) -> usize {
        return self.history.len() + usize::from(self.open_tail.is_some());
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Appends the user's message and opens an empty assistant reply.
    /// Returns false, changing nothing, while another reply is streaming.
    pub fn open_turn(&mut self, text: &str) -> bool {
        if self.pending() {
            return false;
        }

        self.history.push(Message::user(text));
        self.open_tail = Some(Message::assistant(""));

        return true;
    }

    /// Overwrites the open reply's text. No-op when no turn is open.
    pub fn set_tail_text(&mut self, text: &str) {
        if let Some(tail) = self.open_tail.as_mut() {
            tail.text = text.to_string();
        }
    }

    /// Moves the open reply, as it currently reads, into the history.
    pub fn close_turn(&mut self) {
        if let Some(tail) = self.open_tail.take() {
            self.history.push(tail);
        }
    }
}
