#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use futures::StreamExt;
use tokio::sync::watch;

use super::pending::PendingGuard;
use crate::domain::models::ConversationSession;
use crate::domain::models::GatewayError;
use crate::domain::models::Locale;
use crate::domain::models::Message;
use crate::domain::models::SharedGateway;

/// Drives one chat session against the gateway. At most one reply streams at
/// a time; submissions made meanwhile are dropped.
pub struct ConversationController {
    gateway: SharedGateway,
    locale: Locale,
    state: watch::Sender<ConversationSession>,
}

impl ConversationController {
    pub fn new(gateway: SharedGateway, locale: Locale) -> ConversationController {
        return ConversationController::with_session(gateway, locale, ConversationSession::new());
    }

    pub fn with_session(
        gateway: SharedGateway,
        locale: Locale,
        session: ConversationSession,
    ) -> ConversationController {
        let (state, _) = watch::channel(session);
        return ConversationController {
            gateway,
            locale,
            state,
        };
    }

    /// Notified after every change, including each streamed fragment.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSession> {
        return self.state.subscribe();
    }

    pub fn snapshot(&self) -> Vec<Message> {
        return self.state.borrow().messages();
    }

    pub fn is_pending(&self) -> bool {
        return self.state.borrow().pending();
    }

    pub async fn submit(&self, raw_input: &str) {
        let text = raw_input.trim();
        if text.is_empty() {
            tracing::trace!("Ignoring empty submission");
            return;
        }

        let mut history: Vec<Message> = vec![];
        let accepted = self.state.send_if_modified(|session| {
            if !session.open_turn(text) {
                return false;
            }

            history = session.history().to_vec();
            return true;
        });

        if !accepted {
            tracing::trace!("A reply is still streaming, dropping submission");
            return;
        }

        let _guard = PendingGuard::new(&self.state, ConversationSession::close_turn);
        tracing::debug!(history_len = history.len(), "Starting conversation turn");

        if let Err(err) = self.stream_reply(history, text.to_string()).await {
            tracing::error!(error = ?err, "Gateway failed while streaming a reply");
            let fallback = self.locale.chat_fallback();
            self.state
                .send_modify(|session| session.set_tail_text(fallback));
        }
    }

    async fn stream_reply(
        &self,
        history: Vec<Message>,
        new_message: String,
    ) -> Result<(), GatewayError> {
        let mut fragments = self.gateway.stream_converse(history, new_message).await?;

        let mut reply = "".to_string();
        while let Some(fragment) = fragments.next().await {
            reply += &fragment?;
            self.state.send_modify(|session| session.set_tail_text(&reply));
        }

        tracing::debug!(reply_len = reply.len(), "Conversation turn finished");

        return Ok(());
    }
}
