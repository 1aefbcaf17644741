use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::domain::models::FragmentStream;
use crate::domain::models::Gateway;
use crate::domain::models::GatewayError;
use crate::domain::models::GatewayName;
use crate::domain::models::Message;

enum Turn {
    Fails(GatewayError),
    Streams(FragmentStream),
}

enum Completion {
    Ready(Result<String, GatewayError>),
    Deferred(oneshot::Receiver<Result<String, GatewayError>>),
}

/// In-memory gateway for controller tests. Replies are queued up front and
/// every call is recorded.
#[derive(Default)]
pub struct ScriptedGateway {
    turns: Mutex<VecDeque<Turn>>,
    completions: Mutex<VecDeque<Completion>>,
    conversations: Mutex<Vec<(Vec<Message>, String)>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn push_fragments(&self, fragments: Vec<Result<String, GatewayError>>) {
        let turn = Turn::Streams(stream::iter(fragments).boxed());
        self.turns.lock().unwrap().push_back(turn);
    }

    /// Queues a turn whose fragments are fed by the test. The stream ends
    /// once the returned sender is dropped.
    pub fn push_channel(&self) -> mpsc::UnboundedSender<Result<String, GatewayError>> {
        let (tx, rx) = mpsc::unbounded_channel::<Result<String, GatewayError>>();
        let fragments = stream::unfold(rx, |mut rx| async move {
            let fragment = rx.recv().await?;
            return Some((fragment, rx));
        });

        self.turns
            .lock()
            .unwrap()
            .push_back(Turn::Streams(fragments.boxed()));

        return tx;
    }

    pub fn push_turn_failure(&self, message: &str) {
        self.turns
            .lock()
            .unwrap()
            .push_back(Turn::Fails(GatewayError::new(message)));
    }

    pub fn push_completion(&self, completion: Result<String, GatewayError>) {
        self.completions
            .lock()
            .unwrap()
            .push_back(Completion::Ready(completion));
    }

    /// Queues a completion that resolves when the test sends on the
    /// returned channel.
    pub fn push_deferred_completion(&self) -> oneshot::Sender<Result<String, GatewayError>> {
        let (tx, rx) = oneshot::channel();
        self.completions
            .lock()
            .unwrap()
            .push_back(Completion::Deferred(rx));

        return tx;
    }

    pub fn conversations(&self) -> Vec<(Vec<Message>, String)> {
        return self.conversations.lock().unwrap().clone();
    }

    pub fn prompts(&self) -> Vec<String> {
        return self.prompts.lock().unwrap().clone();
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    fn name(&self) -> GatewayName {
        return GatewayName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stream_converse(
        &self,
        history: Vec<Message>,
        new_message: String,
    ) -> Result<FragmentStream, GatewayError> {
        self.conversations
            .lock()
            .unwrap()
            .push((history, new_message));

        let turn = self.turns.lock().unwrap().pop_front();
        match turn {
            Some(Turn::Streams(fragments)) => return Ok(fragments),
            Some(Turn::Fails(err)) => return Err(err),
            None => return Err(GatewayError::new("No scripted turn left")),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, prompt: String) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt);

        let completion = self.completions.lock().unwrap().pop_front();
        match completion {
            Some(Completion::Ready(res)) => return res,
            Some(Completion::Deferred(rx)) => {
                return rx
                    .await
                    .unwrap_or_else(|_| return Err(GatewayError::new("Deferred completion dropped")));
            }
            None => return Err(GatewayError::new("No scripted completion left")),
        }
    }
}
