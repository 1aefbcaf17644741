#[cfg(test)]
#[path = "tasks_test.rs"]
mod tests;

use tokio::sync::watch;

use super::pending::PendingGuard;
use crate::domain::models::Locale;
use crate::domain::models::SharedGateway;
use crate::domain::models::TaskRequest;
use crate::domain::models::TaskType;

/// Single-slot controller for the one-shot analyze, title and rewrite tools.
pub struct TaskController {
    gateway: SharedGateway,
    locale: Locale,
    state: watch::Sender<TaskRequest>,
}

impl TaskController {
    pub fn new(gateway: SharedGateway, locale: Locale) -> TaskController {
        let (state, _) = watch::channel(TaskRequest::default());
        return TaskController {
            gateway,
            locale,
            state,
        };
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskRequest> {
        return self.state.subscribe();
    }

    pub fn snapshot(&self) -> TaskRequest {
        return self.state.borrow().clone();
    }

    pub fn is_pending(&self) -> bool {
        return self.state.borrow().pending;
    }

    pub fn locale(&self) -> Locale {
        return self.locale;
    }

    pub fn result(&self) -> String {
        return self.state.borrow().result.to_string();
    }

    pub async fn generate(&self, task_type: TaskType, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            tracing::trace!("Ignoring empty task content");
            return;
        }

        let accepted = self
            .state
            .send_if_modified(|request| return request.begin(task_type, content));
        if !accepted {
            tracing::trace!(task = %task_type, "A task is still running, dropping request");
            return;
        }

        let _guard = PendingGuard::new(&self.state, TaskRequest::finish);
        tracing::debug!(task = %task_type, content_len = content.len(), "Starting task");

        let result = match self.gateway.generate(task_type.prompt(content)).await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = ?err, task = %task_type, "Gateway failed to generate");
                self.locale.task_fallback().to_string()
            }
        };

        self.state.send_modify(|request| request.result = result);
    }
}
