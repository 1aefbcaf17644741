#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

use super::Message;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum GatewayName {
    Gemini,
}

/// Any failure talking to the text-generation service. Callers never branch
/// on the cause; the message is only for logs.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GatewayError {
    message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> GatewayError {
        return GatewayError {
            message: message.into(),
        };
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> GatewayError {
        return GatewayError::new(err.to_string());
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> GatewayError {
        return GatewayError::new(format!("Malformed response: {err}"));
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> GatewayError {
        return GatewayError::new(err.to_string());
    }
}

/// Lazy, finite and not restartable. Dropping it cancels the underlying
/// request.
pub type FragmentStream = BoxStream<'static, Result<String, GatewayError>>;

pub type SharedGateway = Arc<dyn Gateway>;

/// Settings every gateway adapter receives, independent of transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    pub model_id: String,
    pub system_instruction: String,
    pub request_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// `request_timeout` is in milliseconds; empty means no timeout.
    pub fn from_values(
        model_id: &str,
        system_instruction: &str,
        request_timeout: &str,
    ) -> Result<GatewayConfig> {
        if model_id.trim().is_empty() {
            bail!("A model must be configured to talk to the gateway");
        }

        let mut timeout = None;
        let request_timeout = request_timeout.trim();
        if !request_timeout.is_empty() {
            let millis = match request_timeout.parse::<u64>() {
                Ok(millis) => millis,
                Err(_) => bail!(format!(
                    "request-timeout must be a number of milliseconds, got '{request_timeout}'"
                )),
            };
            timeout = Some(Duration::from_millis(millis));
        }

        return Ok(GatewayConfig {
            model_id: model_id.trim().to_string(),
            system_instruction: system_instruction.to_string(),
            request_timeout: timeout,
        });
    }

    pub fn from_config() -> Result<GatewayConfig> {
        return GatewayConfig::from_values(
            &Config::get(ConfigKey::Model),
            &Config::get(ConfigKey::SystemInstruction),
            &Config::get(ConfigKey::RequestTimeout),
        );
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    fn name(&self) -> GatewayName;

    /// Used when a chat starts to warn early about a missing token or an
    /// unreachable service.
    async fn health_check(&self) -> anyhow::Result<()>;

    /// Streams the reply to `new_message`. `history` is the whole transcript
    /// and already ends with the user's `new_message`; adapters built around
    /// a "send message" call must not send it twice. Nothing is remembered
    /// between calls.
    async fn stream_converse(
        &self,
        history: Vec<Message>,
        new_message: String,
    ) -> Result<FragmentStream, GatewayError>;

    /// One completed text for `prompt`, or an error. Never partial.
    async fn generate(&self, prompt: String) -> Result<String, GatewayError>;
}
