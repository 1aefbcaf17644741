#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use futures::stream::TryStreamExt;
use futures::StreamExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::FragmentStream;
use crate::domain::models::Gateway;
use crate::domain::models::GatewayConfig;
use crate::domain::models::GatewayError;
use crate::domain::models::GatewayName;
use crate::domain::models::Message;
use crate::domain::models::Role;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Content {
        return Content {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        };
    }
}

impl From<&Message> for Content {
    fn from(message: &Message) -> Content {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };

        return Content::text(role, &message.text);
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        return self
            .candidates
            .first()
            .map(|candidate| {
                return candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| return part.text.as_str())
                    .collect::<String>();
            })
            .unwrap_or_default();
    }
}

/// Appends `content`, folding it into the previous entry when both share a
/// role since Gemini expects turns to alternate.
fn push_content(contents: &mut Vec<Content>, content: Content) {
    if let Some(last) = contents.last_mut() {
        if last.role == content.role {
            last.parts.extend(content.parts);
            return;
        }
    }

    contents.push(content);
}

/// Turns the transcript into Gemini contents. Empty messages (a reply that
/// was cancelled before its first fragment) are skipped since the API
/// rejects empty parts.
fn to_contents(history: &[Message], new_message: &str) -> Vec<Content> {
    let mut contents: Vec<Content> = vec![];
    for message in history.iter().filter(|message| return !message.text.is_empty()) {
        push_content(&mut contents, Content::from(message));
    }

    let ends_with_new_message = history
        .last()
        .map(|last| return last.is_user() && last.text == new_message)
        .unwrap_or(false);

    if !ends_with_new_message {
        push_content(&mut contents, Content::text("user", new_message));
    }

    return contents;
}

/// Reads one SSE line. Only `data:` events carrying text produce a fragment.
fn parse_event(line: &str) -> Result<Option<String>, GatewayError> {
    let cleaned_line = line.trim();
    let data = match cleaned_line.strip_prefix("data:") {
        Some(data) => data.trim(),
        None => return Ok(None),
    };
    if data.is_empty() {
        return Ok(None);
    }

    let res: GenerateContentResponse = serde_json::from_str(data)?;
    tracing::debug!(body = ?res, "Stream event");

    let text = res.text();
    if text.is_empty() {
        return Ok(None);
    }

    return Ok(Some(text));
}

pub struct Gemini {
    url: String,
    token: String,
    timeout: String,
    config: GatewayConfig,
}

impl Gemini {
    pub fn new(config: GatewayConfig) -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: Config::get(ConfigKey::GeminiToken),
            timeout: Config::get(ConfigKey::GatewayHealthCheckTimeout),
            config,
        };
    }

    /// Chat turns carry the system instruction. One-shot prompts are sent
    /// bare so the task templates are not steered by the sales persona.
    fn request_body(&self, contents: Vec<Content>) -> GenerateContentRequest {
        let mut system_instruction = None;
        if !self.config.system_instruction.trim().is_empty() {
            system_instruction = Some(Content::text("", &self.config.system_instruction));
        }

        return GenerateContentRequest {
            contents,
            system_instruction,
        };
    }

    async fn post(
        &self,
        method: &str,
        sse: bool,
        body: &GenerateContentRequest,
    ) -> Result<reqwest::Response, GatewayError> {
        let alt = if sse { "alt=sse&" } else { "" };
        let mut req = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/models/{model}:{method}?{alt}key={key}",
                url = self.url,
                model = self.config.model_id,
                key = self.token,
            ))
            .json(body);

        if let Some(timeout) = self.config.request_timeout {
            req = req.timeout(timeout);
        }

        let res = req.send().await?;
        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make request to Gemini"
            );
            return Err(GatewayError::new(format!(
                "Failed to make request to Gemini, {}",
                res.status().as_u16()
            )));
        }

        return Ok(res);
    }
}

#[async_trait]
impl Gateway for Gemini {
    fn name(&self) -> GatewayName {
        return GatewayName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Gemini URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Gemini token is not defined");
        }

        let url = format!(
            "{url}/v1beta/models/{model}?key={key}",
            url = self.url,
            model = self.config.model_id,
            key = self.token
        );

        let res = reqwest::Client::new()
            .get(&url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Gemini is not reachable");
                bail!("Gemini is not reachable");
            }
        };

        let status = res.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Gemini health check failed");
            bail!("Gemini health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stream_converse(
        &self,
        history: Vec<Message>,
        new_message: String,
    ) -> Result<FragmentStream, GatewayError> {
        let body = self.request_body(to_contents(&history, &new_message));
        let res = self.post("streamGenerateContent", true, &body).await?;

        let stream = res.bytes_stream().map_err(convert_err);
        let lines_reader = StreamReader::new(stream).lines();

        // Ends after the last line, or right after the first error.
        let fragments = stream::unfold(Some(lines_reader), |state| async move {
            let mut lines_reader = state?;
            loop {
                match lines_reader.next_line().await {
                    Ok(Some(line)) => match parse_event(&line) {
                        Ok(Some(text)) => return Some((Ok(text), Some(lines_reader))),
                        Ok(None) => continue,
                        Err(err) => return Some((Err(err), None)),
                    },
                    Ok(None) => return None,
                    Err(err) => return Some((Err(GatewayError::from(err)), None)),
                }
            }
        });

        return Ok(fragments.boxed());
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, prompt: String) -> Result<String, GatewayError> {
        let body = GenerateContentRequest {
            contents: vec![Content::text("user", &prompt)],
            system_instruction: None,
        };
        let res = self
            .post("generateContent", false, &body)
            .await?
            .json::<GenerateContentResponse>()
            .await?;

        let text = res.text();
        if text.is_empty() {
            return Err(GatewayError::new("Gemini returned an empty completion"));
        }

        return Ok(text);
    }
}
