#[cfg(test)]
#[path = "tool_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::domain::models::TaskType;
use crate::domain::services::clipboard::ClipboardService;
use crate::domain::services::TaskController;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOptions {
    pub task_type: TaskType,
    pub content: Option<String>,
    pub copy: bool,
}

/// Runs the task and writes its result. Returns the result so callers can
/// hand it on.
pub async fn generate_to<W>(
    controller: &TaskController,
    task_type: TaskType,
    content: &str,
    output: &mut W,
) -> Result<String>
where
    W: AsyncWrite + Unpin,
{
    if content.trim().is_empty() {
        bail!("There is no content to work on. Pass --content or pipe text through stdin.");
    }

    controller.generate(task_type, content).await;
    let result = controller.result();

    output.write_all(result.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;

    return Ok(result);
}

pub async fn run(controller: TaskController, options: ToolOptions) -> Result<()> {
    let content = match options.content {
        Some(content) => content,
        None => {
            let mut content = "".to_string();
            tokio::io::stdin().read_to_string(&mut content).await?;
            content
        }
    };

    eprintln!("{}...", options.task_type.label(controller.locale()));
    let mut stdout = tokio::io::stdout();
    let result = generate_to(&controller, options.task_type, &content, &mut stdout).await?;

    if options.copy {
        if let Err(err) = ClipboardService::healthcheck() {
            tracing::warn!(err = ?err, "Clipboard is unavailable");
            bail!("Clipboard is unavailable: {err}");
        }
        ClipboardService::set(result)?;
        eprintln!("Copied result to clipboard.");
    }

    return Ok(());
}
