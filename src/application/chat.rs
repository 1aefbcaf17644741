#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::services::ConversationController;

fn is_quit(line: &str) -> bool {
    return matches!(line.trim(), "/quit" | "/exit" | "/q");
}

/// Prints one assistant reply while it streams. Text normally only grows, so
/// only the new suffix is written; a replaced reply (the fallback) is
/// printed again on a fresh line.
struct ReplyPrinter {
    shown: String,
    started: bool,
}

impl ReplyPrinter {
    fn new() -> ReplyPrinter {
        return ReplyPrinter {
            shown: "".to_string(),
            started: false,
        };
    }

    async fn show<W>(&mut self, output: &mut W, text: &str) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if text == self.shown {
            return Ok(());
        }

        if !self.started {
            output
                .write_all(format!("{}> ", Role::Assistant).as_bytes())
                .await?;
            self.started = true;
        }

        if let Some(suffix) = text.strip_prefix(self.shown.as_str()) {
            output.write_all(suffix.as_bytes()).await?;
        } else {
            output.write_all(b"\n").await?;
            output.write_all(text.as_bytes()).await?;
        }
        output.flush().await?;
        self.shown = text.to_string();

        return Ok(());
    }

    async fn finish<W>(&mut self, output: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if self.started {
            output.write_all(b"\n").await?;
            output.flush().await?;
        }

        return Ok(());
    }
}

async fn print_message<W>(output: &mut W, message: &Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{}> {}\n", message.role, message.text).as_bytes())
        .await?;

    return Ok(());
}

async fn run_turn<W>(controller: &ConversationController, line: &str, output: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut updates = controller.subscribe();
    let before = updates.borrow().len();
    let mut printer = ReplyPrinter::new();

    let turn = controller.submit(line);
    tokio::pin!(turn);

    loop {
        tokio::select! {
            _ = &mut turn => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }

                let tail = updates
                    .borrow_and_update()
                    .open_tail()
                    .map(|message| return message.text.to_string());
                if let Some(text) = tail {
                    printer.show(output, &text).await?;
                }
            }
        }
    }

    let mut reply = None;
    {
        let session = updates.borrow();
        if session.len() > before {
            reply = session.last().map(|message| return message.text.to_string());
        }
    }
    if let Some(reply) = reply {
        printer.show(output, &reply).await?;
    }
    printer.finish(output).await?;

    return Ok(());
}

/// Reads user lines from `input` until EOF or a quit command and streams
/// every reply to `output`.
pub async fn run<R, W>(controller: &ConversationController, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    for message in controller.snapshot() {
        print_message(output, &message).await?;
    }

    let mut lines = input.lines();
    loop {
        output
            .write_all(format!("{}> ", Role::User).as_bytes())
            .await?;
        output.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        if is_quit(&line) {
            break;
        }

        run_turn(controller, &line, output).await?;
    }

    output.write_all(b"\n").await?;
    output.flush().await?;

    return Ok(());
}

pub async fn start(controller: ConversationController) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    return run(&controller, BufReader::new(tokio::io::stdin()), &mut stdout).await;
}
